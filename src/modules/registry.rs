//! Name → constructor maps for encoder and decoder networks.

use burn::tensor::backend::Backend;

use super::{
    Decoder, Encoder, IdentityEncoder, LstmDecoder, ModuleKind, PerceptronDecoder, RnnEncoder,
};
use crate::config::KeyboardCellConfig;
use crate::error::{Error, Result};

type Factory<M> = Box<dyn Fn(&KeyboardCellConfig) -> M + Send + Sync>;

/// Constructors for one kind of module, keyed by name
///
/// `build_module` reads the name from the config field matching the
/// registry's [`ModuleKind`]: `encoder` or `decoder`. Several names may map
/// to the same network with different settings.
pub struct ModuleRegistry<M> {
    kind: ModuleKind,
    factories: Vec<(&'static str, Factory<M>)>,
}

impl<M> ModuleRegistry<M> {
    pub fn new(kind: ModuleKind) -> Self {
        Self {
            kind,
            factories: Vec::new(),
        }
    }

    pub fn kind(&self) -> ModuleKind {
        self.kind
    }

    /// Register `factory` under `name`, replacing any previous entry.
    pub fn register<F>(&mut self, name: &'static str, factory: F) -> &mut Self
    where
        F: Fn(&KeyboardCellConfig) -> M + Send + Sync + 'static,
    {
        self.factories.retain(|(existing, _)| *existing != name);
        self.factories.push((name, Box::new(factory)));
        self
    }

    /// Registered names, in registration order
    pub fn names(&self) -> Vec<&'static str> {
        self.factories.iter().map(|(name, _)| *name).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.iter().any(|(existing, _)| *existing == name)
    }

    /// Construct the module the config selects for this registry's kind.
    pub fn build_module(&self, config: &KeyboardCellConfig) -> Result<M> {
        let name = match self.kind {
            ModuleKind::Encoder => config.encoder.as_str(),
            ModuleKind::Decoder => config.decoder.as_str(),
        };

        let (_, factory) = self
            .factories
            .iter()
            .find(|(existing, _)| *existing == name)
            .ok_or_else(|| Error::UnknownModule {
                kind: self.kind,
                name: name.to_string(),
                available: self.names().join(", "),
            })?;

        tracing::debug!(kind = %self.kind, name, "resolved module");
        Ok(factory(config))
    }
}

fn identity<B: Backend>(config: &KeyboardCellConfig) -> Encoder<B> {
    Encoder::Identity(IdentityEncoder::new(config))
}

fn rnn<B: Backend>(config: &KeyboardCellConfig) -> Encoder<B> {
    Encoder::Rnn(RnnEncoder::new(config))
}

fn perceptron<B: Backend>(config: &KeyboardCellConfig) -> Decoder<B> {
    Decoder::Perceptron(PerceptronDecoder::new(config))
}

fn lstm<B: Backend>(config: &KeyboardCellConfig) -> Decoder<B> {
    Decoder::Lstm(LstmDecoder::new(config))
}

/// Registry with the built-in encoders: `identity`, `rnn`
pub fn encoder_registry<B: Backend>() -> ModuleRegistry<Encoder<B>> {
    let mut registry = ModuleRegistry::new(ModuleKind::Encoder);
    registry
        .register(IdentityEncoder::NAME, identity::<B>)
        .register(RnnEncoder::<B>::NAME, rnn::<B>);
    registry
}

/// Registry with the built-in decoders: `perceptron`, `lstm`
pub fn decoder_registry<B: Backend>() -> ModuleRegistry<Decoder<B>> {
    let mut registry = ModuleRegistry::new(ModuleKind::Decoder);
    registry
        .register(PerceptronDecoder::<B>::NAME, perceptron::<B>)
        .register(LstmDecoder::<B>::NAME, lstm::<B>);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::{DecoderNetwork, EncoderNetwork};
    use burn::backend::NdArray;

    type Backend = NdArray<f32>;

    #[test]
    fn test_builtin_names() {
        assert_eq!(encoder_registry::<Backend>().names(), vec!["identity", "rnn"]);
        assert_eq!(decoder_registry::<Backend>().names(), vec!["perceptron", "lstm"]);
    }

    #[test]
    fn test_build_selected_module() {
        let config = KeyboardCellConfig::new()
            .with_encoder("rnn".to_string())
            .with_decoder("perceptron".to_string());

        let encoder = encoder_registry::<Backend>().build_module(&config).unwrap();
        let decoder = decoder_registry::<Backend>().build_module(&config).unwrap();

        assert_eq!(encoder.name(), "rnn");
        assert_eq!(decoder.name(), "perceptron");
        assert!(!encoder.is_built());
        assert!(!decoder.is_built());
    }

    #[test]
    fn test_unknown_module() {
        let config = KeyboardCellConfig::new().with_decoder("transformer".to_string());

        match decoder_registry::<Backend>().build_module(&config) {
            Err(Error::UnknownModule {
                kind,
                name,
                available,
            }) => {
                assert_eq!(kind, ModuleKind::Decoder);
                assert_eq!(name, "transformer");
                assert_eq!(available, "perceptron, lstm");
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("transformer should not resolve"),
        }
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = encoder_registry::<Backend>();
        registry.register("identity", rnn::<Backend>);

        assert_eq!(registry.names(), vec!["rnn", "identity"]);
        let module = registry.build_module(&KeyboardCellConfig::new()).unwrap();
        assert_eq!(module.name(), "rnn");
    }

    #[test]
    fn test_register_variant_with_own_settings() {
        let mut registry = encoder_registry::<Backend>();
        registry.register("deep_rnn", |config: &KeyboardCellConfig| {
            Encoder::Rnn(RnnEncoder::new(&config.clone().with_num_layers(4)))
        });

        let config = KeyboardCellConfig::new()
            .with_encoder("deep_rnn".to_string())
            .with_hidden_size(8);
        let module = registry.build_module(&config).unwrap();

        assert_eq!(module.name(), "rnn");
        assert_eq!(
            module.state_size(),
            crate::modules::StateSize::Lstm {
                num_layers: 4,
                hidden_size: 8
            }
        );
    }
}
