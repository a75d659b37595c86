//! Keyboard cell
//!
//! One recurrent step of the piano-roll model: the encoder reads the previous
//! frame, the decoder predicts the next frame from the previous frame and
//! the encoder state it just produced.
//!
//! ```text
//! enc'          = encoder.step(frame, enc)
//! (frame', dec') = decoder.step(frame, (enc', dec))
//! ```
//!
//! The cell has two phases. [`KeyboardCell::ensure_built`] allocates the
//! parameters of both networks once; [`KeyboardCell::step`] is the hot path
//! and requires a built cell. [`KeyboardCell::call`] keeps the recurrent-layer
//! calling convention: its first invocation builds the cell and starts from
//! fresh network state, ignoring any state passed in.
//!
//! The cell is a Burn [`Module`]: once built, its parameters are visible to
//! `num_params`, records, optimizers and `to_device`. The build phase and
//! the configuration are not part of the record.

use burn::module::Module;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::config::KeyboardCellConfig;
use crate::error::{Error, Result};
use crate::keyboard::check_frame;
use crate::modules::{
    decoder_registry, encoder_registry, Decoder, DecoderNetwork, Encoder, EncoderNetwork,
    ModuleRegistry, RecurrentState, StateSize,
};

/// Recurrent state of a [`KeyboardCell`]: one entry per network
#[derive(Clone, Debug)]
pub struct KeyboardState<B: Backend> {
    pub encoder: RecurrentState<B>,
    pub decoder: RecurrentState<B>,
}

/// State shapes of both networks
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellStateSize {
    pub encoder: StateSize,
    pub decoder: StateSize,
}

/// Build phase of a [`KeyboardCell`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellPhase {
    /// Networks resolved, parameters not allocated
    Unbuilt,
    /// Parameters allocated; `step` is available
    Built,
}

/// Encoder/decoder pair stepped once per timestep
#[derive(Module, Debug)]
pub struct KeyboardCell<B: Backend> {
    encoder: Encoder<B>,
    decoder: Decoder<B>,
    #[module(skip)]
    config: KeyboardCellConfig,
    #[module(skip)]
    phase: CellPhase,
}

impl<B: Backend> KeyboardCell<B> {
    /// Resolve the configured encoder and decoder from the built-in registries.
    pub fn new(config: &KeyboardCellConfig) -> Result<Self> {
        Self::with_registries(config, &encoder_registry(), &decoder_registry())
    }

    /// Resolve the configured encoder and decoder from custom registries.
    pub fn with_registries(
        config: &KeyboardCellConfig,
        encoders: &ModuleRegistry<Encoder<B>>,
        decoders: &ModuleRegistry<Decoder<B>>,
    ) -> Result<Self> {
        config.validate()?;
        let encoder = encoders.build_module(config)?;
        let decoder = decoders.build_module(config)?;
        Ok(Self::from_modules(config.clone(), encoder, decoder))
    }

    /// Wrap already constructed networks.
    ///
    /// The cell starts unbuilt even if both networks already carry
    /// parameters; [`ensure_built`](Self::ensure_built) keeps those.
    pub fn from_modules(config: KeyboardCellConfig, encoder: Encoder<B>, decoder: Decoder<B>) -> Self {
        Self {
            encoder,
            decoder,
            config,
            phase: CellPhase::Unbuilt,
        }
    }

    pub fn config(&self) -> &KeyboardCellConfig {
        &self.config
    }

    pub fn phase(&self) -> CellPhase {
        self.phase
    }

    pub fn encoder(&self) -> &Encoder<B> {
        &self.encoder
    }

    pub fn decoder(&self) -> &Decoder<B> {
        &self.decoder
    }

    pub fn encoder_name(&self) -> &'static str {
        self.encoder.name()
    }

    pub fn decoder_name(&self) -> &'static str {
        self.decoder.name()
    }

    pub fn state_size(&self) -> CellStateSize {
        CellStateSize {
            encoder: self.encoder.state_size(),
            decoder: self.decoder.state_size(),
        }
    }

    /// Width of the predicted frame
    pub fn output_size(&self) -> usize {
        self.decoder.output_size()
    }

    /// Allocate both networks' parameters on `device`. Only the first call
    /// does any work.
    pub fn ensure_built(&mut self, device: &B::Device) {
        if self.phase == CellPhase::Built {
            return;
        }

        tracing::debug!(
            encoder = self.encoder.name(),
            decoder = self.decoder.name(),
            "building keyboard cell"
        );
        if !self.encoder.is_built() {
            self.encoder.build(device);
        }
        if !self.decoder.is_built() {
            let encoder_size = self.encoder.state_size();
            self.decoder.build(device, &encoder_size);
        }
        self.phase = CellPhase::Built;
    }

    /// Fresh state for a new sequence.
    pub fn init_state(&self, batch_size: usize, device: &B::Device) -> Result<KeyboardState<B>> {
        self.require_built()?;
        Ok(KeyboardState {
            encoder: self.encoder.init_state(batch_size, device)?,
            decoder: self.decoder.init_state(batch_size, device)?,
        })
    }

    /// One timestep on a built cell.
    ///
    /// # Arguments
    /// * `prev_keyboard` - frame `t-1`, `[batch, NB_NOTES]` (ground truth or previous prediction)
    /// * `prev_state` - state after step `t-1`
    ///
    /// # Returns
    /// The predicted frame `t` and the state after step `t`
    pub fn step(
        &self,
        prev_keyboard: Tensor<B, 2>,
        prev_state: KeyboardState<B>,
    ) -> Result<(Tensor<B, 2>, KeyboardState<B>)> {
        self.require_built()?;
        check_frame(&prev_keyboard)?;

        let KeyboardState { encoder, decoder } = prev_state;
        let encoder = self.encoder.step(prev_keyboard.clone(), encoder)?;
        let (next_keyboard, decoder) = self.decoder.step(prev_keyboard, (&encoder, decoder))?;

        tracing::trace!(dims = ?next_keyboard.dims(), "keyboard cell step");
        Ok((next_keyboard, KeyboardState { encoder, decoder }))
    }

    /// Recurrent-layer entry point.
    ///
    /// On the first call the cell is built on the frame's device and
    /// `prev_state` is replaced by fresh network state. Afterwards `None`
    /// starts a new sequence and `Some` continues one.
    pub fn call(
        &mut self,
        prev_keyboard: Tensor<B, 2>,
        prev_state: Option<KeyboardState<B>>,
    ) -> Result<(Tensor<B, 2>, KeyboardState<B>)> {
        check_frame(&prev_keyboard)?;
        let device = prev_keyboard.device();
        let batch_size = prev_keyboard.dims()[0];

        let state = match (self.phase, prev_state) {
            (CellPhase::Unbuilt, supplied) => {
                self.ensure_built(&device);
                if supplied.is_some() {
                    tracing::debug!("first call: discarding supplied state");
                }
                self.init_state(batch_size, &device)?
            }
            (CellPhase::Built, Some(state)) => state,
            (CellPhase::Built, None) => self.init_state(batch_size, &device)?,
        };

        self.step(prev_keyboard, state)
    }

    fn require_built(&self) -> Result<()> {
        match self.phase {
            CellPhase::Built => Ok(()),
            CellPhase::Unbuilt => Err(Error::NotBuilt {
                module: "keyboard cell",
            }),
        }
    }
}
