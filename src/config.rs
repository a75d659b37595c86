//! Configuration for the keyboard cell.
//!
//! The encoder and decoder names are looked up in the module registries
//! (see [`crate::modules::registry`]); the remaining fields size the
//! concrete networks.

use std::path::Path;

use burn::config::Config;

use crate::error::Error;
use crate::rnn::FeedMode;

/// Options consumed by the module registries and the concrete networks.
#[derive(Config, Debug)]
pub struct KeyboardCellConfig {
    /// Name of the encoder network in the encoder registry
    #[config(default = "String::from(\"identity\")")]
    pub encoder: String,
    /// Name of the decoder network in the decoder registry
    #[config(default = "String::from(\"lstm\")")]
    pub decoder: String,
    /// Hidden units of every recurrent/perceptron layer
    #[config(default = 512)]
    pub hidden_size: usize,
    /// Number of stacked LSTM layers in the `rnn` encoder
    #[config(default = 2)]
    pub num_layers: usize,
    /// Probability above which a predicted key counts as pressed
    #[config(default = 0.5)]
    pub note_threshold: f64,
    /// What a [`KeyboardRnn`](crate::rnn::KeyboardRnn) feeds the cell after the first step
    #[config(default = "FeedMode::TeacherForcing")]
    pub feed: FeedMode,
}

impl KeyboardCellConfig {
    /// Check the numeric options; module names are checked by the registries.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.hidden_size == 0 {
            return Err(Error::Config("hidden_size must be > 0".into()));
        }
        if self.num_layers == 0 {
            return Err(Error::Config("num_layers must be > 0".into()));
        }
        if !(self.note_threshold > 0.0 && self.note_threshold < 1.0) {
            return Err(Error::Config(format!(
                "note_threshold must be in (0, 1), got {}",
                self.note_threshold
            )));
        }
        Ok(())
    }

    /// Load a JSON configuration and validate it.
    pub fn from_file(path: impl AsRef<Path>) -> crate::error::Result<Self> {
        let path = path.as_ref();
        let config = Self::load(path)
            .map_err(|err| Error::Config(format!("{}: {err:?}", path.display())))?;
        config.validate()?;
        Ok(config)
    }
}
