//! # DeepMusic keyboard cell (Rust)
//!
//! Recurrent cell predicting the next piano-roll frame, built on the Burn
//! framework.
//!
//! ## Features
//!
//! - **KeyboardCell**: encoder/decoder pair stepped once per timestep
//! - **Registries**: encoder and decoder networks selected by name from the config
//! - **Encoders**: `identity`, `rnn` (stacked LSTM)
//! - **Decoders**: `perceptron`, `lstm`
//! - **KeyboardRnn**: sequence layer with teacher forcing or free-running feed
//!
//! ## Quick Start
//!
//! ```rust
//! use burn::backend::NdArray;
//! use deepmusic::prelude::*;
//!
//! type Backend = NdArray<f32>;
//! let device = Default::default();
//!
//! let config = KeyboardCellConfig::new()
//!     .with_encoder("rnn".to_string())
//!     .with_decoder("lstm".to_string())
//!     .with_hidden_size(32);
//! let mut cell = KeyboardCell::<Backend>::new(&config).unwrap();
//!
//! let frame = keyboard::empty::<Backend>(4, &device);
//! let (next, state) = cell.call(frame, None).unwrap();
//! let (next, _) = cell.call(next, Some(state)).unwrap();
//!
//! assert_eq!(next.dims(), [4, NB_NOTES]);
//! ```

pub mod cells;
pub mod config;
pub mod error;
pub mod keyboard;
pub mod keyboard_cell;
pub mod modules;
pub mod rnn;

pub use config::KeyboardCellConfig;
pub use error::{Error, Result};
pub use keyboard_cell::{CellPhase, CellStateSize, KeyboardCell, KeyboardState};

pub mod prelude {
    pub use crate::config::KeyboardCellConfig;
    pub use crate::error::{Error, Result};
    pub use crate::keyboard::{self, NB_NOTES};
    pub use crate::keyboard_cell::{CellPhase, KeyboardCell, KeyboardState};
    pub use crate::modules::{
        decoder_registry, encoder_registry, Decoder, DecoderNetwork, Encoder, EncoderNetwork,
        ModuleKind, ModuleRegistry, RecurrentState, StateSize,
    };
    pub use crate::rnn::{FeedMode, KeyboardRnn};
}
