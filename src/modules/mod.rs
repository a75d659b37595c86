//! # Encoder and decoder networks
//!
//! A [`KeyboardCell`](crate::KeyboardCell) is built from one encoder and one
//! decoder, picked by name from a [`ModuleRegistry`]. Both follow the same
//! lifecycle:
//!
//! 1. construction from a [`KeyboardCellConfig`](crate::KeyboardCellConfig)
//!    (no parameters yet),
//! 2. `build` allocates parameters on a device, once,
//! 3. `init_state` creates the recurrent state for a new sequence,
//! 4. `step` maps `(previous frame, previous state)` to the next state.
//!
//! The decoder's `step` also receives the encoder state produced in the
//! same timestep and returns the predicted frame.
//!
//! | Encoder | State | Notes |
//! |---------|-------|-------|
//! | `identity` | `Empty` | no parameters |
//! | `rnn` | `Lstm(num_layers)` | stacked LSTM over the previous frame |
//!
//! | Decoder | State | Notes |
//! |---------|-------|-------|
//! | `perceptron` | `Empty` | two-layer feed-forward baseline |
//! | `lstm` | `Lstm(1)` | LSTM over `[frame, encoder context]` |
//!
//! Registries hand out [`Encoder`] and [`Decoder`], Burn modules wrapping
//! one concrete network each, so built parameters take part in records,
//! optimizers and device moves like any other module.

use std::fmt;

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::cells::LstmState;
use crate::error::{Error, Result};

pub mod decoder;
pub mod encoder;
pub mod registry;

pub use decoder::{Decoder, LstmDecoder, PerceptronDecoder};
pub use encoder::{Encoder, IdentityEncoder, RnnEncoder};
pub use registry::{decoder_registry, encoder_registry, ModuleRegistry};

/// Which registry a module belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModuleKind {
    Encoder,
    Decoder,
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleKind::Encoder => f.write_str("encoder"),
            ModuleKind::Decoder => f.write_str("decoder"),
        }
    }
}

/// Shape of a module's recurrent state
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StateSize {
    Empty,
    Hidden(usize),
    Lstm { num_layers: usize, hidden_size: usize },
}

impl StateSize {
    /// Width of the context tensor a decoder receives from an encoder with this state.
    pub fn context_width(&self) -> usize {
        match self {
            StateSize::Empty => 0,
            StateSize::Hidden(size) => *size,
            StateSize::Lstm { hidden_size, .. } => *hidden_size,
        }
    }
}

/// Recurrent state of one encoder or decoder
#[derive(Clone, Debug)]
pub enum RecurrentState<B: Backend> {
    /// Stateless module
    Empty,
    /// Single `[batch, size]` tensor
    Hidden(Tensor<B, 2>),
    /// One entry per LSTM layer, bottom first
    Lstm(Vec<LstmState<B>>),
}

impl<B: Backend> RecurrentState<B> {
    pub fn variant(&self) -> &'static str {
        match self {
            RecurrentState::Empty => "empty",
            RecurrentState::Hidden(_) => "hidden",
            RecurrentState::Lstm(_) => "lstm",
        }
    }

    /// What a decoder conditions on: the tensor itself, or the top LSTM layer's hidden output.
    pub fn context(&self) -> Option<Tensor<B, 2>> {
        match self {
            RecurrentState::Empty => None,
            RecurrentState::Hidden(hidden) => Some(hidden.clone()),
            RecurrentState::Lstm(layers) => layers.last().map(|layer| layer.hidden.clone()),
        }
    }

    pub fn size(&self) -> StateSize {
        match self {
            RecurrentState::Empty => StateSize::Empty,
            RecurrentState::Hidden(hidden) => StateSize::Hidden(hidden.dims()[1]),
            RecurrentState::Lstm(layers) => StateSize::Lstm {
                num_layers: layers.len(),
                hidden_size: layers.first().map_or(0, |layer| layer.hidden.dims()[1]),
            },
        }
    }

    /// Unwrap the LSTM layers, checking the layer count.
    pub fn into_lstm(self, module: &'static str, num_layers: usize) -> Result<Vec<LstmState<B>>> {
        match self {
            RecurrentState::Lstm(layers) if layers.len() == num_layers => Ok(layers),
            RecurrentState::Lstm(layers) => Err(Error::LayerCount {
                module,
                expected: num_layers,
                found: layers.len(),
            }),
            other => Err(Error::StateMismatch {
                module,
                expected: "lstm",
                found: other.variant(),
            }),
        }
    }

    /// Unwrap a single-layer LSTM state.
    pub fn into_single_lstm(self, module: &'static str) -> Result<LstmState<B>> {
        let mut layers = self.into_lstm(module, 1)?;
        Ok(layers.remove(0))
    }

    pub fn expect_empty(&self, module: &'static str) -> Result<()> {
        match self {
            RecurrentState::Empty => Ok(()),
            other => Err(Error::StateMismatch {
                module,
                expected: "empty",
                found: other.variant(),
            }),
        }
    }
}

/// Encoder side of a keyboard cell
pub trait EncoderNetwork<B: Backend>: Send {
    /// Registry name
    fn name(&self) -> &'static str;

    /// Allocate parameters on `device`
    fn build(&mut self, device: &B::Device);

    fn is_built(&self) -> bool;

    fn state_size(&self) -> StateSize;

    /// Fresh state for the start of a sequence
    fn init_state(&self, batch_size: usize, device: &B::Device) -> Result<RecurrentState<B>>;

    /// Consume the previous frame and state, return the next state
    fn step(&self, prev_keyboard: Tensor<B, 2>, prev_state: RecurrentState<B>) -> Result<RecurrentState<B>>;
}

/// Decoder side of a keyboard cell
pub trait DecoderNetwork<B: Backend>: Send {
    /// Registry name
    fn name(&self) -> &'static str;

    /// Allocate parameters on `device`, sized for the encoder's state
    fn build(&mut self, device: &B::Device, encoder: &StateSize);

    fn is_built(&self) -> bool;

    fn state_size(&self) -> StateSize;

    /// Width of the predicted keyboard frame
    fn output_size(&self) -> usize;

    /// Fresh state for the start of a sequence
    fn init_state(&self, batch_size: usize, device: &B::Device) -> Result<RecurrentState<B>>;

    /// Predict the next frame from the previous one, conditioned on
    /// `(new encoder state, previous decoder state)`
    fn step(
        &self,
        prev_keyboard: Tensor<B, 2>,
        states: (&RecurrentState<B>, RecurrentState<B>),
    ) -> Result<(Tensor<B, 2>, RecurrentState<B>)>;
}

/// Previous frame, concatenated with the encoder context when there is one.
pub(crate) fn conditioned_input<B: Backend>(
    prev_keyboard: Tensor<B, 2>,
    encoder_state: &RecurrentState<B>,
) -> Tensor<B, 2> {
    match encoder_state.context() {
        Some(context) => Tensor::cat(vec![prev_keyboard, context], 1),
        None => prev_keyboard,
    }
}
