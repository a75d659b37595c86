//! Encoder networks
//!
//! The encoder runs first in every timestep. Its new state is passed to the
//! decoder of the same timestep.

use burn::module::Module;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use super::{EncoderNetwork, RecurrentState, StateSize};
use crate::cells::LstmStack;
use crate::config::KeyboardCellConfig;
use crate::error::{Error, Result};
use crate::keyboard::NB_NOTES;

/// Pass-through encoder: no parameters, no state
#[derive(Module, Clone, Debug, Default)]
pub struct IdentityEncoder {
    built: bool,
}

impl IdentityEncoder {
    pub const NAME: &'static str = "identity";

    pub fn new(_config: &KeyboardCellConfig) -> Self {
        Self::default()
    }
}

impl<B: Backend> EncoderNetwork<B> for IdentityEncoder {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn build(&mut self, _device: &B::Device) {
        self.built = true;
    }

    fn is_built(&self) -> bool {
        self.built
    }

    fn state_size(&self) -> StateSize {
        StateSize::Empty
    }

    fn init_state(&self, _batch_size: usize, _device: &B::Device) -> Result<RecurrentState<B>> {
        Ok(RecurrentState::Empty)
    }

    fn step(&self, _prev_keyboard: Tensor<B, 2>, prev_state: RecurrentState<B>) -> Result<RecurrentState<B>> {
        prev_state.expect_empty(Self::NAME)?;
        Ok(RecurrentState::Empty)
    }
}

/// Stacked LSTM reading the previous keyboard frame
#[derive(Module, Debug)]
pub struct RnnEncoder<B: Backend> {
    hidden_size: usize,
    num_layers: usize,
    rnn: Option<LstmStack<B>>,
}

impl<B: Backend> RnnEncoder<B> {
    pub const NAME: &'static str = "rnn";

    pub fn new(config: &KeyboardCellConfig) -> Self {
        Self {
            hidden_size: config.hidden_size,
            num_layers: config.num_layers,
            rnn: None,
        }
    }

    fn rnn(&self) -> Result<&LstmStack<B>> {
        self.rnn.as_ref().ok_or(Error::NotBuilt { module: Self::NAME })
    }
}

impl<B: Backend> EncoderNetwork<B> for RnnEncoder<B> {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn build(&mut self, device: &B::Device) {
        self.rnn = Some(LstmStack::new(NB_NOTES, self.hidden_size, self.num_layers, device));
    }

    fn is_built(&self) -> bool {
        self.rnn.is_some()
    }

    fn state_size(&self) -> StateSize {
        StateSize::Lstm {
            num_layers: self.num_layers,
            hidden_size: self.hidden_size,
        }
    }

    fn init_state(&self, batch_size: usize, device: &B::Device) -> Result<RecurrentState<B>> {
        Ok(RecurrentState::Lstm(self.rnn()?.zero_state(batch_size, device)))
    }

    fn step(&self, prev_keyboard: Tensor<B, 2>, prev_state: RecurrentState<B>) -> Result<RecurrentState<B>> {
        let rnn = self.rnn()?;
        let layers = prev_state.into_lstm(Self::NAME, self.num_layers)?;
        Ok(RecurrentState::Lstm(rnn.forward(prev_keyboard, layers)))
    }
}

/// Encoder selected from the registry
///
/// Parameters of the active variant are visible to Burn (records,
/// optimizers, device moves) once the network is built.
#[derive(Module, Debug)]
pub enum Encoder<B: Backend> {
    Identity(IdentityEncoder),
    Rnn(RnnEncoder<B>),
}

impl<B: Backend> EncoderNetwork<B> for Encoder<B> {
    fn name(&self) -> &'static str {
        match self {
            Encoder::Identity(encoder) => EncoderNetwork::<B>::name(encoder),
            Encoder::Rnn(encoder) => encoder.name(),
        }
    }

    fn build(&mut self, device: &B::Device) {
        match self {
            Encoder::Identity(encoder) => EncoderNetwork::<B>::build(encoder, device),
            Encoder::Rnn(encoder) => encoder.build(device),
        }
    }

    fn is_built(&self) -> bool {
        match self {
            Encoder::Identity(encoder) => EncoderNetwork::<B>::is_built(encoder),
            Encoder::Rnn(encoder) => encoder.is_built(),
        }
    }

    fn state_size(&self) -> StateSize {
        match self {
            Encoder::Identity(encoder) => EncoderNetwork::<B>::state_size(encoder),
            Encoder::Rnn(encoder) => encoder.state_size(),
        }
    }

    fn init_state(&self, batch_size: usize, device: &B::Device) -> Result<RecurrentState<B>> {
        match self {
            Encoder::Identity(encoder) => EncoderNetwork::<B>::init_state(encoder, batch_size, device),
            Encoder::Rnn(encoder) => encoder.init_state(batch_size, device),
        }
    }

    fn step(&self, prev_keyboard: Tensor<B, 2>, prev_state: RecurrentState<B>) -> Result<RecurrentState<B>> {
        match self {
            Encoder::Identity(encoder) => EncoderNetwork::<B>::step(encoder, prev_keyboard, prev_state),
            Encoder::Rnn(encoder) => encoder.step(prev_keyboard, prev_state),
        }
    }
}
