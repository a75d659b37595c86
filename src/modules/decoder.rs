//! Decoder networks
//!
//! Every decoder predicts note-on probabilities for the next frame
//! (`[batch, NB_NOTES]`, sigmoid output).

use burn::module::Module;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use super::{conditioned_input, DecoderNetwork, RecurrentState, StateSize};
use crate::cells::{LstmCell, LstmState, Perceptron, PerceptronActivation};
use crate::config::KeyboardCellConfig;
use crate::error::{Error, Result};
use crate::keyboard::NB_NOTES;

/// Parameters of a built [`PerceptronDecoder`]
#[derive(Module, Debug)]
pub struct PerceptronLayers<B: Backend> {
    project_hidden: Perceptron<B>,
    project_keyboard: Perceptron<B>,
}

/// Feed-forward baseline: `[frame, context] -> relu(hidden) -> sigmoid(keys)`
#[derive(Module, Debug)]
pub struct PerceptronDecoder<B: Backend> {
    hidden_size: usize,
    layers: Option<PerceptronLayers<B>>,
}

impl<B: Backend> PerceptronDecoder<B> {
    pub const NAME: &'static str = "perceptron";

    pub fn new(config: &KeyboardCellConfig) -> Self {
        Self {
            hidden_size: config.hidden_size,
            layers: None,
        }
    }
}

impl<B: Backend> DecoderNetwork<B> for PerceptronDecoder<B> {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn build(&mut self, device: &B::Device, encoder: &StateSize) {
        let input_size = NB_NOTES + encoder.context_width();
        self.layers = Some(PerceptronLayers {
            project_hidden: Perceptron::new(input_size, self.hidden_size, PerceptronActivation::Relu, device),
            project_keyboard: Perceptron::new(self.hidden_size, NB_NOTES, PerceptronActivation::Sigmoid, device),
        });
    }

    fn is_built(&self) -> bool {
        self.layers.is_some()
    }

    fn state_size(&self) -> StateSize {
        StateSize::Empty
    }

    fn output_size(&self) -> usize {
        NB_NOTES
    }

    fn init_state(&self, _batch_size: usize, _device: &B::Device) -> Result<RecurrentState<B>> {
        if self.layers.is_none() {
            return Err(Error::NotBuilt { module: Self::NAME });
        }
        Ok(RecurrentState::Empty)
    }

    fn step(
        &self,
        prev_keyboard: Tensor<B, 2>,
        (encoder_state, prev_state): (&RecurrentState<B>, RecurrentState<B>),
    ) -> Result<(Tensor<B, 2>, RecurrentState<B>)> {
        let layers = self.layers.as_ref().ok_or(Error::NotBuilt { module: Self::NAME })?;
        prev_state.expect_empty(Self::NAME)?;

        let input = conditioned_input(prev_keyboard, encoder_state);
        let hidden = layers.project_hidden.forward(input);
        let next_keyboard = layers.project_keyboard.forward(hidden);

        Ok((next_keyboard, RecurrentState::Empty))
    }
}

/// Parameters of a built [`LstmDecoder`]
#[derive(Module, Debug)]
pub struct LstmLayers<B: Backend> {
    cell: LstmCell<B>,
    project_keyboard: Perceptron<B>,
}

/// LSTM over `[frame, encoder context]` with a sigmoid projection to the keys
#[derive(Module, Debug)]
pub struct LstmDecoder<B: Backend> {
    hidden_size: usize,
    layers: Option<LstmLayers<B>>,
}

impl<B: Backend> LstmDecoder<B> {
    pub const NAME: &'static str = "lstm";

    pub fn new(config: &KeyboardCellConfig) -> Self {
        Self {
            hidden_size: config.hidden_size,
            layers: None,
        }
    }

    fn layers(&self) -> Result<&LstmLayers<B>> {
        self.layers.as_ref().ok_or(Error::NotBuilt { module: Self::NAME })
    }
}

impl<B: Backend> DecoderNetwork<B> for LstmDecoder<B> {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn build(&mut self, device: &B::Device, encoder: &StateSize) {
        let input_size = NB_NOTES + encoder.context_width();
        self.layers = Some(LstmLayers {
            cell: LstmCell::new(input_size, self.hidden_size, device),
            project_keyboard: Perceptron::new(self.hidden_size, NB_NOTES, PerceptronActivation::Sigmoid, device),
        });
    }

    fn is_built(&self) -> bool {
        self.layers.is_some()
    }

    fn state_size(&self) -> StateSize {
        StateSize::Lstm {
            num_layers: 1,
            hidden_size: self.hidden_size,
        }
    }

    fn output_size(&self) -> usize {
        NB_NOTES
    }

    fn init_state(&self, batch_size: usize, device: &B::Device) -> Result<RecurrentState<B>> {
        let layers = self.layers()?;
        Ok(RecurrentState::Lstm(vec![LstmState::zeros(
            batch_size,
            layers.cell.hidden_size(),
            device,
        )]))
    }

    fn step(
        &self,
        prev_keyboard: Tensor<B, 2>,
        (encoder_state, prev_state): (&RecurrentState<B>, RecurrentState<B>),
    ) -> Result<(Tensor<B, 2>, RecurrentState<B>)> {
        let layers = self.layers()?;
        let state = prev_state.into_single_lstm(Self::NAME)?;

        let input = conditioned_input(prev_keyboard, encoder_state);
        let next = layers.cell.forward(input, state);
        let next_keyboard = layers.project_keyboard.forward(next.hidden.clone());

        Ok((next_keyboard, RecurrentState::Lstm(vec![next])))
    }
}

/// Decoder selected from the registry
#[derive(Module, Debug)]
pub enum Decoder<B: Backend> {
    Perceptron(PerceptronDecoder<B>),
    Lstm(LstmDecoder<B>),
}

impl<B: Backend> DecoderNetwork<B> for Decoder<B> {
    fn name(&self) -> &'static str {
        match self {
            Decoder::Perceptron(decoder) => decoder.name(),
            Decoder::Lstm(decoder) => decoder.name(),
        }
    }

    fn build(&mut self, device: &B::Device, encoder: &StateSize) {
        match self {
            Decoder::Perceptron(decoder) => decoder.build(device, encoder),
            Decoder::Lstm(decoder) => decoder.build(device, encoder),
        }
    }

    fn is_built(&self) -> bool {
        match self {
            Decoder::Perceptron(decoder) => decoder.is_built(),
            Decoder::Lstm(decoder) => decoder.is_built(),
        }
    }

    fn state_size(&self) -> StateSize {
        match self {
            Decoder::Perceptron(decoder) => decoder.state_size(),
            Decoder::Lstm(decoder) => decoder.state_size(),
        }
    }

    fn output_size(&self) -> usize {
        match self {
            Decoder::Perceptron(decoder) => decoder.output_size(),
            Decoder::Lstm(decoder) => decoder.output_size(),
        }
    }

    fn init_state(&self, batch_size: usize, device: &B::Device) -> Result<RecurrentState<B>> {
        match self {
            Decoder::Perceptron(decoder) => decoder.init_state(batch_size, device),
            Decoder::Lstm(decoder) => decoder.init_state(batch_size, device),
        }
    }

    fn step(
        &self,
        prev_keyboard: Tensor<B, 2>,
        state: (&RecurrentState<B>, RecurrentState<B>),
    ) -> Result<(Tensor<B, 2>, RecurrentState<B>)> {
        match self {
            Decoder::Perceptron(decoder) => decoder.step(prev_keyboard, state),
            Decoder::Lstm(decoder) => decoder.step(prev_keyboard, state),
        }
    }
}
