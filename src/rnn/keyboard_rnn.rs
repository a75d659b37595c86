//! Keyboard RNN layer
//!
//! Unrolls a [`KeyboardCell`] over a `[batch, seq, NB_NOTES]` piano roll.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::keyboard::{binarize, check_frame, NB_NOTES};
use crate::keyboard_cell::{KeyboardCell, KeyboardState};

/// What the cell reads at each timestep
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedMode {
    /// Ground-truth frame `t` at every step
    #[default]
    TeacherForcing,
    /// Ground-truth frame 0, then the binarized previous prediction
    FreeRunning,
}

/// Sequence layer over a [`KeyboardCell`]
#[derive(Debug)]
pub struct KeyboardRnn<B: Backend> {
    cell: KeyboardCell<B>,
    feed: FeedMode,
}

impl<B: Backend> KeyboardRnn<B> {
    /// Wrap `cell`, feeding it as its config's `feed` says.
    pub fn new(cell: KeyboardCell<B>) -> Self {
        let feed = cell.config().feed;
        Self { cell, feed }
    }

    /// Override the feed mode
    pub fn with_feed(mut self, feed: FeedMode) -> Self {
        self.feed = feed;
        self
    }

    pub fn feed(&self) -> FeedMode {
        self.feed
    }

    pub fn cell(&self) -> &KeyboardCell<B> {
        &self.cell
    }

    /// Forward pass over a sequence
    ///
    /// # Arguments
    /// * `input` - `[batch, seq, NB_NOTES]`; entry `t` is the frame preceding prediction `t`
    /// * `state` - state to continue from, or `None` to start a new sequence
    ///
    /// # Returns
    /// Tuple of (predictions `[batch, seq, NB_NOTES]`, final state)
    pub fn forward(
        &mut self,
        input: Tensor<B, 3>,
        state: Option<KeyboardState<B>>,
    ) -> Result<(Tensor<B, 3>, KeyboardState<B>)> {
        let [batch_size, seq_len, notes] = input.dims();
        if notes != NB_NOTES {
            return Err(Error::FrameShape {
                expected: NB_NOTES,
                found: vec![batch_size, seq_len, notes],
            });
        }
        if seq_len == 0 {
            return Err(Error::EmptySequence("input has no timesteps"));
        }

        let device = input.device();
        self.cell.ensure_built(&device);

        let mut state = match state {
            Some(state) => state,
            None => self.cell.init_state(batch_size, &device)?,
        };

        let threshold = self.cell.config().note_threshold;
        let mut outputs: Vec<Tensor<B, 2>> = Vec::with_capacity(seq_len);
        let mut prev_keyboard: Tensor<B, 2> = input.clone().narrow(1, 0, 1).squeeze(1);

        for t in 0..seq_len {
            if t > 0 {
                prev_keyboard = match self.feed {
                    FeedMode::TeacherForcing => input.clone().narrow(1, t, 1).squeeze(1),
                    FeedMode::FreeRunning => binarize(prev_keyboard, threshold),
                };
            }

            let (next_keyboard, next_state) = self.cell.step(prev_keyboard, state)?;
            state = next_state;
            outputs.push(next_keyboard.clone());
            prev_keyboard = next_keyboard;
        }

        let output: Tensor<B, 3> = Tensor::stack(outputs, 1);
        Ok((output, state))
    }

    /// Free-running generation from a single primer frame
    ///
    /// Returns the `steps` predicted frames, `[batch, steps, NB_NOTES]`.
    pub fn generate(&mut self, primer: Tensor<B, 2>, steps: usize) -> Result<Tensor<B, 3>> {
        check_frame(&primer)?;
        if steps == 0 {
            return Err(Error::EmptySequence("generate needs at least one step"));
        }

        let device = primer.device();
        self.cell.ensure_built(&device);

        let threshold = self.cell.config().note_threshold;
        let mut state = self.cell.init_state(primer.dims()[0], &device)?;
        let mut prev_keyboard = primer;
        let mut outputs: Vec<Tensor<B, 2>> = Vec::with_capacity(steps);

        for _ in 0..steps {
            let (next_keyboard, next_state) = self.cell.step(prev_keyboard, state)?;
            state = next_state;
            prev_keyboard = binarize(next_keyboard.clone(), threshold);
            outputs.push(next_keyboard);
        }

        tracing::debug!(steps, "generated keyboard sequence");
        Ok(Tensor::stack(outputs, 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KeyboardCellConfig;
    use crate::keyboard_cell::CellPhase;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    type TestBackend = NdArray<f32>;

    fn config(encoder: &str, decoder: &str) -> KeyboardCellConfig {
        KeyboardCellConfig::new()
            .with_encoder(encoder.to_string())
            .with_decoder(decoder.to_string())
            .with_hidden_size(16)
            .with_num_layers(1)
    }

    fn rnn(encoder: &str, decoder: &str) -> KeyboardRnn<TestBackend> {
        KeyboardRnn::new(KeyboardCell::new(&config(encoder, decoder)).unwrap())
    }

    fn max_abs_diff<const D: usize>(a: Tensor<TestBackend, D>, b: Tensor<TestBackend, D>) -> f32 {
        (a - b).abs().max().into_scalar()
    }

    #[test]
    fn test_forward_builds_cell() {
        let device = Default::default();
        let mut layer = rnn("rnn", "lstm");
        assert_eq!(layer.cell().phase(), CellPhase::Unbuilt);

        let input = Tensor::<TestBackend, 3>::zeros([4, 6, NB_NOTES], &device);
        let (output, state) = layer.forward(input, None).unwrap();

        assert_eq!(layer.cell().phase(), CellPhase::Built);
        assert_eq!(output.dims(), [4, 6, NB_NOTES]);
        assert_eq!(state.encoder.size(), layer.cell().state_size().encoder);
    }

    #[test]
    fn test_free_running() {
        let device = Default::default();
        let mut layer = rnn("identity", "perceptron").with_feed(FeedMode::FreeRunning);
        assert_eq!(layer.feed(), FeedMode::FreeRunning);

        let input = Tensor::<TestBackend, 3>::random(
            [2, 5, NB_NOTES],
            Distribution::Uniform(0.0, 1.0),
            &device,
        );
        let (output, _) = layer.forward(input, None).unwrap();

        assert_eq!(output.dims(), [2, 5, NB_NOTES]);
    }

    #[test]
    fn test_feed_from_config() {
        let config = config("identity", "perceptron").with_feed(FeedMode::FreeRunning);
        let layer = KeyboardRnn::<TestBackend>::new(KeyboardCell::new(&config).unwrap());
        assert_eq!(layer.feed(), FeedMode::FreeRunning);

        let layer = layer.with_feed(FeedMode::TeacherForcing);
        assert_eq!(layer.feed(), FeedMode::TeacherForcing);
    }

    #[test]
    fn test_teacher_forcing_reads_every_frame() {
        let device = Default::default();
        let mut layer = rnn("rnn", "lstm");
        assert_eq!(layer.feed(), FeedMode::TeacherForcing);

        let first = Tensor::<TestBackend, 3>::random(
            [1, 1, NB_NOTES],
            Distribution::Uniform(0.0, 1.0),
            &device,
        );
        let rest_a = Tensor::<TestBackend, 3>::zeros([1, 3, NB_NOTES], &device);
        let rest_b = Tensor::<TestBackend, 3>::ones([1, 3, NB_NOTES], &device);
        let input_a = Tensor::cat(vec![first.clone(), rest_a], 1);
        let input_b = Tensor::cat(vec![first, rest_b], 1);

        let (out_a, _) = layer.forward(input_a, None).unwrap();
        let (out_b, _) = layer.forward(input_b, None).unwrap();

        // Prediction 0 only sees frame 0; every later prediction sees its own frame
        let head_a = out_a.clone().narrow(1, 0, 1);
        let head_b = out_b.clone().narrow(1, 0, 1);
        assert!(max_abs_diff(head_a, head_b) < 1e-6);
        for t in 1..4 {
            let step_a = out_a.clone().narrow(1, t, 1);
            let step_b = out_b.clone().narrow(1, t, 1);
            assert!(max_abs_diff(step_a, step_b) > 0.0, "step {t} ignored its input frame");
        }
    }

    #[test]
    fn test_free_running_ignores_later_frames() {
        let device = Default::default();
        let mut layer = rnn("rnn", "lstm").with_feed(FeedMode::FreeRunning);

        let first = Tensor::<TestBackend, 3>::random(
            [1, 1, NB_NOTES],
            Distribution::Uniform(0.0, 1.0),
            &device,
        );
        let rest_a = Tensor::<TestBackend, 3>::zeros([1, 3, NB_NOTES], &device);
        let rest_b = Tensor::<TestBackend, 3>::ones([1, 3, NB_NOTES], &device);
        let input_a = Tensor::cat(vec![first.clone(), rest_a], 1);
        let input_b = Tensor::cat(vec![first, rest_b], 1);

        let (out_a, _) = layer.forward(input_a, None).unwrap();
        let (out_b, _) = layer.forward(input_b, None).unwrap();

        let diff = (out_a - out_b).abs().max().into_scalar();
        assert!(diff < 1e-6, "free-running output depends only on frame 0");
    }

    #[test]
    fn test_continue_state() {
        let device = Default::default();
        let mut layer = rnn("rnn", "lstm");

        let input = Tensor::<TestBackend, 3>::random(
            [2, 4, NB_NOTES],
            Distribution::Uniform(0.0, 1.0),
            &device,
        );
        let (_, state) = layer.forward(input.clone(), None).unwrap();
        let (fresh, _) = layer.forward(input.clone(), None).unwrap();
        let (continued, _) = layer.forward(input, Some(state)).unwrap();

        let diff = (fresh - continued).abs().max().into_scalar();
        assert!(diff > 0.0, "carried state should change the predictions");
    }

    #[test]
    fn test_generate() {
        let device = Default::default();
        let mut layer = rnn("rnn", "perceptron");

        let primer = Tensor::<TestBackend, 2>::random(
            [3, NB_NOTES],
            Distribution::Bernoulli(0.2),
            &device,
        );
        let output = layer.generate(primer.clone(), 8).unwrap();
        assert_eq!(output.dims(), [3, 8, NB_NOTES]);

        // Same result as stepping the cell by hand on binarized predictions
        let cell = layer.cell();
        let threshold = cell.config().note_threshold;
        let mut state = cell.init_state(3, &device).unwrap();
        let mut prev_keyboard = primer;
        for t in 0..8 {
            let (next_keyboard, next_state) = cell.step(prev_keyboard, state).unwrap();
            state = next_state;

            let generated: Tensor<TestBackend, 2> = output.clone().narrow(1, t, 1).squeeze(1);
            assert!(max_abs_diff(generated, next_keyboard.clone()) < 1e-6, "step {t}");
            prev_keyboard = binarize(next_keyboard, threshold);
        }
    }

    #[test]
    fn test_rejects_bad_input() {
        let device = Default::default();
        let mut layer = rnn("identity", "lstm");

        let wrong_width = Tensor::<TestBackend, 3>::zeros([2, 4, 12], &device);
        assert!(matches!(layer.forward(wrong_width, None), Err(Error::FrameShape { .. })));

        let empty = Tensor::<TestBackend, 3>::zeros([2, 0, NB_NOTES], &device);
        assert!(matches!(layer.forward(empty, None), Err(Error::EmptySequence(_))));

        let primer = Tensor::<TestBackend, 2>::zeros([2, NB_NOTES], &device);
        assert!(matches!(layer.generate(primer, 0), Err(Error::EmptySequence(_))));
    }
}
