//! # Sequence layers
//!
//! [`KeyboardRnn`] owns a [`KeyboardCell`](crate::KeyboardCell), builds it
//! before the first timestep and then unrolls it over a piano roll.
//!
//! ## Tensor Shapes
//!
//! | Tensor | Shape |
//! |--------|-------|
//! | `input` | `[batch, seq_len, NB_NOTES]` |
//! | `output` | `[batch, seq_len, NB_NOTES]` |
//! | `primer` (generation) | `[batch, NB_NOTES]` |
//!
//! Output `t` is the prediction for the frame following input `t`.
//!
//! ## Feed Modes
//!
//! - [`FeedMode::TeacherForcing`]: the cell reads the ground-truth frame at
//!   every step (training).
//! - [`FeedMode::FreeRunning`]: the cell reads the first ground-truth frame,
//!   then its own binarized predictions (sampling).
//!
//! ```ignore
//! let config = KeyboardCellConfig::new().with_encoder("rnn".to_string());
//! let mut rnn = KeyboardRnn::<Backend>::new(KeyboardCell::new(&config)?);
//!
//! let (predictions, state) = rnn.forward(piano_roll, None)?;
//! let (more, _) = rnn.forward(next_chunk, Some(state))?;
//! ```

pub mod keyboard_rnn;

pub use keyboard_rnn::{FeedMode, KeyboardRnn};
