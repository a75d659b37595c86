//! # Building blocks
//!
//! Parameterised layers shared by the encoder and decoder networks in
//! [`crate::modules`].
//!
//! | Block | Description |
//! |-------|-------------|
//! | [`LstmCell`] | Basic LSTM cell, forget bias 1.0 |
//! | [`LstmStack`] | Stacked [`LstmCell`]s, one state per layer |
//! | [`Perceptron`] | Affine layer + activation |
//!
//! All blocks process one timestep of `[batch, features]` tensors.

pub mod lstm_cell;
pub mod perceptron;

pub use lstm_cell::{LstmCell, LstmStack, LstmState};
pub use perceptron::{Perceptron, PerceptronActivation};
