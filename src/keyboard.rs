//! Keyboard frames
//!
//! A keyboard frame is the piano-roll slice for one timestep: a
//! `[batch, NB_NOTES]` float tensor where each column is one key of an
//! 88-key piano, lowest key first. Values are either note-on probabilities
//! (decoder output) or binary activations (ground truth, fed-back
//! predictions).

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::error::{Error, Result};

/// Number of keys on the keyboard
pub const NB_NOTES: usize = 88;

/// MIDI pitch of the lowest key (A0)
pub const MIDI_LOWEST: u8 = 21;

/// MIDI pitch of the highest key (C8)
pub const MIDI_HIGHEST: u8 = MIDI_LOWEST + NB_NOTES as u8 - 1;

/// All-silent frame of shape `[batch, NB_NOTES]`.
pub fn empty<B: Backend>(batch_size: usize, device: &B::Device) -> Tensor<B, 2> {
    Tensor::zeros([batch_size, NB_NOTES], device)
}

/// Fails with [`Error::FrameShape`] unless `frame` is `[batch, NB_NOTES]`.
pub fn check_frame<B: Backend>(frame: &Tensor<B, 2>) -> Result<()> {
    let dims = frame.dims();
    if dims[1] != NB_NOTES {
        return Err(Error::FrameShape {
            expected: NB_NOTES,
            found: dims.to_vec(),
        });
    }
    Ok(())
}

/// 1.0 for every key strictly above `threshold`, 0.0 elsewhere.
pub fn binarize<B: Backend, const D: usize>(frame: Tensor<B, D>, threshold: f64) -> Tensor<B, D> {
    frame.greater_elem(threshold).float()
}

/// Keyboard column for a MIDI pitch, `None` if the pitch is off the keyboard.
pub fn note_to_key(midi: u8) -> Option<usize> {
    (MIDI_LOWEST..=MIDI_HIGHEST)
        .contains(&midi)
        .then(|| (midi - MIDI_LOWEST) as usize)
}

/// MIDI pitch for a keyboard column.
pub fn key_to_note(key: usize) -> Option<u8> {
    (key < NB_NOTES).then(|| MIDI_LOWEST + key as u8)
}
