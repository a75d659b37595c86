//! Error types for the keyboard cell and its sub-networks.

use crate::modules::ModuleKind;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A registry has no module registered under the configured name.
    #[error("unknown {kind} module '{name}' (available: {available})")]
    UnknownModule {
        kind: ModuleKind,
        name: String,
        available: String,
    },

    /// A sub-network was stepped or asked for state before `build`.
    #[error("{module}: used before build")]
    NotBuilt { module: &'static str },

    /// The recurrent state handed to a sub-network has the wrong layout.
    #[error("{module}: expected {expected} state, got {found}")]
    StateMismatch {
        module: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    /// An LSTM state carries a different number of layers than the network.
    #[error("{module}: expected {expected} lstm layer(s), got {found}")]
    LayerCount {
        module: &'static str,
        expected: usize,
        found: usize,
    },

    /// A sequence operation was asked for zero timesteps.
    #[error("empty sequence: {0}")]
    EmptySequence(&'static str),

    /// A keyboard frame does not have `NB_NOTES` keys on its last dimension.
    #[error("keyboard frame: expected [batch, {expected}], got {found:?}")]
    FrameShape { expected: usize, found: Vec<usize> },

    /// Invalid configuration.
    #[error("config: {0}")]
    Config(String),
}
