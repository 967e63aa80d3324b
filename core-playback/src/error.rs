//! # Playback Error Types
//!
//! Errors raised inside the playback core. None of these cross the
//! [`Player`](crate::traits::Player) contract: the engine absorbs them and
//! reports the outcome through callbacks and the event bus.

use bridge_traits::BridgeError;
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Source Errors
    // ========================================================================
    /// Opening or preparing a data source failed.
    #[error("Failed to open {locator}: {message}")]
    OpenFailed { locator: String, message: String },

    // ========================================================================
    // Decoder State Errors
    // ========================================================================
    /// The decoder was used in a state that forbids the call; it can no
    /// longer be trusted.
    #[error("Illegal decoder state: {0}")]
    IllegalState(String),

    /// Attempted operation when no track is loaded.
    #[error("No track loaded")]
    NoTrackLoaded,

    /// Invalid volume value (must be in range [0.0, 1.0]).
    #[error("Invalid volume: {0} (must be between 0.0 and 1.0)")]
    InvalidVolume(f32),

    // ========================================================================
    // Setup Errors
    // ========================================================================
    /// Engine configuration rejected by validation.
    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),

    /// Host configuration rejected by the runtime layer.
    #[error(transparent)]
    Runtime(#[from] core_runtime::Error),

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// A platform bridge call failed.
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    /// Internal error (should not occur in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlaybackError {
    /// Returns `true` if the decoder behind this error must be treated as lost.
    pub fn is_illegal_state(&self) -> bool {
        match self {
            PlaybackError::IllegalState(_) => true,
            PlaybackError::Bridge(err) => err.is_illegal_state(),
            _ => false,
        }
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
