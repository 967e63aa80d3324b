//! Errors raised while configuring the runtime layer.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A configuration value was rejected, or logging could not be set up.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required host capability was not provided.
    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
