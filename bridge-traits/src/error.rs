use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    /// The platform object was called in a state that forbids the call, e.g.
    /// after the host tore the native decoder down behind our back.
    #[error("Illegal decoder state: {0}")]
    IllegalState(String),

    #[error("Unsupported media: {0}")]
    Unsupported(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Returns `true` if the platform object can no longer be trusted.
    pub fn is_illegal_state(&self) -> bool {
        matches!(self, BridgeError::IllegalState(_))
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
