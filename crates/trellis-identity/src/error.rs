use trellis_core::CoreError;

/// DID resolution and DID method errors.
#[derive(Debug, thiserror::Error)]
pub enum DidResolutionError {
    #[error("invalid DID: {0}")]
    InvalidDid(String),

    #[error("invalid DID URL: {0}")]
    InvalidDidUrl(String),

    #[error("DID not found: {0}")]
    NotFound(String),

    #[error("DID method not supported: {0}")]
    MethodNotSupported(String),

    #[error("network error resolving {did}: {reason}")]
    Network { did: String, reason: String },

    #[error("invalid DID document for {did}: {reason}")]
    InvalidDocument { did: String, reason: String },

    #[error("resolved document id {actual} does not match {expected}")]
    DocumentIdMismatch { expected: String, actual: String },

    #[error("invalid options for did:{method}: {reason}")]
    InvalidOptions { method: String, reason: String },

    #[error("DID method {method} does not support {operation}")]
    OperationNotSupported { method: String, operation: String },
}

impl From<CoreError> for DidResolutionError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidDidUrl(msg) => Self::InvalidDidUrl(msg),
            other => Self::InvalidDid(other.to_string()),
        }
    }
}
