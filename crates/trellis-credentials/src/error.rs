use serde::Serialize;
use trellis_canon::CanonicalizationError;
use trellis_core::CoreError;
use trellis_crypto::CryptoError;
use trellis_identity::DidResolutionError;

/// Broad failure category, for mapping onto transport status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad or missing proof, credential JSON or key encoding.
    InputMalformed,
    /// The signer's DID could not be resolved.
    ResolutionFailure,
    VerificationMethodNotFound,
    /// Proof suite and key type do not go together.
    TypeMismatch,
    UnsupportedAlgorithm,
    /// A configured proof policy refused the proof.
    PolicyRejected,
}

/// Proof validation errors.
///
/// A signature that does not verify is not an error; validation returns
/// `Ok(false)` for it.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("malformed proof: {0}")]
    MalformedProof(String),

    #[error("malformed credential: {0}")]
    MalformedCredential(String),

    #[error("verification method {0} not found")]
    VerificationMethodNotFound(String),

    #[error("proof type {proof_type} cannot be verified with key type {key_type}")]
    TypeMismatch { proof_type: String, key_type: String },

    #[error("unsupported proof type: {0}")]
    UnsupportedAlgorithm(String),

    #[error("proof rejected by policy: {0}")]
    PolicyRejected(String),

    #[error(transparent)]
    Resolution(#[from] DidResolutionError),

    #[error(transparent)]
    Canonicalization(#[from] CanonicalizationError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl ValidationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedProof(_) | Self::MalformedCredential(_) | Self::Canonicalization(_) => {
                ErrorKind::InputMalformed
            }
            Self::VerificationMethodNotFound(_) => ErrorKind::VerificationMethodNotFound,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::UnsupportedAlgorithm(_) => ErrorKind::UnsupportedAlgorithm,
            Self::PolicyRejected(_) => ErrorKind::PolicyRejected,
            Self::Resolution(_) => ErrorKind::ResolutionFailure,
            Self::Crypto(
                CryptoError::UnsupportedAlgorithm(_)
                | CryptoError::UnsupportedKeyType(_)
                | CryptoError::UnsupportedKeyMaterial(_),
            ) => ErrorKind::UnsupportedAlgorithm,
            Self::Crypto(CryptoError::InvalidKey(_) | CryptoError::InvalidKeyLength { .. }) => {
                ErrorKind::InputMalformed
            }
        }
    }
}

impl From<CoreError> for ValidationError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::MalformedProof(msg) => Self::MalformedProof(msg),
            CoreError::UnsupportedProofType(t) => Self::UnsupportedAlgorithm(t),
            CoreError::UnsupportedKeyType(t) => Self::Crypto(CryptoError::UnsupportedKeyType(t)),
            other => Self::MalformedCredential(other.to_string()),
        }
    }
}
