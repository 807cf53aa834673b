/// Key decoding and proof verification errors.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("verification method {0} carries no supported key material")]
    UnsupportedKeyMaterial(String),

    #[error("unsupported verification method type: {0}")]
    UnsupportedKeyType(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("unsupported proof algorithm: {0}")]
    UnsupportedAlgorithm(String),
}
