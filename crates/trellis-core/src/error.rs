/// Core model errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid DID format: {0}")]
    InvalidDid(String),

    #[error("invalid DID URL: {0}")]
    InvalidDidUrl(String),

    #[error("malformed credential: {0}")]
    MalformedCredential(String),

    #[error("malformed proof: {0}")]
    MalformedProof(String),

    #[error("unsupported proof type: {0}")]
    UnsupportedProofType(String),

    #[error("unsupported verification method type: {0}")]
    UnsupportedKeyType(String),

    #[error("invalid DID document: {0}")]
    InvalidDocument(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("tracing initialisation failed: {0}")]
    Telemetry(String),
}
