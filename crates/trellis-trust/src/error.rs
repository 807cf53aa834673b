/// Trust registry errors.
#[derive(Debug, thiserror::Error)]
pub enum TrustRegistryError {
    #[error("{backend}: request failed: {reason}")]
    Transport { backend: String, reason: String },

    #[error("{backend}: endpoint returned status {status}")]
    Status { backend: String, status: u16 },

    #[error("{backend}: could not decode response: {reason}")]
    Decode { backend: String, reason: String },

    #[error("dns lookup for {record} failed: {reason}")]
    Dns { record: String, reason: String },

    #[error("chain call {function} failed: {reason}")]
    Chain { function: String, reason: String },

    #[error("invalid trust source configuration: {0}")]
    Config(String),

    #[error("refresh failed for {}: {}", .failed.join(", "), .reasons.join("; "))]
    Refresh {
        failed: Vec<String>,
        reasons: Vec<String>,
    },

    #[error("issuer {0} is not trusted")]
    Untrusted(String),
}
