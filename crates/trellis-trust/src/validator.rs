use std::sync::Arc;

use crate::error::TrustRegistryError;
use crate::registry::TrustRegistry;

/// Trusted-or-error policy over a [`TrustRegistry`].
#[derive(Clone)]
pub struct TrustListValidator {
    registry: Arc<dyn TrustRegistry>,
}

impl TrustListValidator {
    pub fn new(registry: Arc<dyn TrustRegistry>) -> Self {
        Self { registry }
    }

    /// Fails with [`TrustRegistryError::Untrusted`] naming `did`.
    pub fn validate_issuer(&self, did: &str) -> Result<(), TrustRegistryError> {
        if self.registry.is_trusted(did) {
            return Ok(());
        }
        tracing::debug!(did = did, "issuer not in trust registry");
        Err(TrustRegistryError::Untrusted(did.to_string()))
    }

    pub fn is_trusted(&self, did: &str) -> bool {
        self.registry.is_trusted(did)
    }
}
