use async_trait::async_trait;

use crate::error::TrustRegistryError;
use crate::registry::TrustRegistry;
use crate::trust_set::TrustSet;

/// In-process trust list seeded at construction. The only writable backend.
#[derive(Debug, Default)]
pub struct LocalTrustRegistry {
    issuers: TrustSet,
}

impl LocalTrustRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_issuers<I, S>(issuers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            issuers: TrustSet::with_issuers(issuers),
        }
    }
}

#[async_trait]
impl TrustRegistry for LocalTrustRegistry {
    fn name(&self) -> &str {
        "local"
    }

    fn is_writable(&self) -> bool {
        true
    }

    fn add_trusted_issuer(&self, did: &str) -> bool {
        if self.issuers.insert(did) {
            tracing::info!(did = did, "trusted issuer added");
        }
        true
    }

    fn remove_trusted_issuer(&self, did: &str) -> bool {
        if self.issuers.remove(did) {
            tracing::info!(did = did, "trusted issuer removed");
        }
        true
    }

    fn is_trusted(&self, did: &str) -> bool {
        self.issuers.contains(did)
    }

    fn all_trusted(&self) -> Vec<String> {
        self.issuers.to_sorted_vec()
    }

    async fn refresh(&self) -> Result<(), TrustRegistryError> {
        Ok(())
    }
}
