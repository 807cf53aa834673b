use std::collections::HashSet;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::TrustRegistryError;
use crate::trust_set::TrustSet;

/// Membership store over trusted issuer DIDs.
///
/// Reads come from a cached set and never do I/O. `refresh` repopulates the
/// cache from the backend's source and leaves it untouched on failure.
/// Read-only backends ignore writes and return `false`.
#[async_trait]
pub trait TrustRegistry: Send + Sync {
    /// Backend name used in logs and refresh reports.
    fn name(&self) -> &str;

    fn is_writable(&self) -> bool {
        false
    }

    /// Returns true if the backend accepted the write.
    fn add_trusted_issuer(&self, did: &str) -> bool;

    /// Returns true if the backend accepted the write.
    fn remove_trusted_issuer(&self, did: &str) -> bool;

    fn is_trusted(&self, did: &str) -> bool;

    /// Distinct trusted DIDs, sorted.
    fn all_trusted(&self) -> Vec<String>;

    async fn refresh(&self) -> Result<(), TrustRegistryError>;
}

/// A remote authoritative list of trusted issuers.
#[async_trait]
pub trait TrustSource: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch the complete current list.
    async fn fetch(&self) -> Result<HashSet<String>, TrustRegistryError>;
}

/// Read-only [`TrustRegistry`] caching a [`TrustSource`].
pub struct SourceTrustRegistry<S> {
    source: S,
    cache: TrustSet,
}

impl<S: TrustSource> SourceTrustRegistry<S> {
    /// Starts empty until the first refresh.
    pub fn new(source: S) -> Self {
        Self {
            source,
            cache: TrustSet::new(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

#[async_trait]
impl<S: TrustSource> TrustRegistry for SourceTrustRegistry<S> {
    fn name(&self) -> &str {
        self.source.name()
    }

    fn add_trusted_issuer(&self, did: &str) -> bool {
        tracing::debug!(backend = self.name(), did = did, "ignoring write to read-only trust backend");
        false
    }

    fn remove_trusted_issuer(&self, did: &str) -> bool {
        tracing::debug!(backend = self.name(), did = did, "ignoring write to read-only trust backend");
        false
    }

    fn is_trusted(&self, did: &str) -> bool {
        self.cache.contains(did)
    }

    fn all_trusted(&self) -> Vec<String> {
        self.cache.to_sorted_vec()
    }

    async fn refresh(&self) -> Result<(), TrustRegistryError> {
        let issuers = self.source.fetch().await?;
        tracing::debug!(backend = self.name(), count = issuers.len(), "trust backend refreshed");
        self.cache.replace(issuers);
        Ok(())
    }
}

/// Collect DID strings from a JSON array, skipping blank entries.
///
/// Entries may be strings or objects carrying a `did` or `id` string.
pub(crate) fn collect_dids(
    backend: &str,
    value: &Value,
) -> Result<HashSet<String>, TrustRegistryError> {
    let items = value.as_array().ok_or_else(|| TrustRegistryError::Decode {
        backend: backend.to_string(),
        reason: "expected a JSON array of issuers".into(),
    })?;

    let mut issuers = HashSet::new();
    for item in items {
        let did = match item {
            Value::String(s) => Some(s.as_str()),
            Value::Object(map) => map
                .get("did")
                .or_else(|| map.get("id"))
                .and_then(Value::as_str),
            _ => None,
        };
        match did.map(str::trim) {
            Some(did) if !did.is_empty() => {
                issuers.insert(did.to_string());
            }
            _ => tracing::debug!(backend = backend, entry = %item, "skipping issuer entry"),
        }
    }
    Ok(issuers)
}
