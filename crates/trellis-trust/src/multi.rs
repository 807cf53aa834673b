use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;

use crate::error::TrustRegistryError;
use crate::registry::TrustRegistry;

/// Outcome of refreshing every backend of a [`MultiSourceTrustRegistry`].
#[derive(Debug, Default)]
pub struct RefreshReport {
    pub succeeded: Vec<String>,
    /// Backend name and error.
    pub failed: Vec<(String, TrustRegistryError)>,
}

impl RefreshReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Aggregates several trust backends.
///
/// An issuer is trusted when any backend trusts it. Writes go to every
/// writable backend. A failing backend never stops the others from
/// refreshing.
#[derive(Default)]
pub struct MultiSourceTrustRegistry {
    backends: Vec<Arc<dyn TrustRegistry>>,
}

impl MultiSourceTrustRegistry {
    pub fn new(backends: Vec<Arc<dyn TrustRegistry>>) -> Self {
        Self { backends }
    }

    pub fn add_backend(&mut self, backend: Arc<dyn TrustRegistry>) {
        self.backends.push(backend);
    }

    pub fn backend_count(&self) -> usize {
        self.backends.len()
    }

    pub fn backends(&self) -> &[Arc<dyn TrustRegistry>] {
        &self.backends
    }

    /// Refresh all backends concurrently and report each outcome.
    pub async fn refresh_all(&self) -> RefreshReport {
        let results = join_all(self.backends.iter().map(|backend| async move {
            (backend.name().to_string(), backend.refresh().await)
        }))
        .await;

        let mut report = RefreshReport::default();
        for (name, result) in results {
            match result {
                Ok(()) => report.succeeded.push(name),
                Err(e) => {
                    tracing::warn!(backend = %name, error = %e, "trust backend refresh failed, keeping cached issuers");
                    report.failed.push((name, e));
                }
            }
        }
        report
    }
}

#[async_trait]
impl TrustRegistry for MultiSourceTrustRegistry {
    fn name(&self) -> &str {
        "multi"
    }

    fn is_writable(&self) -> bool {
        self.backends.iter().any(|b| b.is_writable())
    }

    fn add_trusted_issuer(&self, did: &str) -> bool {
        self.backends
            .iter()
            .filter(|b| b.is_writable())
            .fold(false, |accepted, b| b.add_trusted_issuer(did) || accepted)
    }

    fn remove_trusted_issuer(&self, did: &str) -> bool {
        self.backends
            .iter()
            .filter(|b| b.is_writable())
            .fold(false, |accepted, b| b.remove_trusted_issuer(did) || accepted)
    }

    fn is_trusted(&self, did: &str) -> bool {
        self.backends.iter().any(|b| b.is_trusted(did))
    }

    fn all_trusted(&self) -> Vec<String> {
        let union: BTreeSet<String> = self
            .backends
            .iter()
            .flat_map(|b| b.all_trusted())
            .collect();
        union.into_iter().collect()
    }

    async fn refresh(&self) -> Result<(), TrustRegistryError> {
        let report = self.refresh_all().await;
        if report.is_success() {
            return Ok(());
        }
        let (failed, reasons) = report
            .failed
            .into_iter()
            .map(|(name, e)| (name, e.to_string()))
            .unzip();
        Err(TrustRegistryError::Refresh { failed, reasons })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::LocalTrustRegistry;
    use crate::registry::{SourceTrustRegistry, TrustSource};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Scripted {
        name: &'static str,
        issuers: Vec<&'static str>,
        fail: AtomicBool,
    }

    impl Scripted {
        fn new(name: &'static str, issuers: Vec<&'static str>) -> Self {
            Self {
                name,
                issuers,
                fail: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl TrustSource for Scripted {
        fn name(&self) -> &str {
            self.name
        }

        async fn fetch(&self) -> Result<HashSet<String>, TrustRegistryError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(TrustRegistryError::Transport {
                    backend: self.name.into(),
                    reason: "connection refused".into(),
                });
            }
            Ok(self.issuers.iter().map(|s| s.to_string()).collect())
        }
    }

    #[tokio::test]
    async fn test_union_and_or_membership() {
        let local: Arc<dyn TrustRegistry> =
            Arc::new(LocalTrustRegistry::with_issuers(["did:example:a", "did:example:b"]));
        let remote: Arc<dyn TrustRegistry> = Arc::new(SourceTrustRegistry::new(Scripted::new(
            "remote",
            vec!["did:example:b", "did:example:c"],
        )));
        let multi = MultiSourceTrustRegistry::new(vec![local, remote]);
        multi.refresh().await.unwrap();

        assert!(multi.is_trusted("did:example:a"));
        assert!(multi.is_trusted("did:example:c"));
        assert!(!multi.is_trusted("did:example:d"));
        assert_eq!(
            multi.all_trusted(),
            vec!["did:example:a", "did:example:b", "did:example:c"]
        );
    }

    #[tokio::test]
    async fn test_one_failure_does_not_block_others() {
        let bad = Arc::new(SourceTrustRegistry::new(Scripted::new("bad", vec!["did:example:x"])));
        let good = Arc::new(SourceTrustRegistry::new(Scripted::new("good", vec!["did:example:y"])));
        let multi = MultiSourceTrustRegistry::new(vec![bad.clone(), good.clone()]);

        multi.refresh().await.unwrap();
        bad.source().fail.store(true, Ordering::SeqCst);

        let report = multi.refresh_all().await;
        assert_eq!(report.succeeded, vec!["good"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "bad");
        // Stale data from the failed backend is still served.
        assert!(multi.is_trusted("did:example:x"));
        assert!(multi.is_trusted("did:example:y"));

        let err = multi.refresh().await.unwrap_err();
        assert!(matches!(err, TrustRegistryError::Refresh { ref failed, .. } if failed == &["bad"]));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_writes_fan_out_to_writable_backends() {
        let first = Arc::new(LocalTrustRegistry::new());
        let second = Arc::new(LocalTrustRegistry::new());
        let remote = Arc::new(SourceTrustRegistry::new(Scripted::new("remote", vec![])));
        let multi = MultiSourceTrustRegistry::new(vec![first.clone(), second.clone(), remote.clone()]);

        assert!(multi.add_trusted_issuer("did:example:new"));
        assert!(first.is_trusted("did:example:new"));
        assert!(second.is_trusted("did:example:new"));
        assert!(!remote.is_trusted("did:example:new"));

        assert!(multi.remove_trusted_issuer("did:example:new"));
        assert!(!multi.is_trusted("did:example:new"));
    }

    #[test]
    fn test_read_only_aggregate_rejects_writes() {
        let remote = Arc::new(SourceTrustRegistry::new(Scripted::new("remote", vec![])));
        let multi = MultiSourceTrustRegistry::new(vec![remote]);
        assert!(!multi.is_writable());
        assert!(!multi.add_trusted_issuer("did:example:new"));
    }
}
