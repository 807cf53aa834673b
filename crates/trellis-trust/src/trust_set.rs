use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;

/// Snapshot-swapped set of trusted issuer DIDs.
///
/// Readers clone an `Arc` of the current set and never wait on a refresh.
/// Every mutation builds a new set and swaps it in whole, so no reader sees
/// a partially filled set.
#[derive(Debug, Default)]
pub struct TrustSet {
    current: RwLock<Arc<HashSet<String>>>,
}

impl TrustSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_issuers<I, S>(issuers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: HashSet<String> = issuers.into_iter().map(Into::into).collect();
        Self {
            current: RwLock::new(Arc::new(set)),
        }
    }

    /// The current set. Later mutations do not affect the returned snapshot.
    pub fn snapshot(&self) -> Arc<HashSet<String>> {
        self.current.read().clone()
    }

    pub fn contains(&self, did: &str) -> bool {
        self.current.read().contains(did)
    }

    /// Returns true if `did` was not already present.
    pub fn insert(&self, did: &str) -> bool {
        let mut guard = self.current.write();
        if guard.contains(did) {
            return false;
        }
        let mut next = HashSet::clone(&guard);
        next.insert(did.to_string());
        *guard = Arc::new(next);
        true
    }

    /// Returns true if `did` was present.
    pub fn remove(&self, did: &str) -> bool {
        let mut guard = self.current.write();
        if !guard.contains(did) {
            return false;
        }
        let mut next = HashSet::clone(&guard);
        next.remove(did);
        *guard = Arc::new(next);
        true
    }

    /// Replace the whole set.
    pub fn replace(&self, issuers: HashSet<String>) {
        *self.current.write() = Arc::new(issuers);
    }

    pub fn len(&self) -> usize {
        self.current.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.read().is_empty()
    }

    /// Members in sorted order.
    pub fn to_sorted_vec(&self) -> Vec<String> {
        let mut all: Vec<String> = self.snapshot().iter().cloned().collect();
        all.sort();
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_remove_idempotent() {
        let set = TrustSet::new();
        assert!(set.insert("did:example:a"));
        assert!(!set.insert("did:example:a"));
        assert_eq!(set.len(), 1);
        assert!(set.remove("did:example:a"));
        assert!(!set.remove("did:example:a"));
        assert!(set.is_empty());
    }

    #[test]
    fn test_snapshot_unaffected_by_replace() {
        let set = TrustSet::with_issuers(["did:example:a"]);
        let before = set.snapshot();
        set.replace(HashSet::from(["did:example:b".to_string()]));
        assert!(before.contains("did:example:a"));
        assert!(!set.contains("did:example:a"));
        assert!(set.contains("did:example:b"));
    }

    #[test]
    fn test_sorted_vec() {
        let set = TrustSet::with_issuers(["did:example:c", "did:example:a", "did:example:b"]);
        assert_eq!(
            set.to_sorted_vec(),
            vec!["did:example:a", "did:example:b", "did:example:c"]
        );
    }
}
