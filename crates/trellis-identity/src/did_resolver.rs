use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use trellis_core::{Did, DidDocument};

use crate::error::DidResolutionError;
use crate::registry::DidMethodRegistry;

/// Trait for resolving DIDs to their documents.
#[async_trait]
pub trait DidResolver: Send + Sync {
    /// Resolve a DID URI to its DID Document.
    async fn resolve(&self, did: &str) -> Result<DidDocument, DidResolutionError>;
}

#[async_trait]
impl<T: DidResolver + ?Sized> DidResolver for Arc<T> {
    async fn resolve(&self, did: &str) -> Result<DidDocument, DidResolutionError> {
        (**self).resolve(did).await
    }
}

/// Resolves DIDs from documents held in memory.
#[derive(Default)]
pub struct StaticDidResolver {
    documents: DashMap<String, DidDocument>,
}

impl StaticDidResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `document` under its own id, replacing any previous one.
    pub fn insert(&self, document: DidDocument) {
        self.documents.insert(document.id.clone(), document);
    }

    pub fn remove(&self, did: &str) -> Option<DidDocument> {
        self.documents.remove(did).map(|(_, doc)| doc)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl DidResolver for StaticDidResolver {
    async fn resolve(&self, did: &str) -> Result<DidDocument, DidResolutionError> {
        self.documents
            .get(did)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| DidResolutionError::NotFound(did.to_string()))
    }
}

/// Resolves DIDs through the method registered for their method name.
///
/// The resolved document's `id` must equal the requested DID.
#[derive(Clone)]
pub struct RegistryDidResolver {
    registry: Arc<DidMethodRegistry>,
}

impl RegistryDidResolver {
    pub fn new(registry: Arc<DidMethodRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<DidMethodRegistry> {
        &self.registry
    }
}

#[async_trait]
impl DidResolver for RegistryDidResolver {
    async fn resolve(&self, did: &str) -> Result<DidDocument, DidResolutionError> {
        let parsed = Did::new(did)?;
        let method = self
            .registry
            .get(parsed.method())
            .ok_or_else(|| DidResolutionError::MethodNotSupported(parsed.method().to_string()))?;

        let document = method.resolve(&parsed).await?;
        if document.id != parsed.as_str() {
            return Err(DidResolutionError::DocumentIdMismatch {
                expected: parsed.to_string(),
                actual: document.id,
            });
        }

        tracing::debug!(did = did, method = parsed.method(), "DID resolved");
        Ok(document)
    }
}

/// Composite resolver that tries multiple resolvers in order.
///
/// Returns the first successful resolution, or the last error.
pub struct CompositeDidResolver {
    resolvers: Vec<Box<dyn DidResolver>>,
}

impl CompositeDidResolver {
    /// Create a new composite resolver with no backends.
    pub fn new() -> Self {
        Self {
            resolvers: Vec::new(),
        }
    }

    /// Add a resolver to the chain.
    pub fn add_resolver(&mut self, resolver: Box<dyn DidResolver>) {
        self.resolvers.push(resolver);
    }

    /// Number of registered resolvers.
    pub fn resolver_count(&self) -> usize {
        self.resolvers.len()
    }
}

impl Default for CompositeDidResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DidResolver for CompositeDidResolver {
    async fn resolve(&self, did: &str) -> Result<DidDocument, DidResolutionError> {
        let mut last_error = DidResolutionError::NotFound(format!("{did} (no resolvers configured)"));

        for resolver in &self.resolvers {
            match resolver.resolve(did).await {
                Ok(doc) => return Ok(doc),
                Err(e) => {
                    tracing::debug!(did = did, error = %e, "resolver failed, trying next");
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}
