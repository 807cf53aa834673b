use std::sync::Arc;

use serde_json::Value;
use trellis_core::{Did, DidDocument};

use crate::dereference::{DidDereferencer, Dereferenced};
use crate::did_resolver::{DidResolver, RegistryDidResolver};
use crate::error::DidResolutionError;
use crate::method::DidMethod;
use crate::registry::DidMethodRegistry;

/// High-level DID operations over a method registry: resolve, dereference,
/// and the per-method create / update / deactivate lifecycle.
#[derive(Clone)]
pub struct DidService {
    registry: Arc<DidMethodRegistry>,
    resolver: Arc<dyn DidResolver>,
    dereferencer: DidDereferencer,
}

impl DidService {
    /// Resolve through the registry itself.
    pub fn new(registry: Arc<DidMethodRegistry>) -> Self {
        let resolver: Arc<dyn DidResolver> = Arc::new(RegistryDidResolver::new(registry.clone()));
        Self::with_resolver(registry, resolver)
    }

    /// Use `resolver` for reads (for example a [`crate::CompositeDidResolver`]
    /// with a cache in front), and `registry` for writes.
    pub fn with_resolver(registry: Arc<DidMethodRegistry>, resolver: Arc<dyn DidResolver>) -> Self {
        let dereferencer = DidDereferencer::new(resolver.clone());
        Self {
            registry,
            resolver,
            dereferencer,
        }
    }

    pub fn registry(&self) -> &Arc<DidMethodRegistry> {
        &self.registry
    }

    pub fn resolver(&self) -> Arc<dyn DidResolver> {
        self.resolver.clone()
    }

    pub async fn resolve(&self, did: &str) -> Result<DidDocument, DidResolutionError> {
        self.resolver.resolve(did).await
    }

    pub async fn dereference(&self, did_url: &str) -> Result<Dereferenced, DidResolutionError> {
        self.dereferencer.dereference(did_url).await
    }

    /// Create a DID with the named method.
    pub async fn create(
        &self,
        method: &str,
        options: &Value,
    ) -> Result<DidDocument, DidResolutionError> {
        let document = self.method(method)?.create(options).await?;
        tracing::info!(method = method, did = %document.id, "DID created");
        Ok(document)
    }

    pub async fn update(&self, did: &str, options: &Value) -> Result<DidDocument, DidResolutionError> {
        let did = Did::new(did)?;
        let document = self.method(did.method())?.update(&did, options).await?;
        tracing::info!(did = %did, "DID updated");
        Ok(document)
    }

    pub async fn deactivate(&self, did: &str, options: &Value) -> Result<(), DidResolutionError> {
        let did = Did::new(did)?;
        self.method(did.method())?.deactivate(&did, options).await?;
        tracing::info!(did = %did, "DID deactivated");
        Ok(())
    }

    /// Whether a method is registered for `did`'s method name.
    pub fn is_supported(&self, did: &str) -> bool {
        Did::new(did)
            .map(|d| self.registry.contains(d.method()))
            .unwrap_or(false)
    }

    pub fn supported_methods(&self) -> Vec<String> {
        self.registry.method_names()
    }

    fn method(&self, name: &str) -> Result<Arc<dyn DidMethod>, DidResolutionError> {
        self.registry
            .get(name)
            .ok_or_else(|| DidResolutionError::MethodNotSupported(name.to_string()))
    }
}
