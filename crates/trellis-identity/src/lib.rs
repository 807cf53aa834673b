//! Trellis Identity — DID resolution, the DID method registry, built-in
//! `did:key` / `did:peer` / `did:web` methods, DID URL dereferencing and the `DidService`
//! facade.

pub mod dereference;
pub mod did_resolver;
pub mod error;
pub mod method;
pub mod methods;
pub mod registry;
pub mod service;

use std::sync::Arc;

use trellis_core::ResolverConfig;

pub use dereference::{DidDereferencer, Dereferenced};
pub use did_resolver::{CompositeDidResolver, DidResolver, RegistryDidResolver, StaticDidResolver};
pub use error::DidResolutionError;
pub use method::DidMethod;
pub use methods::{did_key_for, did_peer_for, DidKeyMethod, DidPeerMethod, DidWebMethod};
pub use registry::DidMethodRegistry;
pub use service::DidService;

/// Build a registry holding the built-in methods named in `config`.
pub fn registry_from_config(config: &ResolverConfig) -> Result<DidMethodRegistry, DidResolutionError> {
    let registry = DidMethodRegistry::new();
    for name in &config.enabled_methods {
        match name.as_str() {
            "key" => registry.register(Arc::new(DidKeyMethod::new())),
            "peer" => registry.register(Arc::new(DidPeerMethod::new())),
            "web" => registry.register(Arc::new(DidWebMethod::from_config(&config.web)?)),
            other => return Err(DidResolutionError::MethodNotSupported(other.to_string())),
        }
    }
    Ok(registry)
}
