//! DID URL dereferencing.

use std::sync::Arc;

use serde_json::Value;
use trellis_core::{DidDocument, DidUrl, Service, VerificationMethod};
use url::Url;

use crate::did_resolver::DidResolver;
use crate::error::DidResolutionError;

/// The resource a DID URL points at.
#[derive(Debug, Clone, PartialEq)]
pub enum Dereferenced {
    /// Plain DID: the whole document.
    Document(DidDocument),
    /// `#fragment` naming a verification method.
    VerificationMethod(VerificationMethod),
    /// `#fragment` naming a service.
    Service(Service),
    /// `?service=<id>[&relativeRef=<ref>]`: the selected endpoint URL.
    ServiceEndpoint(String),
}

/// Dereferences DID URLs against documents from a [`DidResolver`].
#[derive(Clone)]
pub struct DidDereferencer {
    resolver: Arc<dyn DidResolver>,
}

impl DidDereferencer {
    pub fn new(resolver: Arc<dyn DidResolver>) -> Self {
        Self { resolver }
    }

    pub async fn dereference(&self, did_url: &str) -> Result<Dereferenced, DidResolutionError> {
        let parsed = DidUrl::parse(did_url)?;
        let document = self.resolver.resolve(parsed.did().as_str()).await?;
        let not_found = || DidResolutionError::NotFound(did_url.to_string());

        if let Some(service_id) = parsed.query_param("service") {
            let service = document
                .find_service(&format!("#{service_id}"))
                .ok_or_else(not_found)?;
            let endpoint = primary_endpoint(&service.service_endpoint).ok_or_else(not_found)?;
            return match parsed.query_param("relativeRef") {
                Some(relative) => {
                    let relative = relative.replace("%2F", "/").replace("%2f", "/");
                    Url::parse(endpoint)
                        .and_then(|base| base.join(&relative))
                        .map(|joined| Dereferenced::ServiceEndpoint(joined.into()))
                        .map_err(|e| {
                            DidResolutionError::InvalidDidUrl(format!("{did_url}: {e}"))
                        })
                }
                None => Ok(Dereferenced::ServiceEndpoint(endpoint.to_string())),
            };
        }

        if let Some(fragment) = parsed.fragment() {
            let reference = format!("#{fragment}");
            if let Some(vm) = document.find_verification_method(&reference) {
                return Ok(Dereferenced::VerificationMethod(vm.clone()));
            }
            if let Some(service) = document.find_service(&reference) {
                return Ok(Dereferenced::Service(service.clone()));
            }
            tracing::debug!(did_url = did_url, "fragment not present in DID document");
            return Err(not_found());
        }

        if parsed.path().is_some() {
            return Err(DidResolutionError::OperationNotSupported {
                method: parsed.did().method().to_string(),
                operation: "path dereferencing".into(),
            });
        }

        Ok(Dereferenced::Document(document))
    }
}

/// First URL of a `serviceEndpoint` (string, array of strings, or map).
fn primary_endpoint(endpoint: &Value) -> Option<&str> {
    match endpoint {
        Value::String(url) => Some(url),
        Value::Array(items) => items.iter().find_map(Value::as_str),
        Value::Object(map) => map.values().find_map(Value::as_str),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::did_resolver::StaticDidResolver;
    use serde_json::json;
    use trellis_core::KeyMaterial;

    fn dereferencer() -> DidDereferencer {
        let mut doc = DidDocument::new("did:example:alice").with_verification_method(
            VerificationMethod::new(
                "#key-1",
                "Ed25519VerificationKey2020",
                "did:example:alice",
                Some(KeyMaterial::Multibase("z6Mk".into())),
            ),
        );
        doc.services.push(Service {
            id: "did:example:alice#hub".into(),
            service_type: json!("LinkedDomains"),
            service_endpoint: json!("https://hub.example.com/api/"),
        });
        let resolver = StaticDidResolver::new();
        resolver.insert(doc);
        DidDereferencer::new(Arc::new(resolver))
    }

    #[tokio::test]
    async fn test_dereference_document() {
        let result = dereferencer().dereference("did:example:alice").await.unwrap();
        assert!(matches!(result, Dereferenced::Document(doc) if doc.id == "did:example:alice"));
    }

    #[tokio::test]
    async fn test_dereference_verification_method() {
        let result = dereferencer()
            .dereference("did:example:alice#key-1")
            .await
            .unwrap();
        match result {
            Dereferenced::VerificationMethod(vm) => assert_eq!(vm.id, "#key-1"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_dereference_service_fragment() {
        let result = dereferencer()
            .dereference("did:example:alice#hub")
            .await
            .unwrap();
        assert!(matches!(result, Dereferenced::Service(s) if s.id.ends_with("#hub")));
    }

    #[tokio::test]
    async fn test_dereference_service_query() {
        let d = dereferencer();
        let plain = d.dereference("did:example:alice?service=hub").await.unwrap();
        assert_eq!(
            plain,
            Dereferenced::ServiceEndpoint("https://hub.example.com/api/".into())
        );

        let relative = d
            .dereference("did:example:alice?service=hub&relativeRef=%2Fitems%2F1")
            .await
            .unwrap();
        assert_eq!(
            relative,
            Dereferenced::ServiceEndpoint("https://hub.example.com/items/1".into())
        );
    }

    #[tokio::test]
    async fn test_dereference_missing_fragment() {
        let result = dereferencer().dereference("did:example:alice#nope").await;
        assert!(matches!(result, Err(DidResolutionError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_dereference_invalid_url() {
        let result = dereferencer().dereference("not a did url").await;
        assert!(matches!(result, Err(DidResolutionError::InvalidDidUrl(_))));
    }

    #[tokio::test]
    async fn test_dereference_unresolvable_did() {
        let result = dereferencer().dereference("did:example:bob#key-1").await;
        assert!(matches!(result, Err(DidResolutionError::NotFound(_))));
    }
}
