use std::sync::Arc;

use trellis_core::{TrustConfig, TrustSourceConfig};

use crate::chain::ChainTrustSource;
use crate::directory::DirectoryTrustSource;
use crate::dns::{DnsTrustSource, DohTxtLookup};
use crate::document_store::DocumentStoreTrustSource;
use crate::error::TrustRegistryError;
use crate::http::{build_client, HttpTrustSource};
use crate::local::LocalTrustRegistry;
use crate::multi::MultiSourceTrustRegistry;
use crate::registry::{SourceTrustRegistry, TrustRegistry};

/// Build the aggregate registry described by `config`, backends in order.
///
/// Remote backends start empty; call `refresh` to populate them.
pub fn build_registry(config: &TrustConfig) -> Result<MultiSourceTrustRegistry, TrustRegistryError> {
    let mut registry = MultiSourceTrustRegistry::default();
    for source in &config.sources {
        registry.add_backend(build_backend(source)?);
        tracing::debug!(kind = source.kind(), "trust backend configured");
    }
    Ok(registry)
}

pub fn build_backend(source: &TrustSourceConfig) -> Result<Arc<dyn TrustRegistry>, TrustRegistryError> {
    let backend: Arc<dyn TrustRegistry> = match source {
        TrustSourceConfig::Local { issuers } => {
            Arc::new(LocalTrustRegistry::with_issuers(issuers.iter().cloned()))
        }
        TrustSourceConfig::Http {
            url,
            field,
            timeout_secs,
        } => {
            let mut http = HttpTrustSource::new(build_client("http", *timeout_secs)?, url.clone());
            if let Some(field) = field {
                http = http.with_field(field.clone());
            }
            Arc::new(SourceTrustRegistry::new(http))
        }
        TrustSourceConfig::Dns {
            record,
            doh_endpoint,
            timeout_secs,
        } => {
            let lookup = DohTxtLookup::new(build_client("dns", *timeout_secs)?, doh_endpoint.clone());
            Arc::new(SourceTrustRegistry::new(DnsTrustSource::new(
                record.clone(),
                Arc::new(lookup),
            )))
        }
        TrustSourceConfig::Chain {
            rpc_url,
            contract,
            function,
        } => Arc::new(SourceTrustRegistry::new(ChainTrustSource::new(
            chain_caller(rpc_url, contract)?,
            function.clone(),
        ))),
        TrustSourceConfig::DocumentStore {
            url,
            field,
            timeout_secs,
        } => Arc::new(SourceTrustRegistry::new(
            DocumentStoreTrustSource::new(build_client("document_store", *timeout_secs)?, url.clone())
                .with_field(field.clone()),
        )),
        TrustSourceConfig::Directory {
            members_url,
            attribute,
            bearer_token,
            timeout_secs,
        } => {
            let mut directory = DirectoryTrustSource::new(
                build_client("directory", *timeout_secs)?,
                members_url.clone(),
                attribute.clone(),
            );
            if let Some(token) = bearer_token {
                directory = directory.with_bearer_token(token.clone());
            }
            Arc::new(SourceTrustRegistry::new(directory))
        }
    };
    Ok(backend)
}

#[cfg(feature = "ethereum")]
fn chain_caller(
    rpc_url: &str,
    contract: &str,
) -> Result<Arc<dyn crate::chain::ViewCaller>, TrustRegistryError> {
    Ok(Arc::new(crate::chain::EthersViewCaller::new(rpc_url, contract)?))
}

#[cfg(not(feature = "ethereum"))]
fn chain_caller(
    _rpc_url: &str,
    _contract: &str,
) -> Result<Arc<dyn crate::chain::ViewCaller>, TrustRegistryError> {
    Err(TrustRegistryError::Config(
        "chain trust sources require the `ethereum` feature".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_registry_in_order() {
        let config = TrustConfig {
            sources: vec![
                TrustSourceConfig::Local {
                    issuers: vec!["did:example:a".into()],
                },
                TrustSourceConfig::Http {
                    url: "https://trust.example.com/issuers".into(),
                    field: Some("issuers".into()),
                    timeout_secs: 5,
                },
                TrustSourceConfig::Directory {
                    members_url: "https://graph.example.com/groups/1/members".into(),
                    attribute: "extension_did".into(),
                    bearer_token: None,
                    timeout_secs: 5,
                },
            ],
        };
        let registry = build_registry(&config).unwrap();
        let names: Vec<&str> = registry.backends().iter().map(|b| b.name()).collect();
        assert_eq!(names, vec!["local", "http", "directory"]);
        assert!(registry.is_trusted("did:example:a"));
        assert!(registry.is_writable());
    }

    #[test]
    fn test_empty_config() {
        let registry = build_registry(&TrustConfig::default()).unwrap();
        assert_eq!(registry.backend_count(), 0);
        assert!(!registry.is_trusted("did:example:a"));
    }

    #[cfg(not(feature = "ethereum"))]
    #[test]
    fn test_chain_requires_feature() {
        let source = TrustSourceConfig::Chain {
            rpc_url: "http://localhost:8545".into(),
            contract: "0x0000000000000000000000000000000000000000".into(),
            function: "getTrustedIssuers".into(),
        };
        assert!(matches!(
            build_backend(&source),
            Err(TrustRegistryError::Config(_))
        ));
    }
}
