//! `did:web`: the DID names an HTTPS location serving `did.json`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use trellis_core::{Did, DidDocument, WebResolverConfig};
use url::Url;

use crate::error::DidResolutionError;
use crate::method::DidMethod;

/// Fetches `did:web` documents over HTTPS.
#[derive(Debug, Clone)]
pub struct DidWebMethod {
    client: reqwest::Client,
    insecure_http: bool,
}

impl DidWebMethod {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            insecure_http: false,
        }
    }

    pub fn from_config(config: &WebResolverConfig) -> Result<Self, DidResolutionError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DidResolutionError::Network {
                did: "did:web".into(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            insecure_http: config.insecure_http,
        })
    }

    /// Fetch over plain HTTP instead of HTTPS. Local development only.
    pub fn with_insecure_http(mut self, insecure_http: bool) -> Self {
        self.insecure_http = insecure_http;
        self
    }
}

/// Map a `did:web` DID to the URL of its document.
///
/// `did:web:example.com` → `https://example.com/.well-known/did.json`,
/// `did:web:example.com:user:alice` → `https://example.com/user/alice/did.json`.
/// A port is written percent-encoded: `did:web:localhost%3A8443`.
pub fn document_url(did: &Did, insecure_http: bool) -> Result<Url, DidResolutionError> {
    if did.method() != "web" {
        return Err(DidResolutionError::MethodNotSupported(did.method().to_string()));
    }
    let mut segments = did.method_specific_id().split(':');
    let host = segments
        .next()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| DidResolutionError::InvalidDid(did.to_string()))?
        .replace("%3A", ":")
        .replace("%3a", ":");
    let path: Vec<&str> = segments.collect();

    let scheme = if insecure_http { "http" } else { "https" };
    let location = if path.is_empty() {
        format!("{scheme}://{host}/.well-known/did.json")
    } else {
        format!("{scheme}://{host}/{}/did.json", path.join("/"))
    };
    Url::parse(&location).map_err(|e| DidResolutionError::InvalidDid(format!("{did}: {e}")))
}

#[async_trait]
impl DidMethod for DidWebMethod {
    fn name(&self) -> &str {
        "web"
    }

    async fn resolve(&self, did: &Did) -> Result<DidDocument, DidResolutionError> {
        let url = document_url(did, self.insecure_http)?;
        tracing::debug!(did = %did, url = %url, "fetching did:web document");

        let network = |reason: String| DidResolutionError::Network {
            did: did.to_string(),
            reason,
        };
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            return Err(DidResolutionError::NotFound(did.to_string()));
        }
        if !status.is_success() {
            return Err(network(format!("{url} returned {status}")));
        }

        let body = response.text().await.map_err(|e| network(e.to_string()))?;
        DidDocument::from_json(&body).map_err(|e| DidResolutionError::InvalidDocument {
            did: did.to_string(),
            reason: e.to_string(),
        })
    }
}
