use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::TrustRegistryError;
use crate::registry::{collect_dids, TrustSource};

pub(crate) fn build_client(backend: &str, timeout_secs: u64) -> Result<reqwest::Client, TrustRegistryError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| TrustRegistryError::Transport {
            backend: backend.to_string(),
            reason: e.to_string(),
        })
}

/// GET `url` and decode the body as JSON.
pub(crate) async fn get_json(
    client: &reqwest::Client,
    backend: &str,
    url: &str,
    bearer_token: Option<&str>,
) -> Result<Value, TrustRegistryError> {
    let mut request = client.get(url).header("Accept", "application/json");
    if let Some(token) = bearer_token {
        request = request.bearer_auth(token);
    }
    let response = request
        .send()
        .await
        .map_err(|e| TrustRegistryError::Transport {
            backend: backend.to_string(),
            reason: e.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(TrustRegistryError::Status {
            backend: backend.to_string(),
            status: status.as_u16(),
        });
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| TrustRegistryError::Decode {
            backend: backend.to_string(),
            reason: e.to_string(),
        })
}

/// Issuer list served as JSON over HTTP.
///
/// The body is either the array itself or an object holding it under `field`.
#[derive(Debug, Clone)]
pub struct HttpTrustSource {
    client: reqwest::Client,
    url: String,
    field: Option<String>,
}

impl HttpTrustSource {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            field: None,
        }
    }

    /// Read the issuer array from `field` of a JSON object body.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

#[async_trait]
impl TrustSource for HttpTrustSource {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self) -> Result<HashSet<String>, TrustRegistryError> {
        let body = get_json(&self.client, self.name(), &self.url, None).await?;
        let list = match &self.field {
            Some(field) => body.get(field).ok_or_else(|| TrustRegistryError::Decode {
                backend: self.name().to_string(),
                reason: format!("response has no `{field}` field"),
            })?,
            None => &body,
        };
        collect_dids(self.name(), list)
    }
}
