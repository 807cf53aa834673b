use std::collections::HashSet;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::TrustRegistryError;
use crate::http::get_json;
use crate::registry::{collect_dids, TrustSource};

/// Trust list kept in an append-only document store.
///
/// The store returns either one document or the document history as an
/// array; the last document in the history is the current list. The issuer
/// array is read from `field` (default `content`).
#[derive(Debug, Clone)]
pub struct DocumentStoreTrustSource {
    client: reqwest::Client,
    url: String,
    field: String,
}

impl DocumentStoreTrustSource {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            field: "content".into(),
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }
}

#[async_trait]
impl TrustSource for DocumentStoreTrustSource {
    fn name(&self) -> &str {
        "document_store"
    }

    async fn fetch(&self) -> Result<HashSet<String>, TrustRegistryError> {
        let body = get_json(&self.client, self.name(), &self.url, None).await?;
        let document = match &body {
            Value::Array(history) => history.last(),
            other => Some(other),
        };
        let content = document
            .and_then(|doc| doc.get(&self.field))
            .ok_or_else(|| TrustRegistryError::Decode {
                backend: self.name().to_string(),
                reason: format!("document has no `{}` array", self.field),
            })?;
        collect_dids(self.name(), content)
    }
}
