//! Trust list derived from directory group membership.

use std::collections::HashSet;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::TrustRegistryError;
use crate::http::get_json;
use crate::registry::TrustSource;

/// Members of a directory group (Graph-style `value` pages linked by
/// `@odata.nextLink`), each mapped to a DID through an extension attribute.
#[derive(Debug, Clone)]
pub struct DirectoryTrustSource {
    client: reqwest::Client,
    members_url: String,
    attribute: String,
    bearer_token: Option<String>,
}

/// Upper bound on followed `@odata.nextLink` pages.
const MAX_PAGES: usize = 100;

impl DirectoryTrustSource {
    pub fn new(
        client: reqwest::Client,
        members_url: impl Into<String>,
        attribute: impl Into<String>,
    ) -> Self {
        Self {
            client,
            members_url: members_url.into(),
            attribute: attribute.into(),
            bearer_token: None,
        }
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }
}

#[async_trait]
impl TrustSource for DirectoryTrustSource {
    fn name(&self) -> &str {
        "directory"
    }

    async fn fetch(&self) -> Result<HashSet<String>, TrustRegistryError> {
        let mut issuers = HashSet::new();
        let mut next = Some(self.members_url.clone());
        let mut pages = 0;

        while let Some(url) = next.take() {
            pages += 1;
            if pages > MAX_PAGES {
                return Err(TrustRegistryError::Decode {
                    backend: self.name().to_string(),
                    reason: format!("more than {MAX_PAGES} member pages"),
                });
            }

            let page = get_json(&self.client, self.name(), &url, self.bearer_token.as_deref()).await?;
            let members = page
                .get("value")
                .and_then(Value::as_array)
                .ok_or_else(|| TrustRegistryError::Decode {
                    backend: self.name().to_string(),
                    reason: "member page has no `value` array".into(),
                })?;

            for member in members {
                match member.get(&self.attribute).and_then(Value::as_str).map(str::trim) {
                    Some(did) if did.starts_with("did:") => {
                        issuers.insert(did.to_string());
                    }
                    _ => tracing::debug!(
                        member = member.get("id").and_then(serde_json::Value::as_str).unwrap_or("?"),
                        attribute = %self.attribute,
                        "directory member has no DID attribute"
                    ),
                }
            }

            next = page
                .get("@odata.nextLink")
                .and_then(Value::as_str)
                .map(str::to_string);
        }

        Ok(issuers)
    }
}
