//! Trust list published in DNS TXT records.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::TrustRegistryError;
use crate::registry::TrustSource;

/// DNS TXT lookup collaborator.
#[async_trait]
pub trait TxtLookup: Send + Sync {
    /// Text of every TXT record at `name`, character-strings joined.
    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, TrustRegistryError>;
}

/// DNS-over-HTTPS lookup against a DNS-JSON endpoint
/// (`?name=<n>&type=TXT`, `Accept: application/dns-json`).
#[derive(Debug, Clone)]
pub struct DohTxtLookup {
    client: reqwest::Client,
    endpoint: String,
}

const TXT_RECORD_TYPE: u64 = 16;

impl DohTxtLookup {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl TxtLookup for DohTxtLookup {
    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, TrustRegistryError> {
        let dns_error = |reason: String| TrustRegistryError::Dns {
            record: name.to_string(),
            reason,
        };
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("name", name), ("type", "TXT")])
            .header("Accept", "application/dns-json")
            .send()
            .await
            .map_err(|e| dns_error(e.to_string()))?;
        if !response.status().is_success() {
            return Err(dns_error(format!("resolver returned {}", response.status())));
        }
        let body: Value = response
            .json()
            .await
            .map_err(|e| dns_error(e.to_string()))?;

        // RCODE 0 is NOERROR. Anything else leaves the cache alone.
        let rcode = body.get("Status").and_then(Value::as_u64).unwrap_or(0);
        if rcode != 0 {
            return Err(dns_error(format!("rcode {rcode}")));
        }

        Ok(body
            .get("Answer")
            .and_then(Value::as_array)
            .map(|answers| {
                answers
                    .iter()
                    .filter(|a| a.get("type").and_then(Value::as_u64) == Some(TXT_RECORD_TYPE))
                    .filter_map(|a| a.get("data").and_then(Value::as_str))
                    .map(join_character_strings)
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// `"abc" "def"` → `abcdef`. Unquoted data is returned as is.
fn join_character_strings(data: &str) -> String {
    if !data.contains('"') {
        return data.to_string();
    }
    let mut out = String::new();
    let mut in_quotes = false;
    let mut chars = data.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => in_quotes = !in_quotes,
            '\\' if in_quotes => {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            _ if in_quotes => out.push(c),
            _ => {}
        }
    }
    out
}

/// Split TXT text into DIDs on commas and whitespace.
pub fn parse_txt_tokens<'a, I>(records: I) -> HashSet<String>
where
    I: IntoIterator<Item = &'a str>,
{
    records
        .into_iter()
        .flat_map(|record| record.split(|c: char| c == ',' || c.is_whitespace()))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Trusted issuers listed in the TXT records at one DNS name.
#[derive(Clone)]
pub struct DnsTrustSource {
    record: String,
    lookup: Arc<dyn TxtLookup>,
}

impl DnsTrustSource {
    pub fn new(record: impl Into<String>, lookup: Arc<dyn TxtLookup>) -> Self {
        Self {
            record: record.into(),
            lookup,
        }
    }

    pub fn record(&self) -> &str {
        &self.record
    }
}

#[async_trait]
impl TrustSource for DnsTrustSource {
    fn name(&self) -> &str {
        "dns"
    }

    async fn fetch(&self) -> Result<HashSet<String>, TrustRegistryError> {
        let records = self.lookup.lookup_txt(&self.record).await?;
        Ok(parse_txt_tokens(records.iter().map(String::as_str)))
    }
}
