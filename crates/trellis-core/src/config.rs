//! Configuration loading and management.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// Full configuration for a Trellis verifier.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TrellisConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// DID resolution settings.
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// JSON-LD canonicalization settings.
    #[serde(default)]
    pub canonicalization: CanonicalizationConfig,

    /// Trust registry sources.
    #[serde(default)]
    pub trust: TrustConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// DID methods registered at startup.
    #[serde(default = "default_enabled_methods")]
    pub enabled_methods: Vec<String>,
    /// did:web settings.
    #[serde(default)]
    pub web: WebResolverConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebResolverConfig {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Fetch documents over plain HTTP. Local development only.
    #[serde(default)]
    pub insecure_http: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalizationConfig {
    /// Vocabulary used for terms no context defines.
    #[serde(default = "default_vocab")]
    pub default_vocab: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TrustConfig {
    #[serde(default)]
    pub sources: Vec<TrustSourceConfig>,
}

/// One trust registry backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrustSourceConfig {
    /// Static, in-process issuer list.
    Local {
        #[serde(default)]
        issuers: Vec<String>,
    },
    /// JSON endpoint returning an array, or an object with an array field.
    Http {
        url: String,
        #[serde(default)]
        field: Option<String>,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
    /// TXT records under a DNS name, fetched over DNS-over-HTTPS.
    Dns {
        record: String,
        #[serde(default = "default_doh_endpoint")]
        doh_endpoint: String,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
    /// Nullary view function returning `string[]`.
    Chain {
        rpc_url: String,
        contract: String,
        #[serde(default = "default_chain_function")]
        function: String,
    },
    /// Append-only document whose array field lists issuers.
    DocumentStore {
        url: String,
        #[serde(default = "default_content_field")]
        field: String,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
    /// Directory group membership mapped through an extension attribute.
    Directory {
        members_url: String,
        attribute: String,
        #[serde(default)]
        bearer_token: Option<String>,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
}

impl TrustSourceConfig {
    /// Short backend name used in logs and reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Local { .. } => "local",
            Self::Http { .. } => "http",
            Self::Dns { .. } => "dns",
            Self::Chain { .. } => "chain",
            Self::DocumentStore { .. } => "document_store",
            Self::Directory { .. } => "directory",
        }
    }
}

/// Fallback vocabulary for undefined JSON-LD terms.
pub const DEFAULT_VOCAB: &str = "https://www.w3.org/ns/credentials/issuer-dependent#";

// Default value functions
fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "text".into()
}
fn default_enabled_methods() -> Vec<String> {
    vec!["key".into(), "peer".into(), "web".into()]
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_vocab() -> String {
    DEFAULT_VOCAB.into()
}
fn default_doh_endpoint() -> String {
    "https://cloudflare-dns.com/dns-query".into()
}
fn default_chain_function() -> String {
    "getTrustedIssuers".into()
}
fn default_content_field() -> String {
    "content".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            enabled_methods: default_enabled_methods(),
            web: WebResolverConfig::default(),
        }
    }
}

impl Default for WebResolverConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            insecure_http: false,
        }
    }
}

impl Default for CanonicalizationConfig {
    fn default() -> Self {
        Self {
            default_vocab: default_vocab(),
        }
    }
}

impl TrellisConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: TrellisConfig = toml::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save the current config to a TOML file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Reject values that deserialize but cannot work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.logging.format.as_str() {
            "text" | "json" => {}
            other => {
                return Err(ConfigError::Invalid(format!(
                    "logging.format must be \"text\" or \"json\", got {other:?}"
                )))
            }
        }
        for source in &self.trust.sources {
            let timeout = match source {
                TrustSourceConfig::Http { timeout_secs, .. }
                | TrustSourceConfig::Dns { timeout_secs, .. }
                | TrustSourceConfig::DocumentStore { timeout_secs, .. }
                | TrustSourceConfig::Directory { timeout_secs, .. } => Some(*timeout_secs),
                TrustSourceConfig::Local { .. } | TrustSourceConfig::Chain { .. } => None,
            };
            if timeout == Some(0) {
                return Err(ConfigError::Invalid(format!(
                    "trust source {} has a zero timeout",
                    source.kind()
                )));
            }
        }
        Ok(())
    }
}
