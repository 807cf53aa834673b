use serde_json::Value;

use trellis_core::{CanonicalizationConfig, DEFAULT_VOCAB};

use crate::context::ContextRegistry;
use crate::error::CanonicalizationError;
use crate::to_rdf::to_rdf;
use crate::urdna2015::normalize;

/// Deterministic, byte-stable normalization of JSON-LD documents.
pub trait CanonicalizationService: Send + Sync {
    /// Canonical N-Quads bytes for `document`.
    fn canonicalize_json_ld(&self, document: &Value) -> Result<Vec<u8>, CanonicalizationError>;

    /// Pass-through for input that is already canonical N-Quads.
    ///
    /// No graph work is performed; non-canonical input comes back unchanged.
    fn canonicalize_nquads(&self, input: &str) -> Result<Vec<u8>, CanonicalizationError>;
}

/// URDNA2015 canonicalizer over an in-process context registry.
#[derive(Debug, Clone)]
pub struct Urdna2015Canonicalizer {
    registry: ContextRegistry,
    fallback_vocab: String,
}

impl Default for Urdna2015Canonicalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Urdna2015Canonicalizer {
    /// Canonicalizer with the default contexts and fallback vocabulary.
    pub fn new() -> Self {
        Self::with_registry(ContextRegistry::with_defaults(), DEFAULT_VOCAB)
    }

    pub fn with_registry(registry: ContextRegistry, fallback_vocab: impl Into<String>) -> Self {
        Self {
            registry,
            fallback_vocab: fallback_vocab.into(),
        }
    }

    pub fn from_config(config: &CanonicalizationConfig) -> Self {
        Self::with_registry(ContextRegistry::with_defaults(), config.default_vocab.clone())
    }

    /// Registry used to resolve context URLs.
    pub fn registry(&self) -> &ContextRegistry {
        &self.registry
    }

    /// Canonicalize JSON text.
    pub fn canonicalize_str(&self, json: &str) -> Result<Vec<u8>, CanonicalizationError> {
        if json.trim().is_empty() {
            return Err(CanonicalizationError::EmptyInput);
        }
        let document: Value =
            serde_json::from_str(json).map_err(|e| CanonicalizationError::Malformed(e.to_string()))?;
        self.canonicalize_json_ld(&document)
    }
}

impl CanonicalizationService for Urdna2015Canonicalizer {
    fn canonicalize_json_ld(&self, document: &Value) -> Result<Vec<u8>, CanonicalizationError> {
        match document {
            Value::Null => return Err(CanonicalizationError::EmptyInput),
            Value::Object(obj) if obj.is_empty() => return Err(CanonicalizationError::EmptyInput),
            Value::Array(items) if items.is_empty() => return Err(CanonicalizationError::EmptyInput),
            _ => {}
        }

        let dataset = to_rdf(document, &self.registry, &self.fallback_vocab)?;
        if dataset.is_empty() {
            return Err(CanonicalizationError::Malformed(
                "document contains no statements".into(),
            ));
        }
        let normalized = normalize(&dataset)?;
        let nquads = normalized.to_nquads();
        tracing::trace!(statements = normalized.len(), bytes = nquads.len(), "canonicalized document");
        Ok(nquads.into_bytes())
    }

    fn canonicalize_nquads(&self, input: &str) -> Result<Vec<u8>, CanonicalizationError> {
        if input.trim().is_empty() {
            return Err(CanonicalizationError::EmptyInput);
        }
        Ok(input.as_bytes().to_vec())
    }
}
