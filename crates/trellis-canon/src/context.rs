//! JSON-LD context processing for the subset credentials use.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{json, Map, Value};

use crate::error::CanonicalizationError;

pub const CREDENTIALS_V1: &str = "https://www.w3.org/2018/credentials/v1";
pub const CREDENTIALS_V2: &str = "https://www.w3.org/ns/credentials/v2";
pub const DID_V1: &str = "https://www.w3.org/ns/did/v1";
pub const ED25519_2020_V1: &str = "https://w3id.org/security/suites/ed25519-2020/v1";
pub const JWS_2020_V1: &str = "https://w3id.org/security/suites/jws-2020/v1";
pub const SECP256K1_2019_V1: &str = "https://w3id.org/security/suites/secp256k1-2019/v1";

/// Known context documents, keyed by URL.
///
/// Context URLs are never fetched; unknown URLs contribute no terms.
#[derive(Debug, Clone, Default)]
pub struct ContextRegistry {
    contexts: Arc<RwLock<HashMap<String, Arc<Value>>>>,
}

impl ContextRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with the credentials, DID and security suite
    /// contexts.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register(CREDENTIALS_V1, credentials_v1());
        registry.register(CREDENTIALS_V2, credentials_v1());
        registry.register(DID_V1, did_v1());
        registry.register(ED25519_2020_V1, security_terms());
        registry.register(JWS_2020_V1, security_terms());
        registry.register(SECP256K1_2019_V1, security_terms());
        registry
    }

    /// Register (or replace) the context served for `url`.
    pub fn register(&self, url: impl Into<String>, context: Value) {
        self.contexts.write().insert(url.into(), Arc::new(context));
    }

    pub fn get(&self, url: &str) -> Option<Arc<Value>> {
        self.contexts.read().get(url).cloned()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.contexts.read().contains_key(url)
    }
}

/// A processed term definition.
#[derive(Debug, Clone, PartialEq)]
pub struct TermDefinition {
    /// Expanded IRI, or a keyword when the term is an alias.
    pub iri: String,
    /// `@id`, `@vocab`, `@json` or a datatype IRI.
    pub type_mapping: Option<String>,
    /// `@list`, `@set`, `@language`, `@index` or `@graph`.
    pub container: Option<String>,
    pub language: Option<Option<String>>,
}

/// The active context while walking a document.
#[derive(Debug, Clone, Default)]
pub struct ActiveContext {
    pub terms: HashMap<String, TermDefinition>,
    pub vocab: Option<String>,
    pub base: Option<String>,
    pub language: Option<String>,
}

impl ActiveContext {
    /// Apply a local context (string, object, array or null) on top of `self`.
    pub fn process(
        &self,
        local: &Value,
        registry: &ContextRegistry,
    ) -> Result<ActiveContext, CanonicalizationError> {
        let mut seen = HashSet::new();
        self.process_inner(local, registry, &mut seen)
    }

    fn process_inner(
        &self,
        local: &Value,
        registry: &ContextRegistry,
        seen: &mut HashSet<String>,
    ) -> Result<ActiveContext, CanonicalizationError> {
        match local {
            Value::Null => Ok(ActiveContext {
                base: self.base.clone(),
                ..ActiveContext::default()
            }),
            Value::Array(items) => {
                let mut ctx = self.clone();
                for item in items {
                    ctx = ctx.process_inner(item, registry, seen)?;
                }
                Ok(ctx)
            }
            Value::String(url) => {
                let Some(document) = registry.get(url) else {
                    tracing::debug!(url = %url, "context not registered, no terms added");
                    return Ok(self.clone());
                };
                if !seen.insert(url.clone()) {
                    return Err(CanonicalizationError::InvalidContext(format!(
                        "recursive context inclusion of {url}"
                    )));
                }
                let inner = document.get("@context").unwrap_or(document.as_ref());
                let processed = self.process_inner(inner, registry, seen);
                seen.remove(url);
                processed
            }
            Value::Object(definitions) => self.apply_definitions(definitions),
            other => Err(CanonicalizationError::InvalidContext(format!(
                "context must be a string, object, array or null, got {other}"
            ))),
        }
    }

    fn apply_definitions(
        &self,
        local: &Map<String, Value>,
    ) -> Result<ActiveContext, CanonicalizationError> {
        let mut ctx = self.clone();

        if let Some(base) = local.get("@base") {
            ctx.base = match base {
                Value::Null => None,
                Value::String(s) => Some(s.clone()),
                _ => return Err(CanonicalizationError::InvalidContext("@base must be a string".into())),
            };
        }
        if let Some(vocab) = local.get("@vocab") {
            ctx.vocab = match vocab {
                Value::Null => None,
                Value::String(s) => Some(ctx.expand_iri(s, true, false)?.unwrap_or_else(|| s.clone())),
                _ => return Err(CanonicalizationError::InvalidContext("@vocab must be a string".into())),
            };
        }
        if let Some(language) = local.get("@language") {
            ctx.language = match language {
                Value::Null => None,
                Value::String(s) => Some(s.to_lowercase()),
                _ => {
                    return Err(CanonicalizationError::InvalidContext(
                        "@language must be a string".into(),
                    ))
                }
            };
        }

        let mut defined: HashMap<String, bool> = HashMap::new();
        for term in local.keys() {
            if matches!(
                term.as_str(),
                "@base" | "@vocab" | "@language" | "@version" | "@protected" | "@propagate"
            ) {
                continue;
            }
            if term.starts_with('@') {
                return Err(CanonicalizationError::UnsupportedKeyword(term.clone()));
            }
            ctx.create_term(local, term, &mut defined)?;
        }
        Ok(ctx)
    }

    /// Define `term` from `local`, defining any prefix it depends on first.
    fn create_term(
        &mut self,
        local: &Map<String, Value>,
        term: &str,
        defined: &mut HashMap<String, bool>,
    ) -> Result<(), CanonicalizationError> {
        match defined.get(term) {
            Some(true) => return Ok(()),
            Some(false) => {
                return Err(CanonicalizationError::InvalidTerm {
                    term: term.to_string(),
                    reason: "cyclic IRI mapping".into(),
                })
            }
            None => {}
        }
        defined.insert(term.to_string(), false);

        let value = local.get(term).cloned().unwrap_or(Value::Null);
        let invalid = |reason: &str| CanonicalizationError::InvalidTerm {
            term: term.to_string(),
            reason: reason.to_string(),
        };

        let (id, definition) = match &value {
            Value::Null => {
                self.terms.remove(term);
                defined.insert(term.to_string(), true);
                return Ok(());
            }
            Value::String(id) => (Some(id.clone()), None),
            Value::Object(obj) => {
                if obj.contains_key("@reverse") {
                    return Err(CanonicalizationError::UnsupportedKeyword("@reverse".into()));
                }
                let id = match obj.get("@id") {
                    None => None,
                    Some(Value::String(id)) => Some(id.clone()),
                    Some(Value::Null) => {
                        self.terms.remove(term);
                        defined.insert(term.to_string(), true);
                        return Ok(());
                    }
                    Some(_) => return Err(invalid("@id must be a string")),
                };
                (id, Some(obj))
            }
            _ => return Err(invalid("definition must be a string, object or null")),
        };

        // Prefixes used by this definition must be defined first.
        self.define_prefix(local, id.as_deref().unwrap_or(term), term, defined)?;
        if let Some(Value::String(t)) = definition.and_then(|obj| obj.get("@type")) {
            self.define_prefix(local, t, term, defined)?;
        }

        let iri = match id {
            Some(id) if id.starts_with('@') => id,
            Some(id) => self
                .expand_iri(&id, true, false)?
                .ok_or_else(|| invalid("@id does not expand to an IRI"))?,
            None => {
                if let Some((prefix, suffix)) = term.split_once(':') {
                    match self.terms.get(prefix) {
                        Some(def) => format!("{}{}", def.iri, suffix),
                        None => term.to_string(),
                    }
                } else if let Some(vocab) = &self.vocab {
                    format!("{vocab}{term}")
                } else {
                    return Err(invalid("no @id and no @vocab to derive one"));
                }
            }
        };

        let mut def = TermDefinition {
            iri,
            type_mapping: None,
            container: None,
            language: None,
        };

        if let Some(obj) = definition {
            if let Some(type_value) = obj.get("@type") {
                let Value::String(t) = type_value else {
                    return Err(invalid("@type must be a string"));
                };
                def.type_mapping = Some(match t.as_str() {
                    "@id" | "@vocab" | "@json" | "@none" => t.clone(),
                    _ => self
                        .expand_iri(t, true, false)?
                        .ok_or_else(|| invalid("@type does not expand to an IRI"))?,
                });
            }
            if let Some(container) = obj.get("@container") {
                let container = match container {
                    Value::String(c) => c.clone(),
                    Value::Array(items) if items.len() == 1 => items[0]
                        .as_str()
                        .map(str::to_string)
                        .ok_or_else(|| invalid("@container must be a string"))?,
                    _ => return Err(invalid("@container must be a string")),
                };
                if !matches!(
                    container.as_str(),
                    "@list" | "@set" | "@language" | "@index" | "@graph"
                ) {
                    return Err(CanonicalizationError::UnsupportedKeyword(container));
                }
                def.container = Some(container);
            }
            if let Some(language) = obj.get("@language") {
                def.language = Some(language.as_str().map(str::to_lowercase));
            }
        }

        self.terms.insert(term.to_string(), def);
        defined.insert(term.to_string(), true);
        Ok(())
    }

    fn define_prefix(
        &mut self,
        local: &Map<String, Value>,
        value: &str,
        term: &str,
        defined: &mut HashMap<String, bool>,
    ) -> Result<(), CanonicalizationError> {
        if let Some((prefix, suffix)) = value.split_once(':') {
            if !suffix.starts_with("//") && prefix != term && local.contains_key(prefix) {
                self.create_term(local, prefix, defined)?;
            }
        }
        Ok(())
    }

    /// Expand a term or compact IRI.
    ///
    /// With `vocab`, terms and vocabulary-relative values expand through the
    /// active context; otherwise the value is treated as a (possibly relative)
    /// document IRI. Returns `None` when the value cannot be expanded.
    pub fn expand_iri(
        &self,
        value: &str,
        vocab: bool,
        document_relative: bool,
    ) -> Result<Option<String>, CanonicalizationError> {
        if value.starts_with('@') {
            return Ok(Some(value.to_string()));
        }
        if vocab {
            if let Some(def) = self.terms.get(value) {
                return Ok(Some(def.iri.clone()));
            }
        }
        if let Some((prefix, suffix)) = value.split_once(':') {
            if prefix == "_" || suffix.starts_with("//") {
                return Ok(Some(value.to_string()));
            }
            if let Some(def) = self.terms.get(prefix) {
                return Ok(Some(format!("{}{}", def.iri, suffix)));
            }
            return Ok(Some(value.to_string()));
        }
        if vocab {
            if let Some(vocab) = &self.vocab {
                return Ok(Some(format!("{vocab}{value}")));
            }
        }
        if document_relative {
            if let Some(base) = &self.base {
                let base = url::Url::parse(base)
                    .map_err(|e| CanonicalizationError::InvalidIri(format!("@base {base}: {e}")))?;
                let joined = base
                    .join(value)
                    .map_err(|e| CanonicalizationError::InvalidIri(format!("{value}: {e}")))?;
                return Ok(Some(joined.to_string()));
            }
            return Ok(Some(value.to_string()));
        }
        Ok(None)
    }

    /// Keyword a term aliases, if any (`id` -> `@id`).
    pub fn keyword_alias<'a>(&'a self, key: &'a str) -> Option<&'a str> {
        if key.starts_with('@') {
            return Some(key);
        }
        self.terms
            .get(key)
            .map(|def| def.iri.as_str())
            .filter(|iri| iri.starts_with('@'))
    }
}

fn credentials_v1() -> Value {
    json!({
        "@context": {
            "@version": 1.1,
            "id": "@id",
            "type": "@type",
            "cred": "https://www.w3.org/2018/credentials#",
            "sec": "https://w3id.org/security#",
            "xsd": "http://www.w3.org/2001/XMLSchema#",
            "schema": "http://schema.org/",
            "VerifiableCredential": "cred:VerifiableCredential",
            "VerifiablePresentation": "cred:VerifiablePresentation",
            "credentialSchema": { "@id": "cred:credentialSchema", "@type": "@id" },
            "credentialStatus": { "@id": "cred:credentialStatus", "@type": "@id" },
            "credentialSubject": { "@id": "cred:credentialSubject", "@type": "@id" },
            "evidence": { "@id": "cred:evidence", "@type": "@id" },
            "expirationDate": { "@id": "cred:expirationDate", "@type": "xsd:dateTime" },
            "holder": { "@id": "cred:holder", "@type": "@id" },
            "issued": { "@id": "cred:issued", "@type": "xsd:dateTime" },
            "issuer": { "@id": "cred:issuer", "@type": "@id" },
            "issuanceDate": { "@id": "cred:issuanceDate", "@type": "xsd:dateTime" },
            "validFrom": { "@id": "cred:validFrom", "@type": "xsd:dateTime" },
            "validUntil": { "@id": "cred:validUntil", "@type": "xsd:dateTime" },
            "refreshService": { "@id": "cred:refreshService", "@type": "@id" },
            "termsOfUse": { "@id": "cred:termsOfUse", "@type": "@id" },
            "verifiableCredential": { "@id": "cred:verifiableCredential", "@type": "@id", "@container": "@graph" },
            "name": "schema:name",
            "description": "schema:description",
            "proof": { "@id": "sec:proof", "@type": "@id", "@container": "@graph" },
            "challenge": "sec:challenge",
            "domain": "sec:domain",
            "created": { "@id": "http://purl.org/dc/terms/created", "@type": "xsd:dateTime" },
            "proofPurpose": { "@id": "sec:proofPurpose", "@type": "@vocab" },
            "proofValue": "sec:proofValue",
            "jws": "sec:jws",
            "verificationMethod": { "@id": "sec:verificationMethod", "@type": "@id" },
            "assertionMethod": { "@id": "sec:assertionMethod", "@type": "@id", "@container": "@set" },
            "authentication": { "@id": "sec:authenticationMethod", "@type": "@id", "@container": "@set" }
        }
    })
}

fn did_v1() -> Value {
    json!({
        "@context": {
            "@protected": true,
            "id": "@id",
            "type": "@type",
            "sec": "https://w3id.org/security#",
            "alsoKnownAs": { "@id": "https://www.w3.org/ns/activitystreams#alsoKnownAs", "@type": "@id" },
            "assertionMethod": { "@id": "sec:assertionMethod", "@type": "@id", "@container": "@set" },
            "authentication": { "@id": "sec:authenticationMethod", "@type": "@id", "@container": "@set" },
            "capabilityDelegation": { "@id": "sec:capabilityDelegationMethod", "@type": "@id", "@container": "@set" },
            "capabilityInvocation": { "@id": "sec:capabilityInvocationMethod", "@type": "@id", "@container": "@set" },
            "controller": { "@id": "sec:controller", "@type": "@id" },
            "keyAgreement": { "@id": "sec:keyAgreementMethod", "@type": "@id", "@container": "@set" },
            "service": { "@id": "https://www.w3.org/ns/did#service", "@type": "@id", "@container": "@set" },
            "serviceEndpoint": { "@id": "https://www.w3.org/ns/did#serviceEndpoint", "@type": "@id" },
            "verificationMethod": { "@id": "sec:verificationMethod", "@type": "@id" },
            "publicKeyBase58": "sec:publicKeyBase58",
            "publicKeyMultibase": "sec:publicKeyMultibase",
            "publicKeyJwk": { "@id": "sec:publicKeyJwk", "@type": "@json" }
        }
    })
}

fn security_terms() -> Value {
    json!({
        "@context": {
            "id": "@id",
            "type": "@type",
            "sec": "https://w3id.org/security#",
            "xsd": "http://www.w3.org/2001/XMLSchema#",
            "Ed25519Signature2020": "sec:Ed25519Signature2020",
            "Ed25519VerificationKey2020": "sec:Ed25519VerificationKey2020",
            "Ed25519Signature2018": "sec:Ed25519Signature2018",
            "Ed25519VerificationKey2018": "sec:Ed25519VerificationKey2018",
            "EcdsaSecp256k1Signature2019": "sec:EcdsaSecp256k1Signature2019",
            "EcdsaSecp256k1VerificationKey2019": "sec:EcdsaSecp256k1VerificationKey2019",
            "JsonWebSignature2020": "sec:JsonWebSignature2020",
            "JsonWebKey2020": "sec:JsonWebKey2020",
            "Multikey": "sec:Multikey",
            "challenge": "sec:challenge",
            "domain": "sec:domain",
            "created": { "@id": "http://purl.org/dc/terms/created", "@type": "xsd:dateTime" },
            "expires": { "@id": "sec:expiration", "@type": "xsd:dateTime" },
            "nonce": "sec:nonce",
            "controller": { "@id": "sec:controller", "@type": "@id" },
            "proofPurpose": { "@id": "sec:proofPurpose", "@type": "@vocab" },
            "proofValue": "sec:proofValue",
            "jws": "sec:jws",
            "verificationMethod": { "@id": "sec:verificationMethod", "@type": "@id" },
            "publicKeyBase58": "sec:publicKeyBase58",
            "publicKeyMultibase": "sec:publicKeyMultibase",
            "publicKeyJwk": { "@id": "sec:publicKeyJwk", "@type": "@json" },
            "assertionMethod": { "@id": "sec:assertionMethod", "@type": "@id", "@container": "@set" },
            "authentication": { "@id": "sec:authenticationMethod", "@type": "@id", "@container": "@set" }
        }
    })
}
