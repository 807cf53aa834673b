use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;

/// Public key material carried by a verification method.
///
/// Exactly one encoding is kept per method. When a document populates more
/// than one field the JWK wins, then multibase, then base58.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyMaterial {
    Jwk(Map<String, Value>),
    Multibase(String),
    Base58(String),
}

impl KeyMaterial {
    /// Field name used in DID Documents for this encoding.
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::Jwk(_) => "publicKeyJwk",
            Self::Multibase(_) => "publicKeyMultibase",
            Self::Base58(_) => "publicKeyBase58",
        }
    }
}

/// A verification method within a DID Document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawVerificationMethod", into = "RawVerificationMethod")]
pub struct VerificationMethod {
    /// Verification method identifier (e.g., "did:example:123#key-1").
    pub id: String,
    /// Declared type (e.g., "Ed25519VerificationKey2020").
    pub method_type: String,
    /// The DID that controls this verification method.
    pub controller: String,
    /// The populated key encoding, if any.
    pub key_material: Option<KeyMaterial>,
}

impl VerificationMethod {
    pub fn new(
        id: impl Into<String>,
        method_type: impl Into<String>,
        controller: impl Into<String>,
        key_material: Option<KeyMaterial>,
    ) -> Self {
        Self {
            id: id.into(),
            method_type: method_type.into(),
            controller: controller.into(),
            key_material,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVerificationMethod {
    id: String,
    #[serde(rename = "type")]
    method_type: String,
    #[serde(default)]
    controller: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    public_key_jwk: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    public_key_multibase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    public_key_base58: Option<String>,
}

impl From<RawVerificationMethod> for VerificationMethod {
    fn from(raw: RawVerificationMethod) -> Self {
        let populated = [
            raw.public_key_jwk.is_some(),
            raw.public_key_multibase.is_some(),
            raw.public_key_base58.is_some(),
        ]
        .iter()
        .filter(|p| **p)
        .count();
        if populated > 1 {
            tracing::debug!(id = %raw.id, "verification method carries several key encodings, keeping highest priority");
        }

        let key_material = raw
            .public_key_jwk
            .map(KeyMaterial::Jwk)
            .or(raw.public_key_multibase.map(KeyMaterial::Multibase))
            .or(raw.public_key_base58.map(KeyMaterial::Base58));

        Self {
            id: raw.id,
            method_type: raw.method_type,
            controller: raw.controller,
            key_material,
        }
    }
}

impl From<VerificationMethod> for RawVerificationMethod {
    fn from(vm: VerificationMethod) -> Self {
        let mut raw = RawVerificationMethod {
            id: vm.id,
            method_type: vm.method_type,
            controller: vm.controller,
            public_key_jwk: None,
            public_key_multibase: None,
            public_key_base58: None,
        };
        match vm.key_material {
            Some(KeyMaterial::Jwk(jwk)) => raw.public_key_jwk = Some(jwk),
            Some(KeyMaterial::Multibase(s)) => raw.public_key_multibase = Some(s),
            Some(KeyMaterial::Base58(s)) => raw.public_key_base58 = Some(s),
            None => {}
        }
        raw
    }
}

/// Entry of a verification relationship (`authentication`, `assertionMethod`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VerificationRelationship {
    Reference(String),
    Embedded(VerificationMethod),
}

/// A service endpoint in a DID Document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    #[serde(rename = "type")]
    pub service_type: Value,
    pub service_endpoint: Value,
}

/// W3C DID Document, reduced to the parts proof validation consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
    #[serde(rename = "@context", default, deserialize_with = "one_or_many")]
    pub context: Vec<Value>,
    /// The DID subject.
    pub id: String,
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "one_or_many"
    )]
    pub controller: Vec<Value>,
    #[serde(default, rename = "verificationMethod")]
    pub verification_methods: Vec<VerificationMethod>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authentication: Vec<VerificationRelationship>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assertion_method: Vec<VerificationRelationship>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_agreement: Vec<VerificationRelationship>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capability_invocation: Vec<VerificationRelationship>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capability_delegation: Vec<VerificationRelationship>,
    #[serde(default, rename = "service", skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<Service>,
}

/// Default context for DID Documents built in code.
pub const DID_V1_CONTEXT: &str = "https://www.w3.org/ns/did/v1";

impl DidDocument {
    /// Create an empty document for `id`.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            context: vec![Value::String(DID_V1_CONTEXT.to_string())],
            id: id.into(),
            controller: Vec::new(),
            verification_methods: Vec::new(),
            authentication: Vec::new(),
            assertion_method: Vec::new(),
            key_agreement: Vec::new(),
            capability_invocation: Vec::new(),
            capability_delegation: Vec::new(),
            services: Vec::new(),
        }
    }

    /// Parse a DID Document from JSON text.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        if json.trim().is_empty() {
            return Err(CoreError::InvalidDocument("document is empty".into()));
        }
        serde_json::from_str(json).map_err(|e| CoreError::InvalidDocument(e.to_string()))
    }

    /// Builder-style helper to append a verification method.
    pub fn with_verification_method(mut self, vm: VerificationMethod) -> Self {
        self.verification_methods.push(vm);
        self
    }

    /// Expand a relative reference (`#key-1`) against this document's id.
    pub fn absolute_id(&self, id: &str) -> String {
        if id.starts_with('#') {
            format!("{}{}", self.id, id)
        } else {
            id.to_string()
        }
    }

    /// Find a verification method by id, looking in `verificationMethod`
    /// and in methods embedded in verification relationships.
    pub fn find_verification_method(&self, id: &str) -> Option<&VerificationMethod> {
        let wanted = self.absolute_id(id);
        let embedded = [
            &self.authentication,
            &self.assertion_method,
            &self.key_agreement,
            &self.capability_invocation,
            &self.capability_delegation,
        ]
        .into_iter()
        .flatten()
        .filter_map(|rel| match rel {
            VerificationRelationship::Embedded(vm) => Some(vm),
            VerificationRelationship::Reference(_) => None,
        });

        self.verification_methods
            .iter()
            .chain(embedded)
            .find(|vm| self.absolute_id(&vm.id) == wanted)
    }

    /// Find a service by id or fragment.
    pub fn find_service(&self, id: &str) -> Option<&Service> {
        let wanted = self.absolute_id(id);
        self.services
            .iter()
            .find(|s| self.absolute_id(&s.id) == wanted)
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        other => vec![other],
    })
}
