use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::proof::{parse_proofs, Proof};

/// A JSON-LD credential or presentation kept as its raw object.
///
/// Only the members proof validation needs are interpreted; everything else
/// is carried through untouched so it stays covered by the signature.
#[derive(Debug, Clone, PartialEq)]
pub struct Credential {
    inner: Map<String, Value>,
}

impl Credential {
    /// Parse JSON text into a credential envelope.
    pub fn parse(json: &str) -> Result<Self, CoreError> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| CoreError::MalformedCredential(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, CoreError> {
        match value {
            Value::Object(inner) => Ok(Self { inner }),
            _ => Err(CoreError::MalformedCredential(
                "credential must be a JSON object".into(),
            )),
        }
    }

    /// `issuer`, either a string or an object with an `id`.
    pub fn issuer(&self) -> Option<&str> {
        id_of(self.inner.get("issuer")?)
    }

    /// `holder` of a presentation, either a string or an object with an `id`.
    pub fn holder(&self) -> Option<&str> {
        id_of(self.inner.get("holder")?)
    }

    pub fn id(&self) -> Option<&str> {
        self.inner.get("id").and_then(Value::as_str)
    }

    /// Values of `type`, accepting a single string or an array.
    pub fn types(&self) -> Vec<&str> {
        match self.inner.get("type") {
            Some(Value::String(s)) => vec![s.as_str()],
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }

    pub fn is_presentation(&self) -> bool {
        self.types().contains(&"VerifiablePresentation")
    }

    /// All proofs attached to this document.
    pub fn proofs(&self) -> Result<Vec<Proof>, CoreError> {
        parse_proofs(self.inner.get("proof"))
    }

    /// Copy of the document with the `proof` member removed.
    pub fn without_proof(&self) -> Value {
        let mut inner = self.inner.clone();
        inner.remove("proof");
        Value::Object(inner)
    }

    /// Embedded credentials of a presentation.
    pub fn verifiable_credentials(&self) -> Result<Vec<Credential>, CoreError> {
        match self.inner.get("verifiableCredential") {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => items.iter().cloned().map(Self::from_value).collect(),
            Some(other) => Ok(vec![Self::from_value(other.clone())?]),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.inner.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.inner
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.inner)
    }
}

fn id_of(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s.as_str()),
        Value::Object(obj) => obj.get("id").and_then(Value::as_str),
        _ => None,
    }
}
