use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;

/// Signature carried by a proof. Exactly one encoding is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProofSignature {
    /// `proofValue`, multibase or base64 encoded.
    ProofValue(String),
    /// `jws`, compact serialization (detached or attached payload).
    Jws(String),
}

/// A Linked-Data proof attached to a credential or presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawProof", into = "RawProof")]
pub struct Proof {
    /// Suite name as written in the document; parsed into a
    /// [`ProofType`](crate::ProofType) at validation time.
    pub proof_type: String,
    /// Creation timestamp, kept verbatim.
    pub created: Option<String>,
    /// DID URL of the verification method, absolute or relative.
    pub verification_method: String,
    pub proof_purpose: String,
    pub signature: ProofSignature,
    pub challenge: Option<String>,
    pub domain: Option<String>,
}

impl Proof {
    /// Parse one proof object.
    pub fn from_value(value: &Value) -> Result<Self, CoreError> {
        if !value.is_object() {
            return Err(CoreError::MalformedProof(
                "proof entry must be an object".into(),
            ));
        }
        let raw: RawProof = serde_json::from_value(value.clone())
            .map_err(|e| CoreError::MalformedProof(e.to_string()))?;
        Self::try_from(raw)
    }

    /// Parsed `created` timestamp, if present and RFC 3339.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProof {
    #[serde(rename = "type")]
    proof_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created: Option<String>,
    verification_method: String,
    proof_purpose: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    proof_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    jws: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    challenge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    domain: Option<String>,
}

impl TryFrom<RawProof> for Proof {
    type Error = CoreError;

    fn try_from(raw: RawProof) -> Result<Self, Self::Error> {
        let signature = match (raw.proof_value, raw.jws) {
            (Some(value), None) => ProofSignature::ProofValue(value),
            (None, Some(jws)) => ProofSignature::Jws(jws),
            (Some(_), Some(_)) => {
                return Err(CoreError::MalformedProof(
                    "proof carries both proofValue and jws".into(),
                ))
            }
            (None, None) => {
                return Err(CoreError::MalformedProof(
                    "proof carries neither proofValue nor jws".into(),
                ))
            }
        };
        if raw.verification_method.is_empty() {
            return Err(CoreError::MalformedProof(
                "proof verificationMethod is empty".into(),
            ));
        }
        Ok(Self {
            proof_type: raw.proof_type,
            created: raw.created,
            verification_method: raw.verification_method,
            proof_purpose: raw.proof_purpose,
            signature,
            challenge: raw.challenge,
            domain: raw.domain,
        })
    }
}

impl From<Proof> for RawProof {
    fn from(proof: Proof) -> Self {
        let (proof_value, jws) = match proof.signature {
            ProofSignature::ProofValue(v) => (Some(v), None),
            ProofSignature::Jws(j) => (None, Some(j)),
        };
        Self {
            proof_type: proof.proof_type,
            created: proof.created,
            verification_method: proof.verification_method,
            proof_purpose: proof.proof_purpose,
            proof_value,
            jws,
            challenge: proof.challenge,
            domain: proof.domain,
        }
    }
}

/// Normalize a `proof` member into a list of proofs.
///
/// Absent, `null`, scalar and empty-array values are all rejected with a
/// [`CoreError::MalformedProof`].
pub fn parse_proofs(value: Option<&Value>) -> Result<Vec<Proof>, CoreError> {
    match value {
        None => Err(CoreError::MalformedProof("proof is missing".into())),
        Some(Value::Null) => Err(CoreError::MalformedProof("proof is null".into())),
        Some(obj @ Value::Object(_)) => Ok(vec![Proof::from_value(obj)?]),
        Some(Value::Array(items)) if items.is_empty() => {
            Err(CoreError::MalformedProof("proof array is empty".into()))
        }
        Some(Value::Array(items)) => items.iter().map(Proof::from_value).collect(),
        Some(other) => Err(CoreError::MalformedProof(format!(
            "proof must be an object or array, got {}",
            json_kind(other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
