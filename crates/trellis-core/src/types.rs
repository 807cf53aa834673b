use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Decentralized Identifier.
/// Format: `did:<method>:<method-specific-id>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did(String);

impl Did {
    /// Parse and validate a DID string.
    pub fn new(uri: impl Into<String>) -> Result<Self, CoreError> {
        let uri = uri.into();
        let rest = uri.strip_prefix("did:").ok_or_else(|| {
            CoreError::InvalidDid(format!("DID must start with 'did:', got: {}", uri))
        })?;

        let (method, id) = rest.split_once(':').ok_or_else(|| {
            CoreError::InvalidDid(format!(
                "DID must have format 'did:<method>:<identifier>', got: {}",
                uri
            ))
        })?;

        if method.is_empty()
            || !method
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(CoreError::InvalidDid(format!(
                "invalid method name '{}' in {}",
                method, uri
            )));
        }

        if id.is_empty() || id.ends_with(':') || !id.chars().all(is_idchar) {
            return Err(CoreError::InvalidDid(format!(
                "invalid method-specific identifier in {}",
                uri
            )));
        }

        Ok(Self(uri))
    }

    /// Get the full DID string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The method name (`key`, `web`, ...).
    pub fn method(&self) -> &str {
        self.0.split(':').nth(1).unwrap_or_default()
    }

    /// Everything after `did:<method>:`.
    pub fn method_specific_id(&self) -> &str {
        self.0.splitn(3, ':').nth(2).unwrap_or_default()
    }
}

fn is_idchar(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '%' | ':')
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Did {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Did {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Did> for String {
    fn from(did: Did) -> Self {
        did.0
    }
}

impl AsRef<str> for Did {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A DID URL: a DID plus optional path, query and fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DidUrl {
    did: Did,
    path: Option<String>,
    query: Option<String>,
    fragment: Option<String>,
}

impl DidUrl {
    /// Parse a DID URL such as `did:example:123/path?service=x#key-1`.
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let (before_fragment, fragment) = match input.split_once('#') {
            Some((head, frag)) => (head, Some(frag.to_string())),
            None => (input, None),
        };
        let (before_query, query) = match before_fragment.split_once('?') {
            Some((head, q)) => (head, Some(q.to_string())),
            None => (before_fragment, None),
        };
        let (did_part, path) = match before_query.find('/') {
            Some(idx) => (
                &before_query[..idx],
                Some(before_query[idx..].to_string()),
            ),
            None => (before_query, None),
        };

        let did = Did::new(did_part)
            .map_err(|e| CoreError::InvalidDidUrl(format!("{}: {}", input, e)))?;

        if fragment.as_deref() == Some("") {
            return Err(CoreError::InvalidDidUrl(format!("empty fragment in {}", input)));
        }

        Ok(Self {
            did,
            path,
            query,
            fragment,
        })
    }

    /// The DID this URL is rooted at.
    pub fn did(&self) -> &Did {
        &self.did
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    /// Value of a single query parameter, if present.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.as_deref()?.split('&').find_map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (k == name).then_some(v)
        })
    }
}

impl fmt::Display for DidUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.did)?;
        if let Some(path) = &self.path {
            write!(f, "{}", path)?;
        }
        if let Some(query) = &self.query {
            write!(f, "?{}", query)?;
        }
        if let Some(fragment) = &self.fragment {
            write!(f, "#{}", fragment)?;
        }
        Ok(())
    }
}

impl FromStr for DidUrl {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Linked-Data proof suites this workspace can check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProofType {
    Ed25519Signature2020,
    Ed25519Signature2018,
    EcdsaSecp256k1Signature2019,
    JsonWebSignature2020,
}

impl ProofType {
    /// All known proof suites.
    pub const ALL: [ProofType; 4] = [
        ProofType::Ed25519Signature2020,
        ProofType::Ed25519Signature2018,
        ProofType::EcdsaSecp256k1Signature2019,
        ProofType::JsonWebSignature2020,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ed25519Signature2020 => "Ed25519Signature2020",
            Self::Ed25519Signature2018 => "Ed25519Signature2018",
            Self::EcdsaSecp256k1Signature2019 => "EcdsaSecp256k1Signature2019",
            Self::JsonWebSignature2020 => "JsonWebSignature2020",
        }
    }

    /// Verification method types a proof of this suite may reference.
    pub fn compatible_key_types(&self) -> &'static [VerificationMethodType] {
        use VerificationMethodType::*;
        match self {
            Self::Ed25519Signature2020 => &[Ed25519VerificationKey2020, Multikey],
            Self::Ed25519Signature2018 => &[Ed25519VerificationKey2018],
            Self::EcdsaSecp256k1Signature2019 => &[EcdsaSecp256k1VerificationKey2019],
            Self::JsonWebSignature2020 => &[JsonWebKey2020],
        }
    }

    /// Whether a verification method of `key_type` may back this proof.
    pub fn accepts(&self, key_type: VerificationMethodType) -> bool {
        self.compatible_key_types().contains(&key_type)
    }
}

impl fmt::Display for ProofType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProofType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::UnsupportedProofType(s.to_string()))
    }
}

/// Verification method types with a key decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerificationMethodType {
    Ed25519VerificationKey2020,
    Ed25519VerificationKey2018,
    EcdsaSecp256k1VerificationKey2019,
    JsonWebKey2020,
    Multikey,
}

impl VerificationMethodType {
    pub const ALL: [VerificationMethodType; 5] = [
        VerificationMethodType::Ed25519VerificationKey2020,
        VerificationMethodType::Ed25519VerificationKey2018,
        VerificationMethodType::EcdsaSecp256k1VerificationKey2019,
        VerificationMethodType::JsonWebKey2020,
        VerificationMethodType::Multikey,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ed25519VerificationKey2020 => "Ed25519VerificationKey2020",
            Self::Ed25519VerificationKey2018 => "Ed25519VerificationKey2018",
            Self::EcdsaSecp256k1VerificationKey2019 => "EcdsaSecp256k1VerificationKey2019",
            Self::JsonWebKey2020 => "JsonWebKey2020",
            Self::Multikey => "Multikey",
        }
    }
}

impl fmt::Display for VerificationMethodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerificationMethodType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::UnsupportedKeyType(s.to_string()))
    }
}
