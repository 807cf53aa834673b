//! `did:key`: the DID is the multibase-encoded public key itself.

use async_trait::async_trait;
use serde_json::Value;
use trellis_core::{
    Did, DidDocument, KeyMaterial, VerificationMethod, VerificationMethodType,
    VerificationRelationship, DID_V1_CONTEXT,
};
use trellis_crypto::{KeyFamily, PublicKey};

use crate::error::DidResolutionError;
use crate::method::DidMethod;

pub(crate) const ED25519_2020_CONTEXT: &str = "https://w3id.org/security/suites/ed25519-2020/v1";
pub(crate) const SECP256K1_2019_CONTEXT: &str = "https://w3id.org/security/suites/secp256k1-2019/v1";

/// Resolves `did:key` DIDs locally (Ed25519 `z6Mk...`, secp256k1 `zQ3s...`).
#[derive(Debug, Default, Clone)]
pub struct DidKeyMethod;

impl DidKeyMethod {
    pub fn new() -> Self {
        Self
    }
}

/// Build the `did:key` DID for a public key.
pub fn did_key_for(key: &PublicKey) -> Result<Did, DidResolutionError> {
    let encoded = key
        .to_multibase()
        .map_err(|e| DidResolutionError::InvalidDid(e.to_string()))?;
    Ok(Did::new(format!("did:key:{encoded}"))?)
}

/// Expand a `did:key` DID into its DID Document.
pub fn did_key_document(did: &Did) -> Result<DidDocument, DidResolutionError> {
    if did.method() != "key" {
        return Err(DidResolutionError::MethodNotSupported(did.method().to_string()));
    }
    let encoded = did.method_specific_id();
    let key = decode_multikey(did, encoded)?;

    let (method_type, suite_context) = match key.family() {
        KeyFamily::Ed25519 => (
            VerificationMethodType::Ed25519VerificationKey2020,
            ED25519_2020_CONTEXT,
        ),
        KeyFamily::Secp256k1 => (
            VerificationMethodType::EcdsaSecp256k1VerificationKey2019,
            SECP256K1_2019_CONTEXT,
        ),
    };
    Ok(single_key_document(did, encoded, method_type, suite_context))
}

/// Decode a base58btc multicodec key (`z6Mk...`, `zQ3s...`) embedded in `did`.
pub(crate) fn decode_multikey(did: &Did, encoded: &str) -> Result<PublicKey, DidResolutionError> {
    let invalid = |reason: String| DidResolutionError::InvalidDid(format!("{did}: {reason}"));

    let (base, bytes) = multibase::decode(encoded).map_err(|e| invalid(e.to_string()))?;
    if base != multibase::Base::Base58Btc {
        return Err(invalid(format!("did:{} keys must use base58btc multibase", did.method())));
    }
    PublicKey::from_multicodec(&bytes).map_err(|e| invalid(e.to_string()))
}

/// Document whose only verification method is `{did}#{encoded}`, referenced
/// from every verification relationship except key agreement.
pub(crate) fn single_key_document(
    did: &Did,
    encoded: &str,
    method_type: VerificationMethodType,
    suite_context: &str,
) -> DidDocument {
    let vm_id = format!("{did}#{encoded}");
    let mut doc = DidDocument::new(did.as_str()).with_verification_method(VerificationMethod::new(
        vm_id.clone(),
        method_type.as_str(),
        did.as_str(),
        Some(KeyMaterial::Multibase(encoded.to_string())),
    ));
    doc.context = vec![
        Value::String(DID_V1_CONTEXT.to_string()),
        Value::String(suite_context.to_string()),
    ];
    for relationship in [
        &mut doc.authentication,
        &mut doc.assertion_method,
        &mut doc.capability_invocation,
        &mut doc.capability_delegation,
    ] {
        relationship.push(VerificationRelationship::Reference(vm_id.clone()));
    }
    doc
}

#[async_trait]
impl DidMethod for DidKeyMethod {
    fn name(&self) -> &str {
        "key"
    }

    async fn resolve(&self, did: &Did) -> Result<DidDocument, DidResolutionError> {
        did_key_document(did)
    }
}
