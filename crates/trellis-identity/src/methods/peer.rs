//! `did:peer` numalgo 0: an inception key wrapped as `did:peer:0<multikey>`.
//!
//! Numalgo 0 is stateless, so `update` and `deactivate` keep the trait
//! defaults.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use trellis_core::{Did, DidDocument, VerificationMethodType};
use trellis_crypto::{decode_jwk, KeyFamily, PublicKey};

use super::key::{decode_multikey, single_key_document, SECP256K1_2019_CONTEXT};
use crate::error::DidResolutionError;
use crate::method::DidMethod;

const MULTIKEY_CONTEXT: &str = "https://w3id.org/security/multikey/v1";

/// Creates and resolves `did:peer:0` DIDs.
#[derive(Debug, Default, Clone)]
pub struct DidPeerMethod;

impl DidPeerMethod {
    pub fn new() -> Self {
        Self
    }
}

/// Build the numalgo 0 `did:peer` DID for a public key.
pub fn did_peer_for(key: &PublicKey) -> Result<Did, DidResolutionError> {
    let encoded = key
        .to_multibase()
        .map_err(|e| DidResolutionError::InvalidDid(e.to_string()))?;
    Ok(Did::new(format!("did:peer:0{encoded}"))?)
}

/// Expand a numalgo 0 `did:peer` DID into its DID Document.
pub fn did_peer_document(did: &Did) -> Result<DidDocument, DidResolutionError> {
    if did.method() != "peer" {
        return Err(DidResolutionError::MethodNotSupported(did.method().to_string()));
    }
    let msid = did.method_specific_id();
    let Some(encoded) = msid.strip_prefix('0') else {
        let numalgo = msid.chars().next().map(String::from).unwrap_or_default();
        return Err(numalgo_not_supported(&numalgo));
    };
    let key = decode_multikey(did, encoded)?;

    let (method_type, suite_context) = match key.family() {
        KeyFamily::Ed25519 => (VerificationMethodType::Multikey, MULTIKEY_CONTEXT),
        KeyFamily::Secp256k1 => (
            VerificationMethodType::EcdsaSecp256k1VerificationKey2019,
            SECP256K1_2019_CONTEXT,
        ),
    };
    Ok(single_key_document(did, encoded, method_type, suite_context))
}

fn numalgo_not_supported(numalgo: &str) -> DidResolutionError {
    DidResolutionError::OperationNotSupported {
        method: "peer".to_string(),
        operation: format!("numalgo {numalgo}"),
    }
}

fn invalid_options(reason: impl Into<String>) -> DidResolutionError {
    DidResolutionError::InvalidOptions {
        method: "peer".to_string(),
        reason: reason.into(),
    }
}

/// The inception key from `publicKeyMultibase` or `publicKeyJwk`.
fn key_from_options(options: &Value) -> Result<PublicKey, DidResolutionError> {
    if let Some(encoded) = options.get("publicKeyMultibase") {
        let encoded = encoded
            .as_str()
            .ok_or_else(|| invalid_options("publicKeyMultibase must be a string"))?;
        let (base, bytes) =
            multibase::decode(encoded).map_err(|e| invalid_options(e.to_string()))?;
        if base != multibase::Base::Base58Btc {
            return Err(invalid_options("publicKeyMultibase must use base58btc"));
        }
        return PublicKey::from_multicodec(&bytes).map_err(|e| invalid_options(e.to_string()));
    }
    if let Some(jwk) = options.get("publicKeyJwk") {
        let jwk = jwk
            .as_object()
            .ok_or_else(|| invalid_options("publicKeyJwk must be an object"))?;
        return decode_jwk(jwk).map_err(|e| invalid_options(e.to_string()));
    }
    Err(invalid_options("publicKeyMultibase or publicKeyJwk is required"))
}

#[async_trait]
impl DidMethod for DidPeerMethod {
    fn name(&self) -> &str {
        "peer"
    }

    async fn resolve(&self, did: &Did) -> Result<DidDocument, DidResolutionError> {
        did_peer_document(did)
    }

    async fn create(&self, options: &Value) -> Result<DidDocument, DidResolutionError> {
        match options.get("numalgo") {
            None => {}
            Some(n) if n.as_u64() == Some(0) => {}
            Some(n) => return Err(numalgo_not_supported(&n.to_string())),
        }
        let key = key_from_options(options)?;
        let did = did_peer_for(&key)?;
        debug!(did = %did, family = ?key.family(), "created did:peer");
        did_peer_document(&did)
    }
}
