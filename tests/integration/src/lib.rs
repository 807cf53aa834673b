//! Signing fixtures for the cross-crate tests.
//!
//! Trellis only verifies; these helpers produce the signed documents the
//! tests feed it.

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ed25519_dalek::{Signer as _, SigningKey};
use rand::rngs::OsRng;
use serde_json::{json, Value};
use trellis_canon::{CanonicalizationService, Urdna2015Canonicalizer};
use trellis_core::Did;
use trellis_credentials::LinkedDataProofValidator;
use trellis_crypto::jws::detached_header;
use trellis_crypto::{KeyFamily, PublicKey, SuiteProofService};
use trellis_identity::{
    did_key_for, did_peer_for, DidKeyMethod, DidMethodRegistry, DidPeerMethod, DidResolver,
    RegistryDidResolver,
};

/// An Ed25519 signer identified by a DID and verification method id.
pub struct TestSigner {
    key: SigningKey,
    pub did: String,
    pub verification_method: String,
}

impl TestSigner {
    /// Fresh key published as `did:key`.
    pub fn did_key() -> Self {
        let key = SigningKey::generate(&mut OsRng);
        let did = did_key_for(&Self::public(&key)).expect("did:key from fresh key");
        let verification_method = format!("{did}#{}", did.method_specific_id());
        Self {
            key,
            did: did.to_string(),
            verification_method,
        }
    }

    /// Fresh key published as `did:peer:0`.
    pub fn did_peer() -> Self {
        let key = SigningKey::generate(&mut OsRng);
        let did = did_peer_for(&Self::public(&key)).expect("did:peer from fresh key");
        let verification_method = format!("{did}#{}", &did.method_specific_id()[1..]);
        Self {
            key,
            did: did.to_string(),
            verification_method,
        }
    }

    /// Fresh key for a DID whose document is published elsewhere.
    pub fn with_did(did: &str, fragment: &str) -> Self {
        Self {
            key: SigningKey::generate(&mut OsRng),
            did: did.to_string(),
            verification_method: format!("{did}#{fragment}"),
        }
    }

    fn public(key: &SigningKey) -> PublicKey {
        PublicKey::from_bytes(KeyFamily::Ed25519, key.verifying_key().as_bytes())
            .expect("valid ed25519 key")
    }

    pub fn public_key(&self) -> PublicKey {
        Self::public(&self.key)
    }

    pub fn public_key_multibase(&self) -> String {
        self.public_key().to_multibase().expect("multibase key")
    }

    /// OKP JWK of the public key.
    pub fn public_key_jwk(&self) -> Value {
        json!({
            "kty": "OKP",
            "crv": "Ed25519",
            "x": URL_SAFE_NO_PAD.encode(self.key.verifying_key().as_bytes())
        })
    }

    /// Attach an `Ed25519Signature2020` proof over the canonical document.
    pub fn sign(&self, document: &Value) -> Value {
        let value = multibase::encode(multibase::Base::Base58Btc, self.raw_signature(document));
        self.attach(document, "Ed25519Signature2020", json!({ "proofValue": value }))
    }

    /// Attach a `JsonWebSignature2020` proof with a detached EdDSA JWS.
    pub fn sign_jws(&self, document: &Value) -> Value {
        let header = detached_header("EdDSA");
        let mut input = header.as_bytes().to_vec();
        input.push(b'.');
        input.extend_from_slice(&canonical(document));
        let signature = URL_SAFE_NO_PAD.encode(self.key.sign(&input).to_bytes());
        self.attach(
            document,
            "JsonWebSignature2020",
            json!({ "jws": format!("{header}..{signature}") }),
        )
    }

    /// Attach an `authentication` proof bound to `challenge` and `domain`.
    pub fn sign_presentation(&self, presentation: &Value, challenge: &str, domain: &str) -> Value {
        let mut signed = self.sign(presentation);
        signed["proof"]["proofPurpose"] = json!("authentication");
        signed["proof"]["challenge"] = json!(challenge);
        signed["proof"]["domain"] = json!(domain);
        signed
    }

    /// Proof object signed by this signer, for documents that carry several.
    pub fn proof_for(&self, document: &Value) -> Value {
        self.sign(document)["proof"].clone()
    }

    fn raw_signature(&self, document: &Value) -> Vec<u8> {
        self.key.sign(&canonical(document)).to_bytes().to_vec()
    }

    fn attach(&self, document: &Value, proof_type: &str, signature: Value) -> Value {
        let mut proof = json!({
            "type": proof_type,
            "created": "2024-06-01T12:00:00Z",
            "verificationMethod": self.verification_method,
            "proofPurpose": "assertionMethod"
        });
        if let (Some(proof), Some(signature)) = (proof.as_object_mut(), signature.as_object()) {
            proof.extend(signature.clone());
        }
        let mut signed = unsigned(document);
        signed["proof"] = proof;
        signed
    }
}

fn unsigned(document: &Value) -> Value {
    let mut copy = document.clone();
    if let Some(map) = copy.as_object_mut() {
        map.remove("proof");
    }
    copy
}

/// Canonical N-Quads of `document` without its proof.
pub fn canonical(document: &Value) -> Vec<u8> {
    Urdna2015Canonicalizer::new()
        .canonicalize_json_ld(&unsigned(document))
        .expect("canonicalizable fixture")
}

/// A minimal credentials-v1 credential.
pub fn sample_credential(issuer: &str, subject: &str) -> Value {
    json!({
        "@context": ["https://www.w3.org/2018/credentials/v1"],
        "id": "urn:uuid:0b4a4e5c-97c5-4a36-a4b5-8f1a2c3d4e5f",
        "type": ["VerifiableCredential", "MembershipCredential"],
        "issuer": issuer,
        "issuanceDate": "2024-06-01T12:00:00Z",
        "credentialSubject": {
            "id": subject,
            "memberOf": "Trellis Cooperative",
            "level": 3
        }
    })
}

/// A presentation by `holder` wrapping `credentials`, without a proof.
pub fn sample_presentation(holder: &str, credentials: Vec<Value>) -> Value {
    json!({
        "@context": ["https://www.w3.org/2018/credentials/v1"],
        "type": ["VerifiablePresentation"],
        "holder": holder,
        "verifiableCredential": credentials
    })
}

/// Resolver for `did:key` only.
pub fn did_key_resolver() -> Arc<dyn DidResolver> {
    let registry = Arc::new(DidMethodRegistry::new());
    registry.register(Arc::new(DidKeyMethod::new()));
    Arc::new(RegistryDidResolver::new(registry))
}

/// Resolver for the locally resolved methods, `did:key` and `did:peer`.
pub fn local_resolver() -> Arc<dyn DidResolver> {
    let registry = Arc::new(DidMethodRegistry::new());
    registry.register(Arc::new(DidKeyMethod::new()));
    registry.register(Arc::new(DidPeerMethod::new()));
    Arc::new(RegistryDidResolver::new(registry))
}

/// Validator with the default canonicalizer and suite verifier.
pub fn validator(resolver: Arc<dyn DidResolver>) -> LinkedDataProofValidator {
    LinkedDataProofValidator::new(
        resolver,
        Arc::new(Urdna2015Canonicalizer::new()),
        Arc::new(SuiteProofService::new()),
    )
}

/// Parse a DID, panicking on fixtures that are not DIDs.
pub fn did(value: &str) -> Did {
    Did::new(value).expect("fixture DID")
}
