use async_trait::async_trait;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use ed25519_dalek::Verifier as _;

use trellis_core::{ProofSignature, ProofType};

use crate::error::CryptoError;
use crate::jws::CompactJws;
use crate::keys::{KeyFamily, PublicKey};

/// Low-level proof verification contract.
///
/// Returns `Ok(false)` when the signature does not verify (including when it
/// cannot be decoded) and `Err` only when the inputs cannot be checked at all.
#[async_trait]
pub trait ProofService: Send + Sync {
    async fn verify_proof(
        &self,
        proof_type: ProofType,
        message: &[u8],
        signature: &ProofSignature,
        public_key: &PublicKey,
        proof_purpose: &str,
    ) -> Result<bool, CryptoError>;
}

/// How a suite secures its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    /// Raw signature bytes in `proofValue`.
    ProofValue,
    /// Detached compact JWS in `jws`.
    Jws,
    /// Either of the above.
    Any,
}

struct Suite {
    proof_type: ProofType,
    families: &'static [KeyFamily],
    encoding: Encoding,
}

const SUITES: &[Suite] = &[
    Suite {
        proof_type: ProofType::Ed25519Signature2020,
        families: &[KeyFamily::Ed25519],
        encoding: Encoding::ProofValue,
    },
    Suite {
        proof_type: ProofType::Ed25519Signature2018,
        families: &[KeyFamily::Ed25519],
        encoding: Encoding::Any,
    },
    Suite {
        proof_type: ProofType::EcdsaSecp256k1Signature2019,
        families: &[KeyFamily::Secp256k1],
        encoding: Encoding::Any,
    },
    Suite {
        proof_type: ProofType::JsonWebSignature2020,
        families: &[KeyFamily::Ed25519, KeyFamily::Secp256k1],
        encoding: Encoding::Jws,
    },
];

fn suite(proof_type: ProofType) -> Result<&'static Suite, CryptoError> {
    SUITES
        .iter()
        .find(|s| s.proof_type == proof_type)
        .ok_or_else(|| CryptoError::UnsupportedAlgorithm(proof_type.to_string()))
}

/// Key families a proof suite can verify with.
pub fn suite_key_families(proof_type: ProofType) -> Result<&'static [KeyFamily], CryptoError> {
    Ok(suite(proof_type)?.families)
}

/// Default [`ProofService`] backed by `ed25519-dalek` and `k256`.
#[derive(Debug, Default, Clone)]
pub struct SuiteProofService;

impl SuiteProofService {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous form of [`ProofService::verify_proof`].
    pub fn verify(
        &self,
        proof_type: ProofType,
        message: &[u8],
        signature: &ProofSignature,
        public_key: &PublicKey,
    ) -> Result<bool, CryptoError> {
        let suite = suite(proof_type)?;
        if !suite.families.contains(&public_key.family()) {
            tracing::debug!(proof_type = %proof_type, family = ?public_key.family(), "key family not usable with suite");
            return Ok(false);
        }

        match (signature, suite.encoding) {
            (ProofSignature::ProofValue(value), Encoding::ProofValue | Encoding::Any) => {
                let Some(sig) = decode_proof_value(value) else {
                    tracing::debug!(proof_type = %proof_type, "proofValue could not be decoded");
                    return Ok(false);
                };
                verify_raw(public_key, message, &sig)
            }
            (ProofSignature::Jws(token), Encoding::Jws | Encoding::Any) => {
                let Some(jws) = CompactJws::parse(token) else {
                    tracing::debug!(proof_type = %proof_type, "jws could not be parsed");
                    return Ok(false);
                };
                if !alg_matches(&jws.header.alg, public_key.family()) {
                    tracing::debug!(alg = %jws.header.alg, family = ?public_key.family(), "jws alg does not match key");
                    return Ok(false);
                }
                let Some(input) = jws.signing_input(message) else {
                    return Ok(false);
                };
                verify_raw(public_key, &input, &jws.signature)
            }
            _ => {
                tracing::debug!(proof_type = %proof_type, "signature encoding not used by suite");
                Ok(false)
            }
        }
    }
}

#[async_trait]
impl ProofService for SuiteProofService {
    async fn verify_proof(
        &self,
        proof_type: ProofType,
        message: &[u8],
        signature: &ProofSignature,
        public_key: &PublicKey,
        proof_purpose: &str,
    ) -> Result<bool, CryptoError> {
        let valid = self.verify(proof_type, message, signature, public_key)?;
        tracing::debug!(proof_type = %proof_type, purpose = proof_purpose, valid, "proof signature checked");
        Ok(valid)
    }
}

fn alg_matches(alg: &str, family: KeyFamily) -> bool {
    matches!(
        (alg, family),
        ("EdDSA", KeyFamily::Ed25519) | ("ES256K", KeyFamily::Secp256k1)
    )
}

/// Decode a `proofValue`: multibase first, then base64 / base64url.
pub fn decode_proof_value(value: &str) -> Option<Vec<u8>> {
    if let Ok((_, bytes)) = multibase::decode(value) {
        return Some(bytes);
    }
    STANDARD
        .decode(value)
        .or_else(|_| URL_SAFE_NO_PAD.decode(value))
        .ok()
}

fn verify_raw(key: &PublicKey, message: &[u8], signature: &[u8]) -> Result<bool, CryptoError> {
    match key.family() {
        KeyFamily::Ed25519 => {
            let vk = key.ed25519()?;
            let Ok(sig) = ed25519_dalek::Signature::from_slice(signature) else {
                return Ok(false);
            };
            Ok(vk.verify(message, &sig).is_ok())
        }
        KeyFamily::Secp256k1 => {
            use k256::ecdsa::signature::Verifier as _;

            let vk = key.secp256k1()?;
            let sig = match k256::ecdsa::Signature::from_slice(signature)
                .or_else(|_| k256::ecdsa::Signature::from_der(signature))
            {
                Ok(sig) => sig,
                Err(_) => return Ok(false),
            };
            let sig = sig.normalize_s().unwrap_or(sig);
            Ok(vk.verify(message, &sig).is_ok())
        }
    }
}
