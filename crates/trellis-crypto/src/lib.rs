//! Trellis Crypto — verification-key decoding and Linked-Data proof suite
//! verification (Ed25519, secp256k1, detached JWS).

pub mod error;
pub mod jws;
pub mod keys;
pub mod proof_service;

pub use error::CryptoError;
pub use keys::{decode_jwk, decode_verification_method, KeyFamily, PublicKey};
pub use proof_service::{decode_proof_value, suite_key_families, ProofService, SuiteProofService};
