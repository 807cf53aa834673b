//! Trellis Core — DIDs, DID Documents, proofs, credential envelopes and
//! configuration shared by the Trellis verification crates.

pub mod config;
pub mod credential;
pub mod document;
pub mod error;
pub mod proof;
pub mod telemetry;
pub mod types;

pub use config::{
    CanonicalizationConfig, LoggingConfig, ResolverConfig, TrellisConfig, TrustConfig,
    TrustSourceConfig, WebResolverConfig, DEFAULT_VOCAB,
};
pub use credential::Credential;
pub use document::{
    DidDocument, KeyMaterial, Service, VerificationMethod, VerificationRelationship,
    DID_V1_CONTEXT,
};
pub use error::{ConfigError, CoreError};
pub use proof::{parse_proofs, Proof, ProofSignature};
pub use types::{Did, DidUrl, ProofType, VerificationMethodType};
