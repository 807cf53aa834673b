//! Trellis Credentials — Linked-Data proof validation for Verifiable
//! Credentials and Presentations, plus a verifier that combines proof
//! validity with issuer trust.

pub mod error;
pub mod policy;
pub mod validator;
pub mod verifier;

pub use error::{ErrorKind, ValidationError};
pub use policy::{ProofPolicy, ProofPurposePolicy};
pub use validator::{LinkedDataProofValidator, PresentationOptions};
pub use verifier::{CredentialVerifier, VerificationCheck, VerificationResult};
