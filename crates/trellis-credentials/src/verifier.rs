use serde::Serialize;
use trellis_core::Credential;
use trellis_trust::TrustListValidator;

use crate::error::ValidationError;
use crate::validator::LinkedDataProofValidator;

/// Result of credential verification.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationResult {
    /// Whether the credential is valid.
    pub valid: bool,
    /// Individual check results.
    pub checks: Vec<VerificationCheck>,
}

/// An individual verification check.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationCheck {
    /// Name of the check.
    pub name: String,
    /// Whether the check passed.
    pub passed: bool,
    /// Optional detail message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl VerificationCheck {
    fn new(name: &str, passed: bool, failure: impl FnOnce() -> String) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: if passed { None } else { Some(failure()) },
        }
    }
}

/// Runs proof validation and issuer trust evaluation on a credential.
///
/// Typed validation errors propagate; only the two outcomes are reported as
/// checks.
pub struct CredentialVerifier {
    validator: LinkedDataProofValidator,
    trust: TrustListValidator,
}

impl CredentialVerifier {
    pub fn new(validator: LinkedDataProofValidator, trust: TrustListValidator) -> Self {
        Self { validator, trust }
    }

    pub fn validator(&self) -> &LinkedDataProofValidator {
        &self.validator
    }

    /// Verify a credential given as JSON text.
    pub async fn verify(&self, credential_json: &str) -> Result<VerificationResult, ValidationError> {
        let credential = Credential::parse(credential_json)?;
        self.verify_credential(&credential).await
    }

    pub async fn verify_credential(
        &self,
        credential: &Credential,
    ) -> Result<VerificationResult, ValidationError> {
        let mut checks = Vec::new();

        // Check 1: do the proofs verify?
        let proof_valid = self.validator.validate_credential(credential).await?;
        checks.push(VerificationCheck::new("proof_valid", proof_valid, || {
            "proof signature verification failed".into()
        }));

        // Check 2: is the issuer trusted?
        let issuer = credential.issuer().unwrap_or_default();
        let trust = self.trust.validate_issuer(issuer);
        checks.push(VerificationCheck::new("issuer_trusted", trust.is_ok(), || {
            trust
                .err()
                .map(|e| e.to_string())
                .unwrap_or_default()
        }));

        let valid = checks.iter().all(|c| c.passed);
        tracing::debug!(
            credential = credential.id().unwrap_or("?"),
            issuer = issuer,
            valid,
            "credential verified"
        );
        Ok(VerificationResult { valid, checks })
    }
}
