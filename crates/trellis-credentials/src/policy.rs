use trellis_core::{Credential, Proof};

/// Optional per-proof check run before signature verification.
///
/// Freshness, expiry or purpose rules live here; the validator itself
/// enforces none. An `Err` carries the rejection reason.
pub trait ProofPolicy: Send + Sync {
    fn check(&self, document: &Credential, proof: &Proof) -> Result<(), String>;
}

impl<F> ProofPolicy for F
where
    F: Fn(&Credential, &Proof) -> Result<(), String> + Send + Sync,
{
    fn check(&self, document: &Credential, proof: &Proof) -> Result<(), String> {
        self(document, proof)
    }
}

/// Requires every proof to declare one of the given `proofPurpose` values.
#[derive(Debug, Clone)]
pub struct ProofPurposePolicy {
    allowed: Vec<String>,
}

impl ProofPurposePolicy {
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    /// `assertionMethod` for credentials.
    pub fn assertion() -> Self {
        Self::new(["assertionMethod"])
    }
}

impl ProofPolicy for ProofPurposePolicy {
    fn check(&self, _document: &Credential, proof: &Proof) -> Result<(), String> {
        if self.allowed.iter().any(|p| p == &proof.proof_purpose) {
            Ok(())
        } else {
            Err(format!(
                "proof purpose {} is not one of [{}]",
                proof.proof_purpose,
                self.allowed.join(", ")
            ))
        }
    }
}
