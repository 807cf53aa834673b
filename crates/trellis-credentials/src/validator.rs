use std::str::FromStr;
use std::sync::Arc;

use trellis_canon::CanonicalizationService;
use trellis_core::{Credential, Proof, ProofType, VerificationMethodType};
use trellis_crypto::{decode_verification_method, suite_key_families, ProofService};
use trellis_identity::DidResolver;

use crate::error::ValidationError;
use crate::policy::ProofPolicy;

/// Expected binding values for presentation proofs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresentationOptions {
    pub challenge: Option<String>,
    pub domain: Option<String>,
}

/// Validates the Linked-Data proofs attached to credentials and
/// presentations.
///
/// Every proof is checked; the result is `true` only if all of them verify.
/// A signature mismatch yields `Ok(false)`. Anything that prevents a proof
/// from being checked is returned as an error, even when an earlier proof
/// already failed.
#[derive(Clone)]
pub struct LinkedDataProofValidator {
    resolver: Arc<dyn DidResolver>,
    canonicalizer: Arc<dyn CanonicalizationService>,
    proof_service: Arc<dyn ProofService>,
    policy: Option<Arc<dyn ProofPolicy>>,
}

impl LinkedDataProofValidator {
    pub fn new(
        resolver: Arc<dyn DidResolver>,
        canonicalizer: Arc<dyn CanonicalizationService>,
        proof_service: Arc<dyn ProofService>,
    ) -> Self {
        Self {
            resolver,
            canonicalizer,
            proof_service,
            policy: None,
        }
    }

    /// Run `policy` on every proof before its signature is checked.
    pub fn with_policy(mut self, policy: Arc<dyn ProofPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Validate the proofs of a credential given as JSON text.
    pub async fn validate(&self, credential_json: &str) -> Result<bool, ValidationError> {
        let credential = Credential::parse(credential_json)?;
        self.validate_credential(&credential).await
    }

    /// Validate the proofs of a parsed credential against its issuer.
    pub async fn validate_credential(&self, credential: &Credential) -> Result<bool, ValidationError> {
        let proofs = credential.proofs()?;
        let issuer = credential
            .issuer()
            .ok_or_else(|| ValidationError::MalformedCredential("credential has no issuer".into()))?;
        self.validate_proofs(credential, &proofs, issuer, None).await
    }

    /// Validate a presentation: its own proofs against `holder`, then every
    /// embedded credential.
    ///
    /// A proof whose `challenge` or `domain` differs from `options` does not
    /// verify.
    pub async fn validate_presentation(
        &self,
        presentation_json: &str,
        options: &PresentationOptions,
    ) -> Result<bool, ValidationError> {
        let presentation = Credential::parse(presentation_json)?;
        if !presentation.is_presentation() {
            return Err(ValidationError::MalformedCredential(
                "document is not a VerifiablePresentation".into(),
            ));
        }
        let proofs = presentation.proofs()?;
        let holder = presentation.holder().ok_or_else(|| {
            ValidationError::MalformedCredential("presentation has no holder".into())
        })?;

        let mut valid = self
            .validate_proofs(&presentation, &proofs, holder, Some(options))
            .await?;

        for credential in presentation.verifiable_credentials()? {
            let credential_valid = self.validate_credential(&credential).await?;
            if !credential_valid {
                tracing::debug!(credential = credential.id().unwrap_or("?"), "embedded credential failed validation");
            }
            valid &= credential_valid;
        }
        Ok(valid)
    }

    async fn validate_proofs(
        &self,
        document: &Credential,
        proofs: &[Proof],
        signer: &str,
        options: Option<&PresentationOptions>,
    ) -> Result<bool, ValidationError> {
        let did_document = self.resolver.resolve(signer).await?;
        let mut message: Option<Vec<u8>> = None;
        let mut all_valid = true;

        for proof in proofs {
            let vm_ref = method_reference(&proof.verification_method);
            let vm = did_document
                .find_verification_method(&vm_ref)
                .ok_or_else(|| ValidationError::VerificationMethodNotFound(proof.verification_method.clone()))?;

            let proof_type = ProofType::from_str(&proof.proof_type)?;
            let key_type = VerificationMethodType::from_str(&vm.method_type)?;
            if !proof_type.accepts(key_type) {
                return Err(ValidationError::TypeMismatch {
                    proof_type: proof_type.to_string(),
                    key_type: key_type.to_string(),
                });
            }
            let public_key = decode_verification_method(vm)?;
            // Multikey and JWK methods only reveal their family once decoded.
            if !suite_key_families(proof_type)?.contains(&public_key.family()) {
                return Err(ValidationError::TypeMismatch {
                    proof_type: proof_type.to_string(),
                    key_type: format!("{key_type} ({:?} key)", public_key.family()),
                });
            }

            if let Some(policy) = &self.policy {
                policy
                    .check(document, proof)
                    .map_err(ValidationError::PolicyRejected)?;
            }

            if message.is_none() {
                message = Some(self.canonicalizer.canonicalize_json_ld(&document.without_proof())?);
            }
            let bytes = message.as_deref().unwrap_or_default();

            let mut valid = self
                .proof_service
                .verify_proof(proof_type, bytes, &proof.signature, &public_key, &proof.proof_purpose)
                .await?;

            if let Some(options) = options {
                valid &= bindings_match(proof, options);
            }

            tracing::debug!(
                signer = signer,
                verification_method = %vm.id,
                proof_type = %proof_type,
                valid,
                "proof checked"
            );
            all_valid &= valid;
        }

        Ok(all_valid)
    }
}

/// Verification method reference as looked up in the signer's document.
///
/// Absolute DID URLs and `#fragment`s are used as written; a bare key id
/// (`key-1`) is treated as a fragment of the document.
fn method_reference(verification_method: &str) -> String {
    if verification_method.contains(':') || verification_method.starts_with('#') {
        verification_method.to_string()
    } else {
        format!("#{verification_method}")
    }
}

fn bindings_match(proof: &Proof, options: &PresentationOptions) -> bool {
    let matches = |expected: &Option<String>, actual: &Option<String>| {
        expected.is_none() || expected == actual
    };
    let ok = matches(&options.challenge, &proof.challenge) && matches(&options.domain, &proof.domain);
    if !ok {
        tracing::debug!(
            challenge = ?proof.challenge,
            domain = ?proof.domain,
            "presentation proof challenge or domain mismatch"
        );
    }
    ok
}
