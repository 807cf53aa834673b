//! Integration test: credential and presentation validation end to end.
//!
//! Tests that credentials signed by a `did:key` or `did:peer` issuer are resolved,
//! canonicalized and verified across the identity, canon, crypto and
//! credentials crates.

use serde_json::{json, Value};
use trellis_credentials::{ErrorKind, PresentationOptions, ProofPurposePolicy, ValidationError};
use trellis_integration_tests::{
    did_key_resolver, local_resolver, sample_credential, sample_presentation, validator,
    TestSigner,
};

use std::sync::Arc;

fn issue(signer: &TestSigner) -> Value {
    signer.sign(&sample_credential(&signer.did, "did:example:holder"))
}

// ============================================================================
// Single credential
// ============================================================================

#[tokio::test]
async fn test_valid_did_key_credential() {
    let issuer = TestSigner::did_key();
    let credential = issue(&issuer);

    let valid = validator(did_key_resolver())
        .validate(&credential.to_string())
        .await
        .expect("validation runs");
    assert!(valid);
}

#[tokio::test]
async fn test_valid_did_peer_credential() {
    let issuer = TestSigner::did_peer();
    assert!(issuer.did.starts_with("did:peer:0z6Mk"));
    let credential = issue(&issuer);

    let valid = validator(local_resolver())
        .validate(&credential.to_string())
        .await
        .expect("validation runs");
    assert!(valid);
}

#[tokio::test]
async fn test_did_peer_issuer_needs_peer_method() {
    let issuer = TestSigner::did_peer();
    let credential = issue(&issuer);

    let err = validator(did_key_resolver())
        .validate(&credential.to_string())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResolutionFailure);
}

#[tokio::test]
async fn test_tampered_subject_is_invalid() {
    let issuer = TestSigner::did_key();
    let mut credential = issue(&issuer);
    credential["credentialSubject"]["level"] = json!(9);

    let valid = validator(did_key_resolver())
        .validate(&credential.to_string())
        .await
        .expect("validation runs");
    assert!(!valid);
}

#[tokio::test]
async fn test_key_order_does_not_matter() {
    let issuer = TestSigner::did_key();
    let credential = issue(&issuer);

    // Re-serialize with the subject fields in a different textual order.
    let subject = &credential["credentialSubject"];
    let reordered = format!(
        r#"{{"proof":{},"credentialSubject":{{"level":3,"memberOf":{},"id":{}}},"issuanceDate":{},"issuer":{},"type":{},"id":{},"@context":{}}}"#,
        credential["proof"],
        subject["memberOf"],
        subject["id"],
        credential["issuanceDate"],
        credential["issuer"],
        credential["type"],
        credential["id"],
        credential["@context"],
    );

    assert!(validator(did_key_resolver()).validate(&reordered).await.unwrap());
}

#[tokio::test]
async fn test_suite_rejects_did_key_method_type() {
    let issuer = TestSigner::did_key();
    let mut credential = issue(&issuer);
    // did:key documents publish Ed25519VerificationKey2020, which the
    // 2018 suite does not accept.
    credential["proof"]["type"] = json!("Ed25519Signature2018");

    let err = validator(did_key_resolver())
        .validate(&credential.to_string())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
}

#[tokio::test]
async fn test_proof_from_another_did_is_not_found() {
    let issuer = TestSigner::did_key();
    let impostor = TestSigner::did_key();
    let credential = impostor.sign(&sample_credential(&issuer.did, "did:example:holder"));

    let err = validator(did_key_resolver())
        .validate(&credential.to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, ValidationError::VerificationMethodNotFound(_)));
    assert_eq!(err.kind(), ErrorKind::VerificationMethodNotFound);
}

#[tokio::test]
async fn test_unresolvable_issuer() {
    let signer = TestSigner::with_did("did:example:nobody", "key-1");
    let credential = signer.sign(&sample_credential("did:example:nobody", "did:example:holder"));

    let err = validator(did_key_resolver())
        .validate(&credential.to_string())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResolutionFailure);
}

#[tokio::test]
async fn test_missing_proof_is_malformed() {
    let issuer = TestSigner::did_key();
    let credential = sample_credential(&issuer.did, "did:example:holder");

    let err = validator(did_key_resolver())
        .validate(&credential.to_string())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InputMalformed);
}

#[tokio::test]
async fn test_not_json_is_malformed() {
    let err = validator(did_key_resolver())
        .validate("{not json")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InputMalformed);
}

// ============================================================================
// Multiple proofs
// ============================================================================

#[tokio::test]
async fn test_two_proofs_by_issuer_both_verify() {
    let issuer = TestSigner::did_key();
    let unsigned = sample_credential(&issuer.did, "did:example:holder");
    let mut second = issuer.proof_for(&unsigned);
    second["created"] = json!("2024-07-01T00:00:00Z");

    let mut credential = unsigned.clone();
    credential["proof"] = json!([issuer.proof_for(&unsigned), second]);

    assert!(validator(did_key_resolver())
        .validate(&credential.to_string())
        .await
        .unwrap());
}

#[tokio::test]
async fn test_one_bad_proof_fails_the_credential() {
    let issuer = TestSigner::did_key();
    let unsigned = sample_credential(&issuer.did, "did:example:holder");
    let good = issuer.proof_for(&unsigned);

    // Signed over different content by the same key.
    let mut other = unsigned.clone();
    other["credentialSubject"]["level"] = json!(1);
    let bad = issuer.proof_for(&other);

    let mut credential = unsigned;
    credential["proof"] = json!([good, bad]);

    assert!(!validator(did_key_resolver())
        .validate(&credential.to_string())
        .await
        .unwrap());
}

// ============================================================================
// Policy
// ============================================================================

#[tokio::test]
async fn test_purpose_policy_rejects_authentication_proof() {
    let issuer = TestSigner::did_key();
    let mut credential = issue(&issuer);
    credential["proof"]["proofPurpose"] = json!("authentication");

    let err = validator(did_key_resolver())
        .with_policy(Arc::new(ProofPurposePolicy::assertion()))
        .validate(&credential.to_string())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PolicyRejected);
}

// ============================================================================
// Presentations
// ============================================================================

#[tokio::test]
async fn test_presentation_with_valid_credential() {
    let issuer = TestSigner::did_key();
    let holder = TestSigner::did_key();
    let presentation = holder.sign_presentation(
        &sample_presentation(&holder.did, vec![issue(&issuer)]),
        "nonce-123",
        "verifier.example",
    );

    let options = PresentationOptions {
        challenge: Some("nonce-123".into()),
        domain: Some("verifier.example".into()),
    };
    assert!(validator(did_key_resolver())
        .validate_presentation(&presentation.to_string(), &options)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_presentation_replayed_with_other_challenge() {
    let issuer = TestSigner::did_key();
    let holder = TestSigner::did_key();
    let presentation = holder.sign_presentation(
        &sample_presentation(&holder.did, vec![issue(&issuer)]),
        "nonce-123",
        "verifier.example",
    );

    let options = PresentationOptions {
        challenge: Some("nonce-456".into()),
        domain: None,
    };
    assert!(!validator(did_key_resolver())
        .validate_presentation(&presentation.to_string(), &options)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_presentation_with_tampered_credential() {
    let issuer = TestSigner::did_key();
    let holder = TestSigner::did_key();
    let mut credential = issue(&issuer);
    credential["credentialSubject"]["memberOf"] = json!("Someone Else");
    let presentation = holder.sign_presentation(
        &sample_presentation(&holder.did, vec![credential]),
        "nonce-123",
        "verifier.example",
    );

    assert!(!validator(did_key_resolver())
        .validate_presentation(&presentation.to_string(), &PresentationOptions::default())
        .await
        .unwrap());
}
