//! Integration test: credentials issued by a `did:web` identifier.
//!
//! Serves DID Documents from a local mock server and resolves them through
//! a registry built from configuration.

use std::sync::Arc;

use serde_json::{json, Value};
use trellis_core::ResolverConfig;
use trellis_credentials::ErrorKind;
use trellis_identity::{
    registry_from_config, Dereferenced, DidResolver, DidService, RegistryDidResolver,
};
use trellis_integration_tests::{sample_credential, validator, TestSigner};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn web_did(server: &MockServer) -> String {
    let authority = server.uri().trim_start_matches("http://").replace(':', "%3A");
    format!("did:web:{authority}")
}

fn did_document(did: &str, signer: &TestSigner, jwk_signer: &TestSigner) -> Value {
    json!({
        "@context": ["https://www.w3.org/ns/did/v1"],
        "id": did,
        "verificationMethod": [
            {
                "id": signer.verification_method,
                "type": "Ed25519VerificationKey2020",
                "controller": did,
                "publicKeyMultibase": signer.public_key_multibase()
            },
            {
                "id": format!("{did}#jwk-1"),
                "type": "JsonWebKey2020",
                "controller": did,
                "publicKeyJwk": jwk_signer.public_key_jwk()
            }
        ],
        "assertionMethod": [signer.verification_method, format!("{did}#jwk-1")],
        "service": [{
            "id": format!("{did}#registry"),
            "type": "CredentialRegistry",
            "serviceEndpoint": "https://registry.example/api/"
        }]
    })
}

fn local_config() -> ResolverConfig {
    let mut config = ResolverConfig::default();
    config.web.insecure_http = true;
    config
}

fn resolver() -> Arc<dyn DidResolver> {
    let registry = registry_from_config(&local_config()).expect("registry");
    Arc::new(RegistryDidResolver::new(Arc::new(registry)))
}

async fn serve(server: &MockServer, document: Value) {
    Mock::given(method("GET"))
        .and(path("/.well-known/did.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(document))
        .mount(server)
        .await;
}

// ============================================================================
// Validation
// ============================================================================

#[tokio::test]
async fn test_did_web_ed25519_credential() {
    let server = MockServer::start().await;
    let did = web_did(&server);
    let signer = TestSigner::with_did(&did, "key-1");
    let jwk_signer = TestSigner::with_did(&did, "jwk-1");
    serve(&server, did_document(&did, &signer, &jwk_signer)).await;

    let credential = signer.sign(&sample_credential(&did, "did:example:holder"));
    assert!(validator(resolver())
        .validate(&credential.to_string())
        .await
        .unwrap());
}

#[tokio::test]
async fn test_did_web_json_web_signature() {
    let server = MockServer::start().await;
    let did = web_did(&server);
    let signer = TestSigner::with_did(&did, "key-1");
    let jwk_signer = TestSigner::with_did(&did, "jwk-1");
    serve(&server, did_document(&did, &signer, &jwk_signer)).await;

    let credential = jwk_signer.sign_jws(&sample_credential(&did, "did:example:holder"));
    assert!(validator(resolver())
        .validate(&credential.to_string())
        .await
        .unwrap());

    let mut tampered = credential.clone();
    tampered["credentialSubject"]["level"] = json!(4);
    assert!(!validator(resolver())
        .validate(&tampered.to_string())
        .await
        .unwrap());
}

#[tokio::test]
async fn test_relative_verification_method_reference() {
    let server = MockServer::start().await;
    let did = web_did(&server);
    let signer = TestSigner::with_did(&did, "key-1");
    let jwk_signer = TestSigner::with_did(&did, "jwk-1");
    serve(&server, did_document(&did, &signer, &jwk_signer)).await;

    let mut credential = signer.sign(&sample_credential(&did, "did:example:holder"));
    credential["proof"]["verificationMethod"] = json!("#key-1");
    assert!(validator(resolver())
        .validate(&credential.to_string())
        .await
        .unwrap());
}

#[tokio::test]
async fn test_did_web_document_missing() {
    let server = MockServer::start().await;
    let did = web_did(&server);
    let signer = TestSigner::with_did(&did, "key-1");
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let credential = signer.sign(&sample_credential(&did, "did:example:holder"));
    let err = validator(resolver())
        .validate(&credential.to_string())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResolutionFailure);
}

#[tokio::test]
async fn test_did_web_document_for_other_did() {
    let server = MockServer::start().await;
    let did = web_did(&server);
    let signer = TestSigner::with_did(&did, "key-1");
    let jwk_signer = TestSigner::with_did(&did, "jwk-1");
    let mut document = did_document(&did, &signer, &jwk_signer);
    document["id"] = json!("did:web:attacker.example");
    serve(&server, document).await;

    let credential = signer.sign(&sample_credential(&did, "did:example:holder"));
    let err = validator(resolver())
        .validate(&credential.to_string())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResolutionFailure);
}

// ============================================================================
// Dereferencing
// ============================================================================

#[tokio::test]
async fn test_dereference_served_document() {
    let server = MockServer::start().await;
    let did = web_did(&server);
    let signer = TestSigner::with_did(&did, "key-1");
    let jwk_signer = TestSigner::with_did(&did, "jwk-1");
    serve(&server, did_document(&did, &signer, &jwk_signer)).await;

    let service = DidService::new(Arc::new(registry_from_config(&local_config()).unwrap()));

    match service.dereference(&format!("{did}#key-1")).await.unwrap() {
        Dereferenced::VerificationMethod(vm) => assert_eq!(vm.method_type, "Ed25519VerificationKey2020"),
        other => panic!("unexpected {other:?}"),
    }

    let endpoint = service
        .dereference(&format!("{did}?service=registry&relativeRef=%2Fissuers"))
        .await
        .unwrap();
    assert_eq!(
        endpoint,
        Dereferenced::ServiceEndpoint("https://registry.example/issuers".into())
    );
}
