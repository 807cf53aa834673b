//! Integration test: trust registries and issuer trust decisions.
//!
//! Tests the aggregate registry built from configuration over local and
//! remote backends, and the verifier combining proof and trust checks.

use std::sync::Arc;

use serde_json::json;
use trellis_core::{TrellisConfig, TrustConfig, TrustSourceConfig};
use trellis_credentials::CredentialVerifier;
use trellis_integration_tests::{did_key_resolver, sample_credential, validator, TestSigner};
use trellis_trust::{
    build_registry, LocalTrustRegistry, MultiSourceTrustRegistry, TrustListValidator,
    TrustRegistry, TrustRegistryError,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn doh_answer(txt: &str) -> serde_json::Value {
    json!({
        "Status": 0,
        "Answer": [{ "name": "_trust.example.com", "type": 16, "data": format!("\"{txt}\"") }]
    })
}

fn local_and_dns(doh_endpoint: String) -> TrustConfig {
    TrustConfig {
        sources: vec![
            TrustSourceConfig::Local {
                issuers: vec!["did:example:a".into()],
            },
            TrustSourceConfig::Dns {
                record: "_trust.example.com".into(),
                doh_endpoint,
                timeout_secs: 5,
            },
        ],
    }
}

// ============================================================================
// Aggregation
// ============================================================================

#[tokio::test]
async fn test_local_and_dns_union() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("name", "_trust.example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(doh_answer("did:example:b")))
        .mount(&server)
        .await;

    let registry = build_registry(&local_and_dns(server.uri())).unwrap();
    assert_eq!(registry.backend_count(), 2);

    // Only the local backend is populated before a refresh.
    assert!(registry.is_trusted("did:example:a"));
    assert!(!registry.is_trusted("did:example:b"));

    let report = registry.refresh_all().await;
    assert!(report.is_success());
    assert_eq!(report.succeeded.len(), 2);

    assert_eq!(registry.all_trusted(), vec!["did:example:a", "did:example:b"]);
    assert!(registry.is_trusted("did:example:b"));
    assert!(!registry.is_trusted("did:example:c"));
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_entries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(doh_answer("did:example:b")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let registry = build_registry(&local_and_dns(server.uri())).unwrap();
    registry.refresh().await.unwrap();
    assert!(registry.is_trusted("did:example:b"));

    let err = registry.refresh().await.unwrap_err();
    match err {
        TrustRegistryError::Refresh { failed, .. } => assert_eq!(failed, vec!["dns".to_string()]),
        other => panic!("unexpected {other:?}"),
    }
    // The DNS backend still answers from its last good list.
    assert_eq!(registry.all_trusted(), vec!["did:example:a", "did:example:b"]);
}

#[tokio::test]
async fn test_writes_reach_only_writable_backends() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(doh_answer("did:example:b")))
        .mount(&server)
        .await;

    let registry = build_registry(&local_and_dns(server.uri())).unwrap();
    registry.refresh().await.unwrap();

    assert!(registry.is_writable());
    assert!(registry.add_trusted_issuer("did:example:c"));
    assert!(registry.is_trusted("did:example:c"));

    assert!(registry.remove_trusted_issuer("did:example:c"));
    assert!(!registry.is_trusted("did:example:c"));

    // Removal from the local list does not touch the DNS-sourced entry.
    registry.remove_trusted_issuer("did:example:b");
    assert!(registry.is_trusted("did:example:b"));
}

#[tokio::test]
async fn test_http_and_document_store_sources() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/issuers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "issuers": [{ "did": "did:example:http" }, "did:example:plain"]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/documents/trust-list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "content": ["did:example:old"] },
            { "content": ["did:example:current"] }
        ])))
        .mount(&server)
        .await;

    let config = TrustConfig {
        sources: vec![
            TrustSourceConfig::Http {
                url: format!("{}/issuers", server.uri()),
                field: Some("issuers".into()),
                timeout_secs: 5,
            },
            TrustSourceConfig::DocumentStore {
                url: format!("{}/documents/trust-list", server.uri()),
                field: "content".into(),
                timeout_secs: 5,
            },
        ],
    };
    let registry = build_registry(&config).unwrap();
    assert!(!registry.is_writable());

    registry.refresh().await.unwrap();
    assert_eq!(
        registry.all_trusted(),
        vec!["did:example:current", "did:example:http", "did:example:plain"]
    );
    assert!(!registry.add_trusted_issuer("did:example:x"));
}

// ============================================================================
// Configuration
// ============================================================================

#[tokio::test]
async fn test_registry_from_config_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(doh_answer("did:example:b did:example:d")))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("trellis.toml");
    std::fs::write(
        &config_path,
        format!(
            r#"
[logging]
level = "debug"

[[trust.sources]]
kind = "local"
issuers = ["did:example:a"]

[[trust.sources]]
kind = "dns"
record = "_trust.example.com"
doh_endpoint = "{}"
"#,
            server.uri()
        ),
    )
    .unwrap();

    let config = TrellisConfig::load(&config_path).unwrap();
    let registry = build_registry(&config.trust).unwrap();
    registry.refresh().await.unwrap();
    assert_eq!(
        registry.all_trusted(),
        vec!["did:example:a", "did:example:b", "did:example:d"]
    );
}

// ============================================================================
// Verifier
// ============================================================================

#[tokio::test]
async fn test_verifier_trusted_and_untrusted_issuers() {
    let trusted = TestSigner::did_key();
    let stranger = TestSigner::did_key();

    let registry: Arc<dyn TrustRegistry> =
        Arc::new(LocalTrustRegistry::with_issuers([trusted.did.clone()]));
    let verifier = CredentialVerifier::new(
        validator(did_key_resolver()),
        TrustListValidator::new(registry),
    );

    let credential = trusted.sign(&sample_credential(&trusted.did, "did:example:holder"));
    let result = verifier.verify(&credential.to_string()).await.unwrap();
    assert!(result.valid);
    assert_eq!(result.checks.len(), 2);

    let credential = stranger.sign(&sample_credential(&stranger.did, "did:example:holder"));
    let result = verifier.verify(&credential.to_string()).await.unwrap();
    assert!(!result.valid);
    let trust_check = result
        .checks
        .iter()
        .find(|c| c.name == "issuer_trusted")
        .unwrap();
    assert!(!trust_check.passed);
    assert!(trust_check.detail.as_deref().unwrap().contains(&stranger.did));
}

#[tokio::test]
async fn test_verifier_over_aggregate_registry() {
    let issuer = TestSigner::did_key();
    let mut registry = MultiSourceTrustRegistry::default();
    registry.add_backend(Arc::new(LocalTrustRegistry::new()));
    registry.add_backend(Arc::new(LocalTrustRegistry::with_issuers([issuer.did.clone()])));

    let verifier = CredentialVerifier::new(
        validator(did_key_resolver()),
        TrustListValidator::new(Arc::new(registry)),
    );
    let credential = issuer.sign(&sample_credential(&issuer.did, "did:example:holder"));
    let result = verifier.verify(&credential.to_string()).await.unwrap();
    assert!(result.valid);
    assert!(result.checks.iter().all(|c| c.passed));
}
