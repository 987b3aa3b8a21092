//! End-to-end tests against a live Whisper API.
//!
//! These tests require a running server at localhost:8318.
//! Run with: cargo test --test e2e -- --ignored

use whisper::{
    Client, CreationFlow, CreationState, DestroyOutcome, MemorySession, PasswordCache,
    RetrievalFlow, RetrievalState, RetrievalStatus, SecretForm, SecretService, ServiceState,
    WhisperError, token_from_link,
};

fn api_url() -> String {
    std::env::var("WHISPER_ENDPOINT").unwrap_or_else(|_| "http://localhost:8318/v1".to_string())
}

fn session() -> PasswordCache<MemorySession> {
    PasswordCache::new(MemorySession::default())
}

/// Create through the flow and return the token from the share link.
fn create(client: &Client, form: &SecretForm) -> String {
    let mut flow = CreationFlow::new("http://localhost:3000");
    let state = flow
        .submit(client, &mut session(), form)
        .expect("create failed")
        .clone();
    match state {
        CreationState::Succeeded(link) => {
            println!("Share link: {}", link.url);
            token_from_link(&link.url).expect("token in link")
        }
        other => panic!("expected share link, got {other:?}"),
    }
}

#[test]
#[ignore] // Requires running server
fn test_status() {
    let client = Client::new(&api_url());
    let status = client.get_status().expect("status failed");
    assert_eq!(status.status, ServiceState::Ok);
    println!("✓ Status test PASSED (version {:?})", status.version);
}

/// Create -> fetch -> fetch again with a single allowed access
#[test]
#[ignore]
fn test_single_access_roundtrip() {
    let client = Client::new(&api_url());
    let form = SecretForm::message("WHISPER_E2E_TEST_MARKER_12345").with_accesses(1);
    let token = create(&client, &form);

    let mut flow = RetrievalFlow::new(token.clone());
    flow.load(&client);
    let record = flow.record().expect("secret should be returned");
    assert_eq!(record.secret, "WHISPER_E2E_TEST_MARKER_12345");
    println!("destroyed after read: {}", record.destroyed);

    let mut again = RetrievalFlow::new(token);
    again.load(&client);
    assert_eq!(again.status(), RetrievalStatus::Error);
    println!("✓ Single access test PASSED!");
}

/// 401 -> password -> success -> destroy with the same credential
#[test]
#[ignore]
fn test_password_then_destroy() {
    let client = Client::new(&api_url());
    let form = SecretForm::message("protected")
        .with_password("p@ss")
        .with_accesses(5);
    let token = create(&client, &form);

    let mut cache = session();
    let mut flow = RetrievalFlow::new(token.clone());
    flow.load(&client);
    assert_eq!(flow.status(), RetrievalStatus::Unauthorized);

    flow.submit_password(&client, &mut cache, "wrong");
    assert!(matches!(
        flow.state(),
        RetrievalState::Unauthorized { error: Some(_) }
    ));

    flow.submit_password(&client, &mut cache, "p@ss");
    assert_eq!(flow.status(), RetrievalStatus::Success);
    assert_eq!(flow.record().unwrap().secret, "protected");

    let outcome = flow.destroy(&client, &mut cache, || true);
    assert!(
        matches!(outcome, DestroyOutcome::Destroyed { .. }),
        "destroy failed: {outcome:?}"
    );

    match client.get_secret(&token, None) {
        Err(WhisperError::NotFound) => println!("✓ Password + destroy test PASSED!"),
        other => panic!("Expected 404 after destroy, got {other:?}"),
    }
}

/// Test 404 for non-existent secret
#[test]
#[ignore]
fn test_secret_not_found() {
    let client = Client::new(&api_url());
    let mut flow = RetrievalFlow::new("doesnotexist");
    flow.load(&client);
    assert_eq!(
        flow.state(),
        &RetrievalState::Error {
            message: "No secret exists with the specified token.".to_string()
        }
    );
    println!("✓ 404 test PASSED!");
}

/// Destroy without password on a protected secret is refused
#[test]
#[ignore]
fn test_destroy_requires_password() {
    let client = Client::new(&api_url());
    let form = SecretForm::message("locked").with_password("p@ss");
    let token = create(&client, &form);

    let response = ureq::delete(&format!("{}/secrets/{token}", api_url())).call();
    match response {
        Err(ureq::Error::Status(401, _)) => println!("✓ Destroy auth test PASSED!"),
        other => panic!("Expected 401 without password, got {other:?}"),
    }
}
