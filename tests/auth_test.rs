mod common;

use std::sync::Arc;

use chrono::Utc;
use common::settings;
use playall::{
    Error,
    management::TokenManager,
    server,
    spotify::auth::{AuthSession, CallbackParams, TokenHandoff},
    types::Token,
};
use tokio::sync::{Mutex, oneshot};

fn session() -> AuthSession {
    AuthSession::with_secrets(
        settings(),
        "expected-state".to_string(),
        "verifier".repeat(16),
    )
}

fn token(access_token: &str, obtained_secs_ago: u64, expires_in: u64) -> Token {
    Token {
        access_token: access_token.to_string(),
        refresh_token: "refresh".to_string(),
        scope: "user-follow-read".to_string(),
        expires_in,
        obtained_at: Utc::now().timestamp() as u64 - obtained_secs_ago,
    }
}

#[test]
fn test_auth_url_carries_state_and_pkce() {
    let url = session().auth_url().unwrap();

    assert!(url.starts_with("https://accounts.example.test/authorize?"));
    assert!(url.contains("client_id=client-123"));
    assert!(url.contains("response_type=code"));
    assert!(url.contains("state=expected-state"));
    assert!(url.contains("code_challenge_method=S256"));
    assert!(url.contains("code_challenge="));
    assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Fcallback"));
}

#[test]
fn test_fresh_sessions_use_different_states() {
    let a = AuthSession::new(settings());
    let b = AuthSession::new(settings());

    assert_eq!(a.state().len(), 32);
    assert_ne!(a.state(), b.state());
}

#[test]
fn test_verify_state() {
    let session = session();

    assert!(session.verify_state(Some("expected-state")).is_ok());

    match session.verify_state(Some("forged")) {
        Err(Error::StateMismatch { expected, received }) => {
            assert_eq!(expected, "expected-state");
            assert_eq!(received.as_deref(), Some("forged"));
        }
        other => panic!("expected StateMismatch, got {other:?}"),
    }

    assert!(matches!(
        session.verify_state(None),
        Err(Error::StateMismatch { received: None, .. })
    ));
}

#[tokio::test]
async fn test_state_checked_before_exchange() {
    let params = CallbackParams {
        code: Some("auth-code".to_string()),
        state: Some("forged".to_string()),
        error: None,
    };

    let result = session().exchange_token(&params).await;
    assert!(matches!(result, Err(Error::StateMismatch { .. })));
}

#[tokio::test]
async fn test_denied_authorization() {
    let params = CallbackParams {
        code: None,
        state: Some("expected-state".to_string()),
        error: Some("access_denied".to_string()),
    };

    let result = session().exchange_token(&params).await;
    assert!(matches!(result, Err(Error::Auth(msg)) if msg.contains("access_denied")));
}

#[tokio::test]
async fn test_callback_without_code() {
    let params = CallbackParams {
        state: Some("expected-state".to_string()),
        ..CallbackParams::default()
    };

    let result = session().exchange_token(&params).await;
    assert!(matches!(result, Err(Error::Auth(_))));
}

#[tokio::test]
async fn test_callback_listener_rejects_forged_state() {
    let listener = server::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (tx, rx) = oneshot::channel();
    let handoff: TokenHandoff = Arc::new(Mutex::new(Some(tx)));
    let (stop_tx, stop_rx) = oneshot::channel();
    let task = tokio::spawn(server::serve(
        listener,
        Arc::new(session()),
        handoff,
        stop_rx,
    ));

    let http = reqwest::Client::builder().no_proxy().build().unwrap();
    let base = format!("http://{addr}");

    let health = http.get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(health.status().as_u16(), 200);
    let body: serde_json::Value = health.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    let forged = http
        .get(format!("{base}/callback?code=abc&state=forged"))
        .send()
        .await
        .unwrap();
    assert_eq!(forged.status().as_u16(), 403);

    // The login flow is told about the mismatch
    let handed_over = rx.await.unwrap();
    assert!(matches!(handed_over, Err(Error::StateMismatch { .. })));

    // Only the first callback is handled
    let replay = http
        .get(format!("{base}/callback?code=abc&state=expected-state"))
        .send()
        .await
        .unwrap();
    assert_eq!(replay.status().as_u16(), 410);

    let unknown = http.get(format!("{base}/favicon.ico")).send().await.unwrap();
    assert_eq!(unknown.status().as_u16(), 404);

    drop(http);
    stop_tx.send(()).unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_bind_rejects_bad_address() {
    let result = server::bind("not an address").await;
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_token_expiry_margin() {
    let fresh = TokenManager::in_memory(token("a", 0, 3600), &settings());
    assert!(!fresh.is_expired());

    // Inside the four-minute margin counts as expired
    let closing = TokenManager::in_memory(token("a", 3600 - 120, 3600), &settings());
    assert!(closing.is_expired());

    let stale = TokenManager::in_memory(token("a", 7200, 3600), &settings());
    assert!(stale.is_expired());
}

#[tokio::test]
async fn test_valid_token_needs_no_refresh() {
    let mut tokens = TokenManager::in_memory(token("access-1", 10, 3600), &settings());

    assert_eq!(tokens.get_valid_token().await.unwrap(), "access-1");
    assert_eq!(tokens.current_token().refresh_token, "refresh");

    // In-memory managers never write a cache file
    tokens.persist().await.unwrap();
}

#[tokio::test]
async fn test_empty_access_token_is_auth_error() {
    let mut tokens = TokenManager::in_memory(token("", 10, 3600), &settings());
    assert!(matches!(tokens.get_valid_token().await, Err(Error::Auth(_))));
}
