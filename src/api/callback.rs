use std::sync::Arc;

use axum::{
    Extension,
    extract::Query,
    http::{StatusCode, Uri},
    response::Html,
};

use crate::{
    error::Error,
    spotify::auth::{AuthSession, CallbackParams, TokenHandoff},
    warning,
};

/// OAuth redirect target.
///
/// Verifies `state`, exchanges the code and passes the outcome, success or
/// failure, to the waiting login flow. Only the first callback is handed over;
/// later hits find the handoff already taken.
pub async fn callback(
    Query(params): Query<CallbackParams>,
    Extension(session): Extension<Arc<AuthSession>>,
    Extension(handoff): Extension<TokenHandoff>,
) -> (StatusCode, Html<&'static str>) {
    let Some(sender) = handoff.lock().await.take() else {
        return (
            StatusCode::GONE,
            Html("<h4>Login already handled.</h4>"),
        );
    };

    let result = session.exchange_token(&params).await;
    let response = match &result {
        Ok(_) => (
            StatusCode::OK,
            Html("<h2>Login Completed!</h2><p>You can close this browser window.</p>"),
        ),
        Err(Error::StateMismatch { .. }) => {
            warning!("OAuth state mismatch on callback, refusing the login");
            (StatusCode::FORBIDDEN, Html("<h4>State mismatch.</h4>"))
        }
        Err(e) => {
            warning!("Token exchange failed: {}", e);
            (StatusCode::FORBIDDEN, Html("<h4>Couldn't get token.</h4>"))
        }
    };

    if sender.send(result).is_err() {
        tracing::warn!("login flow stopped waiting before the callback arrived");
    }
    response
}

/// Any other path: logged and ignored.
pub async fn unhandled(uri: Uri) -> StatusCode {
    tracing::info!(%uri, "unhandled request on callback listener");
    StatusCode::NOT_FOUND
}
