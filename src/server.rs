use std::{net::SocketAddr, str::FromStr, sync::Arc};

use axum::{Extension, Router, routing::get};
use tokio::{net::TcpListener, sync::oneshot};

use crate::{
    api,
    error::{Error, Result},
    spotify::auth::{AuthSession, TokenHandoff},
};

/// Binds the callback listener so address problems surface before the browser opens.
pub async fn bind(address: &str) -> Result<TcpListener> {
    let addr = SocketAddr::from_str(address)
        .map_err(|e| Error::Config(format!("invalid SERVER_ADDRESS {address:?}: {e}")))?;
    Ok(TcpListener::bind(addr).await?)
}

pub fn router(session: Arc<AuthSession>, handoff: TokenHandoff) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/callback", get(api::callback))
        .fallback(api::unhandled)
        .layer(Extension(handoff))
        .layer(Extension(session))
}

/// Serves until `stop` fires or its sender is dropped.
pub async fn serve(
    listener: TcpListener,
    session: Arc<AuthSession>,
    handoff: TokenHandoff,
    stop: oneshot::Receiver<()>,
) {
    let app = router(session, handoff);
    let shutdown = async {
        let _ = stop.await;
    };
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
    {
        tracing::error!(error = %e, "callback listener failed");
    }
}
