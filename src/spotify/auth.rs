use std::{sync::Arc, time::Duration};

use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::{Mutex, oneshot};

use crate::{
    config::Settings,
    error::{Error, Result},
    management::TokenManager,
    server,
    spotify::SpotifyClient,
    types::Token,
    utils, warning,
};

/// How long the user gets to finish the browser login.
const AUTH_TIMEOUT: Duration = Duration::from_secs(120);

/// Redirect parameters Spotify appends to the callback URL.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// One authorization attempt: the issued `state`, the PKCE verifier and the
/// settings needed to talk to the accounts service.
///
/// Built once per login and shared by reference with the callback handler.
pub struct AuthSession {
    settings: Settings,
    state: String,
    code_verifier: String,
}

impl AuthSession {
    pub fn new(settings: Settings) -> Self {
        Self::with_secrets(
            settings,
            utils::generate_state(),
            utils::generate_code_verifier(),
        )
    }

    pub fn with_secrets(settings: Settings, state: String, code_verifier: String) -> Self {
        Self {
            settings,
            state,
            code_verifier,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    /// The URL the user has to open to grant access.
    pub fn auth_url(&self) -> Result<String> {
        let challenge = utils::generate_code_challenge(&self.code_verifier);
        let query = [
            ("client_id", self.settings.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", self.settings.redirect_uri.as_str()),
            ("code_challenge_method", "S256"),
            ("code_challenge", challenge.as_str()),
            ("state", self.state.as_str()),
            ("scope", self.settings.scope.as_str()),
        ];
        reqwest::Url::parse_with_params(&self.settings.auth_url, query)
            .map(String::from)
            .map_err(|e| Error::Config(format!("invalid SPOTIFY_API_AUTH_URL: {e}")))
    }

    /// Rejects a callback whose `state` is not the one issued by this session.
    pub fn verify_state(&self, received: Option<&str>) -> Result<()> {
        if received == Some(self.state.as_str()) {
            return Ok(());
        }
        Err(Error::StateMismatch {
            expected: self.state.clone(),
            received: received.map(str::to_string),
        })
    }

    /// Checks the callback and trades its code for a token.
    ///
    /// The state is verified before anything is sent to the token endpoint.
    pub async fn exchange_token(&self, params: &CallbackParams) -> Result<Token> {
        self.verify_state(params.state.as_deref())?;

        if let Some(error) = &params.error {
            return Err(Error::Auth(format!("authorization denied: {error}")));
        }
        let code = params
            .code
            .as_deref()
            .ok_or_else(|| Error::Auth("callback carried no authorization code".to_string()))?;

        exchange_code_pkce(&self.settings, code, &self.code_verifier).await
    }
}

/// Single-use sender the callback handler resolves with the exchange result.
pub type TokenHandoff = Arc<Mutex<Option<oneshot::Sender<Result<Token>>>>>;

/// Runs the interactive login and returns the fresh token.
///
/// Starts the callback listener, points the user's browser at the
/// authorization page and waits for the handler to hand over the result. The
/// listener shuts down as soon as a result (or the timeout) arrives.
pub async fn authorize(settings: Settings) -> Result<Token> {
    let session = Arc::new(AuthSession::new(settings));
    let (tx, rx) = oneshot::channel();
    let handoff: TokenHandoff = Arc::new(Mutex::new(Some(tx)));
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let listener = server::bind(&session.settings().server_address).await?;
    let server_task = tokio::spawn(server::serve(
        listener,
        Arc::clone(&session),
        handoff,
        stop_rx,
    ));

    let url = session.auth_url()?;
    if webbrowser::open(&url).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            url
        );
    }

    let pb = utils::spinner("Waiting for Spotify authorization...");
    let outcome = tokio::time::timeout(AUTH_TIMEOUT, rx).await;
    pb.finish_and_clear();

    let _ = stop_tx.send(());
    if let Err(e) = server_task.await {
        tracing::warn!(error = %e, "callback listener task failed");
    }

    match outcome {
        Ok(Ok(result)) => result,
        Ok(Err(_)) => Err(Error::Auth("callback listener stopped early".to_string())),
        Err(_) => Err(Error::Auth(format!(
            "no authorization within {} seconds",
            AUTH_TIMEOUT.as_secs()
        ))),
    }
}

/// Authenticated API handle for `token`. The walk never sees the token itself.
pub fn client_for(settings: &Settings, token: Token) -> Result<SpotifyClient> {
    SpotifyClient::new(settings.api_url.clone(), TokenManager::new(token, settings))
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: String,
    #[serde(default)]
    scope: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

impl From<TokenResponse> for Token {
    fn from(res: TokenResponse) -> Self {
        Token {
            access_token: res.access_token,
            refresh_token: res.refresh_token,
            scope: res.scope,
            expires_in: res.expires_in,
            obtained_at: Utc::now().timestamp() as u64,
        }
    }
}

async fn request_token(token_url: &str, form: &[(&str, &str)]) -> Result<Token> {
    let res = Client::new().post(token_url).form(form).send().await?;
    let status = res.status();
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        return Err(Error::Auth(format!("token endpoint answered {status}: {body}")));
    }

    let token: TokenResponse = res
        .json()
        .await
        .map_err(|e| Error::Auth(format!("unexpected token response: {e}")))?;
    Ok(token.into())
}

/// Exchanges an authorization code for a token using the PKCE verifier.
pub async fn exchange_code_pkce(settings: &Settings, code: &str, verifier: &str) -> Result<Token> {
    request_token(
        &settings.token_url,
        &[
            ("grant_type", "authorization_code"),
            ("client_id", &settings.client_id),
            ("code", code),
            ("code_verifier", verifier),
            ("redirect_uri", &settings.redirect_uri),
        ],
    )
    .await
}

/// Trades a refresh token for a new access token.
///
/// Spotify may omit `refresh_token` from the answer; the caller keeps the old one then.
pub async fn refresh_token(token_url: &str, client_id: &str, refresh_token: &str) -> Result<Token> {
    request_token(
        token_url,
        &[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", client_id),
        ],
    )
    .await
}
