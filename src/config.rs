//! Configuration management for playall.
//!
//! Values come from environment variables, optionally seeded from a `.env`
//! file in the local data directory:
//! - Linux: `~/.local/share/playall/.env`
//! - macOS: `~/Library/Application Support/playall/.env`
//! - Windows: `%LOCALAPPDATA%/playall/.env`
//!
//! Variables already present in the environment win over the file. Only the
//! client id is required; everything else falls back to Spotify's public
//! endpoints and the retry defaults below.

use std::{env, path::PathBuf, time::Duration};

use crate::{
    catalog::{Backoff, RetryPolicy},
    error::{Error, Result},
};

pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8080";
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8080/callback";
pub const DEFAULT_SCOPE: &str = "user-read-private user-follow-read playlist-modify-public playlist-modify-private user-library-read";
pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";

const DEFAULT_MAX_ATTEMPTS: u32 = 6;
const DEFAULT_BACKOFF_MS: u64 = 1000;
const DEFAULT_MAX_BACKOFF_MS: u64 = 32_000;

/// Loads `.env` from the local data directory, creating the directory if needed.
///
/// A missing file is not an error; a malformed one is.
pub async fn load_env() -> Result<()> {
    let path = env_path();
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent).await?;
    }

    match dotenv::from_path(&path) {
        Ok(()) => Ok(()),
        Err(dotenv::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::Config(format!("{}: {e}", path.display()))),
    }
}

pub fn env_path() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("playall/.env");
    path
}

/// Everything the binary reads from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server_address: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub scope: String,
    pub auth_url: String,
    pub token_url: String,
    pub api_url: String,
    /// Playlist owner; the authorized user when unset.
    pub user_id: Option<String>,
    pub retry: RetryPolicy,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server_address: server_addr(),
            client_id: spotify_client_id()?,
            redirect_uri: spotify_redirect_uri(),
            scope: spotify_scope(),
            auth_url: spotify_apiauth_url(),
            token_url: spotify_apitoken_url(),
            api_url: spotify_apiurl(),
            user_id: spotify_user(),
            retry: retry_policy()?,
        })
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{name} must be a number, got {raw:?}"))),
        _ => Ok(default),
    }
}

/// `SERVER_ADDRESS`: where the OAuth callback listener binds.
pub fn server_addr() -> String {
    var_or("SERVER_ADDRESS", DEFAULT_SERVER_ADDRESS)
}

/// `SPOTIFY_USER_ID`: optional playlist owner override.
pub fn spotify_user() -> Option<String> {
    env::var("SPOTIFY_USER_ID")
        .ok()
        .filter(|v| !v.trim().is_empty())
}

/// `SPOTIFY_API_AUTH_CLIENT_ID`: the registered application's client id.
pub fn spotify_client_id() -> Result<String> {
    env::var("SPOTIFY_API_AUTH_CLIENT_ID")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| {
            Error::Config(format!(
                "SPOTIFY_API_AUTH_CLIENT_ID must be set (environment or {})",
                env_path().display()
            ))
        })
}

/// `SPOTIFY_API_REDIRECT_URI`: must match the application's registered URI.
pub fn spotify_redirect_uri() -> String {
    var_or("SPOTIFY_API_REDIRECT_URI", DEFAULT_REDIRECT_URI)
}

/// `SPOTIFY_API_AUTH_SCOPE`: space separated scopes.
pub fn spotify_scope() -> String {
    var_or("SPOTIFY_API_AUTH_SCOPE", DEFAULT_SCOPE)
}

pub fn spotify_apiauth_url() -> String {
    var_or("SPOTIFY_API_AUTH_URL", DEFAULT_AUTH_URL)
}

pub fn spotify_apiurl() -> String {
    var_or("SPOTIFY_API_URL", DEFAULT_API_URL)
}

pub fn spotify_apitoken_url() -> String {
    var_or("SPOTIFY_API_TOKEN_URL", DEFAULT_TOKEN_URL)
}

/// Retry policy from `PLAYALL_MAX_ATTEMPTS` (`0` = unbounded),
/// `PLAYALL_BACKOFF_MS` and `PLAYALL_MAX_BACKOFF_MS`.
pub fn retry_policy() -> Result<RetryPolicy> {
    let max_attempts = parse_var("PLAYALL_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?;
    let initial = parse_var("PLAYALL_BACKOFF_MS", DEFAULT_BACKOFF_MS)?;
    let max = parse_var("PLAYALL_MAX_BACKOFF_MS", DEFAULT_MAX_BACKOFF_MS)?;

    Ok(build_retry_policy(max_attempts, initial, max))
}

/// `max_attempts == 0` keeps retrying forever with a fixed `initial_ms` wait.
pub fn build_retry_policy(max_attempts: u32, initial_ms: u64, max_ms: u64) -> RetryPolicy {
    let initial = Duration::from_millis(initial_ms);
    if max_attempts == 0 {
        return RetryPolicy::unbounded(initial);
    }
    RetryPolicy {
        max_attempts: Some(max_attempts),
        backoff: Backoff::Exponential {
            initial,
            max: Duration::from_millis(max_ms.max(initial_ms)),
        },
    }
}
