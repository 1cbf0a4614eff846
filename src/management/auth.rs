use std::path::PathBuf;

use chrono::Utc;

use crate::{
    config::Settings,
    error::{Error, Result},
    spotify::auth::refresh_token,
    types::Token,
};

/// Seconds before expiry at which the access token is refreshed.
const EXPIRY_MARGIN: u64 = 240;

/// Owns the OAuth token: on-disk cache plus refresh when it is about to expire.
pub struct TokenManager {
    token: Token,
    token_url: String,
    client_id: String,
    cache_path: Option<PathBuf>,
}

impl TokenManager {
    pub fn new(token: Token, settings: &Settings) -> Self {
        Self {
            token,
            token_url: settings.token_url.clone(),
            client_id: settings.client_id.clone(),
            cache_path: Some(Self::token_path()),
        }
    }

    /// A manager that never touches the disk.
    pub fn in_memory(token: Token, settings: &Settings) -> Self {
        Self {
            cache_path: None,
            ..Self::new(token, settings)
        }
    }

    pub async fn load(settings: &Settings) -> Result<Self> {
        let content = async_fs::read_to_string(Self::token_path()).await?;
        let token: Token = serde_json::from_str(&content)?;
        Ok(Self::new(token, settings))
    }

    pub async fn persist(&self) -> Result<()> {
        let Some(path) = &self.cache_path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            async_fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(&self.token)?;
        async_fs::write(path, json).await?;
        Ok(())
    }

    /// Current access token, refreshed first if it expires within four minutes.
    ///
    /// A failed refresh is an auth error; the user has to authorize again.
    pub async fn get_valid_token(&mut self) -> Result<String> {
        if self.is_expired() {
            tracing::debug!("access token expired, refreshing");
            let mut fresh =
                refresh_token(&self.token_url, &self.client_id, &self.token.refresh_token).await?;
            if fresh.refresh_token.is_empty() {
                fresh.refresh_token = self.token.refresh_token.clone();
            }
            self.token = fresh;
            if let Err(e) = self.persist().await {
                tracing::warn!(error = %e, "cannot cache refreshed token");
            }
        }

        if self.token.access_token.is_empty() {
            return Err(Error::Auth("no access token, run playall auth".to_string()));
        }
        Ok(self.token.access_token.clone())
    }

    pub fn is_expired(&self) -> bool {
        let now = Utc::now().timestamp() as u64;
        now + EXPIRY_MARGIN >= self.token.obtained_at + self.token.expires_in
    }

    pub fn current_token(&self) -> &Token {
        &self.token
    }

    fn token_path() -> PathBuf {
        let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("playall/cache/token.json");
        path
    }
}
