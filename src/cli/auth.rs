use crate::{
    config::Settings,
    error::Result,
    management::TokenManager,
    spotify::{self, SpotifyClient},
    success, warning,
};

/// Runs the browser login and caches the resulting token.
pub async fn auth(settings: &Settings) -> Result<()> {
    let token = spotify::auth::authorize(settings.clone()).await?;
    TokenManager::new(token, settings).persist().await?;
    success!("Authentication successful!");
    Ok(())
}

/// Client built from the cached token, logging in interactively when there is none.
pub async fn authenticated_client(settings: &Settings) -> Result<SpotifyClient> {
    match TokenManager::load(settings).await {
        Ok(tokens) => SpotifyClient::new(settings.api_url.clone(), tokens),
        Err(e) => {
            warning!("No cached token ({}), starting login.", e);
            let token = spotify::auth::authorize(settings.clone()).await?;
            TokenManager::new(token.clone(), settings).persist().await?;
            success!("Authentication successful!");
            spotify::auth::client_for(settings, token)
        }
    }
}
