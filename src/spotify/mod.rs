//! # Spotify Integration Module
//!
//! reqwest implementation of [`CatalogApi`] and [`PlaylistApi`] against the
//! Spotify Web API, plus the OAuth 2.0 authorization flow in [`auth`].
//!
//! ## Endpoints
//!
//! - `GET /me` - playlist owner when none is configured
//! - `GET /me/following?type=artist` - followed artists, `after` cursor
//! - `GET /artists/{id}/albums` - albums and singles, offset paged
//! - `GET /albums/{id}/tracks` - album tracks, offset paged
//! - `GET /me/albums` - saved albums, offset paged
//! - `POST /users/{user_id}/playlists` - create the target playlist
//! - `POST /playlists/{id}/tracks` - append up to 50 track URIs
//!
//! ## Errors
//!
//! Every response is classified before decoding: `429` (with its
//! `Retry-After`) and `5xx` become [`Error::Transient`], any other failure
//! status becomes [`Error::Permanent`]. Retrying is left to the caller.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode, header::RETRY_AFTER};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::Mutex;

use crate::{
    catalog::{CatalogApi, PlaylistApi},
    error::{Error, Result},
    management::TokenManager,
    types::{AlbumRef, AlbumType, ArtistRef, Cursor, Page, Playlist, TrackRef},
};

pub mod albums;
pub mod artists;
pub mod auth;
pub mod playlist;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Authenticated handle to the Web API.
///
/// Holds the token manager behind a mutex so an expired access token is
/// refreshed transparently in the middle of a long walk.
pub struct SpotifyClient {
    http: Client,
    api_url: String,
    tokens: Mutex<TokenManager>,
}

impl SpotifyClient {
    pub fn new(api_url: impl Into<String>, tokens: TokenManager) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Config(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            tokens: Mutex::new(tokens),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    async fn bearer(&self) -> Result<String> {
        self.tokens.lock().await.get_valid_token().await
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let request = self.http.get(self.url(path)).query(query);
        let response = self.send(request).await?;
        decode(response).await
    }

    pub(crate) async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let request = self.http.post(self.url(path)).json(body);
        let response = self.send(request).await?;
        decode(response).await
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let token = self.bearer().await?;
        let response = request.bearer_auth(token).send().await?;
        tracing::debug!(url = %response.url(), status = %response.status(), "spotify response");
        classify(response).await
    }
}

async fn classify(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        return Err(Error::Transient {
            message: format!("rate limited ({status})"),
            retry_after,
        });
    }

    let body = response.text().await.unwrap_or_default();
    if status.is_server_error() {
        return Err(Error::transient(format!("{status}: {body}")));
    }
    Err(Error::permanent(Some(status.as_u16()), body))
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes)
        .map_err(|e| Error::permanent(None, format!("unexpected response body: {e}")))
}

impl CatalogApi for SpotifyClient {
    async fn list_followed_artists(&self, cursor: Cursor, limit: u32) -> Result<Page<ArtistRef>> {
        self.followed_artists_page(cursor.after(), limit).await
    }

    async fn list_artist_albums(
        &self,
        artist_id: &str,
        groups: &[AlbumType],
        cursor: Cursor,
        limit: u32,
    ) -> Result<Page<AlbumRef>> {
        self.artist_albums_page(artist_id, groups, cursor.offset(), limit)
            .await
    }

    async fn list_album_tracks(
        &self,
        album_id: &str,
        cursor: Cursor,
        limit: u32,
    ) -> Result<Page<TrackRef>> {
        self.album_tracks_page(album_id, cursor.offset(), limit).await
    }

    async fn list_saved_albums(&self, cursor: Cursor, limit: u32) -> Result<Page<AlbumRef>> {
        self.saved_albums_page(cursor.offset(), limit).await
    }
}

impl PlaylistApi for SpotifyClient {
    async fn current_user_id(&self) -> Result<String> {
        Ok(self.current_user().await?.id)
    }

    async fn create_playlist(
        &self,
        owner_id: &str,
        name: &str,
        description: &str,
        public: bool,
        collaborative: bool,
    ) -> Result<Playlist> {
        let created = self
            .create(owner_id, name, description, public, collaborative)
            .await?;
        Ok(Playlist { id: created.id })
    }

    async fn append_tracks(&self, playlist_id: &str, track_ids: &[String]) -> Result<String> {
        self.add_tracks(playlist_id, track_ids).await
    }
}
