#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use playall::{
    Error, Result,
    catalog::{
        Backoff, BatchWriter, CatalogApi, CatalogWalker, PlaylistApi, ResilientFetch,
        RetryPolicy, WalkOptions,
    },
    config::Settings,
    types::{AlbumRef, AlbumType, ArtistRef, Cursor, Page, Playlist, Token, TrackRef},
};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Transient,
    Permanent,
}

impl Failure {
    fn into_error(self) -> Error {
        match self {
            Failure::Transient => Error::transient("503 Service Unavailable"),
            Failure::Permanent => Error::permanent(Some(404), "playlist not found"),
        }
    }
}

/// In-memory stand-in for the music service.
#[derive(Default)]
pub struct FakeSpotify {
    pub artists: Vec<ArtistRef>,
    pub albums: HashMap<String, Vec<AlbumRef>>,
    pub tracks: HashMap<String, Vec<TrackRef>>,
    pub saved: Vec<AlbumRef>,
    /// Every successful append call, in order.
    pub appends: Mutex<Vec<Vec<String>>>,
    /// Album IDs whose track listing was requested, per request.
    pub track_requests: Mutex<Vec<String>>,
    append_attempts: AtomicUsize,
    append_failures: Mutex<HashMap<usize, Failure>>,
    track_failures: Mutex<Vec<Failure>>,
    album_failures: Mutex<HashMap<String, Failure>>,
    cancel_after: Mutex<Option<(usize, CancellationToken)>>,
    create_attempts: AtomicUsize,
    create_failure: Mutex<Option<Failure>>,
}

pub fn artist(id: &str, name: &str) -> ArtistRef {
    ArtistRef {
        id: id.to_string(),
        name: name.to_string(),
    }
}

pub fn album(id: &str, name: &str, release_date: &str) -> AlbumRef {
    AlbumRef {
        id: id.to_string(),
        name: name.to_string(),
        release_date: release_date.to_string(),
        album_type: AlbumType::Album,
    }
}

pub fn track(id: &str, name: &str) -> TrackRef {
    TrackRef {
        id: id.to_string(),
        name: name.to_string(),
    }
}

/// `count` plain tracks named `<prefix>-<n>`.
pub fn tracks(prefix: &str, count: usize) -> Vec<TrackRef> {
    (0..count)
        .map(|n| track(&format!("{prefix}-{n}"), &format!("Song {n}")))
        .collect()
}

fn offset_slice<T: Clone>(items: &[T], cursor: &Cursor, limit: u32) -> Vec<T> {
    items
        .iter()
        .skip(cursor.offset() as usize)
        .take(limit as usize)
        .cloned()
        .collect()
}

impl FakeSpotify {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_artist(
        mut self,
        artist: ArtistRef,
        albums: Vec<(AlbumRef, Vec<TrackRef>)>,
    ) -> Self {
        let mut listed = Vec::new();
        for (album, tracks) in albums {
            self.tracks.insert(album.id.clone(), tracks);
            listed.push(album);
        }
        self.albums.insert(artist.id.clone(), listed);
        self.artists.push(artist);
        self
    }

    pub fn with_saved(mut self, album: AlbumRef, tracks: Vec<TrackRef>) -> Self {
        self.tracks.insert(album.id.clone(), tracks);
        self.saved.push(album);
        self
    }

    /// The `attempt`-th append call (0-based, retries included) fails.
    pub fn fail_append(&self, attempt: usize, failure: Failure) {
        self.append_failures.lock().unwrap().insert(attempt, failure);
    }

    /// The next track listing requests fail, one failure per request.
    pub fn fail_track_reads(&self, failures: Vec<Failure>) {
        *self.track_failures.lock().unwrap() = failures;
    }

    /// The first track listing request for `album_id` fails.
    pub fn fail_album_tracks(&self, album_id: &str, failure: Failure) {
        self.album_failures
            .lock()
            .unwrap()
            .insert(album_id.to_string(), failure);
    }

    /// Cancels `token` once `appends` append calls have succeeded.
    pub fn cancel_after_appends(&self, appends: usize, token: CancellationToken) {
        *self.cancel_after.lock().unwrap() = Some((appends, token));
    }

    /// Every playlist creation fails.
    pub fn fail_create(&self, failure: Failure) {
        *self.create_failure.lock().unwrap() = Some(failure);
    }

    pub fn create_attempts(&self) -> usize {
        self.create_attempts.load(Ordering::SeqCst)
    }

    pub fn appended(&self) -> Vec<Vec<String>> {
        self.appends.lock().unwrap().clone()
    }

    pub fn appended_ids(&self) -> Vec<String> {
        self.appended().into_iter().flatten().collect()
    }

    pub fn append_attempts(&self) -> usize {
        self.append_attempts.load(Ordering::SeqCst)
    }
}

impl CatalogApi for FakeSpotify {
    async fn list_followed_artists(&self, cursor: Cursor, limit: u32) -> Result<Page<ArtistRef>> {
        let start = match cursor.after() {
            Some(after) => self
                .artists
                .iter()
                .position(|a| a.id == after)
                .map_or(self.artists.len(), |i| i + 1),
            None => 0,
        };
        let items = self
            .artists
            .iter()
            .skip(start)
            .take(limit as usize)
            .cloned()
            .collect();
        Ok(Page::new(items))
    }

    async fn list_artist_albums(
        &self,
        artist_id: &str,
        groups: &[AlbumType],
        cursor: Cursor,
        limit: u32,
    ) -> Result<Page<AlbumRef>> {
        assert_eq!(groups, &[AlbumType::Album, AlbumType::Single]);
        let albums = self.albums.get(artist_id).cloned().unwrap_or_default();
        Ok(Page::new(offset_slice(&albums, &cursor, limit)))
    }

    async fn list_album_tracks(
        &self,
        album_id: &str,
        cursor: Cursor,
        limit: u32,
    ) -> Result<Page<TrackRef>> {
        self.track_requests
            .lock()
            .unwrap()
            .push(album_id.to_string());

        let failure = {
            let mut failures = self.track_failures.lock().unwrap();
            (!failures.is_empty()).then(|| failures.remove(0))
        };
        if let Some(failure) = failure {
            return Err(failure.into_error());
        }
        if let Some(failure) = self.album_failures.lock().unwrap().remove(album_id) {
            return Err(failure.into_error());
        }

        let tracks = self.tracks.get(album_id).cloned().unwrap_or_default();
        Ok(Page::new(offset_slice(&tracks, &cursor, limit)))
    }

    async fn list_saved_albums(&self, cursor: Cursor, limit: u32) -> Result<Page<AlbumRef>> {
        Ok(Page::new(offset_slice(&self.saved, &cursor, limit)))
    }
}

impl PlaylistApi for FakeSpotify {
    async fn current_user_id(&self) -> Result<String> {
        Ok("listener".to_string())
    }

    async fn create_playlist(
        &self,
        _owner_id: &str,
        name: &str,
        _description: &str,
        _public: bool,
        _collaborative: bool,
    ) -> Result<Playlist> {
        self.create_attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = *self.create_failure.lock().unwrap() {
            return Err(failure.into_error());
        }
        Ok(Playlist {
            id: format!("pl-{name}"),
        })
    }

    async fn append_tracks(&self, _playlist_id: &str, track_ids: &[String]) -> Result<String> {
        let attempt = self.append_attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = self.append_failures.lock().unwrap().remove(&attempt) {
            return Err(failure.into_error());
        }
        assert!(track_ids.len() <= 50, "append of {} tracks", track_ids.len());

        let mut appends = self.appends.lock().unwrap();
        appends.push(track_ids.to_vec());
        if let Some((after, token)) = &*self.cancel_after.lock().unwrap() {
            if appends.len() == *after {
                token.cancel();
            }
        }
        Ok(format!("snapshot-{}", appends.len()))
    }
}

pub fn quick_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts: Some(max_attempts),
        backoff: Backoff::Fixed(Duration::from_millis(1)),
    }
}

pub fn walker<'a>(
    api: &'a FakeSpotify,
    writer: BatchWriter,
    options: WalkOptions,
    cancel: CancellationToken,
) -> CatalogWalker<'a, FakeSpotify> {
    let resilient = ResilientFetch::new(quick_policy(3), cancel.clone());
    CatalogWalker::new(api, resilient, writer, options, cancel)
}

pub fn playlist() -> Playlist {
    Playlist {
        id: "pl-test".to_string(),
    }
}

/// Settings pointing every endpoint at a closed local port.
pub fn settings() -> Settings {
    Settings {
        server_address: "127.0.0.1:0".to_string(),
        client_id: "client-123".to_string(),
        redirect_uri: "http://localhost:8080/callback".to_string(),
        scope: "user-follow-read playlist-modify-private".to_string(),
        auth_url: "https://accounts.example.test/authorize".to_string(),
        token_url: "http://127.0.0.1:9/api/token".to_string(),
        api_url: "http://127.0.0.1:9/v1".to_string(),
        user_id: None,
        retry: RetryPolicy::no_retry(),
    }
}

/// An access token valid for the next hour.
pub fn valid_token(access_token: &str) -> Token {
    Token {
        access_token: access_token.to_string(),
        refresh_token: "refresh".to_string(),
        scope: "user-follow-read".to_string(),
        expires_in: 3600,
        obtained_at: chrono::Utc::now().timestamp() as u64,
    }
}
