//! # Catalog Module
//!
//! The playlist-building pipeline: every followed artist, every album and
//! single of each artist, every non-remix track of each album, appended to one
//! playlist in fixed-size batches.
//!
//! ```text
//! followed artists ──(token cursor)──► sort ──► per artist
//!     artist albums ──(offset cursor)──► dedup ──► per album
//!         album tracks ──(offset cursor)──► remix filter ──► batch writer
//! saved albums ──(offset cursor)──► dedup ──┘
//! ```
//!
//! The remote service is reached only through [`CatalogApi`] and
//! [`PlaylistApi`]; every call made through them is wrapped in
//! [`ResilientFetch`]. The walk is strictly sequential.

use std::future::Future;

use crate::{
    error::Result,
    types::{AlbumRef, AlbumType, ArtistRef, Cursor, Page, Playlist, TrackRef},
};

mod batch;
mod dedup;
mod filter;
mod paginator;
mod retry;
mod walker;

pub use batch::{BatchFailurePolicy, BatchOutcome, BatchWriter, ChunkReceipt, SkippedChunk};
pub use dedup::{AlbumDeduplicator, dedup_albums, dedup_key};
pub use filter::{filter_tracks, is_remix};
pub use paginator::{CursorRule, Paginator};
pub use retry::{Backoff, ResilientFetch, RetryPolicy};
pub use walker::{ArtistOrder, CatalogWalker, FlushStrategy, Stage, WalkOptions, WalkReport};

/// Items requested per page; the service's practical maximum.
pub const PAGE_SIZE: u32 = 50;

/// Track IDs per playlist append call; the service rejects more.
pub const BATCH_SIZE: usize = 50;

/// Release groups enumerated for each artist.
pub const ARTIST_ALBUM_GROUPS: [AlbumType; 2] = [AlbumType::Album, AlbumType::Single];

/// Read side of the music service.
pub trait CatalogApi {
    fn list_followed_artists(
        &self,
        cursor: Cursor,
        limit: u32,
    ) -> impl Future<Output = Result<Page<ArtistRef>>> + Send;

    fn list_artist_albums(
        &self,
        artist_id: &str,
        groups: &[AlbumType],
        cursor: Cursor,
        limit: u32,
    ) -> impl Future<Output = Result<Page<AlbumRef>>> + Send;

    fn list_album_tracks(
        &self,
        album_id: &str,
        cursor: Cursor,
        limit: u32,
    ) -> impl Future<Output = Result<Page<TrackRef>>> + Send;

    fn list_saved_albums(
        &self,
        cursor: Cursor,
        limit: u32,
    ) -> impl Future<Output = Result<Page<AlbumRef>>> + Send;
}

/// Write side of the music service.
pub trait PlaylistApi {
    /// Identifier of the authorized user, the default playlist owner.
    fn current_user_id(&self) -> impl Future<Output = Result<String>> + Send;

    fn create_playlist(
        &self,
        owner_id: &str,
        name: &str,
        description: &str,
        public: bool,
        collaborative: bool,
    ) -> impl Future<Output = Result<Playlist>> + Send;

    /// Appends at most [`BATCH_SIZE`] tracks and returns the new snapshot id.
    fn append_tracks(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> impl Future<Output = Result<String>> + Send;
}
