use std::{fmt, future::Future};

use tokio_util::sync::CancellationToken;

use crate::{
    catalog::{
        ARTIST_ALBUM_GROUPS, AlbumDeduplicator, BatchOutcome, BatchWriter, CatalogApi, CursorRule,
        PAGE_SIZE, Paginator, PlaylistApi, ResilientFetch, SkippedChunk, filter_tracks,
    },
    error::{Error, PartialWrite, Result},
    info,
    types::{AlbumRef, ArtistRef, Cursor, Page, Playlist},
};

/// Order in which followed artists are walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArtistOrder {
    /// Lexicographic by name, deterministic across runs.
    #[default]
    Name,
    /// As returned by the service.
    Api,
}

/// When collected track IDs are written to the playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushStrategy {
    /// After each album. A failure leaves every earlier album complete.
    #[default]
    Eager,
    /// Once, after every album of every source has been read.
    CollectThenFlush,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkOptions {
    pub artist_order: ArtistOrder,
    pub flush: FlushStrategy,
    pub followed_artists: bool,
    pub saved_albums: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            artist_order: ArtistOrder::default(),
            flush: FlushStrategy::default(),
            followed_artists: true,
            saved_albums: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Init,
    EnumerateArtists,
    EnumerateAlbums,
    EnumerateTracks,
    Filter,
    Accumulate,
    FlushBatch,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Init => "init",
            Stage::EnumerateArtists => "artist enumeration",
            Stage::EnumerateAlbums => "album enumeration",
            Stage::EnumerateTracks => "track enumeration",
            Stage::Filter => "track filtering",
            Stage::Accumulate => "accumulation",
            Stage::FlushBatch => "batch flush",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Default)]
pub struct WalkReport {
    pub stage: Stage,
    pub artists: usize,
    pub albums_seen: usize,
    pub albums_kept: usize,
    pub duplicates_dropped: usize,
    pub tracks_seen: usize,
    pub tracks_excluded: usize,
    pub tracks_written: usize,
    pub write_calls: usize,
    pub retry_waits: u32,
    pub skipped_chunks: Vec<SkippedChunk>,
}

/// Drives the whole walk for one playlist.
pub struct CatalogWalker<'a, C> {
    api: &'a C,
    resilient: ResilientFetch,
    writer: BatchWriter,
    options: WalkOptions,
    cancel: CancellationToken,
}

impl<'a, C> CatalogWalker<'a, C>
where
    C: CatalogApi + PlaylistApi,
{
    pub fn new(
        api: &'a C,
        resilient: ResilientFetch,
        writer: BatchWriter,
        options: WalkOptions,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            api,
            resilient,
            writer,
            options,
            cancel,
        }
    }

    /// Walks every configured source and appends the surviving tracks to `playlist`.
    pub async fn run(&self, playlist: &Playlist) -> Result<WalkReport> {
        let mut report = WalkReport::default();
        self.walk(playlist, &mut report).await?;
        Ok(report)
    }

    /// Same as [`run`](Self::run), but fills a report owned by the caller, so
    /// what was written or skipped before a failure is still there afterwards.
    /// On error `report.stage` is the last stage entered.
    pub async fn walk(&self, playlist: &Playlist, report: &mut WalkReport) -> Result<()> {
        let walked = self.stages(playlist, report).await;
        report.retry_waits = self.resilient.retry_waits();
        if walked.is_ok() {
            report.stage = Stage::Done;
        }
        walked
    }

    async fn stages(&self, playlist: &Playlist, report: &mut WalkReport) -> Result<()> {
        let mut pending: Vec<String> = Vec::new();

        if self.options.followed_artists {
            self.enter(report, Stage::EnumerateArtists)?;
            let artists = self.followed_artists().await?;
            report.artists = artists.len();

            for (n, artist) in artists.iter().enumerate() {
                info!(
                    "artist #{:03} ID: {}, Name: {}",
                    n + 1,
                    artist.id,
                    artist.name
                );
                self.enter(report, Stage::EnumerateAlbums)?;
                let albums = self.artist_albums(artist, report).await?;
                self.process_albums(playlist, &albums, &mut pending, report)
                    .await?;
            }
        }

        if self.options.saved_albums {
            self.enter(report, Stage::EnumerateAlbums)?;
            let albums = self.saved_albums(report).await?;
            info!("saved albums: {} after deduplication", albums.len());
            self.process_albums(playlist, &albums, &mut pending, report)
                .await?;
        }

        if self.options.flush == FlushStrategy::CollectThenFlush {
            self.flush(playlist, &pending, report).await?;
        }

        Ok(())
    }

    fn enter(&self, report: &mut WalkReport, stage: Stage) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled(stage.to_string()));
        }
        tracing::trace!(from = ?report.stage, to = ?stage, "stage");
        report.stage = stage;
        Ok(())
    }

    async fn followed_artists(&self) -> Result<Vec<ArtistRef>> {
        let api = self.api;
        let resilient = &self.resilient;
        let mut artists = Paginator::new(CursorRule::Token, move |cursor: Cursor| {
            resilient.run("followed artists", move || {
                api.list_followed_artists(cursor.clone(), PAGE_SIZE)
            })
        })
        .collect_all()
        .await?;

        if self.options.artist_order == ArtistOrder::Name {
            artists.sort_by(|a, b| a.name.cmp(&b.name));
        }
        Ok(artists)
    }

    async fn artist_albums(
        &self,
        artist: &ArtistRef,
        report: &mut WalkReport,
    ) -> Result<Vec<AlbumRef>> {
        let api = self.api;
        let resilient = &self.resilient;
        let artist_id = artist.id.as_str();
        let pages = Paginator::new(CursorRule::Offset, move |cursor: Cursor| {
            resilient.run("artist albums", move || {
                api.list_artist_albums(artist_id, &ARTIST_ALBUM_GROUPS, cursor.clone(), PAGE_SIZE)
            })
        });
        self.dedup_stream(pages, report).await
    }

    async fn saved_albums(&self, report: &mut WalkReport) -> Result<Vec<AlbumRef>> {
        let api = self.api;
        let resilient = &self.resilient;
        let pages = Paginator::new(CursorRule::Offset, move |cursor: Cursor| {
            resilient.run("saved albums", move || {
                api.list_saved_albums(cursor.clone(), PAGE_SIZE)
            })
        });
        self.dedup_stream(pages, report).await
    }

    /// Drains an album stream through a fresh deduplicator.
    async fn dedup_stream<F, Fut>(
        &self,
        mut pages: Paginator<AlbumRef, F>,
        report: &mut WalkReport,
    ) -> Result<Vec<AlbumRef>>
    where
        F: FnMut(Cursor) -> Fut,
        Fut: Future<Output = Result<Page<AlbumRef>>>,
    {
        let mut dedup = AlbumDeduplicator::new();
        let mut kept = Vec::new();
        while let Some(album) = pages.next().await? {
            report.albums_seen += 1;
            if dedup.admit(&album) {
                kept.push(album);
            } else {
                report.duplicates_dropped += 1;
                tracing::debug!(
                    id = %album.id,
                    name = %album.name,
                    date = %album.release_date,
                    "dropping duplicate release"
                );
            }
        }
        report.albums_kept += kept.len();
        Ok(kept)
    }

    async fn process_albums(
        &self,
        playlist: &Playlist,
        albums: &[AlbumRef],
        pending: &mut Vec<String>,
        report: &mut WalkReport,
    ) -> Result<()> {
        for album in albums {
            self.enter(report, Stage::EnumerateTracks)?;
            let api = self.api;
            let resilient = &self.resilient;
            let album_id = album.id.as_str();
            let tracks = Paginator::new(CursorRule::Offset, move |cursor: Cursor| {
                resilient.run("album tracks", move || {
                    api.list_album_tracks(album_id, cursor.clone(), PAGE_SIZE)
                })
            })
            .collect_all()
            .await?;

            self.enter(report, Stage::Filter)?;
            let seen = tracks.len();
            let kept = filter_tracks(tracks);
            report.tracks_seen += seen;
            report.tracks_excluded += seen - kept.len();
            tracing::debug!(album = %album.name, kept = kept.len(), seen, "album tracks");

            self.enter(report, Stage::Accumulate)?;
            let ids = kept.into_iter().map(|t| t.id);
            match self.options.flush {
                FlushStrategy::Eager => {
                    let ids: Vec<String> = ids.collect();
                    self.flush(playlist, &ids, report).await?;
                }
                FlushStrategy::CollectThenFlush => pending.extend(ids),
            }
        }
        Ok(())
    }

    async fn flush(
        &self,
        playlist: &Playlist,
        track_ids: &[String],
        report: &mut WalkReport,
    ) -> Result<()> {
        if track_ids.is_empty() {
            return Ok(());
        }
        self.enter(report, Stage::FlushBatch)?;

        let first_index = report.write_calls + report.skipped_chunks.len();
        let written = self
            .writer
            .write(self.api, &self.resilient, &playlist.id, track_ids, first_index)
            .await;

        match written {
            Ok(outcome) => {
                self.record(outcome, report);
                Ok(())
            }
            Err(Error::PartialWrite(mut partial)) => {
                report.write_calls += partial.succeeded_chunks;
                report.tracks_written += partial.tracks_written;
                partial.succeeded_chunks = report.write_calls;
                partial.tracks_written = report.tracks_written;
                Err(Error::PartialWrite(partial))
            }
            // Cancelled before this flush wrote anything, but earlier ones did
            Err(err @ Error::Cancelled(_)) if report.write_calls > 0 => {
                Err(Error::PartialWrite(Box::new(PartialWrite {
                    playlist_id: playlist.id.clone(),
                    succeeded_chunks: report.write_calls,
                    tracks_written: report.tracks_written,
                    failed_chunk: first_index,
                    failed_track_ids: track_ids
                        .iter()
                        .take(self.writer.batch_size())
                        .cloned()
                        .collect(),
                    source: err,
                })))
            }
            Err(err) => Err(err),
        }
    }

    fn record(&self, outcome: BatchOutcome, report: &mut WalkReport) {
        report.tracks_written += outcome.tracks_written();
        report.write_calls += outcome.written.len();
        report.skipped_chunks.extend(outcome.skipped);
    }
}
