use chrono::Local;
use tabled::Table;
use tokio_util::sync::CancellationToken;

use crate::{
    catalog::{
        BATCH_SIZE, BatchFailurePolicy, BatchWriter, CatalogWalker, PlaylistApi, ResilientFetch,
        RetryPolicy, WalkOptions, WalkReport,
    },
    cli::authenticated_client,
    config::Settings,
    error::Result,
    info, success,
    types::Playlist,
    utils, warning,
};

#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Defaults to the start time of the run.
    pub name: Option<String>,
    pub description: String,
    pub public: bool,
    pub collaborative: bool,
    pub walk: WalkOptions,
    pub on_write_failure: BatchFailurePolicy,
    pub retry: RetryPolicy,
}

/// Creates the playlist and fills it from the followed-artist catalog.
pub async fn build(settings: &Settings, opts: BuildOptions) -> Result<()> {
    let client = authenticated_client(settings).await?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warning!("Interrupted, stopping after the current request...");
            on_signal.cancel();
        }
    });

    let resilient = ResilientFetch::new(opts.retry, cancel.clone());

    let owner = match &settings.user_id {
        Some(id) => id.clone(),
        None => {
            resilient
                .run("current user", || client.current_user_id())
                .await?
        }
    };

    if opts.walk.followed_artists {
        match client.followed_artist_count().await {
            Ok(total) => info!("Following {} artists", total),
            Err(e) => tracing::debug!(error = %e, "cannot count followed artists"),
        }
    }

    let name = opts
        .name
        .unwrap_or_else(|| utils::playlist_name(&Local::now()));
    info!("creating playlist: {}", name);
    let playlist = create_playlist(
        &client,
        &owner,
        &name,
        &opts.description,
        opts.public,
        opts.collaborative,
        cancel.clone(),
    )
    .await?;
    success!("Playlist {} created ({})", name, playlist.id);

    let writer = BatchWriter::new(BATCH_SIZE, opts.on_write_failure);
    let walker = CatalogWalker::new(&client, resilient, writer, opts.walk, cancel);
    let mut report = WalkReport::default();
    let walked = walker.walk(&playlist, &mut report).await;

    for chunk in &report.skipped_chunks {
        warning!(
            "Chunk #{} was not appended ({}): {}",
            chunk.index,
            chunk.reason,
            chunk.track_ids.join(",")
        );
    }

    println!("{}", Table::new(utils::summary_rows(&report)));
    if let Err(e) = walked {
        warning!("Stopped during {} with playlist {} partly filled", report.stage, name);
        return Err(e);
    }
    success!(
        "Playlist {} populated with {} tracks",
        name,
        report.tracks_written
    );
    Ok(())
}

/// Creates the playlist with a single attempt; the POST is not idempotent.
pub async fn create_playlist<P: PlaylistApi>(
    api: &P,
    owner: &str,
    name: &str,
    description: &str,
    public: bool,
    collaborative: bool,
    cancel: CancellationToken,
) -> Result<Playlist> {
    ResilientFetch::new(RetryPolicy::no_retry(), cancel)
        .run("create playlist", || {
            api.create_playlist(owner, name, description, public, collaborative)
        })
        .await
}
