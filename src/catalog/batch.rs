use crate::{
    catalog::{BATCH_SIZE, PlaylistApi, ResilientFetch},
    error::{Error, PartialWrite, Result},
    warning,
};

/// What to do when one chunk cannot be appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchFailurePolicy {
    /// Stop the run with [`Error::PartialWrite`].
    #[default]
    Abort,
    /// Record the chunk in [`BatchOutcome::skipped`] and keep going.
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkReceipt {
    /// Position of the chunk among all chunks written during the run.
    pub index: usize,
    pub len: usize,
    pub snapshot_id: String,
}

#[derive(Debug, Clone)]
pub struct SkippedChunk {
    pub index: usize,
    pub track_ids: Vec<String>,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub written: Vec<ChunkReceipt>,
    pub skipped: Vec<SkippedChunk>,
}

impl BatchOutcome {
    pub fn tracks_written(&self) -> usize {
        self.written.iter().map(|r| r.len).sum()
    }
}

/// Appends track IDs to a playlist in consecutive chunks, one call per chunk.
#[derive(Debug, Clone)]
pub struct BatchWriter {
    batch_size: usize,
    policy: BatchFailurePolicy,
}

impl Default for BatchWriter {
    fn default() -> Self {
        Self::new(BATCH_SIZE, BatchFailurePolicy::default())
    }
}

impl BatchWriter {
    /// A zero batch size is raised to one.
    pub fn new(batch_size: usize, policy: BatchFailurePolicy) -> Self {
        Self {
            batch_size: batch_size.max(1),
            policy,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Writes `track_ids` in order. `first_index` numbers the first chunk so
    /// receipts stay unique across several calls within one run.
    ///
    /// Under [`BatchFailurePolicy::Abort`], or on cancellation after at least
    /// one chunk went through, the returned [`PartialWrite`] only accounts for
    /// chunks of this call; callers that flushed earlier add their own totals.
    pub async fn write<P: PlaylistApi>(
        &self,
        api: &P,
        resilient: &ResilientFetch,
        playlist_id: &str,
        track_ids: &[String],
        first_index: usize,
    ) -> Result<BatchOutcome> {
        let mut outcome = BatchOutcome::default();

        for (n, chunk) in track_ids.chunks(self.batch_size).enumerate() {
            let index = first_index + n;
            let written = resilient
                .run("append tracks", || api.append_tracks(playlist_id, chunk))
                .await;

            match written {
                Ok(snapshot_id) => outcome.written.push(ChunkReceipt {
                    index,
                    len: chunk.len(),
                    snapshot_id,
                }),
                Err(err @ Error::Cancelled(_)) if outcome.written.is_empty() => return Err(err),
                Err(err @ Error::Cancelled(_)) => {
                    return Err(partial_write(playlist_id, &outcome, index, chunk, err));
                }
                Err(err) if self.policy == BatchFailurePolicy::Skip => {
                    warning!("Skipping chunk #{} ({} tracks): {}", index, chunk.len(), err);
                    outcome.skipped.push(SkippedChunk {
                        index,
                        track_ids: chunk.to_vec(),
                        reason: err.to_string(),
                    });
                }
                Err(err) => {
                    return Err(partial_write(playlist_id, &outcome, index, chunk, err));
                }
            }
        }

        Ok(outcome)
    }
}

fn partial_write(
    playlist_id: &str,
    outcome: &BatchOutcome,
    failed_chunk: usize,
    chunk: &[String],
    source: Error,
) -> Error {
    Error::PartialWrite(Box::new(PartialWrite {
        playlist_id: playlist_id.to_string(),
        succeeded_chunks: outcome.written.len(),
        tracks_written: outcome.tracks_written(),
        failed_chunk,
        failed_track_ids: chunk.to_vec(),
        source,
    }))
}
