use crate::types::TrackRef;

const REMIX_MARKERS: [&str; 2] = ["mix", "rmx"];

/// Heuristic remix detection on the track title.
///
/// Any title containing "mix" or "rmx" in any case matches, which also catches
/// titles such as "Remixology" or "Mixed Feelings". Those are accepted losses.
pub fn is_remix(name: &str) -> bool {
    let name = name.to_lowercase();
    REMIX_MARKERS.iter().any(|marker| name.contains(marker))
}

/// Drops remixes, keeping the remaining tracks in order.
pub fn filter_tracks(tracks: Vec<TrackRef>) -> Vec<TrackRef> {
    tracks
        .into_iter()
        .filter(|track| {
            let keep = !is_remix(&track.name);
            if !keep {
                tracing::debug!(id = %track.id, name = %track.name, "excluding remix");
            }
            keep
        })
        .collect()
}
