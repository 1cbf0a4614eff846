use std::collections::HashSet;

use crate::types::AlbumRef;

/// Identity used to collapse reissues: lowercased name followed by the release
/// year (the first four characters of the release date, or all of it when
/// shorter).
///
/// Album type is not part of the key, so a single and an album sharing a name
/// and year count as the same release.
pub fn dedup_key(album: &AlbumRef) -> String {
    let year: String = album.release_date.chars().take(4).collect();
    format!("{}{}", album.name, year).to_lowercase()
}

/// Remembers the keys seen for one album source, usually one artist.
#[derive(Debug, Default)]
pub struct AlbumDeduplicator {
    seen: HashSet<String>,
}

impl AlbumDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` the first time an album's key shows up, `false` afterwards.
    pub fn admit(&mut self, album: &AlbumRef) -> bool {
        self.seen.insert(dedup_key(album))
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Keeps the first album per key, preserving order.
pub fn dedup_albums(albums: Vec<AlbumRef>) -> Vec<AlbumRef> {
    let mut dedup = AlbumDeduplicator::new();
    albums.into_iter().filter(|a| dedup.admit(a)).collect()
}
