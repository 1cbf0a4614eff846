use crate::{
    error::Result,
    spotify::SpotifyClient,
    types::{Album, AlbumRef, AlbumType, Cursor, Page, Paging, SavedAlbum, Track, TrackRef},
};

impl SpotifyClient {
    /// Retrieves one offset page of an artist's releases.
    ///
    /// `groups` maps to `include_groups`, e.g. `album,single`. Results come
    /// back in the service's order, which interleaves editions and regional
    /// variants of the same release; deduplication happens upstream.
    pub async fn artist_albums_page(
        &self,
        artist_id: &str,
        groups: &[AlbumType],
        offset: u32,
        limit: u32,
    ) -> Result<Page<AlbumRef>> {
        let include_groups = groups
            .iter()
            .map(AlbumType::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let query = [
            ("include_groups", include_groups),
            ("limit", limit.to_string()),
            ("offset", offset.to_string()),
        ];

        let res: Paging<Album> = self
            .get(&format!("/artists/{artist_id}/albums"), &query)
            .await?;
        Ok(offset_page(res, AlbumRef::from))
    }

    /// Retrieves one offset page of an album's tracks.
    pub async fn album_tracks_page(
        &self,
        album_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Page<TrackRef>> {
        let query = [("limit", limit.to_string()), ("offset", offset.to_string())];
        let res: Paging<Track> = self
            .get(&format!("/albums/{album_id}/tracks"), &query)
            .await?;

        Ok(offset_page(res, |t| TrackRef {
            id: t.id,
            name: t.name,
        }))
    }

    /// Retrieves one offset page of the user's saved albums.
    pub async fn saved_albums_page(&self, offset: u32, limit: u32) -> Result<Page<AlbumRef>> {
        let query = [("limit", limit.to_string()), ("offset", offset.to_string())];
        let res: Paging<SavedAlbum> = self.get("/me/albums", &query).await?;
        Ok(offset_page(res, |saved| AlbumRef::from(saved.album)))
    }
}

fn offset_page<T, U>(res: Paging<T>, map: impl FnMut(T) -> U) -> Page<U> {
    let cursor = res
        .next
        .as_ref()
        .map(|_| Cursor::Offset(res.offset + res.items.len() as u32));
    Page {
        items: res.items.into_iter().map(map).collect(),
        cursor,
    }
}
