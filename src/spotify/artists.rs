use crate::{
    error::Result,
    spotify::SpotifyClient,
    types::{ArtistRef, Cursor, FollowedArtistsResponse, Page},
};

impl SpotifyClient {
    /// Retrieves one page of the artists the authorized user follows.
    ///
    /// The endpoint pages by cursor: `after` is the ID of the last artist of
    /// the previous page, `None` for the first page. The returned page carries
    /// the service's own `after` cursor when it reports one.
    ///
    /// # Example
    ///
    /// ```
    /// let first = client.followed_artists_page(None, 50).await?;
    /// let last_id = first.items.last().map(|a| a.id.as_str());
    /// let second = client.followed_artists_page(last_id, 50).await?;
    /// ```
    pub async fn followed_artists_page(
        &self,
        after: Option<&str>,
        limit: u32,
    ) -> Result<Page<ArtistRef>> {
        let mut query = vec![("type", "artist".to_string()), ("limit", limit.to_string())];
        if let Some(after) = after {
            query.push(("after", after.to_string()));
        }

        let res: FollowedArtistsResponse = self.get("/me/following", &query).await?;
        let cursor = res
            .artists
            .cursors
            .and_then(|c| c.after)
            .map(Cursor::After);

        Ok(Page {
            items: res.artists.items.into_iter().map(ArtistRef::from).collect(),
            cursor,
        })
    }

    /// Total number of followed artists, using a single one-item request.
    pub async fn followed_artist_count(&self) -> Result<u64> {
        let query = [("type", "artist".to_string()), ("limit", "1".to_string())];
        let res: FollowedArtistsResponse = self.get("/me/following", &query).await?;
        Ok(res.artists.total.unwrap_or(0))
    }
}
