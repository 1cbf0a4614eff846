use crate::{
    error::Result,
    spotify::SpotifyClient,
    types::{
        AddTrackToPlaylistRequest, AddTrackToPlaylistResponse, CreatePlaylistRequest,
        CreatePlaylistResponse, CurrentUser,
    },
};

impl SpotifyClient {
    /// Profile of the user the token belongs to.
    pub async fn current_user(&self) -> Result<CurrentUser> {
        self.get("/me", &[]).await
    }

    /// Creates a playlist owned by `user_id`.
    pub async fn create(
        &self,
        user_id: &str,
        name: &str,
        description: &str,
        public: bool,
        collaborative: bool,
    ) -> Result<CreatePlaylistResponse> {
        let body = CreatePlaylistRequest {
            name: name.to_string(),
            description: description.to_string(),
            public,
            collaborative,
        };
        self.post(&format!("/users/{user_id}/playlists"), &body)
            .await
    }

    /// Appends tracks by ID and returns the playlist's new snapshot id.
    ///
    /// The service accepts at most 100 URIs per call; the batch writer sends 50.
    pub async fn add_tracks(&self, playlist_id: &str, track_ids: &[String]) -> Result<String> {
        let body = AddTrackToPlaylistRequest {
            uris: track_ids
                .iter()
                .map(|id| format!("spotify:track:{id}"))
                .collect(),
        };
        let res: AddTrackToPlaylistResponse = self
            .post(&format!("/playlists/{playlist_id}/tracks"), &body)
            .await?;
        Ok(res.snapshot_id)
    }
}
