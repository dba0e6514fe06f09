use reqwest::Client;

use crate::{
    config,
    spotify::{ApiError, status_error},
    types::{
        AddTracksRequest, CreatePlaylistRequest, CreatePlaylistResponse, PlaylistDetails,
        PlaylistDetailsResponse, PlaylistTrack, PlaylistTracksPage, RemoveTracksRequest,
        RenamePlaylistRequest, ReorderRequest, SnapshotResponse, TrackUri,
    },
};

/// Description written into every playlist this tool creates, marking the
/// tool as origin.
pub const PLAYLIST_DESCRIPTION: &str = "Created with spoplcli";

/// Creates a new, private playlist for the given user.
///
/// One `POST /users/{user_id}/playlists` round trip. The playlist is created
/// private with the fixed [`PLAYLIST_DESCRIPTION`] tag; the caller supplies
/// the display name.
///
/// # Arguments
///
/// * `token` - Valid access token for Spotify API authentication
/// * `user_id` - Owner of the new playlist, from [`crate::spotify::user::current_user_id`]
/// * `name` - Display name for the playlist
///
/// # Errors
///
/// Non-success statuses surface as [`ApiError::Status`] carrying the
/// remote-reported message when present. No automatic retry.
pub async fn create(
    token: &str,
    user_id: &str,
    name: &str,
) -> Result<CreatePlaylistResponse, ApiError> {
    let api_url = format!(
        "{uri}/users/{user_id}/playlists",
        uri = &config::spotify_apiurl(),
        user_id = user_id
    );

    let body = CreatePlaylistRequest {
        name: name.to_string(),
        description: PLAYLIST_DESCRIPTION.to_string(),
        public: false,
    };

    let client = Client::new();
    let response = client
        .post(&api_url)
        .bearer_auth(token)
        .json(&body)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(status_error(response, "failed to create playlist").await);
    }

    let json = response.json::<CreatePlaylistResponse>().await?;
    Ok(json)
}

/// Appends tracks to a playlist.
///
/// One `POST /playlists/{playlist_id}/tracks` round trip. The remote API
/// caps a single call at 100 URIs; callers with more tracks split them into
/// ordered chunks and call once per chunk. No local deduplication is
/// performed, the remote may allow duplicate entries.
///
/// # Arguments
///
/// * `token` - Valid access token for Spotify API authentication
/// * `playlist_id` - Target playlist
/// * `uris` - Track URIs (`spotify:track:{id}`), at most 100
pub async fn add_tracks(
    token: &str,
    playlist_id: &str,
    uris: Vec<String>,
) -> Result<SnapshotResponse, ApiError> {
    let api_url = format!(
        "{uri}/playlists/{id}/tracks",
        uri = &config::spotify_apiurl(),
        id = playlist_id
    );

    let client = Client::new();
    let response = client
        .post(&api_url)
        .bearer_auth(token)
        .json(&AddTracksRequest { uris })
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(status_error(response, "failed to add tracks to playlist").await);
    }

    let json = response.json::<SnapshotResponse>().await?;
    Ok(json)
}

/// Overwrites the display name of an existing playlist.
///
/// One `PUT /playlists/{playlist_id}` round trip. A playlist that no longer
/// exists remotely comes back as a 404 [`ApiError::Status`].
pub async fn rename(token: &str, playlist_id: &str, name: &str) -> Result<(), ApiError> {
    let api_url = format!(
        "{uri}/playlists/{id}",
        uri = &config::spotify_apiurl(),
        id = playlist_id
    );

    let client = Client::new();
    let response = client
        .put(&api_url)
        .bearer_auth(token)
        .json(&RenamePlaylistRequest {
            name: name.to_string(),
        })
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(status_error(response, "failed to rename playlist").await);
    }

    Ok(())
}

/// Removes all occurrences of the given track URIs from a playlist.
///
/// One `DELETE /playlists/{playlist_id}/tracks` round trip with a URI-object
/// body.
pub async fn remove_tracks(
    token: &str,
    playlist_id: &str,
    uris: Vec<String>,
) -> Result<SnapshotResponse, ApiError> {
    let api_url = format!(
        "{uri}/playlists/{id}/tracks",
        uri = &config::spotify_apiurl(),
        id = playlist_id
    );

    let body = RemoveTracksRequest {
        tracks: uris.into_iter().map(|uri| TrackUri { uri }).collect(),
    };

    let client = Client::new();
    let response = client
        .delete(&api_url)
        .bearer_auth(token)
        .json(&body)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(status_error(response, "failed to remove tracks from playlist").await);
    }

    let json = response.json::<SnapshotResponse>().await?;
    Ok(json)
}

/// Moves a contiguous slice of tracks to a new position.
///
/// One `PUT /playlists/{playlist_id}/tracks` round trip. `range_start` and
/// `range_length` select the slice; `insert_before` is the index the slice
/// lands in front of, counted in the playlist as it was before the move.
pub async fn reorder(
    token: &str,
    playlist_id: &str,
    range_start: u32,
    insert_before: u32,
    range_length: u32,
) -> Result<SnapshotResponse, ApiError> {
    let api_url = format!(
        "{uri}/playlists/{id}/tracks",
        uri = &config::spotify_apiurl(),
        id = playlist_id
    );

    let body = ReorderRequest {
        range_start,
        insert_before,
        range_length,
    };

    let client = Client::new();
    let response = client
        .put(&api_url)
        .bearer_auth(token)
        .json(&body)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(status_error(response, "failed to reorder playlist").await);
    }

    let json = response.json::<SnapshotResponse>().await?;
    Ok(json)
}

/// Removes the playlist from the current user's library.
///
/// One `DELETE /playlists/{playlist_id}/followers` round trip. Spotify has
/// no hard delete for playlists; unfollowing is how a user-visible delete is
/// expressed.
pub async fn unfollow(token: &str, playlist_id: &str) -> Result<(), ApiError> {
    let api_url = format!(
        "{uri}/playlists/{id}/followers",
        uri = &config::spotify_apiurl(),
        id = playlist_id
    );

    let client = Client::new();
    let response = client.delete(&api_url).bearer_auth(token).send().await?;

    if !response.status().is_success() {
        return Err(status_error(response, "failed to delete playlist").await);
    }

    Ok(())
}

/// Fetches name, shareable URL and the full ordered track list of a playlist.
///
/// Follows the track-item pagination until the listing is exhausted, so the
/// returned order matches the playlist order exactly. Removed or local-file
/// entries (null track, missing id) are filtered out rather than failing the
/// whole call.
pub async fn get_details(token: &str, playlist_id: &str) -> Result<PlaylistDetails, ApiError> {
    let api_url = format!(
        "{uri}/playlists/{id}",
        uri = &config::spotify_apiurl(),
        id = playlist_id
    );

    let client = Client::new();
    let response = client.get(&api_url).bearer_auth(token).send().await?;

    if !response.status().is_success() {
        return Err(status_error(response, "failed to get playlist details").await);
    }

    let json = response.json::<PlaylistDetailsResponse>().await?;

    let mut tracks: Vec<PlaylistTrack> = Vec::new();
    collect_tracks(&mut tracks, &json.tracks);

    let mut next_url = json.tracks.next.clone();
    while let Some(url) = next_url {
        let response = client.get(&url).bearer_auth(token).send().await?;
        if !response.status().is_success() {
            return Err(status_error(response, "failed to get playlist tracks").await);
        }

        let page = response.json::<PlaylistTracksPage>().await?;
        collect_tracks(&mut tracks, &page);
        next_url = page.next;
    }

    Ok(PlaylistDetails {
        id: json.id,
        name: json.name,
        url: json.external_urls.spotify,
        tracks,
    })
}

fn collect_tracks(tracks: &mut Vec<PlaylistTrack>, page: &PlaylistTracksPage) {
    for entry in &page.items {
        let Some(track) = &entry.track else {
            continue;
        };
        let Some(id) = &track.id else {
            continue; // local or removed entries carry no catalog id
        };

        tracks.push(PlaylistTrack {
            id: id.clone(),
            name: track.name.clone(),
            artist: track
                .artists
                .first()
                .map(|a| a.name.clone())
                .unwrap_or_default(),
            album: track.album.name.clone(),
            duration_ms: track.duration_ms,
            image: track.album.images.first().map(|i| i.url.clone()),
            preview_url: track.preview_url.clone(),
        });
    }
}
