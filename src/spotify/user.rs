use reqwest::Client;

use crate::{
    config,
    spotify::{ApiError, status_error},
    types::{CurrentUserResponse, GetUserPlaylistsResponse, PlaylistSummary},
};

/// Resolves the identity of the user the token belongs to.
///
/// Playlist creation needs the owner's user id in the request path, so the
/// synthesizer calls this once per run before creating anything.
///
/// # Errors
///
/// Non-success statuses surface as [`ApiError::Status`]; a 401 marks the
/// token as expired for the caller to refresh.
pub async fn current_user_id(token: &str) -> Result<String, ApiError> {
    let api_url = format!("{uri}/me", uri = &config::spotify_apiurl());

    let client = Client::new();
    let response = client.get(&api_url).bearer_auth(token).send().await?;

    if !response.status().is_success() {
        return Err(status_error(response, "failed to get user info").await);
    }

    let json = response.json::<CurrentUserResponse>().await?;
    Ok(json.id)
}

/// Retrieves one page of the current user's playlists.
///
/// Spotify orders the listing most recently touched first, which is what the
/// reuse-recent playlist check relies on. A single page is one remote round
/// trip; callers page further with `offset` when they need more.
///
/// # Arguments
///
/// * `token` - Valid access token for Spotify API authentication
/// * `limit` - Maximum number of playlists to return (1-50)
/// * `offset` - Index of the first playlist to return
pub async fn get_user_playlists(
    token: &str,
    limit: u32,
    offset: u32,
) -> Result<Vec<PlaylistSummary>, ApiError> {
    let api_url = format!(
        "{uri}/me/playlists?limit={limit}&offset={offset}",
        uri = &config::spotify_apiurl(),
        limit = limit,
        offset = offset
    );

    let client = Client::new();
    let response = client.get(&api_url).bearer_auth(token).send().await?;

    if !response.status().is_success() {
        return Err(status_error(response, "failed to list playlists").await);
    }

    let json = response.json::<GetUserPlaylistsResponse>().await?;
    Ok(json.items)
}
