//! # Spotify Integration Module
//!
//! This module provides the interface to the Spotify Web API used by the
//! playlist builder. It handles HTTP communication, the OAuth 2.0 PKCE
//! authentication flow, catalog search, and playlist management, and serves
//! as the integration layer between the resolution pipeline and Spotify's
//! services.
//!
//! ## Core Modules
//!
//! - [`auth`] - OAuth 2.0 PKCE flow: browser launch, local callback server,
//!   code exchange and token refresh
//! - [`search`] - Track search with rate-limit (429 Retry-After) handling
//! - [`user`] - Current-user lookup and paginated playlist listing
//! - [`playlist`] - Playlist creation and mutation: add, remove, reorder,
//!   rename, unfollow, details
//!
//! ## API Coverage
//!
//! - `GET /search` - Ranked track search with a bounded result page
//! - `GET /me` - Current user identity
//! - `GET /me/playlists` - User's playlists, paginated
//! - `POST /users/{user_id}/playlists` - Create a playlist
//! - `POST /playlists/{playlist_id}/tracks` - Append tracks (max 100 URIs)
//! - `DELETE /playlists/{playlist_id}/tracks` - Remove tracks by URI
//! - `PUT /playlists/{playlist_id}` - Change playlist details
//! - `PUT /playlists/{playlist_id}/tracks` - Reorder a track range
//! - `DELETE /playlists/{playlist_id}/followers` - Unfollow (delete for user)
//! - `GET /playlists/{playlist_id}` - Full details including track items
//! - `POST /api/token` - Token exchange and refresh
//!
//! ## Error Handling
//!
//! All playlist and user operations surface failures as [`ApiError`]: either
//! a transport-level `reqwest` failure or a non-success HTTP status carrying
//! the remote-reported `error.message` when the body provides one. None of
//! the mutation operations retry automatically; callers refresh an expired
//! token and re-issue. An expired credential (401) is recognizable through
//! [`ApiError::is_token_expired`] and its "token expired" message prefix so
//! a collaborating layer can react.
//!
//! Search is the one place with built-in patience: 429 responses are retried
//! after the `Retry-After` delay and 502 responses after a short pause,
//! mirroring how the rest of the API layer treats transient upstream errors.

use reqwest::StatusCode;

pub mod auth;
pub mod playlist;
pub mod search;
pub mod user;

/// Error type for Spotify Web API calls.
///
/// `Http` wraps transport-level failures from reqwest (connection errors,
/// timeouts, body decoding). `Status` captures a non-success HTTP status
/// together with the remote-provided error message when the response body
/// carried one, else a generic description of the failed step.
#[derive(Debug)]
pub enum ApiError {
    Http(reqwest::Error),
    Status { status: StatusCode, message: String },
}

impl ApiError {
    /// True when the remote rejected the call because the bearer token has
    /// expired. Surfaced distinctly so callers can refresh and re-issue;
    /// nothing in this layer retries with a refreshed token on its own.
    pub fn is_token_expired(&self) -> bool {
        matches!(
            self,
            ApiError::Status {
                status: StatusCode::UNAUTHORIZED,
                ..
            }
        )
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Http(e) => write!(f, "{}", e),
            ApiError::Status { status, message } => {
                if *status == StatusCode::UNAUTHORIZED {
                    write!(f, "token expired: {}", message)
                } else {
                    write!(f, "{} ({})", message, status)
                }
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Http(err)
    }
}

/// Turns a non-success response into an [`ApiError::Status`], pulling the
/// message out of Spotify's `{"error": {"message": ...}}` body when present.
pub(crate) async fn status_error(response: reqwest::Response, fallback: &str) -> ApiError {
    let status = response.status();
    let message = response
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|body| body["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| fallback.to_string());

    ApiError::Status { status, message }
}
