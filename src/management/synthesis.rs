use serde_json::json;

use crate::{
    management::{
        guard::RequestGuard,
        logger::{PipelineEvent, PipelineLogger},
        resolver,
    },
    spotify::{self, ApiError},
    types::{CreatePlaylistResult, PlaylistMode, PlaylistSummary},
    utils,
};

/// Name used when the caller leaves the playlist unnamed.
pub const DEFAULT_PLAYLIST_NAME: &str = "My Generated Playlist";

/// Upper bound the remote API places on one track-insertion call.
pub const INSERT_CHUNK_SIZE: usize = 100;

#[derive(Debug)]
pub enum SynthesisError {
    /// Missing token or empty song list; nothing was sent to the remote.
    Validation(String),
    /// An identical request is already in flight; the original run is
    /// unaffected.
    ConcurrentRequest,
    /// Every song failed to resolve; no playlist was created.
    NoTracksFound,
    /// The remote rejected a call because the token has expired. The caller
    /// refreshes and re-invokes; the pipeline never self-heals.
    TokenExpired(ApiError),
    /// Any other non-success remote status, carrying the remote-reported
    /// message when available.
    Remote(ApiError),
}

impl std::fmt::Display for SynthesisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SynthesisError::Validation(msg) => write!(f, "{}", msg),
            SynthesisError::ConcurrentRequest => {
                write!(f, "An identical playlist request is already in flight")
            }
            SynthesisError::NoTracksFound => write!(f, "No tracks found"),
            // ApiError already renders 401s with the "token expired" marker
            SynthesisError::TokenExpired(e) => write!(f, "{}", e),
            SynthesisError::Remote(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SynthesisError {}

fn remote_error(err: ApiError) -> SynthesisError {
    if err.is_token_expired() {
        SynthesisError::TokenExpired(err)
    } else {
        SynthesisError::Remote(err)
    }
}

/// Splits found-track URIs into the ordered batches the insertion endpoint
/// accepts: `ceil(N/100)` batches of at most [`INSERT_CHUNK_SIZE`] URIs
/// whose concatenation reconstructs the input order exactly.
pub fn insertion_batches(uris: &[String]) -> Vec<Vec<String>> {
    uris.chunks(INSERT_CHUNK_SIZE)
        .map(|chunk| chunk.to_vec())
        .collect()
}

/// Resolves a batch of song references and materializes a Spotify playlist
/// from the matches.
///
/// The synthesis pipeline, in order:
///
/// 1. Validation: an empty token or song list fails with
///    [`SynthesisError::Validation`] before any remote call.
/// 2. Duplicate-submission guard: the run registers a fingerprint over
///    `(token, songs)` with `guard`; an identical in-flight run fails this
///    one with [`SynthesisError::ConcurrentRequest`]. The registration is
///    released when the run ends, whether it succeeded or not.
/// 3. Sequential resolution: each song is resolved in input order. A song
///    that resolves to nothing, or whose resolution errors, lands in the
///    not-found list; a single failure never aborts the batch.
/// 4. No-matches guard: an empty found list fails with
///    [`SynthesisError::NoTracksFound`] without touching any playlist.
/// 5. Playlist acquisition: under [`PlaylistMode::CreateNew`] the current
///    user is resolved and a fresh private playlist is created. Under
///    [`PlaylistMode::ReuseRecent`] the most recently listed playlist with
///    the same name is reused when one exists.
/// 6. Batch insertion: found tracks are appended as `spotify:track:` URIs in
///    ordered chunks of at most 100. A later chunk failing leaves the
///    earlier chunks in place; the error is surfaced without rollback.
///
/// The found and not-found lists partition the input exactly; found order
/// matches input order minus the skipped songs.
///
/// # Arguments
///
/// * `token` - Valid access token for Spotify API authentication
/// * `name` - Playlist display name; `None` falls back to
///   [`DEFAULT_PLAYLIST_NAME`]
/// * `songs` - Raw song references in submission order
/// * `mode` - Create-new (canonical) or explicit reuse-recent
/// * `guard` - In-flight registry shared between concurrent callers
/// * `logger` - Milestone hook for UI/debug display
pub async fn create_playlist(
    token: &str,
    name: Option<&str>,
    songs: &[String],
    mode: PlaylistMode,
    guard: &RequestGuard,
    logger: &dyn PipelineLogger,
) -> Result<CreatePlaylistResult, SynthesisError> {
    if token.is_empty() {
        return Err(SynthesisError::Validation(
            "No access token provided".to_string(),
        ));
    }
    if songs.is_empty() {
        return Err(SynthesisError::Validation("No songs provided".to_string()));
    }

    let fingerprint = utils::request_fingerprint(token, songs);
    let Some(_entry) = guard.acquire(&fingerprint) else {
        return Err(SynthesisError::ConcurrentRequest);
    };
    // _entry stays alive until return, releasing the fingerprint on drop

    let mut found_track_ids: Vec<String> = Vec::new();
    let mut not_found_songs: Vec<String> = Vec::new();

    for song in songs {
        logger.log(PipelineEvent::Searching, json!({ "song": song }));

        let reference = utils::parse_song_reference(song);
        match resolver::resolve_track(&reference, token).await {
            Ok(Some(track)) => {
                logger.log(
                    PipelineEvent::TrackFound,
                    json!({
                        "song": song,
                        "track": track.name,
                        "artist": track.artists.first().map(|a| a.name.clone()),
                    }),
                );
                found_track_ids.push(track.id);
            }
            Ok(None) => {
                logger.log(PipelineEvent::TrackNotFound, json!({ "song": song }));
                not_found_songs.push(song.clone());
            }
            Err(e) => {
                // transient per-song search errors count as not found
                logger.log(
                    PipelineEvent::SearchFailed,
                    json!({ "song": song, "error": e.to_string() }),
                );
                not_found_songs.push(song.clone());
            }
        }
    }

    if found_track_ids.is_empty() {
        return Err(SynthesisError::NoTracksFound);
    }

    let playlist_name = name.unwrap_or(DEFAULT_PLAYLIST_NAME);
    logger.log(
        PipelineEvent::CreatingPlaylist,
        json!({ "name": playlist_name, "track_count": found_track_ids.len() }),
    );

    let reusable = match mode {
        PlaylistMode::ReuseRecent => find_recent_playlist(token, playlist_name).await?,
        PlaylistMode::CreateNew => None,
    };

    let (playlist_id, playlist_url) = match reusable {
        Some(existing) => {
            logger.log(
                PipelineEvent::PlaylistReused,
                json!({ "playlist_id": existing.id, "name": existing.name }),
            );
            (existing.id, existing.external_urls.spotify)
        }
        None => {
            let user_id = spotify::user::current_user_id(token)
                .await
                .map_err(remote_error)?;
            let created = spotify::playlist::create(token, &user_id, playlist_name)
                .await
                .map_err(remote_error)?;
            (created.id, created.external_urls.spotify)
        }
    };

    let uris: Vec<String> = found_track_ids
        .iter()
        .map(|id| utils::track_uri(id))
        .collect();
    for batch in insertion_batches(&uris) {
        // a failing chunk leaves earlier chunks in place; no rollback
        spotify::playlist::add_tracks(token, &playlist_id, batch)
            .await
            .map_err(remote_error)?;
    }

    logger.log(
        PipelineEvent::PlaylistCreated,
        json!({ "playlist_id": playlist_id, "tracks": found_track_ids.len() }),
    );

    Ok(CreatePlaylistResult {
        playlist_id,
        playlist_url,
        found_track_ids,
        not_found_songs,
    })
}

// Spotify lists /me/playlists most recently touched first; the first page is
// enough for the reuse check.
async fn find_recent_playlist(
    token: &str,
    name: &str,
) -> Result<Option<PlaylistSummary>, SynthesisError> {
    let playlists = spotify::user::get_user_playlists(token, 50, 0)
        .await
        .map_err(remote_error)?;

    Ok(playlists.into_iter().find(|p| p.name == name))
}
