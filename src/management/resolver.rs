use crate::{
    spotify::{self, ApiError},
    types::{SongReference, TrackRecord},
    utils,
};

/// How many candidates one search query may return. Catalog ranking is
/// unreliable for exact title+artist pairs, so the matcher gets a whole
/// page to look through instead of trusting the top hit.
pub const SEARCH_RESULT_LIMIT: u32 = 50;

#[derive(Debug)]
pub enum ResolveError {
    MissingToken,
    Api(ApiError),
}

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveError::MissingToken => write!(f, "No access token provided"),
            ResolveError::Api(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ResolveError {}

impl From<ApiError> for ResolveError {
    fn from(err: ApiError) -> Self {
        ResolveError::Api(err)
    }
}

/// Builds the tiered query cascade for one song reference, most to least
/// specific.
///
/// With a known artist: exact-quoted title plus artist, unquoted title plus
/// artist, field-scoped title-only, bare normalized title. Without one the
/// artist-bearing tiers cannot be built and only the title-scoped tiers
/// remain.
pub fn build_queries(reference: &SongReference) -> Vec<String> {
    let cleaned = utils::normalize_title(&reference.title);

    match &reference.artist {
        Some(artist) => vec![
            format!("\"{}\" {}", cleaned, artist),
            format!("{} {}", cleaned, artist),
            format!("track:\"{}\"", cleaned),
            cleaned,
        ],
        None => vec![format!("track:\"{}\"", cleaned), cleaned],
    }
}

/// Selects the best candidate from one query's result page.
///
/// Prefers an exact match: normalized candidate title equals the normalized
/// input title and the primary artist matches case-insensitively. Without an
/// input artist the exact check cannot succeed and the first (highest
/// ranked) candidate is the best effort. Returns `None` only for an empty
/// page.
pub fn pick_match<'a>(
    candidates: &'a [TrackRecord],
    reference: &SongReference,
) -> Option<&'a TrackRecord> {
    if let Some(artist) = &reference.artist {
        let wanted_title = utils::normalize_title(&reference.title);
        let exact = candidates.iter().find(|track| {
            utils::normalize_title(&track.name) == wanted_title
                && track
                    .artists
                    .first()
                    .is_some_and(|a| a.name.eq_ignore_ascii_case(artist))
        });
        if exact.is_some() {
            return exact;
        }
    }

    candidates.first()
}

/// Resolves one free-text song reference to its best catalog match.
///
/// Walks the query cascade from [`build_queries`] and stops at the first
/// query that returns any results, then applies [`pick_match`] to that page.
/// Resolution never fails merely because an exact match was absent; it
/// returns `Ok(None)` only when every tier comes back empty.
///
/// # Errors
///
/// [`ResolveError::MissingToken`] for an empty token, [`ResolveError::Api`]
/// when a remote search call fails irrecoverably.
pub async fn resolve_track(
    reference: &SongReference,
    token: &str,
) -> Result<Option<TrackRecord>, ResolveError> {
    if token.is_empty() {
        return Err(ResolveError::MissingToken);
    }

    for query in build_queries(reference) {
        let candidates = spotify::search::search_tracks(&query, token, SEARCH_RESULT_LIMIT).await?;
        if candidates.is_empty() {
            continue;
        }

        return Ok(pick_match(&candidates, reference).cloned());
    }

    Ok(None)
}
