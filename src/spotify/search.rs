use std::time::Duration;

use reqwest::{Client, StatusCode};
use tokio::time::sleep;

use crate::{
    config,
    spotify::{ApiError, status_error},
    types::{SearchResponse, TrackRecord},
    warning,
};

/// Issues one track search against the Spotify Web API.
///
/// Sends a single `/search` request with `type=track` and a bounded result
/// page, returning the ranked candidate tracks for `query`. An absent
/// `tracks` object in the response is treated as an empty result set.
///
/// # Arguments
///
/// * `query` - Free-form search query, passed through URL encoding
/// * `token` - Valid access token for Spotify API authentication
/// * `limit` - Maximum number of candidates to return (1-50)
///
/// # Rate Limiting
///
/// 429 Too Many Requests responses are handled by sleeping for the duration
/// announced in the `Retry-After` header and re-issuing the request, as long
/// as the announced delay stays within 120 seconds. Longer delays abort the
/// call with the remote error after a warning. 502 Bad Gateway responses are
/// retried after a 10-second pause.
///
/// # Errors
///
/// Any other non-success status surfaces as [`ApiError::Status`] carrying
/// the remote-reported message when present; network failures surface as
/// [`ApiError::Http`].
pub async fn search_tracks(
    query: &str,
    token: &str,
    limit: u32,
) -> Result<Vec<TrackRecord>, ApiError> {
    let api_url = format!("{uri}/search", uri = &config::spotify_apiurl());
    let limit = limit.to_string();

    loop {
        let client = Client::new();
        let response = client
            .get(&api_url)
            .query(&[("q", query), ("type", "track"), ("limit", &limit)])
            .bearer_auth(token)
            .send()
            .await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(0);
            if retry_after <= 120 {
                sleep(Duration::from_secs(retry_after)).await;
                continue; // retry
            }

            warning!(
                "Retry after has reached an abnormal high of {} seconds. Try your best tomorrow again.",
                retry_after
            );
            return Err(status_error(response, "search rate limited").await);
        }

        if response.status() == StatusCode::BAD_GATEWAY {
            sleep(Duration::from_secs(10)).await;
            continue; // retry
        }

        if !response.status().is_success() {
            return Err(status_error(response, "search failed").await);
        }

        let json = response.json::<SearchResponse>().await?;
        return Ok(json.tracks.map(|page| page.items).unwrap_or_default());
    }
}
