use tabled::Table;

use crate::{
    error,
    management::{TokenManager, resolve_track},
    types::TrackTableRow,
    utils, warning,
};

/// Resolves a single song reference and prints the best catalog match.
pub async fn search(query: String) {
    let mut token_mgr = match TokenManager::load().await {
        Ok(manager) => manager,
        Err(e) => {
            error!(
                "Failed to load token. Please run spoplcli auth\n Error: {}",
                e
            );
        }
    };
    let token = token_mgr.get_valid_token().await;

    let reference = utils::parse_song_reference(&query);
    let track = match resolve_track(&reference, &token).await {
        Ok(track) => track,
        Err(e) => error!("Search failed: {}", e),
    };

    match track {
        Some(track) => {
            let rows = vec![TrackTableRow {
                title: track.name.clone(),
                artist: track
                    .artists
                    .first()
                    .map(|a| a.name.clone())
                    .unwrap_or_default(),
                album: track.album.name.clone(),
                duration: utils::format_duration(track.duration_ms),
            }];
            println!("{}", Table::new(rows));
            println!("uri: {}", utils::track_uri(&track.id));
        }
        None => warning!("No match found for '{}'", query),
    }
}
