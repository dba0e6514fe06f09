use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tabled::Table;

use crate::{
    error,
    management::TokenManager,
    spotify, success,
    types::{PlaylistTableRow, TrackTableRow},
    utils, warning,
};

async fn valid_token() -> String {
    let mut token_mgr = match TokenManager::load().await {
        Ok(manager) => manager,
        Err(e) => {
            error!(
                "Failed to load token. Please run spoplcli auth\n Error: {}",
                e
            );
        }
    };

    token_mgr.get_valid_token().await
}

fn fetch_spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb
}

// Mutation commands take either full spotify:track: URIs or bare track ids.
fn normalize_uris(tracks: Vec<String>) -> Vec<String> {
    tracks
        .into_iter()
        .map(|track| {
            if track.starts_with("spotify:track:") {
                track
            } else {
                utils::track_uri(&track)
            }
        })
        .collect()
}

/// Prints name, shareable URL and the full ordered track list of a playlist.
pub async fn show_playlist(id: String) {
    let token = valid_token().await;

    let pb = fetch_spinner("Fetching playlist details...");
    let details = match spotify::playlist::get_details(&token, &id).await {
        Ok(details) => {
            pb.finish_and_clear();
            details
        }
        Err(e) => {
            pb.finish_and_clear();
            error!("Failed to get playlist details: {}", e);
        }
    };

    println!("Playlist: {}", details.name);
    if let Some(url) = &details.url {
        println!("URL: {}", url);
    }

    if details.tracks.is_empty() {
        warning!("Playlist has no playable tracks.");
        return;
    }

    let rows: Vec<TrackTableRow> = details
        .tracks
        .iter()
        .map(|track| TrackTableRow {
            title: track.name.clone(),
            artist: track.artist.clone(),
            album: track.album.clone(),
            duration: utils::format_duration(track.duration_ms),
        })
        .collect();

    println!("{}", Table::new(rows));
}

/// Lists the current user's playlists, most recently touched first.
pub async fn list_playlists() {
    let token = valid_token().await;

    let pb = fetch_spinner("Fetching playlists...");
    let playlists = match spotify::user::get_user_playlists(&token, 50, 0).await {
        Ok(playlists) => {
            pb.finish_and_clear();
            playlists
        }
        Err(e) => {
            pb.finish_and_clear();
            error!("Failed to list playlists: {}", e);
        }
    };

    if playlists.is_empty() {
        warning!("No playlists found.");
        return;
    }

    let rows: Vec<PlaylistTableRow> = playlists
        .into_iter()
        .map(|p| PlaylistTableRow {
            name: p.name,
            id: p.id,
        })
        .collect();

    println!("{}", Table::new(rows));
}

pub async fn rename_playlist(id: String, name: String) {
    let token = valid_token().await;

    match spotify::playlist::rename(&token, &id, &name).await {
        Ok(()) => success!("Playlist renamed to {}", name),
        Err(e) => error!("Failed to rename playlist: {}", e),
    }
}

/// Appends tracks to an existing playlist, chunked to the remote's 100-URI
/// cap when more are given.
pub async fn add_tracks(id: String, tracks: Vec<String>) {
    if tracks.is_empty() {
        error!("No tracks provided.");
    }

    let token = valid_token().await;
    let uris = normalize_uris(tracks);

    for chunk in uris.chunks(100) {
        match spotify::playlist::add_tracks(&token, &id, chunk.to_vec()).await {
            Ok(_) => {}
            Err(e) => error!("Failed to add tracks to playlist: {}", e),
        }
    }

    success!("Added {} track(s).", uris.len());
}

pub async fn remove_tracks(id: String, tracks: Vec<String>) {
    if tracks.is_empty() {
        error!("No tracks provided.");
    }

    let token = valid_token().await;
    let uris = normalize_uris(tracks);
    let count = uris.len();

    match spotify::playlist::remove_tracks(&token, &id, uris).await {
        Ok(_) => success!("Removed all occurrences of {} track(s).", count),
        Err(e) => error!("Failed to remove tracks from playlist: {}", e),
    }
}

pub async fn reorder_playlist(id: String, range_start: u32, insert_before: u32, range_length: u32) {
    let token = valid_token().await;

    match spotify::playlist::reorder(&token, &id, range_start, insert_before, range_length).await {
        Ok(_) => success!("Playlist reordered."),
        Err(e) => error!("Failed to reorder playlist: {}", e),
    }
}

pub async fn delete_playlist(id: String) {
    let token = valid_token().await;

    match spotify::playlist::unfollow(&token, &id).await {
        Ok(()) => success!("Playlist removed from your library."),
        Err(e) => error!("Failed to delete playlist: {}", e),
    }
}
