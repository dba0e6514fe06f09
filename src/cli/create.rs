use std::io::{BufRead, stdin};

use serde_json::Value;

use crate::{
    error, info,
    management::{
        PipelineEvent, PipelineLogger, RequestGuard, SynthesisError, TokenManager, create_playlist,
    },
    success,
    types::PlaylistMode,
    warning,
};

/// Renders pipeline milestones with the CLI status macros.
struct CliLogger;

impl PipelineLogger for CliLogger {
    fn log(&self, event: PipelineEvent, payload: Value) {
        match event {
            PipelineEvent::Searching => {
                if let Some(song) = payload["song"].as_str() {
                    info!("Searching for {}", song);
                }
            }
            PipelineEvent::TrackFound => {
                info!(
                    "Matched {} -> {} by {}",
                    payload["song"].as_str().unwrap_or_default(),
                    payload["track"].as_str().unwrap_or_default(),
                    payload["artist"].as_str().unwrap_or("unknown artist")
                );
            }
            PipelineEvent::TrackNotFound => {
                warning!(
                    "No match for {}",
                    payload["song"].as_str().unwrap_or_default()
                );
            }
            PipelineEvent::SearchFailed => {
                warning!(
                    "Search failed for {}: {}",
                    payload["song"].as_str().unwrap_or_default(),
                    payload["error"].as_str().unwrap_or_default()
                );
            }
            PipelineEvent::CreatingPlaylist => {
                info!(
                    "Creating playlist {} with {} tracks",
                    payload["name"].as_str().unwrap_or_default(),
                    payload["track_count"]
                );
            }
            PipelineEvent::PlaylistReused => {
                info!(
                    "Reusing recent playlist {}",
                    payload["name"].as_str().unwrap_or_default()
                );
            }
            PipelineEvent::PlaylistCreated => {}
        }
    }
}

/// Builds a playlist from song references given as arguments, a file (one
/// reference per line) or stdin.
pub async fn create(
    name: Option<String>,
    file: Option<String>,
    songs: Vec<String>,
    reuse_recent: bool,
) {
    let songs = collect_songs(file, songs).await;
    if songs.is_empty() {
        error!("No songs provided. Pass references as arguments, via --file, or on stdin.");
    }

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

    let mode = if reuse_recent {
        PlaylistMode::ReuseRecent
    } else {
        PlaylistMode::CreateNew
    };

    let guard = RequestGuard::new();
    let logger = CliLogger;

    let attempt = create_playlist(&token, name.as_deref(), &songs, mode, &guard, &logger).await;

    let result = match attempt {
        Ok(result) => result,
        Err(SynthesisError::TokenExpired(e)) => {
            // caller-driven retry: refresh once and re-issue
            warning!("{}. Refreshing credentials and retrying...", e);
            let token = match token_mgr.force_refresh().await {
                Ok(token) => token,
                Err(e) => {
                    error!("Failed to refresh token. Please run spoplcli auth\n Error: {}", e);
                }
            };

            match create_playlist(&token, name.as_deref(), &songs, mode, &guard, &logger).await {
                Ok(result) => result,
                Err(e) => error!("Failed to create playlist: {}", e),
            }
        }
        Err(e) => error!("Failed to create playlist: {}", e),
    };

    success!(
        "Playlist ready with {} of {} tracks.",
        result.found_track_ids.len(),
        songs.len()
    );
    if let Some(url) = &result.playlist_url {
        success!("Share it: {}", url);
    }
    info!(
        "Inspect it with: spoplcli playlist show {}",
        result.playlist_id
    );

    if !result.not_found_songs.is_empty() {
        warning!(
            "{} song(s) could not be matched:",
            result.not_found_songs.len()
        );
        for song in &result.not_found_songs {
            println!("    - {}", song);
        }
    }
}

async fn collect_songs(file: Option<String>, args: Vec<String>) -> Vec<String> {
    let mut songs: Vec<String> = args;

    if let Some(path) = file {
        let content = match async_fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) => error!("Failed to read song list from {}: {}", path, e),
        };
        songs.extend(non_empty_lines(&content));
    }

    // fall back to stdin so lists can be piped in
    if songs.is_empty() {
        let mut buffer = String::new();
        for line in stdin().lock().lines().map_while(Result::ok) {
            buffer.push_str(&line);
            buffer.push('\n');
        }
        songs.extend(non_empty_lines(&buffer));
    }

    songs
}

fn non_empty_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
