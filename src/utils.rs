use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use lazy_regex::regex;
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};

use crate::types::SongReference;

pub fn generate_code_verifier() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(128)
        .map(char::from)
        .collect()
}

pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

// Fixed, ordered rule list; applied after lowercasing so the comparisons in
// the resolver stay case-insensitive. Applying the rules a second time is a
// no-op, which keeps normalization idempotent.
pub fn normalize_title(title: &str) -> String {
    let patterns = [
        regex!(r"\(ver[\s.]?\d+\)"i),
        regex!(r"\(version\s?\d+\)"i),
        regex!(r"\(live\)"i),
        regex!(r"\([^)]*version[^)]*\)"i),
        regex!(r"\(feat.[^)]*\)"i),
        regex!(r"\(remaster(ed)?\s*\d*\)"i),
        regex!(r"\([^)]*mix[^)]*\)"i),
        regex!(r"\([^)]*edit[^)]*\)"i),
        regex!(r"-\s*remaster(ed)?\s*\d*"i),
        regex!(r"-\s*single\s*version"i),
    ];

    let mut cleaned = title.to_lowercase();
    for pattern in patterns {
        cleaned = pattern.replace_all(&cleaned, "").into_owned();
    }
    cleaned.trim().to_string()
}

// "Artist - Title" when a delimiter exists; otherwise the whole line is the
// title and the artist stays unknown.
pub fn parse_song_reference(raw: &str) -> SongReference {
    if let Some((artist, title)) = raw.split_once('-') {
        let artist = artist.trim();
        let title = title.trim();
        if !artist.is_empty() && !title.is_empty() {
            return SongReference {
                raw: raw.to_string(),
                artist: Some(artist.to_string()),
                title: title.to_string(),
            };
        }
    }

    SongReference {
        raw: raw.to_string(),
        artist: None,
        title: raw.trim().to_string(),
    }
}

// Deterministic key over (token, songs) for the duplicate-submission guard.
pub fn request_fingerprint(token: &str, songs: &[String]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    for song in songs {
        hasher.update(b"\n");
        hasher.update(song.as_bytes());
    }
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

pub fn track_uri(id: &str) -> String {
    format!("spotify:track:{}", id)
}

pub fn format_duration(ms: u64) -> String {
    let minutes = ms / 60_000;
    let seconds = (ms % 60_000) / 1000;
    format!("{}:{:02}", minutes, seconds)
}
