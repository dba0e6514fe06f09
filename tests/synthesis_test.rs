//! End-to-end pipeline tests against a local stand-in for the Spotify Web
//! API. The client reads its base URL from `SPOTIFY_API_URL`, so one mock
//! server per test process is enough; every test uses its own token string
//! and playlist names to keep recorded calls apart.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, OnceLock, atomic::AtomicUsize, atomic::Ordering},
    time::Duration,
};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde_json::{Value, json};

use spoplcli::management::{
    NullLogger, PipelineEvent, PipelineLogger, RequestGuard, SynthesisError, create_playlist,
    resolve_track,
};
use spoplcli::spotify::{self, ApiError};
use spoplcli::types::PlaylistMode;
use spoplcli::utils::parse_song_reference;

#[derive(Clone, Debug)]
struct Call {
    method: String,
    path: String,
    token: String,
    query: String,
    body: Value,
}

struct MockState {
    calls: Mutex<Vec<Call>>,
    playlists: Mutex<Vec<(String, String)>>,
    counter: AtomicUsize,
    base_url: Mutex<String>,
}

impl MockState {
    fn record(&self, method: &str, path: &str, token: &str, query: &str, body: Value) {
        self.calls.lock().unwrap().push(Call {
            method: method.to_string(),
            path: path.to_string(),
            token: token.to_string(),
            query: query.to_string(),
            body,
        });
    }
}

static MOCK: OnceLock<Arc<MockState>> = OnceLock::new();

fn mock() -> &'static Arc<MockState> {
    MOCK.get_or_init(|| {
        let state = Arc::new(MockState {
            calls: Mutex::new(Vec::new()),
            playlists: Mutex::new(Vec::new()),
            counter: AtomicUsize::new(0),
            base_url: Mutex::new(String::new()),
        });

        let server_state = Arc::clone(&state);
        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async move {
                let app = router(Arc::clone(&server_state));
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
                let addr = listener.local_addr().unwrap();
                *server_state.base_url.lock().unwrap() = format!("http://{}", addr);
                tx.send(addr).unwrap();
                axum::serve(listener, app).await.unwrap();
            });
        });

        let addr = rx.recv().unwrap();
        unsafe {
            std::env::set_var("SPOTIFY_API_URL", format!("http://{}", addr));
        }

        state
    })
}

fn router(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/search", get(search))
        .route("/me", get(me))
        .route("/me/playlists", get(me_playlists))
        .route("/users/{user_id}/playlists", post(create_user_playlist))
        .route(
            "/playlists/{id}/tracks",
            post(add_playlist_tracks)
                .delete(remove_playlist_tracks)
                .put(reorder_playlist_tracks),
        )
        .route("/playlists/{id}", get(playlist_details).put(rename_playlist))
        .route("/playlists/{id}/followers", delete(unfollow_playlist))
        .route("/fixture-tracks-page2", get(fixture_tracks_page2))
        .with_state(state)
}

fn bearer(headers: &HeaderMap) -> String {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or("")
        .to_string()
}

fn expired_response() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": {"status": 401, "message": "The access token expired"}})),
    )
        .into_response()
}

fn empty_page() -> Response {
    Json(json!({"tracks": {"items": []}})).into_response()
}

async fn search(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let token = bearer(&headers);
    let q = params.get("q").cloned().unwrap_or_default();
    state.record("GET", "/search", &token, &q, Value::Null);

    let ql = q.to_lowercase();

    if ql.contains("slow") {
        tokio::time::sleep(Duration::from_millis(400)).await;
    }

    if ql.contains("nonexistent") {
        return empty_page();
    }

    if ql.contains("karma police") {
        return Json(json!({"tracks": {"items": [{
            "id": "6b2oQwSGFkzsMtQruIWm2p",
            "name": "Karma Police",
            "artists": [{"name": "Radiohead"}],
            "album": {"name": "OK Computer", "images": [{"url": "https://images.example/okc.jpg"}]},
            "duration_ms": 261_000,
            "preview_url": null
        }]}}))
        .into_response();
    }

    // Only the bare normalized-title tier yields a result for this one
    if ql.contains("obscurity") {
        if ql == "obscurity" {
            return Json(json!({"tracks": {"items": [{
                "id": "trk-obscurity",
                "name": "Obscurity",
                "artists": [{"name": "Somebody"}],
                "album": {"name": "Deep Cuts", "images": []},
                "duration_ms": 180_000,
                "preview_url": null
            }]}}))
            .into_response();
        }
        return empty_page();
    }

    // Default: one hit whose id echoes the digits in the query so batches
    // of numbered songs resolve to distinct tracks
    let digits: String = q.chars().filter(|c| c.is_ascii_digit()).collect();
    let id = if digits.is_empty() {
        "trk-generic".to_string()
    } else {
        format!("trk{}", digits)
    };

    Json(json!({"tracks": {"items": [{
        "id": id,
        "name": q,
        "artists": [{"name": "Mock Artist"}],
        "album": {"name": "Mock Album", "images": []},
        "duration_ms": 200_000,
        "preview_url": null
    }]}}))
    .into_response()
}

async fn me(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    let token = bearer(&headers);
    state.record("GET", "/me", &token, "", Value::Null);

    if token == "expired-token" {
        return expired_response();
    }

    Json(json!({"id": "testuser"})).into_response()
}

async fn me_playlists(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    let token = bearer(&headers);
    state.record("GET", "/me/playlists", &token, "", Value::Null);

    // Most recently created first, like the real listing
    let items: Vec<Value> = state
        .playlists
        .lock()
        .unwrap()
        .iter()
        .rev()
        .map(|(id, name)| {
            json!({
                "id": id,
                "name": name,
                "description": "Created with spoplcli",
                "external_urls": {"spotify": format!("https://open.spotify.com/playlist/{}", id)}
            })
        })
        .collect();

    Json(json!({"items": items, "next": null})).into_response()
}

async fn create_user_playlist(
    State(state): State<Arc<MockState>>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let token = bearer(&headers);
    let path = format!("/users/{}/playlists", user_id);
    state.record("POST", &path, &token, "", body.clone());

    if token == "expired-token" {
        return expired_response();
    }

    let n = state.counter.fetch_add(1, Ordering::SeqCst) + 1;
    let id = format!("pl{}", n);
    let name = body["name"].as_str().unwrap_or_default().to_string();
    state.playlists.lock().unwrap().push((id.clone(), name.clone()));

    Json(json!({
        "id": id,
        "name": name,
        "external_urls": {"spotify": format!("https://open.spotify.com/playlist/{}", id)}
    }))
    .into_response()
}

async fn add_playlist_tracks(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let token = bearer(&headers);
    let path = format!("/playlists/{}/tracks", id);
    state.record("POST", &path, &token, "", body);

    if token == "expired-token" {
        return expired_response();
    }

    Json(json!({"snapshot_id": "snap-add"})).into_response()
}

async fn remove_playlist_tracks(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let token = bearer(&headers);
    let path = format!("/playlists/{}/tracks", id);
    state.record("DELETE", &path, &token, "", body);

    Json(json!({"snapshot_id": "snap-remove"})).into_response()
}

async fn reorder_playlist_tracks(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let token = bearer(&headers);
    let path = format!("/playlists/{}/tracks", id);
    state.record("PUT", &path, &token, "", body);

    Json(json!({"snapshot_id": "snap-reorder"})).into_response()
}

async fn rename_playlist(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let token = bearer(&headers);
    let path = format!("/playlists/{}", id);
    state.record("PUT", &path, &token, "", body);

    if id == "missing" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"error": {"status": 404, "message": "Not found."}})),
        )
            .into_response();
    }

    Json(json!({})).into_response()
}

async fn playlist_details(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let token = bearer(&headers);
    let path = format!("/playlists/{}", id);
    state.record("GET", &path, &token, "", Value::Null);

    if id == "missing" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"error": {"status": 404, "message": "Not found."}})),
        )
            .into_response();
    }

    // Fixture with a removed entry (null track), a local entry (null id) and
    // a second page behind a next link
    let next = format!("{}/fixture-tracks-page2", state.base_url.lock().unwrap());
    Json(json!({
        "id": id,
        "name": "Fixture Playlist",
        "external_urls": {"spotify": format!("https://open.spotify.com/playlist/{}", id)},
        "tracks": {
            "items": [
                {"track": {
                    "id": "good-track",
                    "name": "Good Track",
                    "artists": [{"name": "Good Artist"}],
                    "album": {"name": "Good Album", "images": [{"url": "https://images.example/a.jpg"}]},
                    "duration_ms": 123_000,
                    "preview_url": "https://preview.example/a.mp3"
                }},
                {"track": null},
                {"track": {"id": null, "name": "Local File"}}
            ],
            "next": next
        }
    }))
    .into_response()
}

async fn fixture_tracks_page2(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
) -> Response {
    let token = bearer(&headers);
    state.record("GET", "/fixture-tracks-page2", &token, "", Value::Null);

    Json(json!({
        "items": [
            {"track": {
                "id": "paged-track",
                "name": "Paged Track",
                "artists": [{"name": "Paged Artist"}],
                "album": {"name": "Paged Album", "images": []},
                "duration_ms": 95_000,
                "preview_url": null
            }}
        ],
        "next": null
    }))
    .into_response()
}

async fn unfollow_playlist(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let token = bearer(&headers);
    let path = format!("/playlists/{}/followers", id);
    state.record("DELETE", &path, &token, "", Value::Null);

    StatusCode::OK.into_response()
}

fn calls_for(token: &str) -> Vec<Call> {
    mock()
        .calls
        .lock()
        .unwrap()
        .iter()
        .filter(|c| c.token == token)
        .cloned()
        .collect()
}

struct RecordingLogger {
    events: Mutex<Vec<(PipelineEvent, Value)>>,
}

impl RecordingLogger {
    fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    fn seen(&self, wanted: PipelineEvent) -> bool {
        self.events.lock().unwrap().iter().any(|(e, _)| *e == wanted)
    }
}

impl PipelineLogger for RecordingLogger {
    fn log(&self, event: PipelineEvent, payload: Value) {
        self.events.lock().unwrap().push((event, payload));
    }
}

#[tokio::test]
async fn creates_playlist_and_partitions_found_and_not_found() {
    let _ = mock();
    let token = "tok-e2e";
    let songs = vec![
        "Radiohead - Karma Police".to_string(),
        "Unknown Artist - Nonexistent Song XYZ123".to_string(),
    ];

    let guard = RequestGuard::new();
    let logger = RecordingLogger::new();
    let result = create_playlist(
        token,
        Some("E2E Playlist"),
        &songs,
        PlaylistMode::CreateNew,
        &guard,
        &logger,
    )
    .await
    .unwrap();

    assert_eq!(result.found_track_ids, vec!["6b2oQwSGFkzsMtQruIWm2p"]);
    assert_eq!(
        result.not_found_songs,
        vec!["Unknown Artist - Nonexistent Song XYZ123"]
    );
    // Found and not-found partition the input exactly
    assert_eq!(
        result.found_track_ids.len() + result.not_found_songs.len(),
        songs.len()
    );
    assert!(result.playlist_url.is_some());

    // The playlist received exactly one track in one insertion call
    let adds: Vec<Call> = calls_for(token)
        .into_iter()
        .filter(|c| c.method == "POST" && c.path.ends_with("/tracks"))
        .collect();
    assert_eq!(adds.len(), 1);
    assert_eq!(
        adds[0].body["uris"],
        json!(["spotify:track:6b2oQwSGFkzsMtQruIWm2p"])
    );

    // Milestones reached the logger
    assert!(logger.seen(PipelineEvent::Searching));
    assert!(logger.seen(PipelineEvent::TrackFound));
    assert!(logger.seen(PipelineEvent::TrackNotFound));
    assert!(logger.seen(PipelineEvent::CreatingPlaylist));
    assert!(logger.seen(PipelineEvent::PlaylistCreated));
}

#[tokio::test]
async fn empty_song_list_fails_validation_without_remote_calls() {
    let _ = mock();
    let token = "tok-validation";
    let guard = RequestGuard::new();

    let result = create_playlist(
        token,
        None,
        &[],
        PlaylistMode::CreateNew,
        &guard,
        &NullLogger,
    )
    .await;

    assert!(matches!(result, Err(SynthesisError::Validation(_))));
    assert!(calls_for(token).is_empty());
}

#[tokio::test]
async fn empty_token_fails_validation() {
    let _ = mock();
    let guard = RequestGuard::new();

    let result = create_playlist(
        "",
        None,
        &["Radiohead - Karma Police".to_string()],
        PlaylistMode::CreateNew,
        &guard,
        &NullLogger,
    )
    .await;

    assert!(matches!(result, Err(SynthesisError::Validation(_))));
    assert!(calls_for("").is_empty());
}

#[tokio::test]
async fn all_unresolvable_songs_create_no_playlist() {
    let _ = mock();
    let token = "tok-nomatch";
    let songs = vec![
        "A - Nonexistent One".to_string(),
        "B - Nonexistent Two".to_string(),
    ];

    let guard = RequestGuard::new();
    let result = create_playlist(
        token,
        None,
        &songs,
        PlaylistMode::CreateNew,
        &guard,
        &NullLogger,
    )
    .await;

    assert!(matches!(result, Err(SynthesisError::NoTracksFound)));

    let calls = calls_for(token);
    // Searches happened, but nothing touched the playlist endpoints
    assert!(calls.iter().any(|c| c.path == "/search"));
    assert!(!calls.iter().any(|c| c.path.contains("/playlists")));
    assert!(!calls.iter().any(|c| c.path == "/me"));
}

#[tokio::test]
async fn insertion_is_chunked_in_order() {
    let _ = mock();
    let token = "tok-chunk";
    let songs: Vec<String> = (1..=120).map(|i| format!("Song {:03}", i)).collect();

    let guard = RequestGuard::new();
    let result = create_playlist(
        token,
        Some("Chunked"),
        &songs,
        PlaylistMode::CreateNew,
        &guard,
        &NullLogger,
    )
    .await
    .unwrap();

    assert_eq!(result.found_track_ids.len(), 120);
    assert!(result.not_found_songs.is_empty());

    let adds: Vec<Call> = calls_for(token)
        .into_iter()
        .filter(|c| c.method == "POST" && c.path.ends_with("/tracks"))
        .collect();

    // ceil(120 / 100) insertion calls, each at most 100 URIs
    assert_eq!(adds.len(), 2);
    let first: Vec<String> = adds[0].body["uris"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u.as_str().unwrap().to_string())
        .collect();
    let second: Vec<String> = adds[1].body["uris"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u.as_str().unwrap().to_string())
        .collect();
    assert_eq!(first.len(), 100);
    assert_eq!(second.len(), 20);

    // Concatenated chunks reconstruct the found order exactly
    let expected: Vec<String> = (1..=120)
        .map(|i| format!("spotify:track:trk{:03}", i))
        .collect();
    let mut rejoined = first;
    rejoined.extend(second);
    assert_eq!(rejoined, expected);
}

#[tokio::test]
async fn duplicate_submission_is_rejected_while_in_flight() {
    let _ = mock();
    let token = "tok-guard".to_string();
    let songs = vec!["Slowpoke - Slow Song 42".to_string()];
    let guard = RequestGuard::new();

    let task_token = token.clone();
    let task_songs = songs.clone();
    let task_guard = guard.clone();
    let first = tokio::spawn(async move {
        create_playlist(
            &task_token,
            Some("Guarded"),
            &task_songs,
            PlaylistMode::CreateNew,
            &task_guard,
            &NullLogger,
        )
        .await
    });

    // Let the first run reach its (slow) search before duplicating it
    tokio::time::sleep(Duration::from_millis(100)).await;
    let second = create_playlist(
        &token,
        Some("Guarded"),
        &songs,
        PlaylistMode::CreateNew,
        &guard,
        &NullLogger,
    )
    .await;
    assert!(matches!(second, Err(SynthesisError::ConcurrentRequest)));

    // The original run is unaffected
    let first = first.await.unwrap().unwrap();
    assert_eq!(first.found_track_ids, vec!["trk42"]);

    // And once it finished, an identical request goes through again
    let third = create_playlist(
        &token,
        Some("Guarded"),
        &songs,
        PlaylistMode::CreateNew,
        &guard,
        &NullLogger,
    )
    .await;
    assert!(third.is_ok());
}

#[tokio::test]
async fn expired_token_is_surfaced_distinctly_and_releases_guard() {
    let _ = mock();
    let token = "expired-token";
    let songs = vec!["Radiohead - Karma Police".to_string()];
    let guard = RequestGuard::new();

    let result = create_playlist(
        token,
        None,
        &songs,
        PlaylistMode::CreateNew,
        &guard,
        &NullLogger,
    )
    .await;

    let err = result.unwrap_err();
    assert!(matches!(err, SynthesisError::TokenExpired(_)));
    assert!(err.to_string().contains("token expired"));

    // The guard entry was released on the error path: an identical retry is
    // not treated as a duplicate
    let retry = create_playlist(
        token,
        None,
        &songs,
        PlaylistMode::CreateNew,
        &guard,
        &NullLogger,
    )
    .await;
    assert!(matches!(
        retry,
        Err(SynthesisError::TokenExpired(_))
    ));
}

#[tokio::test]
async fn reuse_recent_mode_reuses_playlist_with_same_name() {
    let _ = mock();
    let token = "tok-reuse";
    let songs = vec!["Radiohead - Karma Police".to_string()];
    let name = "Weekly Mix tok-reuse";
    let guard = RequestGuard::new();

    let first = create_playlist(
        token,
        Some(name),
        &songs,
        PlaylistMode::CreateNew,
        &guard,
        &NullLogger,
    )
    .await
    .unwrap();

    let second = create_playlist(
        token,
        Some(name),
        &songs,
        PlaylistMode::ReuseRecent,
        &guard,
        &NullLogger,
    )
    .await
    .unwrap();

    assert_eq!(second.playlist_id, first.playlist_id);

    // Only the first run created a playlist
    let creates: Vec<Call> = calls_for(token)
        .into_iter()
        .filter(|c| c.method == "POST" && c.path.starts_with("/users/"))
        .collect();
    assert_eq!(creates.len(), 1);
}

#[tokio::test]
async fn create_new_mode_never_reuses() {
    let _ = mock();
    let token = "tok-fresh";
    let songs = vec!["Radiohead - Karma Police".to_string()];
    let guard = RequestGuard::new();

    let first = create_playlist(
        token,
        Some("Fresh tok-fresh"),
        &songs,
        PlaylistMode::CreateNew,
        &guard,
        &NullLogger,
    )
    .await
    .unwrap();

    let second = create_playlist(
        token,
        Some("Fresh tok-fresh"),
        &songs,
        PlaylistMode::CreateNew,
        &guard,
        &NullLogger,
    )
    .await
    .unwrap();

    assert_ne!(first.playlist_id, second.playlist_id);
}

#[tokio::test]
async fn resolver_falls_through_to_loosest_tier() {
    let _ = mock();
    // Only the bare normalized-title query returns anything for this song
    let reference = parse_song_reference("Nobody - Obscurity");

    let track = resolve_track(&reference, "tok-tier").await.unwrap();
    assert_eq!(track.unwrap().id, "trk-obscurity");
}

#[tokio::test]
async fn playlist_details_filter_malformed_entries_and_follow_pagination() {
    let _ = mock();
    let details = spotify::playlist::get_details("tok-details", "fixture")
        .await
        .unwrap();

    assert_eq!(details.name, "Fixture Playlist");
    assert!(details.url.is_some());

    // The null-track and null-id entries are dropped, the paginated entry
    // is appended in order
    let ids: Vec<&str> = details.tracks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["good-track", "paged-track"]);
    assert_eq!(details.tracks[0].artist, "Good Artist");
    assert_eq!(details.tracks[0].duration_ms, 123_000);
}

#[tokio::test]
async fn rename_missing_playlist_is_not_found() {
    let _ = mock();
    let err = spotify::playlist::rename("tok-rename", "missing", "New Name")
        .await
        .unwrap_err();

    match err {
        ApiError::Status { status, message } => {
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(message, "Not found.");
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn mutation_round_trips_succeed() {
    let _ = mock();
    let token = "tok-mutations";

    spotify::playlist::rename(token, "fixture", "Renamed")
        .await
        .unwrap();

    let snapshot = spotify::playlist::remove_tracks(
        token,
        "fixture",
        vec!["spotify:track:good-track".to_string()],
    )
    .await
    .unwrap();
    assert_eq!(snapshot.snapshot_id, "snap-remove");

    let snapshot = spotify::playlist::reorder(token, "fixture", 0, 2, 1)
        .await
        .unwrap();
    assert_eq!(snapshot.snapshot_id, "snap-reorder");

    spotify::playlist::unfollow(token, "fixture").await.unwrap();

    // Remove sends URI objects, reorder sends the range fields
    let calls = calls_for(token);
    let remove = calls
        .iter()
        .find(|c| c.method == "DELETE" && c.path.ends_with("/tracks"))
        .unwrap();
    assert_eq!(
        remove.body["tracks"],
        json!([{"uri": "spotify:track:good-track"}])
    );

    let reorder = calls
        .iter()
        .find(|c| c.method == "PUT" && c.path.ends_with("/tracks"))
        .unwrap();
    assert_eq!(reorder.body["range_start"], 0);
    assert_eq!(reorder.body["insert_before"], 2);
    assert_eq!(reorder.body["range_length"], 1);
}
