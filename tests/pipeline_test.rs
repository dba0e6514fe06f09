use spoplcli::management::{RequestGuard, build_queries, insertion_batches, pick_match};
use spoplcli::types::{TrackAlbum, TrackArtist, TrackRecord};
use spoplcli::utils::{parse_song_reference, request_fingerprint};

fn test_track(id: &str, name: &str, artist: &str) -> TrackRecord {
    TrackRecord {
        id: id.to_string(),
        name: name.to_string(),
        artists: vec![TrackArtist {
            name: artist.to_string(),
        }],
        album: TrackAlbum::default(),
        duration_ms: 200_000,
        preview_url: None,
    }
}

#[test]
fn test_build_queries_with_artist_is_most_to_least_specific() {
    let reference = parse_song_reference("Radiohead - Karma Police (Live)");
    let queries = build_queries(&reference);

    assert_eq!(
        queries,
        vec![
            "\"karma police\" Radiohead".to_string(),
            "karma police Radiohead".to_string(),
            "track:\"karma police\"".to_string(),
            "karma police".to_string(),
        ]
    );
}

#[test]
fn test_build_queries_without_artist_skips_artist_tiers() {
    let reference = parse_song_reference("Karma Police");
    let queries = build_queries(&reference);

    assert_eq!(
        queries,
        vec![
            "track:\"karma police\"".to_string(),
            "karma police".to_string(),
        ]
    );
}

#[test]
fn test_pick_match_prefers_exact_title_and_artist() {
    let reference = parse_song_reference("Radiohead - Karma Police");
    let candidates = vec![
        test_track("cover", "Karma Police", "Some Cover Band"),
        test_track("wrong-title", "Paranoid Android", "Radiohead"),
        test_track("exact", "Karma Police", "Radiohead"),
    ];

    let picked = pick_match(&candidates, &reference).unwrap();
    assert_eq!(picked.id, "exact");
}

#[test]
fn test_pick_match_normalizes_candidate_titles() {
    // The live-tagged catalog entry still counts as an exact title match
    let reference = parse_song_reference("Radiohead - Karma Police");
    let candidates = vec![
        test_track("cover", "Karma Police", "Some Cover Band"),
        test_track("live", "Karma Police (Live)", "Radiohead"),
    ];

    let picked = pick_match(&candidates, &reference).unwrap();
    assert_eq!(picked.id, "live");
}

#[test]
fn test_pick_match_artist_comparison_is_case_insensitive() {
    let reference = parse_song_reference("RADIOHEAD - Karma Police");
    let candidates = vec![
        test_track("cover", "Karma Police", "Some Cover Band"),
        test_track("exact", "Karma Police", "Radiohead"),
    ];

    let picked = pick_match(&candidates, &reference).unwrap();
    assert_eq!(picked.id, "exact");
}

#[test]
fn test_pick_match_falls_back_to_first_result() {
    let reference = parse_song_reference("Radiohead - Karma Police");
    let candidates = vec![
        test_track("first", "Completely Different", "Someone Else"),
        test_track("second", "Also Different", "Someone Else"),
    ];

    let picked = pick_match(&candidates, &reference).unwrap();
    assert_eq!(picked.id, "first");
}

#[test]
fn test_pick_match_without_artist_takes_first_result() {
    // No delimiter means no artist, so the exact check cannot pass and the
    // top-ranked candidate wins even when a title matches exactly later on
    let reference = parse_song_reference("Karma Police");
    let candidates = vec![
        test_track("first", "Karma Police (Cover)", "Some Cover Band"),
        test_track("exact-title", "Karma Police", "Radiohead"),
    ];

    let picked = pick_match(&candidates, &reference).unwrap();
    assert_eq!(picked.id, "first");
}

#[test]
fn test_pick_match_empty_candidates() {
    let reference = parse_song_reference("Radiohead - Karma Police");
    assert!(pick_match(&[], &reference).is_none());
}

#[test]
fn test_insertion_batches_empty() {
    assert!(insertion_batches(&[]).is_empty());
}

#[test]
fn test_insertion_batches_single_batch() {
    let uris: Vec<String> = (0..100).map(|i| format!("spotify:track:t{}", i)).collect();
    let batches = insertion_batches(&uris);

    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 100);
}

#[test]
fn test_insertion_batches_chunks_preserve_order() {
    let uris: Vec<String> = (0..233).map(|i| format!("spotify:track:t{}", i)).collect();
    let batches = insertion_batches(&uris);

    // ceil(233 / 100) calls, each at most 100 URIs
    assert_eq!(batches.len(), 3);
    assert!(batches.iter().all(|b| b.len() <= 100));
    assert_eq!(batches[2].len(), 33);

    // Concatenation in call order reconstructs the input exactly
    let rejoined: Vec<String> = batches.into_iter().flatten().collect();
    assert_eq!(rejoined, uris);
}

#[test]
fn test_guard_blocks_identical_fingerprint() {
    let guard = RequestGuard::new();
    let songs = vec!["a - b".to_string()];
    let fingerprint = request_fingerprint("token", &songs);

    let first = guard.acquire(&fingerprint);
    assert!(first.is_some());
    assert!(guard.is_in_flight(&fingerprint));

    // An identical in-flight request is refused while the first holds on
    assert!(guard.acquire(&fingerprint).is_none());
}

#[test]
fn test_guard_allows_distinct_fingerprints() {
    let guard = RequestGuard::new();
    let songs = vec!["a - b".to_string()];

    let first = guard.acquire(&request_fingerprint("token", &songs));
    let second = guard.acquire(&request_fingerprint("other-token", &songs));

    assert!(first.is_some());
    assert!(second.is_some());
}

#[test]
fn test_guard_releases_on_drop() {
    let guard = RequestGuard::new();
    let fingerprint = request_fingerprint("token", &["a - b".to_string()]);

    {
        let entry = guard.acquire(&fingerprint);
        assert!(entry.is_some());
    } // entry dropped here

    assert!(!guard.is_in_flight(&fingerprint));
    assert!(guard.acquire(&fingerprint).is_some());
}

#[test]
fn test_guard_is_shared_between_clones() {
    let guard = RequestGuard::new();
    let clone = guard.clone();
    let fingerprint = request_fingerprint("token", &["a - b".to_string()]);

    let _entry = guard.acquire(&fingerprint).unwrap();
    assert!(clone.acquire(&fingerprint).is_none());
    assert!(clone.is_in_flight(&fingerprint));
}
