use serde_json::Value;

/// Pipeline milestones reported while a synthesis run progresses.
///
/// Observability hook only; nothing in the pipeline depends on a logger
/// doing anything with these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineEvent {
    Searching,
    TrackFound,
    TrackNotFound,
    SearchFailed,
    CreatingPlaylist,
    PlaylistReused,
    PlaylistCreated,
}

impl std::fmt::Display for PipelineEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            PipelineEvent::Searching => "Searching",
            PipelineEvent::TrackFound => "Track found",
            PipelineEvent::TrackNotFound => "Track not found",
            PipelineEvent::SearchFailed => "Search failed",
            PipelineEvent::CreatingPlaylist => "Creating playlist",
            PipelineEvent::PlaylistReused => "Playlist reused",
            PipelineEvent::PlaylistCreated => "Playlist created",
        };
        write!(f, "{}", label)
    }
}

/// Structured logging callback invoked at each pipeline milestone with a
/// free-form JSON payload. The CLI renders these to the terminal; tests
/// record them.
pub trait PipelineLogger: Sync {
    fn log(&self, event: PipelineEvent, payload: Value);
}

/// Logger that swallows everything, for callers without a debug surface.
pub struct NullLogger;

impl PipelineLogger for NullLogger {
    fn log(&self, _event: PipelineEvent, _payload: Value) {}
}
