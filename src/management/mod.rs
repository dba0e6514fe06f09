//! High-level pipeline logic: token lifecycle, the duplicate-submission
//! guard, track resolution and playlist synthesis.
//!
//! The flow through this layer is one-directional: raw text is parsed and
//! normalized (`utils`), each reference is resolved to a catalog track
//! ([`resolver`]), and the synthesizer ([`synthesis`]) aggregates the
//! outcomes and reconciles them with the remote service through the
//! `spotify` layer. [`RequestGuard`] keeps identical submissions from
//! running twice; [`PipelineLogger`] reports milestones along the way.

mod auth;
mod guard;
mod logger;
mod resolver;
mod synthesis;

pub use auth::TokenManager;
pub use guard::GuardEntry;
pub use guard::RequestGuard;
pub use logger::NullLogger;
pub use logger::PipelineEvent;
pub use logger::PipelineLogger;
pub use resolver::ResolveError;
pub use resolver::SEARCH_RESULT_LIMIT;
pub use resolver::build_queries;
pub use resolver::pick_match;
pub use resolver::resolve_track;
pub use synthesis::DEFAULT_PLAYLIST_NAME;
pub use synthesis::INSERT_CHUNK_SIZE;
pub use synthesis::SynthesisError;
pub use synthesis::create_playlist;
pub use synthesis::insertion_batches;
