//! # CLI Module
//!
//! User-facing command implementations for the playlist builder. Each
//! command coordinates between the token manager, the resolution pipeline
//! and the Spotify API layer, and handles progress feedback and error
//! presentation.
//!
//! ## Commands
//!
//! - [`auth`] - Spotify OAuth 2.0 PKCE authentication flow
//! - [`create`] - Resolve a free-form song list and materialize a playlist
//! - [`search`] - Resolve a single song reference and show the match
//! - [`list_playlists`] / [`show_playlist`] - Inspect existing playlists
//! - [`rename_playlist`], [`add_tracks`], [`remove_tracks`],
//!   [`reorder_playlist`], [`delete_playlist`] - Mutations on an existing
//!   playlist, each a single remote round trip
//!
//! ## Error Handling Philosophy
//!
//! Commands terminate with a clear message when nothing useful can proceed
//! (no token, no songs) and degrade gracefully otherwise: unresolved songs
//! are reported as a named list next to the created playlist, never silently
//! dropped. An expired token is refreshed once and the operation re-issued;
//! the pipeline itself never retries.

mod auth;
mod create;
mod playlist;
mod search;

pub use auth::auth;
pub use create::create;
pub use playlist::add_tracks;
pub use playlist::delete_playlist;
pub use playlist::list_playlists;
pub use playlist::remove_tracks;
pub use playlist::rename_playlist;
pub use playlist::reorder_playlist;
pub use playlist::show_playlist;
pub use search::search;
