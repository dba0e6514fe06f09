//! # API Module
//!
//! HTTP endpoints for the temporary local web server the CLI runs during
//! authentication. The server exists only to complete the OAuth 2.0 PKCE
//! flow; it is started by [`crate::server::start_api_server`] and serves two
//! routes:
//!
//! - [`callback`] - Receives the authorization redirect from Spotify and
//!   exchanges the code (plus the stored PKCE verifier) for an access token
//! - [`health`] - Status endpoint reporting application health and version
//!
//! Built on the [Axum](https://docs.rs/axum) web framework; each endpoint is
//! an async handler wired into Axum's routing system.

mod callback;
mod health;

pub use callback::callback;
pub use health::health;
