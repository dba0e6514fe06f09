use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{spotify, types::PkceToken};

/// Runs the interactive Spotify authorization flow.
///
/// Owns the shared PKCE state for the duration of the flow; the callback
/// server writes the exchanged token into it once the browser redirect
/// arrives, and the persisted token is picked up by every later command.
pub async fn auth() {
    let oauth_state: Arc<Mutex<Option<PkceToken>>> = Arc::new(Mutex::new(None));
    spotify::auth::auth(oauth_state).await;
}
