use axum::response::Json;
use serde_json::{Value, json};

/// Liveness probe for the temporary callback server. Lets a user verify the
/// listener came up before the authorization redirect lands on `/callback`.
pub async fn health() -> Json<Value> {
    Json(json!({
        "service": env!("CARGO_PKG_NAME"),
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
