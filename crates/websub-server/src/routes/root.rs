//! Landing page.

use axum::{routing::get, Router};

use crate::AppState;

/// Root routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(welcome))
}

async fn welcome() -> &'static str {
    "Welcome to my WebSub Hub."
}
