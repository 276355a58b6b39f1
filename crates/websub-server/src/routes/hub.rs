//! The hub endpoint.
//!
//! Subscribers and publishers POST form-encoded `hub.*` parameters here. The
//! response only says whether the request was accepted; verification and
//! distribution continue in the background.

use std::collections::HashMap;

use axum::{extract::State, http::StatusCode, routing::get, Form, Router};
use websub_core::HubResponse;

use crate::error::AppError;
use crate::AppState;

/// Hub routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/hub", get(hub_info).post(hub_request))
}

async fn hub_info() -> &'static str {
    "Hub"
}

/// Hub request handler.
async fn hub_request(
    State(state): State<AppState>,
    Form(params): Form<HashMap<String, String>>,
) -> Result<StatusCode, AppError> {
    let status = match state.dispatcher.handle(&params)? {
        HubResponse::Accepted => StatusCode::ACCEPTED,
        HubResponse::Ok => StatusCode::OK,
    };
    Ok(status)
}
