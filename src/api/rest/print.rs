use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use uuid::Uuid;

use crate::print::PrintSignal;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/print/signals", post(record_signal))
        .route("/print/errors", get(list_errors))
}

/// Success/failure reports pushed by the print connector.
async fn record_signal(
    State(state): State<Arc<AppState>>,
    Json(signal): Json<PrintSignal>,
) -> StatusCode {
    if let Some(event) = state.print.record_signal(signal) {
        state.publish(event);
    }
    StatusCode::NO_CONTENT
}

async fn list_errors(State(state): State<Arc<AppState>>) -> Json<Vec<Uuid>> {
    Json(state.print.orders_with_errors())
}
