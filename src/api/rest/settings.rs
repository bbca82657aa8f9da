use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, put};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use tracing::info;

use crate::error::AppError;
use crate::models::settings::Settings;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/settings", get(get_settings))
        .route("/settings/auto-accept", put(set_auto_accept))
}

#[derive(Deserialize)]
pub struct AutoAcceptRequest {
    pub enabled: bool,
}

async fn get_settings(State(state): State<Arc<AppState>>) -> Json<Settings> {
    Json(state.settings())
}

async fn set_auto_accept(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AutoAcceptRequest>,
) -> Result<Json<Settings>, AppError> {
    // The store owns the printer configuration; only the flag changes here.
    let mut settings = state.store.get_settings().await?;
    settings.auto_accept = payload.enabled;

    let saved = state.store.update_settings(settings).await?;
    state.set_settings(saved.clone());
    info!(enabled = saved.auto_accept, "auto-accept updated");

    Ok(Json(saved))
}
