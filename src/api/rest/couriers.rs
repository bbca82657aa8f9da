use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::Json;
use axum::Router;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::courier::{Courier, CourierDetail};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/couriers", get(list_couriers))
        .route("/couriers/:id", get(get_courier))
}

async fn list_couriers(State(state): State<Arc<AppState>>) -> Json<Vec<Courier>> {
    let mut couriers: Vec<Courier> = state
        .couriers
        .iter()
        .map(|entry| entry.value().clone())
        .collect();
    couriers.sort_by(|a, b| a.name.cmp(&b.name));
    Json(couriers)
}

/// Courier detail comes straight from the store so it lists every order they carry.
async fn get_courier(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<CourierDetail>, AppError> {
    Ok(Json(state.store.get_courier(id).await?))
}
