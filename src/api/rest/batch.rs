use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{delete, get, post, put};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::assignment;
use crate::error::AppError;
use crate::models::batch::BatchReport;
use crate::state::AppState;
use crate::view::state::BatchSelection;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/batch", get(get_selection))
        .route("/batch/courier", put(select_courier))
        .route("/batch/orders", delete(clear_orders))
        .route("/batch/orders/:id", post(toggle_order))
        .route("/batch/dispatch", post(dispatch))
}

#[derive(Deserialize)]
pub struct SelectCourierRequest {
    pub courier_id: Option<Uuid>,
}

#[derive(Serialize)]
pub struct ToggleResponse {
    pub order_id: Uuid,
    pub selected: bool,
}

async fn get_selection(State(state): State<Arc<AppState>>) -> Json<BatchSelection> {
    Json(state.view.selection())
}

async fn select_courier(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SelectCourierRequest>,
) -> Result<Json<BatchSelection>, AppError> {
    if let Some(courier_id) = payload.courier_id {
        if !state.couriers.contains_key(&courier_id) {
            return Err(AppError::NotFound(format!("courier {courier_id} not found")));
        }
    }

    state.view.select_courier(payload.courier_id);
    Ok(Json(state.view.selection()))
}

async fn toggle_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ToggleResponse>, AppError> {
    let selected = assignment::toggle_selection(&state, id)?;
    Ok(Json(ToggleResponse {
        order_id: id,
        selected,
    }))
}

async fn clear_orders(State(state): State<Arc<AppState>>) -> Json<BatchSelection> {
    state.view.clear_orders();
    Json(state.view.selection())
}

async fn dispatch(State(state): State<Arc<AppState>>) -> Result<Json<BatchReport>, AppError> {
    Ok(Json(assignment::dispatch_selection(&state).await?))
}
