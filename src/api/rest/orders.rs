use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::transitions;
use crate::error::AppError;
use crate::models::order::{Order, OrderStatus, PaymentMethod};
use crate::state::AppState;
use crate::view::{self, StatusBucket};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", get(list_orders))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/accept", post(accept))
        .route("/orders/:id/ready", post(mark_ready))
        .route("/orders/:id/courier", post(assign_courier))
        .route("/orders/:id/route", post(send_to_route))
        .route("/orders/:id/deliver", post(complete_delivery))
        .route("/orders/:id/pickup", post(complete_pickup))
        .route("/orders/:id/cancel", post(cancel))
        .route("/board", get(board))
        .route("/board/:status", get(bucket))
}

#[derive(Deserialize)]
pub struct AssignCourierRequest {
    pub courier_id: Uuid,
}

#[derive(Deserialize)]
pub struct CompletePickupRequest {
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Deserialize)]
pub struct CancelRequest {
    #[serde(default)]
    pub reason: String,
}

async fn list_orders(State(state): State<Arc<AppState>>) -> Json<Vec<Order>> {
    Json(state.orders_snapshot())
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(state.order(id)?))
}

async fn accept(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(transitions::accept(&state, id).await?))
}

async fn mark_ready(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(transitions::mark_ready(&state, id).await?))
}

async fn assign_courier(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignCourierRequest>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(
        transitions::assign_courier(&state, id, payload.courier_id).await?,
    ))
}

async fn send_to_route(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(transitions::send_to_route(&state, id).await?))
}

async fn complete_delivery(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(transitions::complete_delivery(&state, id).await?))
}

async fn complete_pickup(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CompletePickupRequest>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(
        transitions::complete_pickup(&state, id, payload.payment_method).await?,
    ))
}

async fn cancel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CancelRequest>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(transitions::cancel(&state, id, &payload.reason).await?))
}

async fn board(State(state): State<Arc<AppState>>) -> Json<Vec<StatusBucket>> {
    Json(view::board(&state.orders_snapshot()))
}

async fn bucket(
    State(state): State<Arc<AppState>>,
    Path(status): Path<OrderStatus>,
) -> Json<Vec<Order>> {
    let orders = state.orders_snapshot();
    Json(view::projection(&orders, status).into_iter().cloned().collect())
}
