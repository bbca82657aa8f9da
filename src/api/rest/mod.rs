pub mod batch;
pub mod couriers;
pub mod orders;
pub mod print;
pub mod settings;
pub mod ws;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::models::order::OrderStatus;
use crate::state::AppState;
use crate::view;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(orders::router())
        .merge(couriers::router())
        .merge(batch::router())
        .merge(settings::router())
        .merge(print::router())
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    orders: usize,
    couriers: usize,
    awaiting_acceptance: usize,
    auto_accept_in_flight: bool,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let orders = state.orders_snapshot();
    Json(HealthResponse {
        status: "ok",
        orders: orders.len(),
        couriers: state.couriers.len(),
        awaiting_acceptance: view::count(&orders, OrderStatus::AwaitingAcceptance),
        auto_accept_in_flight: state.auto_accept.is_in_flight(),
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
}
