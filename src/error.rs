use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::engine::machine::Transition;
use crate::models::order::OrderStatus;

/// Failures reported by an order store.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("order store unavailable: {0}")]
    Unavailable(String),

    #[error("order store rejected the update: {0}")]
    Rejected(String),

    #[error("not found in order store: {0}")]
    NotFound(String),

    #[error("invalid order store response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::InvalidResponse(err.to_string())
        } else {
            StoreError::Unavailable(err.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("order {order_id} cannot {transition} while {status}")]
    IllegalTransition {
        order_id: Uuid,
        transition: Transition,
        status: OrderStatus,
    },

    #[error("rejected by order store: {0}")]
    Rejected(String),

    #[error("order store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => AppError::StoreUnavailable(msg),
            StoreError::Rejected(msg) => AppError::Rejected(msg),
            StoreError::NotFound(msg) => AppError::NotFound(msg),
            StoreError::InvalidResponse(msg) => {
                AppError::Internal(format!("invalid order store response: {msg}"))
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::IllegalTransition { .. } => StatusCode::CONFLICT,
            AppError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::StoreUnavailable(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}
