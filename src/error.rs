use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::models::order::OrderStatus;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("invalid transition: cannot {event} from {from}")]
    InvalidTransition {
        from: OrderStatus,
        event: &'static str,
    },

    #[error("order already claimed")]
    AlreadyClaimed,

    #[error("too many active orders (cap {cap})")]
    TooManyActiveOrders { cap: usize },

    #[error("order locked after too many failed attempts")]
    Locked,

    #[error("incorrect pin, {attempts_remaining} attempts remaining")]
    WrongCode { attempts_remaining: u32 },

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::WrongCode { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::InvalidTransition { .. } | AppError::AlreadyClaimed => StatusCode::CONFLICT,
            AppError::TooManyActiveOrders { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Locked => StatusCode::LOCKED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}
