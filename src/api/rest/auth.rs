use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::models::courier::ApprovalStatus;
use crate::state::AppState;

const COURIER_HEADER: &str = "x-courier-id";

/// Courier identity from the `X-Courier-Id` header. Stands in for the session
/// layer, which is out of scope; the courier must exist and be approved.
pub struct CourierAuth(pub u64);

/// Courier identity if the header is present, otherwise an admin caller.
/// Used by routes open to both roles.
pub struct OptionalCourier(pub Option<u64>);

fn courier_from_parts(parts: &Parts, state: &AppState) -> Result<Option<u64>, AppError> {
    let Some(raw) = parts.headers.get(COURIER_HEADER) else {
        return Ok(None);
    };

    let id: u64 = raw
        .to_str()
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| AppError::Unauthorized("invalid courier id header".to_string()))?;

    let courier = state
        .couriers
        .get(&id)
        .ok_or_else(|| AppError::Unauthorized(format!("unknown courier {id}")))?;

    if courier.approval != ApprovalStatus::Approved {
        return Err(AppError::Unauthorized(
            "courier is not approved for deliveries".to_string(),
        ));
    }

    Ok(Some(id))
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CourierAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        match courier_from_parts(parts, state)? {
            Some(id) => Ok(CourierAuth(id)),
            None => Err(AppError::Unauthorized(
                "courier id header required".to_string(),
            )),
        }
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for OptionalCourier {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(OptionalCourier(courier_from_parts(parts, state)?))
    }
}
