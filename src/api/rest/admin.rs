use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::Json;
use axum::Router;
use serde_json::{json, Value};

use crate::api::rest::delivery::{run_verification, VerifyPinRequest, VerifyPinResponse};
use crate::error::AppError;
use crate::models::actor::Actor;
use crate::models::courier::{ApprovalStatus, Courier};
use crate::models::fraud::FraudAlert;
use crate::models::order::Order;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/orders", get(list_orders))
        .route("/admin/orders/:id/verify-pin", post(verify_pin))
        .route("/admin/couriers", get(list_couriers))
        .route("/admin/couriers/:id/approve", put(approve_courier))
        .route("/admin/fraud-alerts", get(list_fraud_alerts))
        .route("/admin/fraud-alerts/:id/resolve", put(resolve_fraud_alert))
}

async fn list_orders(State(state): State<Arc<AppState>>) -> Json<Vec<Order>> {
    let mut orders: Vec<Order> = state
        .orders
        .iter()
        .map(|entry| entry.value().clone())
        .collect();

    orders.sort_by(|a, b| b.id.cmp(&a.id));
    Json(orders)
}

/// Staff verification at handoff: no ownership check, any admin may verify.
async fn verify_pin(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(payload): Json<VerifyPinRequest>,
) -> Result<Json<VerifyPinResponse>, AppError> {
    run_verification(&state, id, &payload.pin, Actor::Admin)
}

async fn list_couriers(State(state): State<Arc<AppState>>) -> Json<Vec<Courier>> {
    let mut couriers: Vec<Courier> = state
        .couriers
        .iter()
        .map(|entry| entry.value().clone())
        .collect();

    couriers.sort_by(|a, b| a.id.cmp(&b.id));
    Json(couriers)
}

async fn approve_courier(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, AppError> {
    let mut courier = state
        .couriers
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("courier {id} not found")))?;

    courier.approval = ApprovalStatus::Approved;
    tracing::info!(courier_id = id, "courier approved");

    Ok(Json(json!({ "success": true })))
}

async fn list_fraud_alerts(State(state): State<Arc<AppState>>) -> Json<Vec<FraudAlert>> {
    let mut alerts: Vec<FraudAlert> = state
        .fraud_alerts
        .iter()
        .map(|entry| entry.value().clone())
        .collect();

    alerts.sort_by(|a, b| b.id.cmp(&a.id));
    Json(alerts)
}

/// Flips the resolved flag only; the order itself is untouched.
async fn resolve_fraud_alert(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, AppError> {
    let mut alert = state
        .fraud_alerts
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("fraud alert {id} not found")))?;

    alert.resolved = true;
    tracing::info!(alert_id = id, order_id = alert.order_id, "fraud alert resolved");

    Ok(Json(json!({ "success": true })))
}
