use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::api::rest::auth::CourierAuth;
use crate::engine::{claim, verify};
use crate::error::AppError;
use crate::models::actor::Actor;
use crate::models::courier::{ApprovalStatus, Courier};
use crate::models::order::{Order, OrderKind, OrderStatus};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/delivery/register", post(register))
        .route("/delivery/available-orders", get(available_orders))
        .route("/delivery/my-orders", get(my_orders))
        .route("/delivery/orders/:id/claim", post(claim_order))
        .route("/delivery/orders/:id/verify-pin", post(verify_pin))
        .route("/delivery/analytics", get(analytics))
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub full_name: String,
    pub phone: String,
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<Courier>, AppError> {
    if payload.full_name.trim().is_empty() {
        return Err(AppError::BadRequest("name cannot be empty".to_string()));
    }

    let courier = Courier {
        id: state.next_courier_id(),
        full_name: payload.full_name,
        phone: payload.phone,
        approval: ApprovalStatus::Pending,
        created_at: Utc::now(),
    };

    state.couriers.insert(courier.id, courier.clone());
    tracing::info!(courier_id = courier.id, "courier registered, awaiting approval");

    Ok(Json(courier))
}

/// The claim pool: pending delivery orders nobody has taken yet.
async fn available_orders(
    State(state): State<Arc<AppState>>,
    CourierAuth(_courier_id): CourierAuth,
) -> Json<Vec<Order>> {
    let mut pool: Vec<Order> = state
        .orders
        .iter()
        .filter(|entry| {
            let order = entry.value();
            order.kind == OrderKind::Delivery
                && order.status == OrderStatus::Pending
                && order.assigned_courier.is_none()
        })
        .map(|entry| entry.value().clone())
        .collect();

    pool.sort_by(|a, b| b.id.cmp(&a.id));
    Json(pool)
}

async fn my_orders(
    State(state): State<Arc<AppState>>,
    CourierAuth(courier_id): CourierAuth,
) -> Json<Vec<Order>> {
    let mut mine: Vec<Order> = state
        .orders
        .iter()
        .filter(|entry| entry.value().assigned_courier == Some(courier_id))
        .map(|entry| entry.value().clone())
        .collect();

    mine.sort_by(|a, b| b.id.cmp(&a.id));
    Json(mine)
}

async fn claim_order(
    State(state): State<Arc<AppState>>,
    CourierAuth(courier_id): CourierAuth,
    Path(id): Path<u64>,
) -> Result<Json<Value>, AppError> {
    claim::claim(&state, id, courier_id)?;
    Ok(Json(json!({ "success": true })))
}

#[derive(Deserialize)]
pub struct VerifyPinRequest {
    pub pin: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPinResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts_remaining: Option<u32>,
    pub locked: bool,
}

/// Shared by the courier and admin verify handlers: wrong-code and locked
/// outcomes are part of the response contract, not transport errors.
pub fn run_verification(
    state: &AppState,
    order_id: u64,
    pin: &str,
    actor: Actor,
) -> Result<Json<VerifyPinResponse>, AppError> {
    if pin.len() != 4 || !pin.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::BadRequest("pin must be 4 digits".to_string()));
    }

    match verify::verify(state, order_id, pin, actor) {
        Ok(_) => Ok(Json(VerifyPinResponse {
            success: true,
            message: format!("Order #{order_id} delivered."),
            attempts_remaining: None,
            locked: false,
        })),
        Err(AppError::WrongCode { attempts_remaining }) => Ok(Json(VerifyPinResponse {
            success: false,
            message: format!("Incorrect PIN. {attempts_remaining} attempts remaining."),
            attempts_remaining: Some(attempts_remaining),
            locked: false,
        })),
        Err(AppError::Locked) => Ok(Json(VerifyPinResponse {
            success: false,
            message: "Too many failed attempts. Order locked and flagged for review.".to_string(),
            attempts_remaining: Some(0),
            locked: true,
        })),
        Err(other) => Err(other),
    }
}

async fn verify_pin(
    State(state): State<Arc<AppState>>,
    CourierAuth(courier_id): CourierAuth,
    Path(id): Path<u64>,
    Json(payload): Json<VerifyPinRequest>,
) -> Result<Json<VerifyPinResponse>, AppError> {
    run_verification(&state, id, &payload.pin, Actor::Courier(courier_id))
}

#[derive(Serialize)]
pub struct DailyStats {
    pub date: NaiveDate,
    pub delivered: u32,
    pub total: f64,
}

/// Per-day delivered counts and order value for the calling courier.
async fn analytics(
    State(state): State<Arc<AppState>>,
    CourierAuth(courier_id): CourierAuth,
) -> Json<Vec<DailyStats>> {
    let mut by_day: BTreeMap<NaiveDate, (u32, f64)> = BTreeMap::new();

    for entry in state.orders.iter() {
        let order = entry.value();
        if order.assigned_courier == Some(courier_id) && order.status == OrderStatus::Delivered {
            let day = by_day.entry(order.created_at.date_naive()).or_insert((0, 0.0));
            day.0 += 1;
            day.1 += order.total;
        }
    }

    let stats = by_day
        .into_iter()
        .rev()
        .map(|(date, (delivered, total))| DailyStats {
            date,
            delivered,
            total,
        })
        .collect();

    Json(stats)
}
