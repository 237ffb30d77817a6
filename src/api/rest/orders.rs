use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::api::rest::auth::OptionalCourier;
use crate::engine::lifecycle;
use crate::error::AppError;
use crate::models::actor::Actor;
use crate::models::order::{generate_pin, GeoPoint, LineItem, Order, OrderKind, OrderStatus};
use crate::notify::{self, Event};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", post(place_order))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/out-for-delivery", put(out_for_delivery))
        .route("/orders/:id/complete", put(complete))
}

#[derive(Deserialize)]
pub struct PlaceOrderRequest {
    pub customer_name: String,
    pub phone: String,
    pub items: Vec<LineItem>,
    pub total: f64,
    pub order_type: OrderKind,
    pub location: Option<GeoPoint>,
    pub landmark: Option<String>,
    pub payment_ref: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderResponse {
    pub success: bool,
    pub order_id: u64,
    pub pin: String,
}

async fn place_order(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PlaceOrderRequest>,
) -> Result<Json<PlaceOrderResponse>, AppError> {
    if payload.customer_name.trim().is_empty() {
        return Err(AppError::BadRequest(
            "customer name cannot be empty".to_string(),
        ));
    }
    if payload.items.is_empty() {
        return Err(AppError::BadRequest("order has no items".to_string()));
    }
    if payload.items.iter().any(|item| item.qty == 0) {
        return Err(AppError::BadRequest("item qty must be > 0".to_string()));
    }
    if payload.total < 0.0 {
        return Err(AppError::BadRequest("total cannot be negative".to_string()));
    }

    let order = Order {
        id: state.next_order_id(),
        customer_name: payload.customer_name,
        phone: payload.phone,
        items: payload.items,
        total: payload.total,
        kind: payload.order_type,
        status: OrderStatus::Pending,
        pin: generate_pin(),
        failed_attempts: 0,
        location: payload.location,
        landmark: payload.landmark,
        payment_ref: payload.payment_ref,
        assigned_courier: None,
        created_at: Utc::now(),
    };

    let kind_label = match order.kind {
        OrderKind::DineIn => "dine_in",
        OrderKind::Delivery => "delivery",
    };
    state
        .metrics
        .orders_created_total
        .with_label_values(&[kind_label])
        .inc();

    let response = PlaceOrderResponse {
        success: true,
        order_id: order.id,
        pin: order.pin.clone(),
    };

    state.orders.insert(order.id, order.clone());
    tracing::info!(order_id = order.id, kind = kind_label, total = order.total, "order placed");
    notify::publish(&state, Event::NewOrder { order });

    Ok(Json(response))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<Order>, AppError> {
    let order = state
        .orders
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("order {id} not found")))?;

    Ok(Json(order.value().clone()))
}

async fn out_for_delivery(
    State(state): State<Arc<AppState>>,
    OptionalCourier(courier): OptionalCourier,
    Path(id): Path<u64>,
) -> Result<Json<Value>, AppError> {
    let actor = match courier {
        Some(courier_id) => Actor::Courier(courier_id),
        None => Actor::Admin,
    };

    lifecycle::start_delivery(&state, id, actor)?;
    Ok(Json(json!({ "success": true })))
}

async fn complete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, AppError> {
    lifecycle::complete_dine_in(&state, id)?;
    Ok(Json(json!({ "success": true })))
}
