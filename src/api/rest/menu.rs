use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{delete, get, post, put};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::models::feedback::Feedback;
use crate::models::menu::MenuItem;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/items", get(list_items))
        .route("/admin/items", post(add_item))
        .route("/admin/items/:id", put(update_item))
        .route("/admin/items/:id", delete(delete_item))
        .route("/feedback", post(submit_feedback))
        .route("/admin/feedback", get(list_feedback))
}

async fn list_items(State(state): State<Arc<AppState>>) -> Json<Vec<MenuItem>> {
    let mut items: Vec<MenuItem> = state
        .menu_items
        .iter()
        .map(|entry| entry.value().clone())
        .collect();

    items.sort_by(|a, b| a.id.cmp(&b.id));
    Json(items)
}

#[derive(Deserialize)]
pub struct ItemRequest {
    pub name: String,
    pub price: f64,
    pub image_url: Option<String>,
    pub description: Option<String>,
}

async fn add_item(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ItemRequest>,
) -> Result<Json<MenuItem>, AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name cannot be empty".to_string()));
    }
    if payload.price < 0.0 {
        return Err(AppError::BadRequest("price cannot be negative".to_string()));
    }

    let item = MenuItem {
        id: state.next_item_id(),
        name: payload.name,
        price: payload.price,
        image_url: payload.image_url,
        description: payload.description,
    };

    state.menu_items.insert(item.id, item.clone());
    Ok(Json(item))
}

async fn update_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(payload): Json<ItemRequest>,
) -> Result<Json<Value>, AppError> {
    let mut item = state
        .menu_items
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("item {id} not found")))?;

    item.name = payload.name;
    item.price = payload.price;
    item.image_url = payload.image_url;
    item.description = payload.description;

    Ok(Json(json!({ "success": true })))
}

async fn delete_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, AppError> {
    state
        .menu_items
        .remove(&id)
        .ok_or_else(|| AppError::NotFound(format!("item {id} not found")))?;

    Ok(Json(json!({ "success": true })))
}

#[derive(Deserialize)]
pub struct FeedbackRequest {
    pub order_id: u64,
    pub customer_name: String,
    pub rating: u8,
    pub comment: Option<String>,
}

async fn submit_feedback(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<FeedbackRequest>,
) -> Result<Json<Value>, AppError> {
    if !(1..=5).contains(&payload.rating) {
        return Err(AppError::BadRequest("rating must be 1-5".to_string()));
    }
    if !state.orders.contains_key(&payload.order_id) {
        return Err(AppError::NotFound(format!(
            "order {} not found",
            payload.order_id
        )));
    }

    let feedback = Feedback {
        id: state.next_feedback_id(),
        order_id: payload.order_id,
        customer_name: payload.customer_name,
        rating: payload.rating,
        comment: payload.comment,
        created_at: Utc::now(),
    };

    state.feedback.insert(feedback.id, feedback);
    Ok(Json(json!({ "success": true })))
}

async fn list_feedback(State(state): State<Arc<AppState>>) -> Json<Vec<Feedback>> {
    let mut all: Vec<Feedback> = state
        .feedback
        .iter()
        .map(|entry| entry.value().clone())
        .collect();

    all.sort_by(|a, b| b.id.cmp(&a.id));
    Json(all)
}
