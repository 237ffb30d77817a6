use std::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    DineIn,
    Delivery,
}

/// Persisted status values. The wire strings are fixed; clients match on them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Assigned,
    #[serde(rename = "Out for Delivery")]
    OutForDelivery,
    Delivered,
    Completed,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Completed)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Assigned => "Assigned",
            OrderStatus::OutForDelivery => "Out for Delivery",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Completed => "Completed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub price: f64,
    pub qty: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: u64,
    pub customer_name: String,
    pub phone: String,
    pub items: Vec<LineItem>,
    pub total: f64,
    pub kind: OrderKind,
    pub status: OrderStatus,
    /// Handed to the customer once at creation; never serialized back out.
    #[serde(skip_serializing)]
    pub pin: String,
    pub failed_attempts: u32,
    pub location: Option<GeoPoint>,
    pub landmark: Option<String>,
    pub payment_ref: Option<String>,
    pub assigned_courier: Option<u64>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn is_active_assignment_for(&self, courier_id: u64) -> bool {
        self.assigned_courier == Some(courier_id) && !self.status.is_terminal()
    }
}

/// Uniform random 4-digit code, leading zeros kept.
pub fn generate_pin() -> String {
    let code: u32 = rand::thread_rng().gen_range(0..10_000);
    format!("{code:04}")
}
