use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::models::courier::Courier;
use crate::models::feedback::Feedback;
use crate::models::fraud::FraudAlert;
use crate::models::menu::MenuItem;
use crate::models::order::Order;
use crate::notify::Event;
use crate::observability::metrics::Metrics;

/// Shared stores. The order entry is the unit of mutual exclusion: every
/// status/assignment/attempt-counter write happens while holding the order's
/// map entry via `get_mut`, so concurrent writers to the same order serialize.
pub struct AppState {
    pub orders: DashMap<u64, Order>,
    pub couriers: DashMap<u64, Courier>,
    pub fraud_alerts: DashMap<u64, FraudAlert>,
    pub menu_items: DashMap<u64, MenuItem>,
    pub feedback: DashMap<u64, Feedback>,
    pub events_tx: broadcast::Sender<Event>,
    pub metrics: Metrics,
    pub max_active_orders: usize,
    pub lockout_threshold: u32,
    order_seq: AtomicU64,
    courier_seq: AtomicU64,
    alert_seq: AtomicU64,
    item_seq: AtomicU64,
    feedback_seq: AtomicU64,
}

impl AppState {
    pub fn new(event_buffer_size: usize, max_active_orders: usize, lockout_threshold: u32) -> Self {
        let (events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        Self {
            orders: DashMap::new(),
            couriers: DashMap::new(),
            fraud_alerts: DashMap::new(),
            menu_items: DashMap::new(),
            feedback: DashMap::new(),
            events_tx,
            metrics: Metrics::new(),
            max_active_orders,
            lockout_threshold,
            order_seq: AtomicU64::new(0),
            courier_seq: AtomicU64::new(0),
            alert_seq: AtomicU64::new(0),
            item_seq: AtomicU64::new(0),
            feedback_seq: AtomicU64::new(0),
        }
    }

    pub fn next_order_id(&self) -> u64 {
        self.order_seq.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn next_courier_id(&self) -> u64 {
        self.courier_seq.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn next_alert_id(&self) -> u64 {
        self.alert_seq.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn next_item_id(&self) -> u64 {
        self.item_seq.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn next_feedback_id(&self) -> u64 {
        self.feedback_seq.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Non-terminal orders currently assigned to the courier.
    pub fn active_order_count(&self, courier_id: u64) -> usize {
        self.orders
            .iter()
            .filter(|entry| entry.value().is_active_assignment_for(courier_id))
            .count()
    }
}
