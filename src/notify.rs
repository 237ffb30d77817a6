use serde::Serialize;

use crate::models::fraud::FraudAlert;
use crate::models::order::{Order, OrderStatus};
use crate::state::AppState;

/// Events pushed to live admin and courier clients over `/ws`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    NewOrder { order: Order },
    OrderTaken { order_id: u64, courier_id: u64 },
    OrderStatusUpdate { order_id: u64, status: OrderStatus },
    FraudAlert { alert: FraudAlert },
}

/// Best-effort fan-out. A send error only means nobody is subscribed; the
/// originating state change must never fail because of it.
pub fn publish(state: &AppState, event: Event) {
    if state.events_tx.send(event).is_err() {
        tracing::debug!("no live event subscribers");
    }
}
