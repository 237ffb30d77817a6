use chrono::{DateTime, Utc};
use serde::Serialize;

/// Raised when an order hits the PIN lockout threshold.
/// Immutable after creation except for `resolved`.
#[derive(Debug, Clone, Serialize)]
pub struct FraudAlert {
    pub id: u64,
    pub order_id: u64,
    pub flagged_by: String,
    pub attempts: u32,
    pub resolved: bool,
    pub created_at: DateTime<Utc>,
}
