use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

/// Delivery partner. Credentials live in the session layer, not here.
#[derive(Debug, Clone, Serialize)]
pub struct Courier {
    pub id: u64,
    pub full_name: String,
    pub phone: String,
    pub approval: ApprovalStatus,
    pub created_at: DateTime<Utc>,
}
