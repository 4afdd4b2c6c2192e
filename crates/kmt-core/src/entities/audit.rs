use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::AuditAction;

/// An append-only audit log entry recording a state-changing action on a request.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AuditEntry {
    pub id: String,
    pub actor_id: String,
    pub action: AuditAction,
    pub target_request_id: String,
    pub meta: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}
