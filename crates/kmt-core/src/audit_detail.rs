//! Typed audit meta payloads.
//!
//! Each audit action can carry a structured `meta` JSON blob. These types
//! give the common shapes a schema.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::MaterialRequest;
use crate::enums::{RequestCategory, RequestStatus};

/// Meta for `AuditAction::Submitted`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SubmittedDetail {
    pub area: String,
    pub category: RequestCategory,
    pub item_count: usize,
}

/// Meta for workflow actions (`accepted`, `declined`, `assigned`, `completed`).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct TransitionDetail {
    pub from: RequestStatus,
    pub to: RequestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// PPE register entries created by a completion.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ppe_entries: Vec<String>,
}

impl TransitionDetail {
    #[must_use]
    pub const fn new(from: RequestStatus, to: RequestStatus) -> Self {
        Self {
            from,
            to,
            reason: None,
            previous_assignee: None,
            assignee: None,
            received_by: None,
            completed_at: None,
            ppe_entries: Vec::new(),
        }
    }
}

/// Meta for `AuditAction::Deleted` and `AuditAction::Recovered`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct DeletionDetail {
    pub status: RequestStatus,
    pub deleted_at: DateTime<Utc>,
}

/// Meta for `AuditAction::Purged`: the removed row, since it is no longer queryable.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct PurgedDetail {
    pub snapshot: MaterialRequest,
}

/// Meta for `AuditAction::PpeReturned`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct PpeReturnedDetail {
    pub entry_id: String,
    pub item_name: String,
    pub photo_count: usize,
}
