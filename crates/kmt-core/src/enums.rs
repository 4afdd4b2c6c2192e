//! Status, role, category, and action enums for KMT.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`.
//! `RequestStatus` provides `allowed_next_states()` and `apply()` so the
//! request lifecycle is enforced from a single table.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::CoreError;

// ---------------------------------------------------------------------------
// RequestStatus
// ---------------------------------------------------------------------------

/// Status of a material request.
///
/// ```text
/// pending → in_progress → completed
///         → declined
/// in_progress → pending (reassign)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    InProgress,
    Completed,
    Declined,
}

impl RequestStatus {
    /// Valid next states from the current state.
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::InProgress, Self::Declined],
            Self::InProgress => &[Self::Completed, Self::Pending],
            Self::Completed | Self::Declined => &[],
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    /// Status reached by applying `action` in this state, or `None` when the
    /// action has no edge out of this state.
    #[must_use]
    pub fn apply(self, action: WorkflowAction) -> Option<Self> {
        if self.is_terminal() {
            return None;
        }
        let (from, to) = action.edge();
        (self == from && (from == to || self.can_transition_to(to))).then_some(to)
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Declined)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Declined => "declined",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// WorkflowAction
// ---------------------------------------------------------------------------

/// An operation of the workflow engine on a request's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowAction {
    Accept,
    Decline,
    Complete,
    Reassign,
    /// Hand an in-progress request over to another supervisor.
    Assign,
}

impl WorkflowAction {
    /// The `(from, to)` status edge this action walks.
    #[must_use]
    pub const fn edge(self) -> (RequestStatus, RequestStatus) {
        match self {
            Self::Accept => (RequestStatus::Pending, RequestStatus::InProgress),
            Self::Decline => (RequestStatus::Pending, RequestStatus::Declined),
            Self::Complete => (RequestStatus::InProgress, RequestStatus::Completed),
            Self::Reassign => (RequestStatus::InProgress, RequestStatus::Pending),
            Self::Assign => (RequestStatus::InProgress, RequestStatus::InProgress),
        }
    }

    /// Audit action recorded when this workflow action succeeds.
    #[must_use]
    pub const fn audit_action(self) -> AuditAction {
        match self {
            Self::Accept => AuditAction::Accepted,
            Self::Decline => AuditAction::Declined,
            Self::Complete => AuditAction::Completed,
            Self::Reassign | Self::Assign => AuditAction::Assigned,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Decline => "decline",
            Self::Complete => "complete",
            Self::Reassign => "reassign",
            Self::Assign => "assign",
        }
    }
}

impl fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Role of a user, as supplied by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Staff,
    Supervisor,
    Admin,
}

impl Role {
    /// Supervisors and admins review requests; staff only submit them.
    #[must_use]
    pub const fn can_review(self) -> bool {
        matches!(self, Self::Supervisor | Self::Admin)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Staff => "staff",
            Self::Supervisor => "supervisor",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "staff" => Ok(Self::Staff),
            "supervisor" => Ok(Self::Supervisor),
            "admin" => Ok(Self::Admin),
            other => Err(CoreError::Validation(format!(
                "unknown role '{other}' (expected staff, supervisor, or admin)"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// RequestCategory
// ---------------------------------------------------------------------------

/// Category of a request. `Ppe` requests create PPE register entries when completed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RequestCategory {
    #[default]
    Material,
    Ppe,
}

impl RequestCategory {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Material => "material",
            Self::Ppe => "ppe",
        }
    }
}

impl fmt::Display for RequestCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// AuditAction
// ---------------------------------------------------------------------------

/// Type of action recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Submitted,
    Accepted,
    Declined,
    Assigned,
    Completed,
    Deleted,
    Recovered,
    Purged,
    PpeReturned,
}

impl AuditAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
            Self::Assigned => "assigned",
            Self::Completed => "completed",
            Self::Deleted => "deleted",
            Self::Recovered => "recovered",
            Self::Purged => "purged",
            Self::PpeReturned => "ppe_returned",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ExportFormat
// ---------------------------------------------------------------------------

/// File formats the external renderer produces. There is no CSV option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Xlsx,
    Pdf,
}

impl ExportFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Pdf => "pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
