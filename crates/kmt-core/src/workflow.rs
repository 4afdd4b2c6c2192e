//! Request workflow rules.
//!
//! `plan_transition` decides, without touching storage, what a workflow
//! command does to a request. Checks run in a fixed order: edge, then
//! authorization, then command input. Persistence (and the PPE register side
//! effect) is the caller's job.

use chrono::{DateTime, Datelike, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::audit_detail::TransitionDetail;
use crate::entities::MaterialRequest;
use crate::enums::{Role, WorkflowAction};
use crate::errors::CoreError;
use crate::identity::Actor;

/// A workflow action together with its input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum WorkflowCommand {
    Accept,
    Decline {
        reason: String,
    },
    Complete {
        received_by: String,
        completed_at: DateTime<Utc>,
    },
    Reassign,
    Assign {
        supervisor_id: String,
    },
}

impl WorkflowCommand {
    #[must_use]
    pub const fn action(&self) -> WorkflowAction {
        match self {
            Self::Accept => WorkflowAction::Accept,
            Self::Decline { .. } => WorkflowAction::Decline,
            Self::Complete { .. } => WorkflowAction::Complete,
            Self::Reassign => WorkflowAction::Reassign,
            Self::Assign { .. } => WorkflowAction::Assign,
        }
    }
}

/// Check that `actor` may perform `action` on `request`.
///
/// # Errors
///
/// Returns `CoreError::Forbidden` when the role or area does not allow it.
pub fn authorize(
    actor: &Actor,
    request: &MaterialRequest,
    action: WorkflowAction,
) -> Result<(), CoreError> {
    let allowed = match action {
        WorkflowAction::Accept | WorkflowAction::Decline => actor.can_review_area(&request.area),
        WorkflowAction::Complete | WorkflowAction::Assign => {
            actor.is_admin()
                || (actor.role == Role::Supervisor
                    && request.assigned_supervisor_id.as_deref() == Some(actor.id.as_str()))
        }
        WorkflowAction::Reassign => actor.is_admin(),
    };
    if allowed {
        Ok(())
    } else {
        Err(CoreError::forbidden(
            &actor.id,
            format!("{action} request {}", request.id),
        ))
    }
}

/// Latest year an RFC 3339 timestamp can carry without a sign prefix.
const MAX_YEAR: i32 = 9999;

/// Compute the request after applying `command` at time `now`.
///
/// `updated_at` becomes `now`; callers pass a `now` no earlier than the
/// request's current `updated_at`.
///
/// # Errors
///
/// - `CoreError::InvalidTransition` if the action has no edge from the current status
/// - `CoreError::Forbidden` if the actor may not perform it
/// - `CoreError::Validation` for a blank reason, receiver, or assignee, or a
///   completion time before the request was created or past year 9999
///
/// The completion time is truncated to microseconds, the precision storage keeps.
pub fn plan_transition(
    actor: &Actor,
    request: &MaterialRequest,
    command: &WorkflowCommand,
    now: DateTime<Utc>,
) -> Result<(MaterialRequest, TransitionDetail), CoreError> {
    let action = command.action();
    let next = request
        .status
        .apply(action)
        .ok_or_else(|| CoreError::InvalidTransition {
            id: request.id.clone(),
            from: request.status,
            action,
        })?;

    authorize(actor, request, action)?;

    let mut updated = request.clone();
    updated.status = next;
    updated.updated_at = now;
    let mut detail = TransitionDetail::new(request.status, next);

    match command {
        WorkflowCommand::Accept => {
            updated.assigned_supervisor_id = Some(actor.id.clone());
            detail.assignee = Some(actor.id.clone());
        }
        WorkflowCommand::Decline { reason } => {
            let reason = required("decline reason", reason)?;
            updated.decline_reason = Some(reason.clone());
            detail.reason = Some(reason);
        }
        WorkflowCommand::Complete {
            received_by,
            completed_at,
        } => {
            let received_by = required("received_by", received_by)?;
            let completed_at = completed_at.trunc_subsecs(6);
            if completed_at < request.created_at {
                return Err(CoreError::Validation(format!(
                    "completed_at {completed_at} is before the request was created ({})",
                    request.created_at
                )));
            }
            if completed_at.year() > MAX_YEAR {
                return Err(CoreError::Validation(format!(
                    "completed_at {completed_at} is past year {MAX_YEAR}"
                )));
            }
            updated.received_by = Some(received_by.clone());
            updated.completed_at = Some(completed_at);
            detail.received_by = Some(received_by);
            detail.completed_at = Some(completed_at);
        }
        WorkflowCommand::Reassign => {
            detail.previous_assignee = updated.assigned_supervisor_id.take();
        }
        WorkflowCommand::Assign { supervisor_id } => {
            let supervisor_id = required("supervisor id", supervisor_id)?;
            if request.assigned_supervisor_id.as_deref() == Some(supervisor_id.as_str()) {
                return Err(CoreError::Validation(format!(
                    "request {} is already assigned to {supervisor_id}",
                    request.id
                )));
            }
            detail.previous_assignee = updated.assigned_supervisor_id.replace(supervisor_id.clone());
            detail.assignee = Some(supervisor_id);
        }
    }

    Ok((updated, detail))
}

fn required(field: &str, value: &str) -> Result<String, CoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}
