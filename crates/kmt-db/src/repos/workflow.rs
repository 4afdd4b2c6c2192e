//! Workflow engine: the only path by which a request's status changes.
//!
//! Each action claims the request, loads it inside a write transaction, lets
//! `kmt_core::workflow::plan_transition` decide the outcome, then writes the
//! row (version-checked), any PPE register entries, and one audit entry
//! before committing.

use chrono::{DateTime, Utc};
use kmt_core::entities::MaterialRequest;
use kmt_core::enums::RequestCategory;
use kmt_core::errors::CoreError;
use kmt_core::identity::Actor;
use kmt_core::workflow::{WorkflowCommand, plan_transition};

use crate::error::DatabaseError;
use crate::helpers::now;
use crate::repos::request::{load_request, write_request};
use crate::service::KmtService;

impl KmtService {
    /// `pending → in_progress`; the accepting supervisor becomes the assignee.
    ///
    /// # Errors
    ///
    /// `NotFound`, `InvalidTransition`, `Forbidden`, or `Conflict`.
    pub async fn accept_request(
        &self,
        actor: &Actor,
        id: &str,
    ) -> Result<MaterialRequest, DatabaseError> {
        self.apply_transition(actor, id, &WorkflowCommand::Accept)
            .await
    }

    /// `pending → declined` with a required reason.
    ///
    /// # Errors
    ///
    /// `NotFound`, `InvalidTransition`, `Forbidden`, `Validation`, or `Conflict`.
    pub async fn decline_request(
        &self,
        actor: &Actor,
        id: &str,
        reason: &str,
    ) -> Result<MaterialRequest, DatabaseError> {
        self.apply_transition(
            actor,
            id,
            &WorkflowCommand::Decline {
                reason: reason.to_string(),
            },
        )
        .await
    }

    /// `in_progress → completed`. PPE requests also issue register entries.
    ///
    /// # Errors
    ///
    /// `NotFound`, `InvalidTransition`, `Forbidden`, `Validation`, or `Conflict`.
    pub async fn complete_request(
        &self,
        actor: &Actor,
        id: &str,
        received_by: &str,
        completed_at: DateTime<Utc>,
    ) -> Result<MaterialRequest, DatabaseError> {
        self.apply_transition(
            actor,
            id,
            &WorkflowCommand::Complete {
                received_by: received_by.to_string(),
                completed_at,
            },
        )
        .await
    }

    /// `in_progress → pending`, clearing the assignee. Admin only.
    ///
    /// # Errors
    ///
    /// `NotFound`, `InvalidTransition`, `Forbidden`, or `Conflict`.
    pub async fn reassign_request(
        &self,
        actor: &Actor,
        id: &str,
    ) -> Result<MaterialRequest, DatabaseError> {
        self.apply_transition(actor, id, &WorkflowCommand::Reassign)
            .await
    }

    /// Hand an in-progress request over to another supervisor.
    ///
    /// # Errors
    ///
    /// `NotFound`, `InvalidTransition`, `Forbidden`, `Validation`, or `Conflict`.
    pub async fn assign_request(
        &self,
        actor: &Actor,
        id: &str,
        supervisor_id: &str,
    ) -> Result<MaterialRequest, DatabaseError> {
        self.apply_transition(
            actor,
            id,
            &WorkflowCommand::Assign {
                supervisor_id: supervisor_id.to_string(),
            },
        )
        .await
    }

    /// Run one workflow command end to end.
    ///
    /// # Errors
    ///
    /// Returns the domain error that rejected the command, or a storage error;
    /// in either case nothing was committed.
    pub async fn apply_transition(
        &self,
        actor: &Actor,
        id: &str,
        command: &WorkflowCommand,
    ) -> Result<MaterialRequest, DatabaseError> {
        let _claim = self.claims().try_claim(id)?;
        let tx = self.db().begin_write(id).await?;
        let result = self.transition_in(&tx, actor, id, command).await;
        let request = tx.finish(result).await?;
        tracing::info!(
            request_id = id,
            action = %command.action(),
            actor = %actor.id,
            status = %request.status,
            "request transitioned"
        );
        Ok(request)
    }

    async fn transition_in(
        &self,
        conn: &libsql::Connection,
        actor: &Actor,
        id: &str,
        command: &WorkflowCommand,
    ) -> Result<MaterialRequest, DatabaseError> {
        let stored = load_request(conn, id)
            .await?
            .filter(|s| !s.request.is_deleted())
            .ok_or_else(|| CoreError::not_found("request", id))?;

        let at = now().max(stored.request.updated_at);
        let (updated, mut detail) = plan_transition(actor, &stored.request, command, at)?;
        write_request(conn, &updated, stored.version).await?;

        if matches!(command, WorkflowCommand::Complete { .. })
            && updated.category == RequestCategory::Ppe
        {
            detail.ppe_entries = self.issue_ppe(conn, &updated, &actor.id).await?;
        }

        self.record_audit(
            conn,
            &actor.id,
            command.action().audit_action(),
            id,
            Some(serde_json::to_value(&detail)?),
            at,
        )
        .await?;
        Ok(updated)
    }
}
