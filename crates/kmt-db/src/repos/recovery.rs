//! Recovery manager: soft delete, recover, purge, and the admin recovery view.
//!
//! All four operations are admin only. Soft delete only stamps `deleted_at`;
//! it leaves `updated_at` alone so recovering restores the row exactly.

use chrono::{DateTime, Utc};
use kmt_core::audit_detail::{DeletionDetail, PurgedDetail};
use kmt_core::entities::MaterialRequest;
use kmt_core::enums::AuditAction;
use kmt_core::errors::CoreError;
use kmt_core::identity::Actor;

use crate::error::DatabaseError;
use crate::helpers::now;
use crate::repos::request::{SELECT_COLS, StoredRequest, load_request, row_to_request, write_request};
use crate::service::KmtService;

fn require_admin(actor: &Actor, operation: &str, id: &str) -> Result<(), CoreError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(CoreError::forbidden(&actor.id, format!("{operation} request {id}")))
    }
}

/// Load a soft-deleted request; absent rows count as not deleted.
async fn load_deleted(
    conn: &libsql::Connection,
    id: &str,
) -> Result<(StoredRequest, DateTime<Utc>), DatabaseError> {
    let stored = load_request(conn, id).await?;
    match stored {
        Some(stored) => match stored.request.deleted_at {
            Some(deleted_at) => Ok((stored, deleted_at)),
            None => Err(CoreError::NotDeleted { id: id.to_string() }.into()),
        },
        None => Err(CoreError::NotDeleted { id: id.to_string() }.into()),
    }
}

impl KmtService {
    /// Hide a request from every active view.
    ///
    /// # Errors
    ///
    /// `Forbidden`, `NotFound`, `AlreadyDeleted`, or `Conflict`.
    pub async fn soft_delete(
        &self,
        actor: &Actor,
        id: &str,
    ) -> Result<MaterialRequest, DatabaseError> {
        require_admin(actor, "delete", id)?;
        let _claim = self.claims().try_claim(id)?;
        let tx = self.db().begin_write(id).await?;
        let result = self.soft_delete_in(&tx, actor, id).await;
        let request = tx.finish(result).await?;
        tracing::info!(request_id = id, actor = %actor.id, "request soft-deleted");
        Ok(request)
    }

    async fn soft_delete_in(
        &self,
        conn: &libsql::Connection,
        actor: &Actor,
        id: &str,
    ) -> Result<MaterialRequest, DatabaseError> {
        let stored = load_request(conn, id)
            .await?
            .ok_or_else(|| CoreError::not_found("request", id))?;
        if stored.request.is_deleted() {
            return Err(CoreError::AlreadyDeleted { id: id.to_string() }.into());
        }

        let at = now().max(stored.request.updated_at);
        let mut updated = stored.request.clone();
        updated.deleted_at = Some(at);
        write_request(conn, &updated, stored.version).await?;

        let detail = DeletionDetail {
            status: updated.status,
            deleted_at: at,
        };
        self.record_audit(
            conn,
            &actor.id,
            AuditAction::Deleted,
            id,
            Some(serde_json::to_value(&detail)?),
            at,
        )
        .await?;
        Ok(updated)
    }

    /// Bring a soft-deleted request back with its fields unchanged.
    ///
    /// # Errors
    ///
    /// `Forbidden`, `NotDeleted` (also for absent or purged ids), or `Conflict`.
    pub async fn recover(
        &self,
        actor: &Actor,
        id: &str,
    ) -> Result<MaterialRequest, DatabaseError> {
        require_admin(actor, "recover", id)?;
        let _claim = self.claims().try_claim(id)?;
        let tx = self.db().begin_write(id).await?;
        let result = self.recover_in(&tx, actor, id).await;
        let request = tx.finish(result).await?;
        tracing::info!(request_id = id, actor = %actor.id, "request recovered");
        Ok(request)
    }

    async fn recover_in(
        &self,
        conn: &libsql::Connection,
        actor: &Actor,
        id: &str,
    ) -> Result<MaterialRequest, DatabaseError> {
        let (stored, deleted_at) = load_deleted(conn, id).await?;
        let mut restored = stored.request.clone();
        restored.deleted_at = None;
        write_request(conn, &restored, stored.version).await?;

        let detail = DeletionDetail {
            status: restored.status,
            deleted_at,
        };
        self.record_audit(
            conn,
            &actor.id,
            AuditAction::Recovered,
            id,
            Some(serde_json::to_value(&detail)?),
            now().max(deleted_at),
        )
        .await?;
        Ok(restored)
    }

    /// Permanently remove a soft-deleted request. The audit entry keeps a
    /// snapshot of the removed row.
    ///
    /// # Errors
    ///
    /// `Forbidden`, `NotDeleted`, or `Conflict`.
    pub async fn purge(
        &self,
        actor: &Actor,
        id: &str,
    ) -> Result<MaterialRequest, DatabaseError> {
        require_admin(actor, "purge", id)?;
        let _claim = self.claims().try_claim(id)?;
        let tx = self.db().begin_write(id).await?;
        let result = self.purge_in(&tx, actor, id).await;
        let snapshot = tx.finish(result).await?;
        tracing::info!(request_id = id, actor = %actor.id, "request purged");
        Ok(snapshot)
    }

    async fn purge_in(
        &self,
        conn: &libsql::Connection,
        actor: &Actor,
        id: &str,
    ) -> Result<MaterialRequest, DatabaseError> {
        let (stored, deleted_at) = load_deleted(conn, id).await?;
        let removed = conn
            .execute(
                "DELETE FROM material_requests WHERE id = ?1 AND version = ?2",
                libsql::params![id, stored.version],
            )
            .await?;
        if removed == 0 {
            return Err(CoreError::Conflict { id: id.to_string() }.into());
        }

        let snapshot = stored.request;
        let detail = PurgedDetail {
            snapshot: snapshot.clone(),
        };
        self.record_audit(
            conn,
            &actor.id,
            AuditAction::Purged,
            id,
            Some(serde_json::to_value(&detail)?),
            now().max(deleted_at),
        )
        .await?;
        Ok(snapshot)
    }

    /// Soft-deleted requests, most recently deleted first.
    ///
    /// # Errors
    ///
    /// `Forbidden` for non-admins, or `DatabaseError` if the query fails.
    pub async fn list_deleted(&self, actor: &Actor) -> Result<Vec<MaterialRequest>, DatabaseError> {
        if !actor.is_admin() {
            return Err(CoreError::forbidden(&actor.id, "list deleted requests").into());
        }
        let _read = self.db().read().await;
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM material_requests
                     WHERE deleted_at IS NOT NULL
                     ORDER BY deleted_at DESC, id DESC"
                ),
                (),
            )
            .await?;
        let mut requests = Vec::new();
        while let Some(row) = rows.next().await? {
            requests.push(row_to_request(&row)?.request);
        }
        Ok(requests)
    }
}

#[cfg(test)]
mod tests {
    use kmt_core::enums::RequestStatus;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::repos::audit::AuditFilter;
    use crate::repos::request::RequestFilter;
    use crate::test_support::helpers::{admin, staff, submit, supervisor, test_service};

    #[tokio::test]
    async fn soft_delete_hides_from_active_views() {
        let svc = test_service().await;
        let req = submit(&svc, &staff("usr-ali"), "Rustaq", "Gloves").await;

        let deleted = svc.soft_delete(&admin(), &req.id).await.unwrap();
        assert!(deleted.deleted_at.is_some());
        assert_eq!(deleted.updated_at, req.updated_at);

        let listed = svc
            .list_active(
                &admin(),
                &RequestFilter {
                    area: Some("Rustaq".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(listed.is_empty());

        let err = svc.get_request(&admin(), &req.id).await.unwrap_err();
        assert!(matches!(err.domain(), Some(CoreError::NotFound { .. })));

        let in_bin = svc.list_deleted(&admin()).await.unwrap();
        assert_eq!(in_bin.len(), 1);
        assert_eq!(in_bin[0].id, req.id);
    }

    #[tokio::test]
    async fn soft_delete_twice_is_already_deleted() {
        let svc = test_service().await;
        let req = submit(&svc, &staff("usr-ali"), "Rustaq", "Gloves").await;
        svc.soft_delete(&admin(), &req.id).await.unwrap();
        let err = svc.soft_delete(&admin(), &req.id).await.unwrap_err();
        assert!(matches!(err.domain(), Some(CoreError::AlreadyDeleted { .. })));
    }

    #[tokio::test]
    async fn soft_delete_missing_is_not_found() {
        let svc = test_service().await;
        let err = svc.soft_delete(&admin(), "req-00000000").await.unwrap_err();
        assert!(matches!(err.domain(), Some(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn recovery_is_admin_only() {
        let svc = test_service().await;
        let req = submit(&svc, &staff("usr-ali"), "Rustaq", "Gloves").await;
        let sup = supervisor("usr-sup", "Rustaq");

        for err in [
            svc.soft_delete(&sup, &req.id).await.unwrap_err(),
            svc.recover(&sup, &req.id).await.unwrap_err(),
            svc.purge(&sup, &req.id).await.unwrap_err(),
            svc.list_deleted(&sup).await.unwrap_err(),
        ] {
            assert!(matches!(err.domain(), Some(CoreError::Forbidden { .. })));
        }
    }

    #[tokio::test]
    async fn recover_restores_identical_fields() {
        let svc = test_service().await;
        let req = submit(&svc, &staff("usr-ali"), "Rustaq", "Gloves").await;
        let accepted = svc
            .accept_request(&supervisor("usr-sup", "Rustaq"), &req.id)
            .await
            .unwrap();

        svc.soft_delete(&admin(), &req.id).await.unwrap();
        let restored = svc.recover(&admin(), &req.id).await.unwrap();
        assert_eq!(restored, accepted);
        assert_eq!(svc.get_request(&admin(), &req.id).await.unwrap(), accepted);
        assert!(svc.list_deleted(&admin()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn recover_active_request_is_not_deleted() {
        let svc = test_service().await;
        let req = submit(&svc, &staff("usr-ali"), "Rustaq", "Gloves").await;
        let err = svc.recover(&admin(), &req.id).await.unwrap_err();
        assert!(matches!(err.domain(), Some(CoreError::NotDeleted { .. })));
        let err = svc.purge(&admin(), &req.id).await.unwrap_err();
        assert!(matches!(err.domain(), Some(CoreError::NotDeleted { .. })));
    }

    #[tokio::test]
    async fn purge_is_irreversible_and_snapshotted() {
        let svc = test_service().await;
        let req = submit(&svc, &staff("usr-ali"), "Rustaq", "Gloves").await;
        let deleted = svc.soft_delete(&admin(), &req.id).await.unwrap();

        let snapshot = svc.purge(&admin(), &req.id).await.unwrap();
        assert_eq!(snapshot, deleted);

        let err = svc.recover(&admin(), &req.id).await.unwrap_err();
        assert!(matches!(err.domain(), Some(CoreError::NotDeleted { .. })));

        let purged = svc
            .query_audit(
                &admin(),
                &AuditFilter {
                    target_request_id: Some(req.id.clone()),
                    action: Some(AuditAction::Purged),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(purged.len(), 1);
        let detail: PurgedDetail =
            serde_json::from_value(purged[0].meta.clone().unwrap()).unwrap();
        assert_eq!(detail.snapshot, deleted);
        assert_eq!(detail.snapshot.status, RequestStatus::Pending);
    }

    #[tokio::test]
    async fn workflow_cannot_see_deleted_requests() {
        let svc = test_service().await;
        let req = submit(&svc, &staff("usr-ali"), "Rustaq", "Gloves").await;
        svc.soft_delete(&admin(), &req.id).await.unwrap();
        let err = svc
            .accept_request(&supervisor("usr-sup", "Rustaq"), &req.id)
            .await
            .unwrap_err();
        assert!(matches!(err.domain(), Some(CoreError::NotFound { .. })));
    }
}
