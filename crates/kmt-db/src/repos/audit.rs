//! Audit log repository.
//!
//! Append-only entries recording every request mutation. Entries are written
//! inside the mutation's transaction; the table's triggers reject UPDATE and
//! DELETE.

use chrono::{DateTime, Utc};
use kmt_core::entities::AuditEntry;
use kmt_core::enums::AuditAction;
use kmt_core::errors::CoreError;
use kmt_core::identity::Actor;
use kmt_core::ids::PREFIX_AUDIT;

use crate::error::DatabaseError;
use crate::helpers::{format_datetime, get_opt_string, parse_datetime, parse_enum, parse_optional_json};
use crate::service::KmtService;

/// Filter criteria for audit queries.
#[derive(Debug, Default, Clone)]
pub struct AuditFilter {
    pub target_request_id: Option<String>,
    pub action: Option<AuditAction>,
    pub actor_id: Option<String>,
    pub limit: Option<u32>,
}

fn row_to_audit(row: &libsql::Row) -> Result<AuditEntry, DatabaseError> {
    Ok(AuditEntry {
        id: row.get::<String>(0)?,
        actor_id: row.get::<String>(1)?,
        action: parse_enum(&row.get::<String>(2)?)?,
        target_request_id: row.get::<String>(3)?,
        meta: parse_optional_json(get_opt_string(row, 4)?.as_deref())?,
        created_at: parse_datetime(&row.get::<String>(5)?)?,
    })
}

impl KmtService {
    /// Append an audit entry on `conn`. Called by every mutation inside its
    /// transaction.
    pub(crate) async fn record_audit(
        &self,
        conn: &libsql::Connection,
        actor_id: &str,
        action: AuditAction,
        target_request_id: &str,
        meta: Option<serde_json::Value>,
        at: DateTime<Utc>,
    ) -> Result<AuditEntry, DatabaseError> {
        let entry = AuditEntry {
            id: self.db().generate_id(PREFIX_AUDIT).await?,
            actor_id: actor_id.to_string(),
            action,
            target_request_id: target_request_id.to_string(),
            meta,
            created_at: at,
        };
        conn.execute(
            "INSERT INTO audit_log (id, actor_id, action, target_request_id, meta, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            libsql::params![
                entry.id.as_str(),
                entry.actor_id.as_str(),
                entry.action.as_str(),
                entry.target_request_id.as_str(),
                entry.meta.as_ref().map(std::string::ToString::to_string),
                format_datetime(&entry.created_at)
            ],
        )
        .await?;
        Ok(entry)
    }

    /// Query audit entries, newest first.
    ///
    /// Entries outlive purges, so they are not scoped by request visibility;
    /// staff may not read the log at all.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Forbidden` for staff, or `DatabaseError` if the
    /// query fails.
    pub async fn query_audit(
        &self,
        actor: &Actor,
        filter: &AuditFilter,
    ) -> Result<Vec<AuditEntry>, DatabaseError> {
        if !actor.role.can_review() {
            return Err(CoreError::forbidden(&actor.id, "read the audit log").into());
        }

        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(ref target) = filter.target_request_id {
            params.push(libsql::Value::Text(target.clone()));
            conditions.push(format!("target_request_id = ?{}", params.len()));
        }
        if let Some(action) = filter.action {
            params.push(libsql::Value::Text(action.as_str().to_string()));
            conditions.push(format!("action = ?{}", params.len()));
        }
        if let Some(ref actor_id) = filter.actor_id {
            params.push(libsql::Value::Text(actor_id.clone()));
            conditions.push(format!("actor_id = ?{}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let limit = filter.limit.unwrap_or(100);
        let sql = format!(
            "SELECT id, actor_id, action, target_request_id, meta, created_at
             FROM audit_log {where_clause}
             ORDER BY created_at DESC, rowid DESC LIMIT {limit}"
        );

        let _read = self.db().read().await;
        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params_from_iter(params))
            .await?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(row_to_audit(&row)?);
        }
        Ok(entries)
    }
}
