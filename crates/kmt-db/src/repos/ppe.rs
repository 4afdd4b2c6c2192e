//! PPE register repository.
//!
//! Entries are issued when a PPE request completes and later marked returned.
//! The register has no foreign key to requests so issuance history survives a
//! purge.

use kmt_core::audit_detail::PpeReturnedDetail;
use kmt_core::entities::{MaterialRequest, PpeRegisterEntry};
use kmt_core::enums::{AuditAction, Role};
use kmt_core::errors::CoreError;
use kmt_core::identity::Actor;
use kmt_core::ids::PREFIX_PPE;

use crate::error::DatabaseError;
use crate::helpers::{
    format_datetime, get_opt_string, get_u32, now, parse_datetime, parse_json,
    parse_optional_datetime,
};
use crate::service::KmtService;

const PPE_COLS: &str = "id, request_id, user_id, item_name, size, qty, issued_by, issued_at, \
     returned, return_photo_refs, remark, returned_at";

/// Filter criteria for the PPE register.
#[derive(Debug, Default, Clone)]
pub struct PpeFilter {
    pub user_id: Option<String>,
    pub returned: Option<bool>,
    pub limit: Option<u32>,
}

fn row_to_ppe(row: &libsql::Row) -> Result<PpeRegisterEntry, DatabaseError> {
    Ok(PpeRegisterEntry {
        id: row.get::<String>(0)?,
        request_id: row.get::<String>(1)?,
        user_id: row.get::<String>(2)?,
        item_name: row.get::<String>(3)?,
        size: row.get::<String>(4)?,
        qty: get_u32(row, 5)?,
        issued_by: row.get::<String>(6)?,
        issued_at: parse_datetime(&row.get::<String>(7)?)?,
        returned: row.get::<i64>(8)? != 0,
        return_photo_refs: parse_json(&row.get::<String>(9)?)?,
        remark: get_opt_string(row, 10)?,
        returned_at: parse_optional_datetime(get_opt_string(row, 11)?.as_deref())?,
    })
}

async fn load_entry(
    conn: &libsql::Connection,
    id: &str,
) -> Result<Option<PpeRegisterEntry>, DatabaseError> {
    let mut rows = conn
        .query(
            &format!("SELECT {PPE_COLS} FROM ppe_register WHERE id = ?1"),
            [id],
        )
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some(row_to_ppe(&row)?)),
        None => Ok(None),
    }
}

impl KmtService {
    /// Insert one register entry per item of a completed PPE request.
    /// Returns the new entry ids in item order.
    pub(crate) async fn issue_ppe(
        &self,
        conn: &libsql::Connection,
        request: &MaterialRequest,
        issued_by: &str,
    ) -> Result<Vec<String>, DatabaseError> {
        let issued_at = request.completed_at.unwrap_or(request.updated_at);
        let mut ids = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let id = self.db().generate_id(PREFIX_PPE).await?;
            conn.execute(
                "INSERT INTO ppe_register (id, request_id, user_id, item_name, size, qty, issued_by, issued_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                libsql::params![
                    id.as_str(),
                    request.id.as_str(),
                    request.requester_id.as_str(),
                    item.material_name.as_str(),
                    item.size.as_str(),
                    i64::from(item.qty),
                    issued_by,
                    format_datetime(&issued_at)
                ],
            )
            .await?;
            ids.push(id);
        }
        Ok(ids)
    }

    /// List register entries, newest issue first.
    ///
    /// Staff only ever see entries issued to themselves.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_ppe_register(
        &self,
        actor: &Actor,
        filter: &PpeFilter,
    ) -> Result<Vec<PpeRegisterEntry>, DatabaseError> {
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        let user_id = if actor.role == Role::Staff {
            Some(actor.id.clone())
        } else {
            filter.user_id.clone()
        };
        if let Some(user_id) = user_id {
            params.push(libsql::Value::Text(user_id));
            conditions.push(format!("user_id = ?{}", params.len()));
        }
        if let Some(returned) = filter.returned {
            params.push(libsql::Value::Integer(i64::from(returned)));
            conditions.push(format!("returned = ?{}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let limit_clause = filter
            .limit
            .map(|limit| format!(" LIMIT {limit}"))
            .unwrap_or_default();
        let sql = format!(
            "SELECT {PPE_COLS} FROM ppe_register {where_clause}
             ORDER BY issued_at DESC, id DESC{limit_clause}"
        );

        let _read = self.db().read().await;
        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params_from_iter(params))
            .await?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(row_to_ppe(&row)?);
        }
        Ok(entries)
    }

    /// Record that an issued PPE item came back.
    ///
    /// # Errors
    ///
    /// `Forbidden` for staff, `NotFound` for an unknown entry, `Validation`
    /// if it was already returned, or `Conflict` if another return won.
    pub async fn mark_ppe_returned(
        &self,
        actor: &Actor,
        entry_id: &str,
        return_photo_refs: &[String],
        remark: Option<&str>,
    ) -> Result<PpeRegisterEntry, DatabaseError> {
        if !actor.role.can_review() {
            return Err(CoreError::forbidden(&actor.id, format!("return PPE entry {entry_id}")).into());
        }
        let tx = self.db().begin_write(entry_id).await?;
        let result = self
            .mark_returned_in(&tx, actor, entry_id, return_photo_refs, remark)
            .await;
        let entry = tx.finish(result).await?;
        tracing::info!(
            entry_id,
            request_id = %entry.request_id,
            actor = %actor.id,
            "PPE marked returned"
        );
        Ok(entry)
    }

    async fn mark_returned_in(
        &self,
        conn: &libsql::Connection,
        actor: &Actor,
        entry_id: &str,
        return_photo_refs: &[String],
        remark: Option<&str>,
    ) -> Result<PpeRegisterEntry, DatabaseError> {
        let mut entry = load_entry(conn, entry_id)
            .await?
            .ok_or_else(|| CoreError::not_found("ppe_entry", entry_id))?;
        if entry.returned {
            return Err(CoreError::Validation(format!(
                "PPE entry {entry_id} is already returned"
            ))
            .into());
        }

        let at = now().max(entry.issued_at);
        entry.returned = true;
        entry.returned_at = Some(at);
        entry.return_photo_refs.extend(
            return_photo_refs
                .iter()
                .map(|r| r.trim())
                .filter(|r| !r.is_empty())
                .map(String::from),
        );
        if let Some(remark) = remark.map(str::trim).filter(|r| !r.is_empty()) {
            entry.remark = Some(remark.to_string());
        }

        let changed = conn
            .execute(
                "UPDATE ppe_register
                 SET returned = 1, returned_at = ?1, return_photo_refs = ?2, remark = ?3
                 WHERE id = ?4 AND returned = 0",
                libsql::params![
                    format_datetime(&at),
                    serde_json::to_string(&entry.return_photo_refs)?,
                    entry.remark.as_deref(),
                    entry_id
                ],
            )
            .await?;
        if changed == 0 {
            return Err(CoreError::Conflict {
                id: entry_id.to_string(),
            }
            .into());
        }

        let detail = PpeReturnedDetail {
            entry_id: entry.id.clone(),
            item_name: entry.item_name.clone(),
            photo_count: entry.return_photo_refs.len(),
        };
        self.record_audit(
            conn,
            &actor.id,
            AuditAction::PpeReturned,
            &entry.request_id,
            Some(serde_json::to_value(&detail)?),
            at,
        )
        .await?;
        Ok(entry)
    }
}
