//! Request store: create, fetch, and list active material requests.

use kmt_core::audit_detail::SubmittedDetail;
use kmt_core::entities::{MaterialRequest, NewRequest};
use kmt_core::enums::{AuditAction, RequestStatus, Role};
use kmt_core::errors::CoreError;
use kmt_core::identity::Actor;
use kmt_core::ids::PREFIX_REQUEST;

use crate::error::DatabaseError;
use crate::helpers::{
    format_datetime, get_opt_string, now, parse_datetime, parse_enum, parse_json,
    parse_optional_datetime,
};
use crate::service::KmtService;

pub(crate) const SELECT_COLS: &str = "id, requester_id, area, category, items, status, \
     assigned_supervisor_id, decline_reason, received_by, completed_at, created_at, \
     updated_at, deleted_at, version";

/// Filter criteria for `list_active`.
#[derive(Debug, Default, Clone)]
pub struct RequestFilter {
    pub area: Option<String>,
    pub status: Option<RequestStatus>,
    /// `None` returns every match.
    pub limit: Option<u32>,
}

/// A request row together with the version it was read at.
#[derive(Debug, Clone)]
pub(crate) struct StoredRequest {
    pub request: MaterialRequest,
    pub version: i64,
}

pub(crate) fn row_to_request(row: &libsql::Row) -> Result<StoredRequest, DatabaseError> {
    let request = MaterialRequest {
        id: row.get::<String>(0)?,
        requester_id: row.get::<String>(1)?,
        area: row.get::<String>(2)?,
        category: parse_enum(&row.get::<String>(3)?)?,
        items: parse_json(&row.get::<String>(4)?)?,
        status: parse_enum(&row.get::<String>(5)?)?,
        assigned_supervisor_id: get_opt_string(row, 6)?,
        decline_reason: get_opt_string(row, 7)?,
        received_by: get_opt_string(row, 8)?,
        completed_at: parse_optional_datetime(get_opt_string(row, 9)?.as_deref())?,
        created_at: parse_datetime(&row.get::<String>(10)?)?,
        updated_at: parse_datetime(&row.get::<String>(11)?)?,
        deleted_at: parse_optional_datetime(get_opt_string(row, 12)?.as_deref())?,
    };
    Ok(StoredRequest {
        request,
        version: row.get::<i64>(13)?,
    })
}

/// Load a request row by id, deleted or not.
pub(crate) async fn load_request(
    conn: &libsql::Connection,
    id: &str,
) -> Result<Option<StoredRequest>, DatabaseError> {
    let mut rows = conn
        .query(
            &format!("SELECT {SELECT_COLS} FROM material_requests WHERE id = ?1"),
            [id],
        )
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some(row_to_request(&row)?)),
        None => Ok(None),
    }
}

/// Write every mutable column of `request`, provided the row is still at
/// `expected_version`.
///
/// # Errors
///
/// Returns `CoreError::Conflict` when another writer bumped the version first.
pub(crate) async fn write_request(
    conn: &libsql::Connection,
    request: &MaterialRequest,
    expected_version: i64,
) -> Result<(), DatabaseError> {
    let items = serde_json::to_string(&request.items)?;
    let changed = conn
        .execute(
            "UPDATE material_requests
             SET items = ?1, status = ?2, assigned_supervisor_id = ?3, decline_reason = ?4,
                 received_by = ?5, completed_at = ?6, updated_at = ?7, deleted_at = ?8,
                 version = version + 1
             WHERE id = ?9 AND version = ?10",
            libsql::params![
                items,
                request.status.as_str(),
                request.assigned_supervisor_id.as_deref(),
                request.decline_reason.as_deref(),
                request.received_by.as_deref(),
                request.completed_at.as_ref().map(format_datetime),
                format_datetime(&request.updated_at),
                request.deleted_at.as_ref().map(format_datetime),
                request.id.as_str(),
                expected_version
            ],
        )
        .await?;
    if changed == 0 {
        tracing::warn!(request_id = %request.id, expected_version, "stale request version");
        return Err(CoreError::Conflict {
            id: request.id.clone(),
        }
        .into());
    }
    Ok(())
}

impl KmtService {
    /// Submit a new request on behalf of `actor`. Status starts at pending.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` for a blank area, no items, a blank
    /// item name, a zero quantity, or an unknown catalog reference.
    pub async fn create_request(
        &self,
        actor: &Actor,
        new: &NewRequest,
    ) -> Result<MaterialRequest, DatabaseError> {
        new.validate()?;
        let id = self.db().generate_id(PREFIX_REQUEST).await?;
        let tx = self.db().begin_write(&id).await?;
        let result = self.insert_request(&tx, actor, new, &id).await;
        let request = tx.finish(result).await?;
        tracing::info!(
            request_id = %request.id,
            actor = %actor.id,
            area = %request.area,
            items = request.items.len(),
            "request submitted"
        );
        Ok(request)
    }

    async fn insert_request(
        &self,
        conn: &libsql::Connection,
        actor: &Actor,
        new: &NewRequest,
        id: &str,
    ) -> Result<MaterialRequest, DatabaseError> {
        for item in &new.items {
            let Some(material_id) = item.material_id.as_deref() else {
                continue;
            };
            if !Self::material_exists(conn, material_id).await? {
                return Err(CoreError::Validation(format!(
                    "unknown material '{material_id}' for item '{}'",
                    item.material_name
                ))
                .into());
            }
        }

        let created = now();
        let mut items = new.items.clone();
        for item in &mut items {
            item.material_name = item.material_name.trim().to_string();
            item.size = item.size.trim().to_string();
        }
        let request = MaterialRequest {
            id: id.to_string(),
            requester_id: actor.id.clone(),
            area: new.area.trim().to_string(),
            category: new.category,
            items,
            status: RequestStatus::Pending,
            assigned_supervisor_id: None,
            decline_reason: None,
            received_by: None,
            completed_at: None,
            created_at: created,
            updated_at: created,
            deleted_at: None,
        };

        conn.execute(
            "INSERT INTO material_requests (id, requester_id, area, category, items, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            libsql::params![
                id,
                request.requester_id.as_str(),
                request.area.as_str(),
                request.category.as_str(),
                serde_json::to_string(&request.items)?,
                request.status.as_str(),
                format_datetime(&created),
                format_datetime(&created)
            ],
        )
        .await?;

        let detail = SubmittedDetail {
            area: request.area.clone(),
            category: request.category,
            item_count: request.items.len(),
        };
        self.record_audit(
            conn,
            &actor.id,
            AuditAction::Submitted,
            &id,
            Some(serde_json::to_value(&detail)?),
            created,
        )
        .await?;

        Ok(request)
    }

    /// Fetch one active request visible to `actor`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if the request is absent, soft-deleted,
    /// or outside the actor's visibility.
    pub async fn get_request(
        &self,
        actor: &Actor,
        id: &str,
    ) -> Result<MaterialRequest, DatabaseError> {
        let stored = {
            let _read = self.db().read().await;
            load_request(self.db().conn(), id).await?
        };
        stored
            .map(|s| s.request)
            .filter(|r| !r.is_deleted() && actor.can_view(r))
            .ok_or_else(|| CoreError::not_found("request", id).into())
    }

    /// List active requests visible to `actor`, newest first (ties by id).
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_active(
        &self,
        actor: &Actor,
        filter: &RequestFilter,
    ) -> Result<Vec<MaterialRequest>, DatabaseError> {
        let mut conditions = vec!["deleted_at IS NULL".to_string()];
        let mut params: Vec<libsql::Value> = Vec::new();

        match actor.role {
            Role::Admin => {}
            Role::Supervisor => {
                let Some(area) = actor.area.as_deref() else {
                    return Ok(Vec::new());
                };
                params.push(libsql::Value::Text(area.to_string()));
                conditions.push(format!("area = ?{}", params.len()));
            }
            Role::Staff => {
                params.push(libsql::Value::Text(actor.id.clone()));
                conditions.push(format!("requester_id = ?{}", params.len()));
            }
        }
        if let Some(ref area) = filter.area {
            params.push(libsql::Value::Text(area.trim().to_string()));
            conditions.push(format!("area = ?{}", params.len()));
        }
        if let Some(status) = filter.status {
            params.push(libsql::Value::Text(status.as_str().to_string()));
            conditions.push(format!("status = ?{}", params.len()));
        }

        let limit_clause = filter
            .limit
            .map(|limit| format!(" LIMIT {limit}"))
            .unwrap_or_default();
        let sql = format!(
            "SELECT {SELECT_COLS} FROM material_requests
             WHERE {}
             ORDER BY created_at DESC, id DESC{limit_clause}",
            conditions.join(" AND ")
        );

        let _read = self.db().read().await;
        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params_from_iter(params))
            .await?;
        let mut requests = Vec::new();
        while let Some(row) = rows.next().await? {
            requests.push(row_to_request(&row)?.request);
        }
        tracing::debug!(actor = %actor.id, count = requests.len(), "listed active requests");
        Ok(requests)
    }
}
