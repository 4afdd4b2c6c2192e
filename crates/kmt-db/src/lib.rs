//! # kmt-db
//!
//! libSQL storage for the KMT request tracker.
//!
//! Handles all relational state: material requests, the audit log, the PPE
//! register, and the material catalog. `KmtService` layers the request store,
//! workflow engine, recovery manager, and export projector on top of `KmtDb`.
//!
//! Uses the `libsql` crate (C `SQLite` fork) in local mode.

pub mod claims;
pub mod error;
pub mod helpers;
mod migrations;
pub mod repos;
pub mod service;
pub mod transaction;

#[cfg(test)]
mod test_support;

use error::DatabaseError;
use libsql::Builder;
use tokio::sync::{RwLock, RwLockReadGuard};
use transaction::WriteTx;

/// Central database handle for all KMT state operations.
///
/// The libSQL connection is shared, so transactions are serialized through a
/// read/write gate: writers hold it exclusively for the whole transaction and
/// readers hold it shared, so no reader ever observes uncommitted rows.
pub struct KmtDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
    gate: RwLock<()>,
}

impl KmtDb {
    /// Open a local database at the given path, or `":memory:"`.
    ///
    /// Runs migrations automatically on first open.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("PRAGMA foreign_keys: {e}")))?;

        let kmt_db = Self {
            db,
            conn,
            gate: RwLock::new(()),
        };
        kmt_db.run_migrations().await?;
        tracing::debug!(path, "opened local database");
        Ok(kmt_db)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Hold the shared side of the gate for the duration of a read.
    pub async fn read(&self) -> RwLockReadGuard<'_, ()> {
        self.gate.read().await
    }

    /// Take the gate exclusively and begin a transaction that writes `target`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if `BEGIN` fails, or `CoreError::Conflict` if
    /// another process holds the database lock.
    pub async fn begin_write(&self, target: &str) -> Result<WriteTx<'_>, DatabaseError> {
        let gate = self.gate.write().await;
        let tx = self
            .conn
            .transaction()
            .await
            .map_err(|e| DatabaseError::from(e).contended(target))?;
        Ok(WriteTx::new(tx, target, gate))
    }

    /// Generate a prefixed ID via libSQL. Returns e.g., `"req-a3f8b2c1"`.
    ///
    /// Uses `randomblob(4)` in SQL to produce 8-char hex, then prepends the prefix.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or returns no rows.
    pub async fn generate_id(&self, prefix: &str) -> Result<String, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT '{prefix}-' || lower(hex(randomblob(4)))"),
                (),
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<String>(0)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    async fn test_db() -> KmtDb {
        KmtDb::open_local(":memory:").await.unwrap()
    }

    #[tokio::test]
    async fn open_local_creates_schema() {
        let db = test_db().await;
        for table in ["materials", "material_requests", "ppe_register", "audit_log"] {
            let mut rows = db
                .conn()
                .query(
                    "SELECT name FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                )
                .await
                .unwrap();
            assert!(
                rows.next().await.unwrap().is_some(),
                "table '{table}' should exist"
            );
        }
    }

    #[tokio::test]
    async fn generate_id_correct_format() {
        let db = test_db().await;
        let id = db.generate_id("req").await.unwrap();
        assert!(id.starts_with("req-"), "ID should start with 'req-': {id}");
        assert_eq!(id.len(), 12, "ID should be 12 chars: {id}");
        assert!(id[4..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn generate_id_all_prefixes() {
        let db = test_db().await;
        for prefix in kmt_core::ids::ALL_PREFIXES {
            let id = db.generate_id(prefix).await.unwrap();
            assert!(id.starts_with(&format!("{prefix}-")));
        }
    }

    #[tokio::test]
    async fn generate_id_uniqueness() {
        let db = test_db().await;
        let mut ids = HashSet::new();
        for _ in 0..100 {
            let id = db.generate_id("tst").await.unwrap();
            assert!(ids.insert(id.clone()), "Duplicate ID generated: {id}");
        }
    }

    #[tokio::test]
    async fn idempotent_migrations() {
        let db = test_db().await;
        db.run_migrations().await.unwrap();
    }

    #[tokio::test]
    async fn status_check_constraint_rejects_unknown_status() {
        let db = test_db().await;
        let result = db
            .conn()
            .execute(
                "INSERT INTO material_requests (id, requester_id, area, items, status, created_at, updated_at)
                 VALUES ('req-bad', 'usr-1', 'Rustaq', '[]', 'archived', 'x', 'x')",
                (),
            )
            .await;
        assert!(result.is_err(), "unknown status must be rejected");
    }

    #[tokio::test]
    async fn audit_log_rejects_update_and_delete() {
        let db = test_db().await;
        db.conn()
            .execute(
                "INSERT INTO audit_log (id, actor_id, action, target_request_id, created_at)
                 VALUES ('aud-t1', 'usr-1', 'accepted', 'req-1', '2025-11-15T08:00:00.000000Z')",
                (),
            )
            .await
            .unwrap();

        let update = db
            .conn()
            .execute("UPDATE audit_log SET action = 'declined' WHERE id = 'aud-t1'", ())
            .await;
        assert!(update.is_err(), "audit UPDATE must be rejected");

        let delete = db
            .conn()
            .execute("DELETE FROM audit_log WHERE id = 'aud-t1'", ())
            .await;
        assert!(delete.is_err(), "audit DELETE must be rejected");
    }

    #[tokio::test]
    async fn rolled_back_write_is_invisible() {
        let db = test_db().await;
        {
            let tx = db.begin_write("mat-t1").await.unwrap();
            tx.execute(
                "INSERT INTO materials (id, name, created_at) VALUES ('mat-t1', 'Gloves', 'x')",
                (),
            )
            .await
            .unwrap();
            let result: Result<(), DatabaseError> = Err(DatabaseError::NoResult);
            assert!(tx.finish(result).await.is_err());
        }
        let mut rows = db
            .conn()
            .query("SELECT id FROM materials WHERE id = 'mat-t1'", ())
            .await
            .unwrap();
        assert!(rows.next().await.unwrap().is_none());
    }
}
