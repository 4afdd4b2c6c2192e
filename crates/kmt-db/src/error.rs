//! Database error types for kmt-db.

use kmt_core::errors::CoreError;
use thiserror::Error;

/// Errors from database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The operation was rejected by a domain rule (validation, authorization,
    /// state machine, recovery precondition, or conflict).
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// A SQL query failed.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// Invalid state encountered (e.g., bad data in DB).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DatabaseError {
    /// Turn lock contention on `target` into a retryable `Conflict`.
    #[must_use]
    pub fn contended(self, target: &str) -> Self {
        match self {
            Self::LibSql(ref e) if is_lock_contention(e) => {
                tracing::warn!(target_id = target, error = %e, "database locked by another writer");
                CoreError::Conflict {
                    id: target.to_string(),
                }
                .into()
            }
            other => other,
        }
    }

    /// The domain error behind this failure, if it is one.
    #[must_use]
    pub const fn domain(&self) -> Option<&CoreError> {
        match self {
            Self::Domain(err) => Some(err),
            _ => None,
        }
    }

    /// Whether retrying the same call may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.domain().is_some_and(CoreError::is_retryable)
    }
}

/// `SQLITE_BUSY` and `SQLITE_LOCKED` primary result codes.
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

/// Detect another connection holding the database lock.
///
/// Constraint and syntax failures also arrive as `SqliteFailure`; only the
/// busy and locked codes count.
#[must_use]
pub fn is_lock_contention(e: &libsql::Error) -> bool {
    if let libsql::Error::SqliteFailure(code, _) = e {
        return matches!(*code & 0xff, SQLITE_BUSY | SQLITE_LOCKED);
    }
    let msg = e.to_string();
    msg.contains("database is locked") || msg.contains("database table is locked")
}

impl From<serde_json::Error> for DatabaseError {
    fn from(e: serde_json::Error) -> Self {
        Self::Other(e.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_and_locked_codes_are_contention() {
        assert!(is_lock_contention(&libsql::Error::SqliteFailure(
            SQLITE_BUSY,
            "database is locked".into()
        )));
        // SQLITE_BUSY_SNAPSHOT carries the busy primary code
        assert!(is_lock_contention(&libsql::Error::SqliteFailure(
            517,
            "snapshot".into()
        )));
        assert!(!is_lock_contention(&libsql::Error::SqliteFailure(
            19,
            "UNIQUE constraint failed".into()
        )));
    }

    #[test]
    fn contended_maps_only_lock_errors() {
        let locked = DatabaseError::LibSql(libsql::Error::SqliteFailure(
            SQLITE_LOCKED,
            "database table is locked".into(),
        ));
        let mapped = locked.contended("req-1");
        assert!(matches!(mapped.domain(), Some(CoreError::Conflict { id }) if id == "req-1"));
        assert!(mapped.is_retryable());

        let other = DatabaseError::Query("bad".into()).contended("req-1");
        assert!(matches!(other, DatabaseError::Query(_)));
    }
}
