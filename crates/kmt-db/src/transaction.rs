//! Gated write transactions.

use std::ops::Deref;

use tokio::sync::RwLockWriteGuard;

use crate::error::DatabaseError;

/// A libSQL transaction holding the database's write gate.
///
/// Derefs to the connection so repo helpers run their statements inside the
/// transaction. Finish it with [`WriteTx::finish`]; the gate is released
/// after commit or rollback.
///
/// `target` names the row being written. If another process holds the
/// database lock, the failure is reported as `CoreError::Conflict` on it.
pub struct WriteTx<'a> {
    tx: libsql::Transaction,
    target: String,
    _gate: RwLockWriteGuard<'a, ()>,
}

impl<'a> WriteTx<'a> {
    pub(crate) fn new(
        tx: libsql::Transaction,
        target: &str,
        gate: RwLockWriteGuard<'a, ()>,
    ) -> Self {
        Self {
            tx,
            target: target.to_string(),
            _gate: gate,
        }
    }

    /// Commit on `Ok`, roll back on `Err`, and pass the result through.
    ///
    /// # Errors
    ///
    /// Returns the original error after rolling back, or the commit error.
    /// Lock contention from either becomes `CoreError::Conflict`.
    pub async fn finish<T>(self, result: Result<T, DatabaseError>) -> Result<T, DatabaseError> {
        let target = self.target;
        match result {
            Ok(value) => {
                self.tx
                    .commit()
                    .await
                    .map_err(|e| DatabaseError::from(e).contended(&target))?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.tx.rollback().await {
                    tracing::warn!(error = %err, %rollback_err, "rollback failed");
                } else {
                    tracing::debug!(error = %err, "transaction rolled back");
                }
                Err(err.contended(&target))
            }
        }
    }
}

impl Deref for WriteTx<'_> {
    type Target = libsql::Connection;

    fn deref(&self) -> &Self::Target {
        &self.tx
    }
}
