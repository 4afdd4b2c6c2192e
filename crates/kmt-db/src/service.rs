//! Service layer orchestrating request mutations with audit.
//!
//! `KmtService` wraps `KmtDb` (raw database access) and the per-request claim
//! registry. All repo methods are implemented as `impl KmtService`.

use crate::KmtDb;
use crate::claims::RequestClaims;
use crate::error::DatabaseError;

/// Orchestrates request mutations with the audit log.
///
/// Every mutation method follows this protocol:
/// 1. Claim the request id (fail fast with `Conflict`)
/// 2. Begin transaction (takes the write gate)
/// 3. Load the row and its version, check the domain rules
/// 4. Execute the versioned UPDATE / DELETE
/// 5. Append the audit entry (inside the transaction)
/// 6. Commit, or roll back on any error
pub struct KmtService {
    db: KmtDb,
    claims: RequestClaims,
}

impl KmtService {
    /// Create a new service over a local database file, or `":memory:"` for tests.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn new_local(db_path: &str) -> Result<Self, DatabaseError> {
        let db = KmtDb::open_local(db_path).await?;
        Ok(Self::from_db(db))
    }

    /// Create from an existing `KmtDb`.
    #[must_use]
    pub fn from_db(db: KmtDb) -> Self {
        Self {
            db,
            claims: RequestClaims::new(),
        }
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &KmtDb {
        &self.db
    }

    /// Access the per-request claim registry.
    #[must_use]
    pub const fn claims(&self) -> &RequestClaims {
        &self.claims
    }
}
