//! Per-request mutation claims.
//!
//! At most one workflow or recovery mutation may be in flight per request id
//! within this process. A second caller is turned away with
//! `CoreError::Conflict` instead of waiting. Cross-process races surface as
//! a locked database or a stale row version, and both map to `Conflict` too.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use kmt_core::errors::CoreError;

#[derive(Debug, Default)]
pub struct RequestClaims {
    held: Mutex<HashSet<String>>,
}

/// Releases its claim on drop.
#[derive(Debug)]
pub struct ClaimGuard<'a> {
    claims: &'a RequestClaims,
    id: String,
}

impl RequestClaims {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `id` for one mutation.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Conflict` if another mutation holds the claim.
    pub fn try_claim(&self, id: &str) -> Result<ClaimGuard<'_>, CoreError> {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        if !held.insert(id.to_string()) {
            tracing::warn!(request_id = id, "concurrent mutation rejected");
            return Err(CoreError::Conflict { id: id.to_string() });
        }
        Ok(ClaimGuard {
            claims: self,
            id: id.to_string(),
        })
    }

    #[must_use]
    pub fn is_claimed(&self, id: &str) -> bool {
        self.held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id)
    }
}

impl ClaimGuard<'_> {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for ClaimGuard<'_> {
    fn drop(&mut self) {
        self.claims
            .held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}
