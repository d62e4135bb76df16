//! Row versioning for optimistic concurrency.
//!
//! There is no cross-operation locking in the ledger: two concurrent abonos
//! against the same sale are serialized by the store's commit-time version
//! check, not by application locks. Mutators work on a copy of the row; the
//! commit compares the copy's version with the stored one and rejects stale
//! writes with a `Conflict` the caller can retry.

use crate::error::{DomainError, DomainResult};

/// An entity whose rows carry a monotonically increasing version.
pub trait Versioned {
    /// Version of the row this state was read at.
    fn version(&self) -> u64;

    /// Advance the version by one (called by the store on commit).
    fn bump_version(&mut self);
}

/// Optimistic concurrency expectation for a row write.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking (inserts, idempotent metric refreshes).
    Any,
    /// Require the stored row to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }

    pub fn check(self, actual: u64) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "optimistic concurrency check failed (expected: {self:?}, actual: {actual})"
            )))
        }
    }
}
