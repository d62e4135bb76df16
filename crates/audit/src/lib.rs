//! `gyaledger-audit` — immutable audit trail of every business action.
//!
//! The writer is best-effort by contract: an audit failure is logged and
//! swallowed, because it must never roll back a financially-correct
//! transaction.

pub mod entry;
pub mod log;

pub use entry::AuditLogEntry;
pub use log::{record_best_effort, AuditError, AuditLog, InMemoryAuditLog};
