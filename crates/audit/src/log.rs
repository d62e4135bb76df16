use std::sync::Mutex;

use crate::entry::AuditLogEntry;

/// Audit writer failure.
///
/// Only ever logged — see [`record_best_effort`].
#[derive(Debug)]
pub enum AuditError {
    /// The underlying store rejected the append.
    Store(String),
}

/// Append-only audit log.
pub trait AuditLog: Send + Sync {
    /// Append one immutable entry.
    fn record(&self, entry: AuditLogEntry) -> Result<(), AuditError>;

    /// Read back the trail (admin/reporting surface).
    fn entries(&self) -> Vec<AuditLogEntry>;
}

/// Record an entry, swallowing and logging any failure.
///
/// The audit trail is best-effort relative to the ledger's correctness: a
/// failure here must never abort the business transaction that produced it.
pub fn record_best_effort(log: &dyn AuditLog, entry: AuditLogEntry) {
    let action = entry.action.clone();
    if let Err(err) = log.record(entry) {
        tracing::warn!(action = %action, error = ?err, "audit log write failed; continuing");
    }
}

/// In-memory audit log for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryAuditLog {
    entries: Mutex<Vec<AuditLogEntry>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuditLog for InMemoryAuditLog {
    fn record(&self, entry: AuditLogEntry) -> Result<(), AuditError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| AuditError::Store("audit log lock poisoned".to_string()))?;
        entries.push(entry);
        Ok(())
    }

    fn entries(&self) -> Vec<AuditLogEntry> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }
}
