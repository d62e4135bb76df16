//! `gyaledger-alerts` — threshold alerts over ledger state.
//!
//! Scans are pure and idempotent: they look at current entity state plus the
//! set of currently active alerts and decide what to open and what to
//! resolve. Re-running a scan with no intervening mutation is a no-op.

pub mod alert;
pub mod rules;

pub use alert::{Alert, AlertId, AlertKind, AlertSeverity, AlertStatus};
pub use rules::{scan_clients, scan_stock, AlertConfig, ScanOutcome};
