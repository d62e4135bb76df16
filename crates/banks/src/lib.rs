//! `gyaledger-banks` — purpose-bound ledger accounts and their movements.
//!
//! Each bank accumulates one category of funds. `capital_actual` moves only
//! as cash is realized; the historic totals record the full committed
//! distribution the moment a sale is created, so the two deliberately do not
//! reconcile against each other at any instant.

pub mod bank;
pub mod movement;

pub use bank::{Bank, BankId, BankKind, BankMetrics, FlowWindow, HealthLabel, Trend};
pub use movement::{Movement, MovementId, MovementKind};
