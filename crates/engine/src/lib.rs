//! `gyaledger-engine` — the transactional ledger engine.
//!
//! Every mutating operation validates against a snapshot, stages its writes,
//! and commits them all-or-nothing under one store lock with per-row version
//! checks. The audit writer runs best-effort right after commit, and a
//! `LedgerEvent` is published for the derived-metrics pipeline, which runs
//! outside the write path.

pub mod engine;
pub mod events;
pub mod pipeline;
pub mod queries;
pub mod scan;
pub mod store;

pub use engine::{
    CreateSaleInput, CreateSaleOutcome, LedgerEngine, PayDistributorOutcome, AbonoOutcome,
    ReturnOutcome, TransferOutcome,
};
pub use events::LedgerEvent;
pub use pipeline::{spawn_worker, MetricsPipeline};
pub use queries::{bank_overview, list_sales, Page, Rentabilidad, SaleRecord};
pub use scan::AlertScanner;
pub use store::{LedgerStore, StagedWrites};
