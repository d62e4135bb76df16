//! `gyaledger-metrics` — derived-statistics recompute functions.
//!
//! One pure function per entity kind, each **idempotent given current ledger
//! state**: calling it twice with no intervening mutation produces the same
//! result. `now` is always a parameter so the functions stay deterministic
//! and testable; the pipeline passes wall-clock time, tests pass fixtures.

pub mod bank;
pub mod client;
pub mod distributor;
pub mod order;
pub mod product;

pub use bank::recompute_bank;
pub use client::recompute_client;
pub use distributor::recompute_distributor;
pub use order::recompute_order;
pub use product::recompute_product;
