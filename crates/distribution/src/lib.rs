//! `gyaledger-distribution` — the GYA split calculator.
//!
//! Pure arithmetic, no IO. Every money-splitting code path in the ledger
//! (sale creation, each abono, each devolución) goes through [`distribute`]
//! and [`proportional`]; nothing else re-derives the split.

pub mod split;

pub use split::{approx_eq, distribute, proportional, GyaSplit, EPSILON};
