//! `gyaledger-parties` — clients and distributors.
//!
//! Base fields are mutated by the transaction engine; the `metrics` blocks
//! are owned exclusively by the derived-metrics pipeline.

pub mod client;
pub mod distributor;

pub use client::{Client, ClientCategory, ClientId, ClientMetrics};
pub use distributor::{Distributor, DistributorId, DistributorMetrics};
