//! `gyaledger-api` — HTTP surface for the ledger engine.
//!
//! Consumed by the dashboard collaborator. Mutating routes pass a rate
//! limiter before reaching the engine and invalidate the sales cache on
//! success; reads are served from a short-TTL cache.

pub mod app;
pub mod cache;
pub mod middleware;
