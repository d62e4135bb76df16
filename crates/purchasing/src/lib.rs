//! `gyaledger-purchasing` — purchase orders from distributors.
//!
//! A purchase order tracks the merchandise bought, the stock still unsold
//! against it, and the running balance owed to the distributor.

pub mod order;

pub use order::{Efficiency, OrderStatus, PurchaseOrder, PurchaseOrderId, RotationMetrics};
