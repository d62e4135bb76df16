//! `gyaledger-products` — warehouse products and their ABC statistics.

pub mod product;

pub use product::{AbcClass, Product, ProductId, ProductMetrics, ProductScores};
