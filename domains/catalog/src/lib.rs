//! Catalog domain: product lines and their products

pub mod domain;
pub mod repository;

// Re-export domain types at the crate root for convenience
pub use domain::entities::{Product, ProductLine};

// Re-export repository types
pub use repository::ProductLineRepository;
