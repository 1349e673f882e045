//! HR domain: employee classifications

pub mod domain;
pub mod repository;

// Re-export domain types at the crate root for convenience
pub use domain::entities::EmployeeClassification;

// Re-export repository types
pub use repository::ClassificationRepository;
