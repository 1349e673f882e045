//! Rule-aware data store for Linecard
//!
//! This crate is the boundary between the domain repositories and SQL: it
//! maps entities to rows through a small metadata trait, builds and executes
//! the statements, and runs multi-statement work under transaction scopes.
//! Repositories above this layer never construct SQL.
//!
//! Cross-cutting data policies (currently soft deletion) hook in through
//! [`DataRule`]: a rule-bound [`SqlDataSource`] rewrites deletes and filters
//! reads for every entity carrying the rule's column, without any
//! per-entity branching in repository code.

pub mod entity;
pub mod rules;
pub mod source;
pub mod transaction;
pub mod value;

mod ops;
mod sql;

pub use entity::Entity;
pub use rules::{DataRule, RuleSet, SoftDeleteRule};
pub use source::SqlDataSource;
pub use transaction::TransactionScope;
pub use value::{Filter, SqlValue};
