//! Cross-cutting data rules
//!
//! Rules intercept deletes and reads at the store boundary. They match
//! entities purely by column presence, so one rule covers every entity type
//! that carries its column and no repository ever branches on entity type.

use std::sync::Arc;

use crate::value::SqlValue;

/// A policy applied around every delete and read issued through a
/// rule-bound data source.
pub trait DataRule: Send + Sync {
    /// Whether the rule governs an entity with these non-key columns.
    fn applies_to(&self, columns: &[&str]) -> bool;

    /// When `Some`, deletes of governed entities are rewritten into an
    /// update assigning these column values instead of removing the row.
    fn delete_assignments(&self) -> Option<Vec<(&'static str, SqlValue)>>;

    /// Predicates implicitly appended to every read of governed entities.
    fn read_predicates(&self) -> Vec<(&'static str, SqlValue)>;
}

/// Converts hard deletes into `flag = true` updates and hides flagged rows
/// from reads. The flag column is owned by the store; application code
/// neither sets nor filters on it.
pub struct SoftDeleteRule {
    column: &'static str,
}

impl SoftDeleteRule {
    pub fn new(column: &'static str) -> Self {
        Self { column }
    }
}

impl DataRule for SoftDeleteRule {
    fn applies_to(&self, columns: &[&str]) -> bool {
        columns.contains(&self.column)
    }

    fn delete_assignments(&self) -> Option<Vec<(&'static str, SqlValue)>> {
        Some(vec![(self.column, SqlValue::Bool(true))])
    }

    fn read_predicates(&self) -> Vec<(&'static str, SqlValue)> {
        vec![(self.column, SqlValue::Bool(false))]
    }
}

/// The set of rules attached to a data source. Cloning shares the rules.
#[derive(Clone, Default)]
pub struct RuleSet {
    rules: Arc<Vec<Box<dyn DataRule>>>,
}

impl RuleSet {
    pub fn new(rules: Vec<Box<dyn DataRule>>) -> Self {
        Self {
            rules: Arc::new(rules),
        }
    }

    /// Convenience for the common single-rule case.
    pub fn with(rule: impl DataRule + 'static) -> Self {
        Self::new(vec![Box::new(rule)])
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Delete rewrite for an entity with these columns, from the first
    /// applicable rule providing one.
    pub(crate) fn delete_rewrite_for(
        &self,
        columns: &[&str],
    ) -> Option<Vec<(&'static str, SqlValue)>> {
        self.rules
            .iter()
            .filter(|r| r.applies_to(columns))
            .find_map(|r| r.delete_assignments())
    }

    /// Read predicates from every applicable rule, in rule order.
    pub(crate) fn read_predicates_for(
        &self,
        columns: &[&str],
    ) -> Vec<(&'static str, SqlValue)> {
        self.rules
            .iter()
            .filter(|r| r.applies_to(columns))
            .flat_map(|r| r.read_predicates())
            .collect()
    }
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSet")
            .field("rules", &self.rules.len())
            .finish()
    }
}
