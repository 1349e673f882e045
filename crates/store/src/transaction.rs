//! Transaction scopes

use linecard_common::Result;
use sqlx::{Sqlite, Transaction};

use crate::entity::Entity;
use crate::ops;
use crate::rules::RuleSet;
use crate::value::Filter;

/// Exclusive ownership of a connection for one atomic multi-statement
/// operation.
///
/// Every statement issued through the scope either commits as a unit via
/// [`TransactionScope::commit`] or is rolled back when the scope drops,
/// so a failure anywhere in a graph operation leaves no partial rows. The
/// source's rules apply inside the scope exactly as outside it.
pub struct TransactionScope {
    tx: Transaction<'static, Sqlite>,
    rules: RuleSet,
}

impl TransactionScope {
    pub(crate) fn new(tx: Transaction<'static, Sqlite>, rules: RuleSet) -> Self {
        Self { tx, rules }
    }

    /// Commit, consuming the scope.
    pub async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        tracing::debug!("transaction committed");
        Ok(())
    }

    /// Insert a row; returns the store-generated key.
    pub async fn insert<E: Entity>(&mut self, row: &E) -> Result<i64> {
        ops::insert(&mut self.tx, row).await
    }

    pub async fn insert_batch<E: Entity>(&mut self, rows: &[E]) -> Result<()> {
        ops::insert_batch(&mut self.tx, rows).await
    }

    pub async fn update<E: Entity>(&mut self, row: &E) -> Result<()> {
        ops::update(&mut self.tx, row).await
    }

    /// Insert-if-absent-else-update keyed by the entity key.
    pub async fn upsert<E: Entity>(&mut self, row: &E) -> Result<i64> {
        ops::upsert(&mut self.tx, row).await
    }

    pub async fn delete<E: Entity>(&mut self, row: &E) -> Result<()> {
        let key = row.key();
        self.delete_by_key::<E>(key).await
    }

    pub async fn delete_by_key<E: Entity>(&mut self, key: i64) -> Result<()> {
        ops::delete_by_key::<E>(&mut self.tx, &self.rules, key).await
    }

    pub async fn delete_by_key_list<E: Entity>(&mut self, keys: &[i64]) -> Result<()> {
        ops::delete_by_key_list::<E>(&mut self.tx, &self.rules, keys).await
    }

    pub async fn delete_with_filter<E: Entity>(&mut self, filter: &Filter) -> Result<()> {
        ops::delete_with_filter::<E>(&mut self.tx, &self.rules, filter).await
    }

    /// Rows matching the filter, read inside the transaction.
    pub async fn query<E: Entity>(&mut self, filter: &Filter) -> Result<Vec<E>> {
        ops::fetch_where(&mut self.tx, &self.rules, filter).await
    }

    /// Keys of the rows matching the filter, for set-difference
    /// reconciliation against an in-memory collection.
    pub async fn key_set<E: Entity>(&mut self, filter: &Filter) -> Result<Vec<i64>> {
        ops::fetch_key_set::<E>(&mut self.tx, &self.rules, filter).await
    }
}

impl std::fmt::Debug for TransactionScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionScope")
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}
