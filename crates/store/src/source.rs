//! Data source: pooled one-shot operations and transaction entry point

use std::future::Future;

use linecard_common::{Error, Result};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;

use crate::entity::Entity;
use crate::ops;
use crate::rules::RuleSet;
use crate::transaction::TransactionScope;
use crate::value::Filter;

/// Race a read against its cancellation token. Already-cancelled tokens are
/// honored without touching the pool.
async fn cancellable<F, T>(cancel: &CancellationToken, operation: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = operation => result,
    }
}

/// A handle to the database plus the rules bound to it.
///
/// `with_rules` produces a second source over the same pool with a policy
/// attached; the original remains the unfiltered diagnostic path. Cloning
/// is cheap (pool and rules are shared).
///
/// Reads take a [`CancellationToken`]. Writes do not: single-statement
/// writes are not worth tearing, and multi-statement work belongs in a
/// [`TransactionScope`], which is never cancelled mid-flight.
#[derive(Clone, Debug)]
pub struct SqlDataSource {
    pool: SqlitePool,
    rules: RuleSet,
}

impl SqlDataSource {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            rules: RuleSet::default(),
        }
    }

    /// Connect to a SQLite database URL.
    ///
    /// The pool is pinned to one connection: an in-memory database exists
    /// per connection, and SQLite allows one writer regardless.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect(url)
            .await?;
        tracing::debug!(url, "connected");
        Ok(Self::new(pool))
    }

    /// A source over the same pool with `rules` bound to it.
    pub fn with_rules(&self, rules: RuleSet) -> Self {
        Self {
            pool: self.pool.clone(),
            rules,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Begin a transaction. The scope owns the underlying connection until
    /// it is committed or dropped; dropping without commit rolls back.
    pub async fn begin(&self) -> Result<TransactionScope> {
        let tx = self.pool.begin().await?;
        tracing::debug!("transaction begun");
        Ok(TransactionScope::new(tx, self.rules.clone()))
    }

    /// Insert a row; returns the store-generated key.
    pub async fn insert<E: Entity>(&self, row: &E) -> Result<i64> {
        let mut conn = self.pool.acquire().await?;
        ops::insert(&mut conn, row).await
    }

    pub async fn insert_batch<E: Entity>(&self, rows: &[E]) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        ops::insert_batch(&mut conn, rows).await
    }

    pub async fn update<E: Entity>(&self, row: &E) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        ops::update(&mut conn, row).await
    }

    /// Insert-if-absent-else-update keyed by the entity key.
    pub async fn upsert<E: Entity>(&self, row: &E) -> Result<i64> {
        let mut conn = self.pool.acquire().await?;
        ops::upsert(&mut conn, row).await
    }

    pub async fn delete<E: Entity>(&self, row: &E) -> Result<()> {
        self.delete_by_key::<E>(row.key()).await
    }

    pub async fn delete_by_key<E: Entity>(&self, key: i64) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        ops::delete_by_key::<E>(&mut conn, &self.rules, key).await
    }

    pub async fn delete_by_key_list<E: Entity>(&self, keys: &[i64]) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        ops::delete_by_key_list::<E>(&mut conn, &self.rules, keys).await
    }

    pub async fn delete_with_filter<E: Entity>(&self, filter: &Filter) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        ops::delete_with_filter::<E>(&mut conn, &self.rules, filter).await
    }

    /// Mandatory single-row lookup; absence is a `MissingData` error.
    pub async fn get_by_key<E: Entity>(&self, key: i64, cancel: &CancellationToken) -> Result<E> {
        self.get_by_key_or_null(key, cancel).await?.ok_or_else(|| {
            Error::MissingData(format!("no {} row with {} = {}", E::TABLE, E::KEY, key))
        })
    }

    /// Tolerant single-row lookup; absence is `None`, never an error.
    pub async fn get_by_key_or_null<E: Entity>(
        &self,
        key: i64,
        cancel: &CancellationToken,
    ) -> Result<Option<E>> {
        cancellable(cancel, async {
            let mut conn = self.pool.acquire().await?;
            ops::fetch_by_key(&mut conn, &self.rules, key).await
        })
        .await
    }

    /// Batched IN lookup on a named column.
    pub async fn get_by_key_list<E: Entity>(
        &self,
        column: &str,
        keys: &[i64],
        cancel: &CancellationToken,
    ) -> Result<Vec<E>> {
        cancellable(cancel, async {
            let mut conn = self.pool.acquire().await?;
            ops::fetch_in(&mut conn, &self.rules, column, keys).await
        })
        .await
    }

    /// Rows matching the filter's equality predicates; an empty filter
    /// returns every row.
    pub async fn query<E: Entity>(
        &self,
        filter: &Filter,
        cancel: &CancellationToken,
    ) -> Result<Vec<E>> {
        cancellable(cancel, async {
            let mut conn = self.pool.acquire().await?;
            ops::fetch_where(&mut conn, &self.rules, filter).await
        })
        .await
    }
}
