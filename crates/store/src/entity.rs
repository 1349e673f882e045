//! Entity-to-row mapping metadata

use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteRow};

/// Row-mapping metadata for a persisted entity type.
///
/// The key column is always a store-generated 64-bit identity; a key of `0`
/// means "not yet persisted". `COLUMNS` lists every non-key column in bind
/// order, and [`Entity::bind`] must append the matching values in exactly
/// that order.
///
/// Rules match entities by column name: an entity is subject to a rule iff
/// the rule's column appears in `COLUMNS`.
pub trait Entity: for<'r> sqlx::FromRow<'r, SqliteRow> + Send + Sync + Unpin {
    /// Table name.
    const TABLE: &'static str;

    /// Key column name.
    const KEY: &'static str;

    /// Non-key column names, in bind order.
    const COLUMNS: &'static [&'static str];

    /// Current key value; `0` when the row has not been inserted yet.
    fn key(&self) -> i64;

    /// Append the non-key column values to `query`, in `COLUMNS` order.
    fn bind<'q>(
        &'q self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>>;
}
