//! Generic row operations over a live connection
//!
//! Everything here takes `&mut SqliteConnection`, so the same code path
//! serves pooled one-shot calls and transaction scopes. Rules are applied
//! here, identically for both paths.

use linecard_common::{Error, Result};
use sqlx::{Row, SqliteConnection};

use crate::entity::Entity;
use crate::rules::RuleSet;
use crate::sql;
use crate::value::Filter;

pub(crate) async fn insert<E: Entity>(conn: &mut SqliteConnection, row: &E) -> Result<i64> {
    let statement = sql::insert_sql(E::TABLE, E::COLUMNS);
    tracing::debug!(table = E::TABLE, "insert");
    let result = row.bind(sqlx::query(&statement)).execute(&mut *conn).await?;
    Ok(result.last_insert_rowid())
}

pub(crate) async fn insert_batch<E: Entity>(conn: &mut SqliteConnection, rows: &[E]) -> Result<()> {
    let statement = sql::insert_sql(E::TABLE, E::COLUMNS);
    tracing::debug!(table = E::TABLE, count = rows.len(), "insert batch");
    for row in rows {
        row.bind(sqlx::query(&statement)).execute(&mut *conn).await?;
    }
    Ok(())
}

/// Update one row by key. Missing rows are an error: an update that matched
/// nothing is a lost write, not a no-op.
pub(crate) async fn update<E: Entity>(conn: &mut SqliteConnection, row: &E) -> Result<()> {
    let statement = sql::update_sql(E::TABLE, E::COLUMNS, E::KEY);
    tracing::debug!(table = E::TABLE, key = row.key(), "update");
    let result = row
        .bind(sqlx::query(&statement))
        .bind(row.key())
        .execute(&mut *conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(Error::MissingData(format!(
            "no {} row with {} = {}",
            E::TABLE,
            E::KEY,
            row.key()
        )));
    }
    Ok(())
}

/// Insert-if-absent-else-update, keyed by the entity key. A zero key means
/// the row was never persisted, so it is a plain insert with a generated
/// key. Returns the row's key either way.
pub(crate) async fn upsert<E: Entity>(conn: &mut SqliteConnection, row: &E) -> Result<i64> {
    if row.key() == 0 {
        return insert(conn, row).await;
    }
    let statement = sql::upsert_sql(E::TABLE, E::KEY, E::COLUMNS);
    tracing::debug!(table = E::TABLE, key = row.key(), "upsert");
    row.bind(sqlx::query(&statement).bind(row.key()))
        .execute(&mut *conn)
        .await?;
    Ok(row.key())
}

pub(crate) async fn delete_by_key<E: Entity>(
    conn: &mut SqliteConnection,
    rules: &RuleSet,
    key: i64,
) -> Result<()> {
    let where_sql = sql::eq_predicate(E::KEY);
    match rules.delete_rewrite_for(E::COLUMNS) {
        Some(assignments) => {
            let columns: Vec<&str> = assignments.iter().map(|(c, _)| *c).collect();
            let statement = sql::flag_update_sql(E::TABLE, &columns, &where_sql);
            tracing::debug!(table = E::TABLE, key, "delete rewritten by rule");
            let mut query = sqlx::query(&statement);
            for (_, value) in &assignments {
                query = value.bind_scalar(query);
            }
            query.bind(key).execute(&mut *conn).await?;
        }
        None => {
            let statement = sql::delete_sql(E::TABLE, &where_sql);
            tracing::debug!(table = E::TABLE, key, "delete");
            sqlx::query(&statement).bind(key).execute(&mut *conn).await?;
        }
    }
    Ok(())
}

pub(crate) async fn delete_by_key_list<E: Entity>(
    conn: &mut SqliteConnection,
    rules: &RuleSet,
    keys: &[i64],
) -> Result<()> {
    if keys.is_empty() {
        return Ok(());
    }
    let where_sql = sql::in_predicate(E::KEY, keys.len());
    match rules.delete_rewrite_for(E::COLUMNS) {
        Some(assignments) => {
            let columns: Vec<&str> = assignments.iter().map(|(c, _)| *c).collect();
            let statement = sql::flag_update_sql(E::TABLE, &columns, &where_sql);
            tracing::debug!(table = E::TABLE, count = keys.len(), "delete list rewritten by rule");
            let mut query = sqlx::query(&statement);
            for (_, value) in &assignments {
                query = value.bind_scalar(query);
            }
            for key in keys {
                query = query.bind(key);
            }
            query.execute(&mut *conn).await?;
        }
        None => {
            let statement = sql::delete_sql(E::TABLE, &where_sql);
            tracing::debug!(table = E::TABLE, count = keys.len(), "delete list");
            let mut query = sqlx::query(&statement);
            for key in keys {
                query = query.bind(key);
            }
            query.execute(&mut *conn).await?;
        }
    }
    Ok(())
}

pub(crate) async fn delete_with_filter<E: Entity>(
    conn: &mut SqliteConnection,
    rules: &RuleSet,
    filter: &Filter,
) -> Result<()> {
    if filter.is_empty() {
        return Err(Error::Validation(format!(
            "refusing unfiltered delete on {}",
            E::TABLE
        )));
    }
    let predicates: Vec<String> = filter.columns().map(|c| sql::eq_predicate(c)).collect();
    let where_sql = predicates.join(" AND ");
    match rules.delete_rewrite_for(E::COLUMNS) {
        Some(assignments) => {
            let columns: Vec<&str> = assignments.iter().map(|(c, _)| *c).collect();
            let statement = sql::flag_update_sql(E::TABLE, &columns, &where_sql);
            tracing::debug!(table = E::TABLE, "filtered delete rewritten by rule");
            let mut query = sqlx::query(&statement);
            for (_, value) in &assignments {
                query = value.bind_scalar(query);
            }
            for value in filter.values() {
                query = value.bind_scalar(query);
            }
            query.execute(&mut *conn).await?;
        }
        None => {
            let statement = sql::delete_sql(E::TABLE, &where_sql);
            tracing::debug!(table = E::TABLE, "filtered delete");
            let mut query = sqlx::query(&statement);
            for value in filter.values() {
                query = value.bind_scalar(query);
            }
            query.execute(&mut *conn).await?;
        }
    }
    Ok(())
}

pub(crate) async fn fetch_by_key<E: Entity>(
    conn: &mut SqliteConnection,
    rules: &RuleSet,
    key: i64,
) -> Result<Option<E>> {
    let mut predicates = vec![sql::eq_predicate(E::KEY)];
    let rule_predicates = rules.read_predicates_for(E::COLUMNS);
    predicates.extend(rule_predicates.iter().map(|(c, _)| sql::eq_predicate(c)));
    let statement = sql::select_sql(E::TABLE, E::KEY, E::COLUMNS, &predicates);
    tracing::debug!(table = E::TABLE, key, "get by key");

    let mut query = sqlx::query_as::<_, E>(&statement).bind(key);
    for (_, value) in &rule_predicates {
        query = value.bind_row(query);
    }
    Ok(query.fetch_optional(&mut *conn).await?)
}

pub(crate) async fn fetch_where<E: Entity>(
    conn: &mut SqliteConnection,
    rules: &RuleSet,
    filter: &Filter,
) -> Result<Vec<E>> {
    let mut predicates: Vec<String> = filter.columns().map(|c| sql::eq_predicate(c)).collect();
    let rule_predicates = rules.read_predicates_for(E::COLUMNS);
    predicates.extend(rule_predicates.iter().map(|(c, _)| sql::eq_predicate(c)));
    let statement = sql::select_sql(E::TABLE, E::KEY, E::COLUMNS, &predicates);
    tracing::debug!(table = E::TABLE, "query");

    let mut query = sqlx::query_as::<_, E>(&statement);
    for value in filter.values() {
        query = value.bind_row(query);
    }
    for (_, value) in &rule_predicates {
        query = value.bind_row(query);
    }
    Ok(query.fetch_all(&mut *conn).await?)
}

/// Batched IN lookup on a named column; the fan-out read behind eager child
/// loading for multi-parent results.
pub(crate) async fn fetch_in<E: Entity>(
    conn: &mut SqliteConnection,
    rules: &RuleSet,
    column: &str,
    keys: &[i64],
) -> Result<Vec<E>> {
    if keys.is_empty() {
        return Ok(Vec::new());
    }
    let mut predicates = vec![sql::in_predicate(column, keys.len())];
    let rule_predicates = rules.read_predicates_for(E::COLUMNS);
    predicates.extend(rule_predicates.iter().map(|(c, _)| sql::eq_predicate(c)));
    let statement = sql::select_sql(E::TABLE, E::KEY, E::COLUMNS, &predicates);
    tracing::debug!(table = E::TABLE, column, count = keys.len(), "get by key list");

    let mut query = sqlx::query_as::<_, E>(&statement);
    for key in keys {
        query = query.bind(key);
    }
    for (_, value) in &rule_predicates {
        query = value.bind_row(query);
    }
    Ok(query.fetch_all(&mut *conn).await?)
}

/// Key set of the rows matching a filter, for set-difference reconciliation.
pub(crate) async fn fetch_key_set<E: Entity>(
    conn: &mut SqliteConnection,
    rules: &RuleSet,
    filter: &Filter,
) -> Result<Vec<i64>> {
    let mut predicates: Vec<String> = filter.columns().map(|c| sql::eq_predicate(c)).collect();
    let rule_predicates = rules.read_predicates_for(E::COLUMNS);
    predicates.extend(rule_predicates.iter().map(|(c, _)| sql::eq_predicate(c)));
    let statement = sql::select_keys_sql(E::TABLE, E::KEY, &predicates);
    tracing::debug!(table = E::TABLE, "key set query");

    let mut query = sqlx::query(&statement);
    for value in filter.values() {
        query = value.bind_scalar(query);
    }
    for (_, value) in &rule_predicates {
        query = value.bind_scalar(query);
    }
    let rows = query.fetch_all(&mut *conn).await?;
    let mut keys = Vec::with_capacity(rows.len());
    for row in rows {
        keys.push(row.try_get::<i64, _>(0)?);
    }
    Ok(keys)
}
