//! Statement-string construction from entity metadata
//!
//! Pure functions; binding and execution live in `ops`. Table and column
//! names come from `Entity` constants, never from caller input.

/// `?, ?, ?` for `n` placeholders.
pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// `column = ?`
pub(crate) fn eq_predicate(column: &str) -> String {
    format!("{column} = ?")
}

/// `column IN (?, ?, ...)`
pub(crate) fn in_predicate(column: &str, n: usize) -> String {
    format!("{column} IN ({})", placeholders(n))
}

pub(crate) fn insert_sql(table: &str, columns: &[&str]) -> String {
    format!(
        "INSERT INTO {table} ({}) VALUES ({})",
        columns.join(", "),
        placeholders(columns.len())
    )
}

pub(crate) fn update_sql(table: &str, columns: &[&str], key: &str) -> String {
    let assignments: Vec<String> = columns.iter().map(|c| eq_predicate(c)).collect();
    format!(
        "UPDATE {table} SET {} WHERE {}",
        assignments.join(", "),
        eq_predicate(key)
    )
}

/// Insert-or-update keyed on the key column. Binds the key first, then the
/// non-key columns.
pub(crate) fn upsert_sql(table: &str, key: &str, columns: &[&str]) -> String {
    let updates: Vec<String> = columns.iter().map(|c| format!("{c} = excluded.{c}")).collect();
    format!(
        "INSERT INTO {table} ({key}, {}) VALUES ({}) ON CONFLICT({key}) DO UPDATE SET {}",
        columns.join(", "),
        placeholders(columns.len() + 1),
        updates.join(", ")
    )
}

pub(crate) fn delete_sql(table: &str, where_sql: &str) -> String {
    format!("DELETE FROM {table} WHERE {where_sql}")
}

/// The soft-delete rewrite: a delete expressed as a flag update.
pub(crate) fn flag_update_sql(table: &str, assignments: &[&str], where_sql: &str) -> String {
    let assignments: Vec<String> = assignments.iter().map(|c| eq_predicate(c)).collect();
    format!("UPDATE {table} SET {} WHERE {where_sql}", assignments.join(", "))
}

/// Select the key plus all non-key columns, with optional equality/IN
/// predicates ANDed in the given order.
pub(crate) fn select_sql(table: &str, key: &str, columns: &[&str], predicates: &[String]) -> String {
    let mut sql = format!("SELECT {key}, {} FROM {table}", columns.join(", "));
    if !predicates.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&predicates.join(" AND "));
    }
    sql
}

/// Select only the key column, for set-difference reconciliation.
pub(crate) fn select_keys_sql(table: &str, key: &str, predicates: &[String]) -> String {
    let mut sql = format!("SELECT {key} FROM {table}");
    if !predicates.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&predicates.join(" AND "));
    }
    sql
}
