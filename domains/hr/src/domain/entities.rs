//! Domain entities for the HR domain

use linecard_store::Entity;
use serde::{Deserialize, Serialize};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments};

/// An employee classification row.
///
/// `is_deleted` is store-managed: the soft-delete rule sets it and filters
/// on it. Application code leaves it `false` and never reads it outside of
/// diagnostics through an unfiltered source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct EmployeeClassification {
    pub id: i64,
    pub name: String,
    pub is_employee: bool,
    pub is_exempt: bool,
    pub is_deleted: bool,
}

impl EmployeeClassification {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            is_employee: false,
            is_exempt: false,
            is_deleted: false,
        }
    }
}

impl Entity for EmployeeClassification {
    const TABLE: &'static str = "employee_classification";
    const KEY: &'static str = "id";
    const COLUMNS: &'static [&'static str] = &["name", "is_employee", "is_exempt", "is_deleted"];

    fn key(&self) -> i64 {
        self.id
    }

    fn bind<'q>(
        &'q self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        query
            .bind(self.name.as_str())
            .bind(self.is_employee)
            .bind(self.is_exempt)
            .bind(self.is_deleted)
    }
}
