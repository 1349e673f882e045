//! Domain entities for the catalog domain
//!
//! A `ProductLine` owns its `Product` collection by value; products carry
//! only the parent's key, never a reference to a live parent, so the
//! aggregate has no cyclic ownership.

use linecard_store::Entity;
use serde::{Deserialize, Serialize};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments};

/// Parent of the product aggregate. A key of `0` means the line has not
/// been persisted yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductLine {
    pub id: i64,
    pub name: String,
    /// Owned child collection; loaded on request, not mapped from the row.
    #[sqlx(skip)]
    pub products: Vec<Product>,
}

impl ProductLine {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            products: Vec::new(),
        }
    }

    /// Stamp this line's key onto every product's foreign key.
    ///
    /// Must run after the parent key is known and before any child write;
    /// newly added products carry a zero foreign key until this runs.
    pub fn apply_keys(&mut self) {
        for product in &mut self.products {
            product.product_line_id = self.id;
        }
    }
}

impl Entity for ProductLine {
    const TABLE: &'static str = "product_line";
    const KEY: &'static str = "id";
    const COLUMNS: &'static [&'static str] = &["name"];

    fn key(&self) -> i64 {
        self.id
    }

    fn bind<'q>(
        &'q self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        query.bind(self.name.as_str())
    }
}

/// Dependent child of a [`ProductLine`]. Has no lifecycle of its own apart
/// from deletion by key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub product_line_id: i64,
    pub name: String,
    pub weight: Option<f64>,
    pub shipping_weight: Option<f64>,
}

impl Product {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            product_line_id: 0,
            name: name.into(),
            weight: None,
            shipping_weight: None,
        }
    }
}

impl Entity for Product {
    const TABLE: &'static str = "product";
    const KEY: &'static str = "id";
    const COLUMNS: &'static [&'static str] =
        &["product_line_id", "name", "weight", "shipping_weight"];

    fn key(&self) -> i64 {
        self.id
    }

    fn bind<'q>(
        &'q self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        query
            .bind(self.product_line_id)
            .bind(self.name.as_str())
            .bind(self.weight)
            .bind(self.shipping_weight)
    }
}
