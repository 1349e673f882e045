//! Product line repository
//!
//! Persists the product-line aggregate: the parent row and its product
//! rows move together, inside one transaction per operation. Writes run
//! parent-first so a child never exists without its parent row; deletes
//! run children-first for the same reason in reverse. Reconciliation of
//! the child collection always works on key sets, never object identity.

use std::collections::{HashMap, HashSet};

use linecard_common::{Error, Result};
use linecard_store::{Filter, SqlDataSource};
use tokio_util::sync::CancellationToken;

use crate::domain::entities::{Product, ProductLine};

/// Foreign-key column on the product table.
const PRODUCT_LINE_FK: &str = "product_line_id";

#[derive(Clone)]
pub struct ProductLineRepository {
    source: SqlDataSource,
}

impl ProductLineRepository {
    pub fn new(source: SqlDataSource) -> Self {
        Self { source }
    }

    /// Persist a new aggregate: insert the parent, stamp its generated key
    /// onto every product, insert the products. One transaction; on any
    /// failure nothing is committed. Returns the generated key, which is
    /// also written back to `line.id`.
    pub async fn create(&self, line: &mut ProductLine) -> Result<i64> {
        if line.id != 0 {
            return Err(Error::Validation(
                "product line is already persisted (id must be 0)".to_string(),
            ));
        }

        let mut tx = self.source.begin().await?;
        line.id = tx.insert(&*line).await?;
        line.apply_keys();
        tx.insert_batch(&line.products).await?;
        tx.commit().await?;

        tracing::debug!(id = line.id, products = line.products.len(), "product line created");
        Ok(line.id)
    }

    /// Look up one line by key; `None` when absent. Products are loaded
    /// only when `include_products` is set.
    pub async fn get_by_key(
        &self,
        key: i64,
        include_products: bool,
        cancel: &CancellationToken,
    ) -> Result<Option<ProductLine>> {
        let Some(mut line) = self
            .source
            .get_by_key_or_null::<ProductLine>(key, cancel)
            .await?
        else {
            return Ok(None);
        };
        if include_products {
            line.products = self
                .source
                .query(&Filter::new().eq(PRODUCT_LINE_FK, line.id), cancel)
                .await?;
        }
        Ok(Some(line))
    }

    /// Lines whose name matches exactly; empty when none match.
    pub async fn find_by_name(
        &self,
        name: &str,
        include_products: bool,
        cancel: &CancellationToken,
    ) -> Result<Vec<ProductLine>> {
        let lines = self
            .source
            .query(&Filter::new().eq("name", name), cancel)
            .await?;
        self.load_products(lines, include_products, cancel).await
    }

    pub async fn get_all(
        &self,
        include_products: bool,
        cancel: &CancellationToken,
    ) -> Result<Vec<ProductLine>> {
        let lines = self.source.query(&Filter::new(), cancel).await?;
        self.load_products(lines, include_products, cancel).await
    }

    /// Eager-load products for a multi-line result: one batched IN lookup
    /// across every returned parent key, partitioned client-side by
    /// foreign key. Never one query per line.
    async fn load_products(
        &self,
        mut lines: Vec<ProductLine>,
        include_products: bool,
        cancel: &CancellationToken,
    ) -> Result<Vec<ProductLine>> {
        if !include_products || lines.is_empty() {
            return Ok(lines);
        }

        let keys: Vec<i64> = lines.iter().map(|l| l.id).collect();
        let products: Vec<Product> = self
            .source
            .get_by_key_list(PRODUCT_LINE_FK, &keys, cancel)
            .await?;

        let mut by_line: HashMap<i64, Vec<Product>> = HashMap::new();
        for product in products {
            by_line.entry(product.product_line_id).or_default().push(product);
        }
        for line in &mut lines {
            line.products = by_line.remove(&line.id).unwrap_or_default();
        }
        Ok(lines)
    }

    /// Delete the aggregate: products first, then the parent row, in one
    /// transaction. The store does not cascade; this ordering is the
    /// application-side cascade.
    pub async fn delete(&self, line: &ProductLine) -> Result<()> {
        if line.id == 0 {
            return Err(Error::Validation(
                "product line was never persisted (id is 0)".to_string(),
            ));
        }
        self.delete_by_key(line.id).await
    }

    pub async fn delete_by_key(&self, key: i64) -> Result<()> {
        let mut tx = self.source.begin().await?;
        tx.delete_with_filter::<Product>(&Filter::new().eq(PRODUCT_LINE_FK, key))
            .await?;
        tx.delete_by_key::<ProductLine>(key).await?;
        tx.commit().await?;

        tracing::debug!(id = key, "product line deleted");
        Ok(())
    }

    /// Update the parent row only; products are untouched.
    pub async fn update(&self, line: &ProductLine) -> Result<()> {
        if line.id == 0 {
            return Err(Error::Validation(
                "product line was never persisted (id is 0)".to_string(),
            ));
        }
        self.source.update(line).await
    }

    /// Update a single product row.
    pub async fn update_product(&self, product: &Product) -> Result<()> {
        if product.id == 0 {
            return Err(Error::Validation(
                "product was never persisted (id is 0)".to_string(),
            ));
        }
        self.source.update(product).await
    }

    /// Upsert-only graph update: the parent row is updated, keys are
    /// stamped, and every in-memory product is upserted.
    ///
    /// Products removed from the in-memory collection but still persisted
    /// are NOT deleted; they are silently orphaned. This is a deliberate
    /// partial-update policy for callers that handle deletions elsewhere.
    /// For mirror semantics use [`Self::update_graph_with_child_deletes`].
    pub async fn update_graph(&self, line: &mut ProductLine) -> Result<()> {
        self.check_persisted(line)?;

        let mut tx = self.source.begin().await?;
        tx.update(&*line).await?;
        line.apply_keys();
        for product in &line.products {
            tx.upsert(product).await?;
        }
        tx.commit().await?;

        tracing::debug!(id = line.id, "graph updated (upsert only)");
        Ok(())
    }

    /// Full-diff graph update: after the call, the persisted product set
    /// mirrors the in-memory collection exactly.
    ///
    /// Inside one transaction: update the parent, fetch the persisted
    /// product key set for this line, delete every key absent from the
    /// in-memory collection, stamp keys, upsert the in-memory products.
    /// Idempotent: repeating the call with the same collection changes
    /// nothing.
    pub async fn update_graph_with_child_deletes(&self, line: &mut ProductLine) -> Result<()> {
        self.check_persisted(line)?;

        let mut tx = self.source.begin().await?;
        tx.update(&*line).await?;

        let persisted = tx
            .key_set::<Product>(&Filter::new().eq(PRODUCT_LINE_FK, line.id))
            .await?;
        let retained: HashSet<i64> = line.products.iter().map(|p| p.id).collect();
        let mut stale: Vec<i64> = persisted
            .into_iter()
            .filter(|key| !retained.contains(key))
            .collect();
        stale.sort_unstable();
        tx.delete_by_key_list::<Product>(&stale).await?;

        line.apply_keys();
        for product in &line.products {
            tx.upsert(product).await?;
        }
        tx.commit().await?;

        tracing::debug!(id = line.id, removed = stale.len(), "graph updated (full diff)");
        Ok(())
    }

    /// Explicit-deletes graph update: upsert the in-memory products and
    /// delete exactly the caller-supplied keys, nothing derived. Rows
    /// outside both sets are untouched.
    pub async fn update_graph_with_deletes(
        &self,
        line: &mut ProductLine,
        product_keys_to_remove: &[i64],
    ) -> Result<()> {
        self.check_persisted(line)?;

        let mut tx = self.source.begin().await?;
        tx.update(&*line).await?;
        line.apply_keys();
        for product in &line.products {
            tx.upsert(product).await?;
        }
        tx.delete_by_key_list::<Product>(product_keys_to_remove)
            .await?;
        tx.commit().await?;

        tracing::debug!(
            id = line.id,
            removed = product_keys_to_remove.len(),
            "graph updated (explicit deletes)"
        );
        Ok(())
    }

    fn check_persisted(&self, line: &ProductLine) -> Result<()> {
        if line.id == 0 {
            return Err(Error::Validation(
                "product line was never persisted (id is 0)".to_string(),
            ));
        }
        Ok(())
    }
}
