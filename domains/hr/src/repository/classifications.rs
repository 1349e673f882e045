//! Employee classification repository
//!
//! Plain single-entity CRUD, no coordination. Normally constructed over a
//! soft-delete-bound source, but nothing here knows that: the rule lives
//! entirely at the store boundary.

use linecard_common::{Error, Result};
use linecard_store::{Filter, SqlDataSource};
use tokio_util::sync::CancellationToken;

use crate::domain::entities::EmployeeClassification;

#[derive(Clone)]
pub struct ClassificationRepository {
    source: SqlDataSource,
}

impl ClassificationRepository {
    pub fn new(source: SqlDataSource) -> Self {
        Self { source }
    }

    /// Insert one classification; returns the store-generated key.
    pub async fn create(&self, classification: &EmployeeClassification) -> Result<i64> {
        if classification.id != 0 {
            return Err(Error::Validation(
                "classification is already persisted (id must be 0)".to_string(),
            ));
        }
        self.source.insert(classification).await
    }

    pub async fn create_batch(&self, classifications: &[EmployeeClassification]) -> Result<()> {
        self.source.insert_batch(classifications).await
    }

    pub async fn update(&self, classification: &EmployeeClassification) -> Result<()> {
        if classification.id == 0 {
            return Err(Error::Validation(
                "classification was never persisted (id is 0)".to_string(),
            ));
        }
        self.source.update(classification).await
    }

    pub async fn delete(&self, classification: &EmployeeClassification) -> Result<()> {
        if classification.id == 0 {
            return Err(Error::Validation(
                "classification was never persisted (id is 0)".to_string(),
            ));
        }
        self.source.delete(classification).await
    }

    pub async fn delete_by_key(&self, key: i64) -> Result<()> {
        self.source.delete_by_key::<EmployeeClassification>(key).await
    }

    /// Mandatory lookup; absence is a `MissingData` error.
    pub async fn get_by_key(
        &self,
        key: i64,
        cancel: &CancellationToken,
    ) -> Result<EmployeeClassification> {
        self.source.get_by_key(key, cancel).await
    }

    /// Tolerant lookup; absence is `None`.
    pub async fn get_by_key_or_null(
        &self,
        key: i64,
        cancel: &CancellationToken,
    ) -> Result<Option<EmployeeClassification>> {
        self.source.get_by_key_or_null(key, cancel).await
    }

    /// First classification with this exact name, if any.
    pub async fn find_by_name(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<EmployeeClassification>> {
        let mut rows: Vec<EmployeeClassification> = self
            .source
            .query(&Filter::new().eq("name", name), cancel)
            .await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }

    pub async fn get_all(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<EmployeeClassification>> {
        self.source.query(&Filter::new(), cancel).await
    }

    /// Classifications matching both flags exactly.
    pub async fn find_with_filter(
        &self,
        is_employee: bool,
        is_exempt: bool,
        cancel: &CancellationToken,
    ) -> Result<Vec<EmployeeClassification>> {
        self.source
            .query(
                &Filter::new()
                    .eq("is_employee", is_employee)
                    .eq("is_exempt", is_exempt),
                cancel,
            )
            .await
    }
}
