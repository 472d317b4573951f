//! `PostgreSQL`-backed [`SalesStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use gestao_vendas_core::{FailureOutcome, SaleId, SalesRepId, SalesStats};

use super::{RepositoryError, SaleFilter, SaleRepository, SalesRepRepository, SalesStore};
use crate::models::{NewSalesRep, Sale, SaleInput, SalesRep};

/// Store that delegates to the per-table repositories.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn reps(&self) -> SalesRepRepository<'_> {
        SalesRepRepository::new(&self.pool)
    }

    fn sales(&self) -> SaleRepository<'_> {
        SaleRepository::new(&self.pool)
    }
}

#[async_trait]
impl SalesStore for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list_sales_reps(&self) -> Result<Vec<SalesRep>, RepositoryError> {
        self.reps().list_active().await
    }

    async fn get_sales_rep(&self, id: SalesRepId) -> Result<Option<SalesRep>, RepositoryError> {
        self.reps().get_active(id).await
    }

    async fn create_sales_rep(&self, rep: NewSalesRep) -> Result<SalesRep, RepositoryError> {
        self.reps().create(&rep).await
    }

    async fn record_failed_login(
        &self,
        id: SalesRepId,
        now: DateTime<Utc>,
    ) -> Result<FailureOutcome, RepositoryError> {
        self.reps().record_failed_login(id, now).await
    }

    async fn clear_lockout(
        &self,
        id: SalesRepId,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        self.reps().clear_lockout(id, now).await
    }

    async fn update_password_hash(
        &self,
        id: SalesRepId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        self.reps().update_password_hash(id, password_hash).await
    }

    async fn deactivate_sales_rep(&self, id: SalesRepId) -> Result<u64, RepositoryError> {
        self.reps().deactivate(id).await
    }

    async fn count_sales_reps(&self) -> Result<u64, RepositoryError> {
        self.reps().count_active().await
    }

    async fn list_sales(&self, filter: SaleFilter) -> Result<Vec<Sale>, RepositoryError> {
        self.sales().list(filter).await
    }

    async fn get_sale(&self, id: SaleId) -> Result<Option<Sale>, RepositoryError> {
        self.sales().get_active(id).await
    }

    async fn create_sale(
        &self,
        rep_id: SalesRepId,
        input: SaleInput,
    ) -> Result<Sale, RepositoryError> {
        self.sales().create(rep_id, &input).await
    }

    async fn update_sale(&self, id: SaleId, input: SaleInput) -> Result<Sale, RepositoryError> {
        self.sales().update(id, &input).await
    }

    async fn delete_sale(&self, id: SaleId) -> Result<(), RepositoryError> {
        self.sales().delete(id).await
    }

    async fn sales_stats(&self, filter: SaleFilter) -> Result<SalesStats, RepositoryError> {
        self.sales().stats(filter).await
    }

    async fn count_reps_with_sales(&self, filter: SaleFilter) -> Result<u64, RepositoryError> {
        self.sales().count_reps_with_sales(filter).await
    }
}
