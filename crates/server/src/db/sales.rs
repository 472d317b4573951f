//! Sale repository for database operations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use gestao_vendas_core::{Amount, SaleId, SaleStatus, SalesRepId, SalesStats, StatusCounts};

use super::{RepositoryError, SaleFilter};
use crate::models::{Sale, SaleInput};

const SELECT_COLUMNS: &str = "id, rep_id, customer_name, tax_id, phone, address, postal_code, \
                              product, amount, status, sold_at, notes, active, created_at, \
                              updated_at";

/// Predicate shared by every filtered query. Binds: `$1` rep id, `$2`/`$3` period bounds.
const FILTER_CLAUSE: &str = "active \
                             AND ($1::uuid IS NULL OR rep_id = $1) \
                             AND ($2::timestamptz IS NULL OR sold_at BETWEEN $2 AND $3)";

/// Row shape of `sales`.
#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    id: Uuid,
    rep_id: Uuid,
    customer_name: String,
    tax_id: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    postal_code: Option<String>,
    product: String,
    amount: Decimal,
    status: String,
    sold_at: DateTime<Utc>,
    notes: Option<String>,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SaleRow> for Sale {
    type Error = RepositoryError;

    fn try_from(row: SaleRow) -> Result<Self, Self::Error> {
        let amount = Amount::new(row.amount).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid amount for sale {}: {e}", row.id))
        })?;
        let status = row.status.parse::<SaleStatus>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid status for sale {}: {e}", row.id))
        })?;

        Ok(Self {
            id: SaleId::new(row.id),
            rep_id: SalesRepId::new(row.rep_id),
            customer_name: row.customer_name,
            tax_id: row.tax_id,
            phone: row.phone,
            address: row.address,
            postal_code: row.postal_code,
            product: row.product,
            amount,
            status,
            sold_at: row.sold_at,
            notes: row.notes,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Aggregate row for the dashboards.
#[derive(Debug, sqlx::FromRow)]
struct StatsRow {
    pending: i64,
    in_progress: i64,
    installed: i64,
    cancelled: i64,
    total_amount: Decimal,
}

fn count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

fn period_bounds(filter: SaleFilter) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    filter
        .period
        .map(|period| period.bounds())
        .map_or((None, None), |(start, end)| (Some(start), Some(end)))
}

/// Repository for sale database operations.
pub struct SaleRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SaleRepository<'a> {
    /// Create a new sale repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List active sales matching `filter`, most recent sale date first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: SaleFilter) -> Result<Vec<Sale>, RepositoryError> {
        let (start, end) = period_bounds(filter);
        let rows = sqlx::query_as::<_, SaleRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM sales WHERE {FILTER_CLAUSE} \
             ORDER BY sold_at DESC, created_at DESC"
        ))
        .bind(filter.rep_id)
        .bind(start)
        .bind(end)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Sale::try_from).collect()
    }

    /// Get an active sale by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active(&self, id: SaleId) -> Result<Option<Sale>, RepositoryError> {
        let row = sqlx::query_as::<_, SaleRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM sales WHERE id = $1 AND active"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Sale::try_from).transpose()
    }

    /// Insert a sale.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::CheckViolation` if a column constraint rejects the row.
    pub async fn create(
        &self,
        rep_id: SalesRepId,
        input: &SaleInput,
    ) -> Result<Sale, RepositoryError> {
        let row = sqlx::query_as::<_, SaleRow>(&format!(
            "INSERT INTO sales (id, rep_id, customer_name, tax_id, phone, address, postal_code, \
             product, amount, status, sold_at, notes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(SaleId::generate())
        .bind(rep_id)
        .bind(&input.customer_name)
        .bind(&input.tax_id)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(&input.postal_code)
        .bind(&input.product)
        .bind(input.amount)
        .bind(input.status)
        .bind(input.sold_at)
        .bind(&input.notes)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "sale already exists"))?;

        Sale::try_from(row)
    }

    /// Insert a sale with its original id, owner, timestamps and active flag.
    ///
    /// Used by the legacy import.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the id already exists.
    pub async fn insert_existing(&self, sale: &Sale) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO sales (id, rep_id, customer_name, tax_id, phone, address, postal_code, \
             product, amount, status, sold_at, notes, active, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
        )
        .bind(sale.id)
        .bind(sale.rep_id)
        .bind(&sale.customer_name)
        .bind(&sale.tax_id)
        .bind(&sale.phone)
        .bind(&sale.address)
        .bind(&sale.postal_code)
        .bind(&sale.product)
        .bind(sale.amount)
        .bind(sale.status)
        .bind(sale.sold_at)
        .bind(&sale.notes)
        .bind(sale.active)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "sale already exists"))?;

        Ok(())
    }

    /// Replace the editable fields of an active sale.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no active sale has this id.
    pub async fn update(&self, id: SaleId, input: &SaleInput) -> Result<Sale, RepositoryError> {
        let row = sqlx::query_as::<_, SaleRow>(&format!(
            "UPDATE sales SET customer_name = $2, tax_id = $3, phone = $4, address = $5, \
             postal_code = $6, product = $7, amount = $8, status = $9, sold_at = $10, \
             notes = $11, updated_at = now() \
             WHERE id = $1 AND active \
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(id)
        .bind(&input.customer_name)
        .bind(&input.tax_id)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(&input.postal_code)
        .bind(&input.product)
        .bind(input.amount)
        .bind(input.status)
        .bind(input.sold_at)
        .bind(&input.notes)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "sale already exists"))?
        .ok_or(RepositoryError::NotFound)?;

        Sale::try_from(row)
    }

    /// Delete an active sale.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no active sale has this id.
    pub async fn delete(&self, id: SaleId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM sales WHERE id = $1 AND active")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Aggregate the sales matching `filter` in a single pass.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stats(&self, filter: SaleFilter) -> Result<SalesStats, RepositoryError> {
        let (start, end) = period_bounds(filter);
        let row = sqlx::query_as::<_, StatsRow>(&format!(
            "SELECT \
               COUNT(*) FILTER (WHERE status = 'pendente')  AS pending, \
               COUNT(*) FILTER (WHERE status = 'andamento') AS in_progress, \
               COUNT(*) FILTER (WHERE status = 'instalado') AS installed, \
               COUNT(*) FILTER (WHERE status = 'cancelado') AS cancelled, \
               COALESCE(SUM(amount), 0)::numeric           AS total_amount \
             FROM sales WHERE {FILTER_CLAUSE}"
        ))
        .bind(filter.rep_id)
        .bind(start)
        .bind(end)
        .fetch_one(self.pool)
        .await?;

        let counts = StatusCounts {
            pending: count(row.pending),
            in_progress: count(row.in_progress),
            installed: count(row.installed),
            cancelled: count(row.cancelled),
        };
        Ok(SalesStats::from_parts(counts, row.total_amount))
    }

    /// Count distinct reps with at least one sale matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_reps_with_sales(&self, filter: SaleFilter) -> Result<u64, RepositoryError> {
        let (start, end) = period_bounds(filter);
        let (reps,): (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(DISTINCT rep_id) FROM sales WHERE {FILTER_CLAUSE}"
        ))
        .bind(filter.rep_id)
        .bind(start)
        .bind(end)
        .fetch_one(self.pool)
        .await?;

        Ok(count(reps))
    }

    /// Count every sale, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_all(&self) -> Result<u64, RepositoryError> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sales")
            .fetch_one(self.pool)
            .await?;

        Ok(count(total))
    }
}
