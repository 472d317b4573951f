//! Database operations for `PostgreSQL`.
//!
//! ## Tables
//!
//! - `sales_reps` - Rep accounts, password hashes and lockout state
//! - `sales` - Sale records, owned by a rep id
//!
//! Handlers talk to storage through the [`SalesStore`] trait. [`PgStore`] is
//! the production implementation; tests swap in an in-memory store.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p gestao-vendas-cli -- migrate
//! ```

pub mod sales;
pub mod sales_reps;
pub mod store;

#[cfg(test)]
pub mod memory;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use gestao_vendas_core::{FailureOutcome, MonthFilter, SaleId, SalesRepId, SalesStats};

use crate::models::{NewSalesRep, Sale, SaleInput, SalesRep};

pub use sales::SaleRepository;
pub use sales_reps::SalesRepRepository;
pub use store::PgStore;

/// Connection attempts made at startup before giving up.
const CONNECT_ATTEMPTS: u32 = 5;
/// Pause between connection attempts.
const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A CHECK constraint rejected the row.
    #[error("check violation: {0}")]
    CheckViolation(String),
}

impl RepositoryError {
    /// Translate constraint violations into their own variants.
    pub(crate) fn from_write(e: sqlx::Error, conflict: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return Self::Conflict(conflict.to_owned());
        }
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_check_violation()
        {
            return Self::CheckViolation(db_err.message().to_owned());
        }
        Self::Database(e)
    }
}

/// Which sales a listing or aggregate covers.
///
/// Only active sales are ever included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaleFilter {
    /// Restrict to one rep.
    pub rep_id: Option<SalesRepId>,
    /// Restrict to a year or month.
    pub period: Option<MonthFilter>,
}

impl SaleFilter {
    /// Filter by rep and/or period.
    #[must_use]
    pub const fn new(rep_id: Option<SalesRepId>, period: Option<MonthFilter>) -> Self {
        Self { rep_id, period }
    }

    /// Whether `sale` passes the filter.
    #[must_use]
    pub fn matches(&self, sale: &Sale) -> bool {
        sale.active
            && self.rep_id.is_none_or(|rep_id| sale.rep_id == rep_id)
            && self.period.is_none_or(|period| period.contains(sale.sold_at))
    }
}

/// Storage operations the API needs.
///
/// Sales-rep lookups only see active reps; sale lookups only see active sales.
#[async_trait]
pub trait SalesStore: Send + Sync {
    /// Check that the backing store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;

    /// Active reps, newest first.
    async fn list_sales_reps(&self) -> Result<Vec<SalesRep>, RepositoryError>;

    /// An active rep by id.
    async fn get_sales_rep(&self, id: SalesRepId) -> Result<Option<SalesRep>, RepositoryError>;

    /// Insert a rep.
    ///
    /// Returns [`RepositoryError::Conflict`] if an active rep already uses the email.
    async fn create_sales_rep(&self, rep: NewSalesRep) -> Result<SalesRep, RepositoryError>;

    /// Count a failed password check as one atomic update.
    ///
    /// Concurrent failures each see the previous one's count, so the lock
    /// engages exactly at the limit. A live lock is left untouched.
    async fn record_failed_login(
        &self,
        id: SalesRepId,
        now: DateTime<Utc>,
    ) -> Result<FailureOutcome, RepositoryError>;

    /// Reset the failure counter after a successful check.
    ///
    /// A lock that is still live at `now` is kept.
    async fn clear_lockout(
        &self,
        id: SalesRepId,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;

    /// Replace a rep's password hash.
    async fn update_password_hash(
        &self,
        id: SalesRepId,
        password_hash: &str,
    ) -> Result<(), RepositoryError>;

    /// Deactivate a rep and every sale it owns, atomically.
    ///
    /// Returns the number of sales deactivated, or [`RepositoryError::NotFound`].
    async fn deactivate_sales_rep(&self, id: SalesRepId) -> Result<u64, RepositoryError>;

    /// Number of active reps.
    async fn count_sales_reps(&self) -> Result<u64, RepositoryError>;

    /// Sales matching `filter`, most recent sale date first.
    async fn list_sales(&self, filter: SaleFilter) -> Result<Vec<Sale>, RepositoryError>;

    /// An active sale by id.
    async fn get_sale(&self, id: SaleId) -> Result<Option<Sale>, RepositoryError>;

    /// Insert a sale for `rep_id`.
    async fn create_sale(
        &self,
        rep_id: SalesRepId,
        input: SaleInput,
    ) -> Result<Sale, RepositoryError>;

    /// Replace the editable fields of a sale.
    ///
    /// Returns [`RepositoryError::NotFound`] if no active sale has this id.
    async fn update_sale(&self, id: SaleId, input: SaleInput) -> Result<Sale, RepositoryError>;

    /// Permanently remove a sale.
    ///
    /// Returns [`RepositoryError::NotFound`] if no active sale has this id.
    async fn delete_sale(&self, id: SaleId) -> Result<(), RepositoryError>;

    /// Aggregate figures over the sales matching `filter`.
    async fn sales_stats(&self, filter: SaleFilter) -> Result<SalesStats, RepositoryError>;

    /// Distinct reps owning at least one sale matching `filter`.
    async fn count_reps_with_sales(&self, filter: SaleFilter) -> Result<u64, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// Retries the initial connection a few times so the server can start
/// alongside a database that is still booting.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established after all attempts.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    let mut attempt = 1;
    loop {
        let result = PgPoolOptions::new()
            .max_connections(10)
            .min_connections(2)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url.expose_secret())
            .await;

        match result {
            Ok(pool) => return Ok(pool),
            Err(e) if attempt < CONNECT_ATTEMPTS => {
                tracing::warn!(
                    attempt,
                    max_attempts = CONNECT_ATTEMPTS,
                    error = %e,
                    "Database connection failed, retrying"
                );
                attempt += 1;
                tokio::time::sleep(CONNECT_RETRY_DELAY).await;
            }
            Err(e) => return Err(e),
        }
    }
}
