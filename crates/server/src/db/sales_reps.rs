//! Sales rep repository for database operations.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use gestao_vendas_core::{Email, FailureOutcome, LoginLockout, Phone, SalesRepId};

use super::RepositoryError;
use crate::models::{NewSalesRep, SalesRep};

const SELECT_COLUMNS: &str = "id, name, email, phone, password_hash, failed_login_attempts, \
                              locked_until, active, created_at, updated_at";

/// Row shape of `sales_reps`.
#[derive(Debug, sqlx::FromRow)]
struct SalesRepRow {
    id: Uuid,
    name: String,
    email: String,
    phone: String,
    password_hash: String,
    failed_login_attempts: i32,
    locked_until: Option<DateTime<Utc>>,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SalesRepRow> for SalesRep {
    type Error = RepositoryError;

    fn try_from(row: SalesRepRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let phone = Phone::parse(&row.phone).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid phone in database: {e}"))
        })?;
        let failed_attempts = u32::try_from(row.failed_login_attempts).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "negative failed_login_attempts for rep {}",
                row.id
            ))
        })?;

        Ok(Self {
            id: SalesRepId::new(row.id),
            name: row.name,
            email,
            phone,
            password_hash: row.password_hash,
            lockout: LoginLockout::new(failed_attempts, row.locked_until),
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for sales rep database operations.
pub struct SalesRepRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SalesRepRepository<'a> {
    /// Create a new sales rep repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List active reps, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(&self) -> Result<Vec<SalesRep>, RepositoryError> {
        let rows = sqlx::query_as::<_, SalesRepRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM sales_reps WHERE active ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(SalesRep::try_from).collect()
    }

    /// Get an active rep by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
    pub async fn get_active(&self, id: SalesRepId) -> Result<Option<SalesRep>, RepositoryError> {
        let row = sqlx::query_as::<_, SalesRepRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM sales_reps WHERE id = $1 AND active"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(SalesRep::try_from).transpose()
    }

    /// Insert a new rep.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if an active rep already has the email.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, rep: &NewSalesRep) -> Result<SalesRep, RepositoryError> {
        let row = sqlx::query_as::<_, SalesRepRow>(&format!(
            "INSERT INTO sales_reps (id, name, email, phone, password_hash) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(SalesRepId::generate())
        .bind(&rep.name)
        .bind(&rep.email)
        .bind(rep.phone.as_str())
        .bind(&rep.password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "email already exists"))?;

        SalesRep::try_from(row)
    }

    /// Insert a rep with its original id, timestamps and lockout state.
    ///
    /// Used by the legacy import.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the id or an active email already exists.
    pub async fn insert_existing(&self, rep: &SalesRep) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO sales_reps (id, name, email, phone, password_hash, \
             failed_login_attempts, locked_until, active, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(rep.id)
        .bind(&rep.name)
        .bind(&rep.email)
        .bind(rep.phone.as_str())
        .bind(&rep.password_hash)
        .bind(i32::try_from(rep.lockout.failed_attempts).unwrap_or(i32::MAX))
        .bind(rep.lockout.locked_until)
        .bind(rep.active)
        .bind(rep.created_at)
        .bind(rep.updated_at)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "rep already exists"))?;

        Ok(())
    }

    /// Count a failed login in a single statement.
    ///
    /// The row lock taken by `UPDATE` serializes concurrent failures, so
    /// every attempt increments the value the previous one wrote.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no active rep has this id.
    pub async fn record_failed_login(
        &self,
        id: SalesRepId,
        now: DateTime<Utc>,
    ) -> Result<FailureOutcome, RepositoryError> {
        let row: Option<(i32, Option<DateTime<Utc>>)> = sqlx::query_as(
            "UPDATE sales_reps SET \
               failed_login_attempts = CASE \
                 WHEN locked_until > $2 THEN failed_login_attempts \
                 WHEN failed_login_attempts + 1 >= $3 THEN 0 \
                 ELSE failed_login_attempts + 1 END, \
               locked_until = CASE \
                 WHEN locked_until > $2 THEN locked_until \
                 WHEN failed_login_attempts + 1 >= $3 THEN $4 \
                 ELSE NULL END, \
               updated_at = now() \
             WHERE id = $1 AND active \
             RETURNING failed_login_attempts, locked_until",
        )
        .bind(id)
        .bind(now)
        .bind(i32::try_from(LoginLockout::MAX_FAILED_ATTEMPTS).unwrap_or(i32::MAX))
        .bind(now + Duration::minutes(LoginLockout::LOCK_MINUTES))
        .fetch_optional(self.pool)
        .await?;

        let (attempts, locked_until) = row.ok_or(RepositoryError::NotFound)?;
        let state = LoginLockout::new(u32::try_from(attempts).unwrap_or(0), locked_until);
        Ok(state.failure_outcome(now))
    }

    /// Reset the failure counter unless a lock is still live.
    ///
    /// # Errors
    ///
    /// Returns a database error if the update fails.
    pub async fn clear_lockout(
        &self,
        id: SalesRepId,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE sales_reps \
             SET failed_login_attempts = 0, locked_until = NULL, updated_at = now() \
             WHERE id = $1 AND active AND (locked_until IS NULL OR locked_until <= $2)",
        )
        .bind(id)
        .bind(now)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Replace a rep's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no active rep has this id.
    pub async fn update_password_hash(
        &self,
        id: SalesRepId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE sales_reps SET password_hash = $2, updated_at = now() \
             WHERE id = $1 AND active",
        )
        .bind(id)
        .bind(password_hash)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Deactivate a rep and all of its sales in one transaction.
    ///
    /// Returns the number of sales deactivated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no active rep has this id.
    pub async fn deactivate(&self, id: SalesRepId) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let rep = sqlx::query(
            "UPDATE sales_reps SET active = FALSE, updated_at = now() WHERE id = $1 AND active",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if rep.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        let sales = sqlx::query(
            "UPDATE sales SET active = FALSE, updated_at = now() WHERE rep_id = $1 AND active",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(sales.rows_affected())
    }

    /// Count active reps.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_active(&self) -> Result<u64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sales_reps WHERE active")
            .fetch_one(self.pool)
            .await?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Count every rep, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_all(&self) -> Result<u64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sales_reps")
            .fetch_one(self.pool)
            .await?;

        Ok(u64::try_from(count).unwrap_or_default())
    }
}
