//! Authentication service.
//!
//! Password login for sales reps, with per-account lockout after repeated
//! failures. The same check guards rep deactivation.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Utc};

use gestao_vendas_core::{FailureOutcome, SalesRepId};

use crate::db::{RepositoryError, SalesStore};
use crate::models::{NewSalesRep, SalesRep, ValidSalesRep};

/// Prefix shared by every bcrypt hash variant (`$2a$`, `$2b$`, `$2y$`).
const BCRYPT_PREFIX: &str = "$2";

/// Authentication service.
///
/// Handles rep registration, login, and password confirmation.
pub struct AuthService<'a> {
    store: &'a dyn SalesStore,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a dyn SalesStore) -> Self {
        Self { store }
    }

    /// Register a rep from a validated request.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::EmailTaken` if an active rep already uses the email.
    /// Returns `AuthError::PasswordHash` if hashing fails.
    pub async fn register(&self, rep: ValidSalesRep) -> Result<SalesRep, AuthError> {
        let password_hash = hash_password(&rep.password)?;

        let created = self
            .store
            .create_sales_rep(NewSalesRep {
                name: rep.name,
                email: rep.email,
                phone: rep.phone,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::EmailTaken,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(rep_id = %created.id, "Sales rep registered");
        Ok(created)
    }

    /// Log a rep in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown rep or a wrong password.
    /// Returns `AuthError::Locked` / `AuthError::LockedNow` while the account is locked.
    pub async fn login(
        &self,
        id: SalesRepId,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<SalesRep, AuthError> {
        let rep = self
            .store
            .get_sales_rep(id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let rep = self
            .check_password(rep, password, now, AuthError::InvalidCredentials)
            .await?;

        tracing::info!(rep_id = %rep.id, "Sales rep logged in");
        Ok(rep)
    }

    /// Re-check a rep's password before a destructive action.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::RepNotFound` if no active rep has the id.
    /// Returns `AuthError::IncorrectPassword` for a wrong password.
    /// Returns `AuthError::Locked` / `AuthError::LockedNow` while the account is locked.
    pub async fn confirm_password(
        &self,
        id: SalesRepId,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<SalesRep, AuthError> {
        let rep = self
            .store
            .get_sales_rep(id)
            .await?
            .ok_or(AuthError::RepNotFound)?;

        self.check_password(rep, password, now, AuthError::IncorrectPassword)
            .await
    }

    async fn check_password(
        &self,
        mut rep: SalesRep,
        password: &str,
        now: DateTime<Utc>,
        mismatch: AuthError,
    ) -> Result<SalesRep, AuthError> {
        if let Some(until) = rep.lockout.locked_until.filter(|_| rep.lockout.is_locked(now)) {
            tracing::warn!(rep_id = %rep.id, %until, "Attempt on locked account");
            return Err(AuthError::Locked { until });
        }

        if !verify_password(password, &rep.password_hash) {
            let outcome = self.store.record_failed_login(rep.id, now).await?;

            return Err(match outcome {
                FailureOutcome::AttemptRecorded { remaining } => {
                    tracing::info!(rep_id = %rep.id, remaining, "Password check failed");
                    mismatch
                }
                FailureOutcome::Locked { until } => {
                    tracing::warn!(rep_id = %rep.id, %until, "Account locked");
                    AuthError::LockedNow { until }
                }
            });
        }

        if rep.lockout.is_dirty() {
            rep.lockout.register_success();
            self.store.clear_lockout(rep.id, now).await?;
        }

        if is_legacy_hash(&rep.password_hash) {
            let upgraded = hash_password(password)?;
            self.store.update_password_hash(rep.id, &upgraded).await?;
            rep.password_hash = upgraded;
            tracing::info!(rep_id = %rep.id, "Legacy password hash upgraded");
        }

        Ok(rep)
    }
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against an Argon2 PHC string or a legacy bcrypt hash.
#[must_use]
pub fn verify_password(password: &str, hash: &str) -> bool {
    if is_legacy_hash(hash) {
        return bcrypt::verify(password, hash).unwrap_or(false);
    }

    PasswordHash::new(hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

fn is_legacy_hash(hash: &str) -> bool {
    hash.starts_with(BCRYPT_PREFIX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::db::memory::MemoryStore;
    use chrono::Duration;
    use gestao_vendas_core::{Email, LoginLockout, Phone};

    const PASSWORD: &str = "Vendas2024";

    async fn seed(store: &MemoryStore, password_hash: String) -> SalesRep {
        store
            .create_sales_rep(NewSalesRep {
                name: "Maria".to_owned(),
                email: Email::parse("maria@empresa.com").unwrap(),
                phone: Phone::parse("11987654321").unwrap(),
                password_hash,
            })
            .await
            .unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password(PASSWORD).unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(PASSWORD, &hash));
        assert!(!verify_password("vendas2024", &hash));
        assert!(!verify_password(PASSWORD, "not a hash"));
    }

    #[test]
    fn test_verify_bcrypt() {
        let hash = bcrypt::hash(PASSWORD, 4).unwrap();
        assert!(verify_password(PASSWORD, &hash));
        assert!(!verify_password("Outra123", &hash));
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_email() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);
        let valid = || ValidSalesRep {
            name: "Maria".to_owned(),
            email: Email::parse("maria@empresa.com").unwrap(),
            phone: Phone::parse("11987654321").unwrap(),
            password: PASSWORD.to_owned(),
        };

        let rep = auth.register(valid()).await.unwrap();
        assert!(verify_password(PASSWORD, &rep.password_hash));
        assert!(matches!(
            auth.register(valid()).await,
            Err(AuthError::EmailTaken)
        ));
    }

    #[tokio::test]
    async fn test_login_unknown_rep_is_invalid_credentials() {
        let store = MemoryStore::new();
        let result = AuthService::new(&store)
            .login(SalesRepId::generate(), PASSWORD, Utc::now())
            .await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_lockout_after_five_failures() {
        let store = MemoryStore::new();
        let rep = seed(&store, hash_password(PASSWORD).unwrap()).await;
        let auth = AuthService::new(&store);
        let now = Utc::now();

        for _ in 0..4 {
            let result = auth.login(rep.id, "Errada123", now).await;
            assert!(matches!(result, Err(AuthError::InvalidCredentials)));
        }
        let fifth = auth.login(rep.id, "Errada123", now).await;
        assert!(matches!(fifth, Err(AuthError::LockedNow { .. })));

        let sixth = auth.login(rep.id, PASSWORD, now).await;
        assert!(matches!(sixth, Err(AuthError::Locked { .. })));

        let later = now + Duration::minutes(LoginLockout::LOCK_MINUTES) + Duration::seconds(1);
        let rep = auth.login(rep.id, PASSWORD, later).await.unwrap();
        assert_eq!(rep.lockout, LoginLockout::default());
        assert_eq!(
            store.get_sales_rep(rep.id).await.unwrap().unwrap().lockout,
            LoginLockout::default()
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_failures_still_lock() {
        let store = Arc::new(MemoryStore::new());
        let rep_id = seed(&store, hash_password(PASSWORD).unwrap()).await.id;
        let now = Utc::now();

        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    AuthService::new(&*store)
                        .login(rep_id, "Errada123", now)
                        .await
                })
            })
            .collect();

        let mut locked_now = 0;
        for task in tasks {
            if matches!(task.await.unwrap(), Err(AuthError::LockedNow { .. })) {
                locked_now += 1;
            }
        }
        assert!(locked_now >= 1);

        let stored = store.get_sales_rep(rep_id).await.unwrap().unwrap();
        assert!(stored.lockout.is_locked(now));
        assert!(matches!(
            AuthService::new(&*store).login(rep_id, PASSWORD, now).await,
            Err(AuthError::Locked { .. })
        ));
    }

    #[tokio::test]
    async fn test_clear_lockout_keeps_live_lock() {
        let store = MemoryStore::new();
        let rep = seed(&store, hash_password(PASSWORD).unwrap()).await;
        let now = Utc::now();
        for _ in 0..LoginLockout::MAX_FAILED_ATTEMPTS {
            store.record_failed_login(rep.id, now).await.unwrap();
        }

        store.clear_lockout(rep.id, now).await.unwrap();
        let stored = store.get_sales_rep(rep.id).await.unwrap().unwrap();
        assert!(stored.lockout.is_locked(now));
    }

    #[tokio::test]
    async fn test_success_resets_counter() {
        let store = MemoryStore::new();
        let rep = seed(&store, hash_password(PASSWORD).unwrap()).await;
        let auth = AuthService::new(&store);
        let now = Utc::now();

        auth.login(rep.id, "Errada123", now).await.unwrap_err();
        let stored = store.get_sales_rep(rep.id).await.unwrap().unwrap();
        assert_eq!(stored.lockout.failed_attempts, 1);

        auth.login(rep.id, PASSWORD, now).await.unwrap();
        let stored = store.get_sales_rep(rep.id).await.unwrap().unwrap();
        assert_eq!(stored.lockout.failed_attempts, 0);
    }

    #[tokio::test]
    async fn test_confirm_password_shares_lockout() {
        let store = MemoryStore::new();
        let rep = seed(&store, hash_password(PASSWORD).unwrap()).await;
        let auth = AuthService::new(&store);
        let now = Utc::now();

        assert!(matches!(
            auth.confirm_password(rep.id, "Errada123", now).await,
            Err(AuthError::IncorrectPassword)
        ));
        for _ in 0..4 {
            auth.confirm_password(rep.id, "Errada123", now)
                .await
                .unwrap_err();
        }
        assert!(matches!(
            auth.login(rep.id, PASSWORD, now).await,
            Err(AuthError::Locked { .. })
        ));
        assert!(matches!(
            auth.confirm_password(SalesRepId::generate(), PASSWORD, now)
                .await,
            Err(AuthError::RepNotFound)
        ));
    }

    #[tokio::test]
    async fn test_login_upgrades_bcrypt_hash() {
        let store = MemoryStore::new();
        let rep = seed(&store, bcrypt::hash(PASSWORD, 4).unwrap()).await;

        AuthService::new(&store)
            .login(rep.id, PASSWORD, Utc::now())
            .await
            .unwrap();

        let stored = store.get_sales_rep(rep.id).await.unwrap().unwrap();
        assert!(stored.password_hash.starts_with("$argon2"));
        assert!(verify_password(PASSWORD, &stored.password_hash));
    }
}
