//! In-memory [`SalesStore`] for handler tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use gestao_vendas_core::{FailureOutcome, LoginLockout, SaleId, SalesRepId, SalesStats};

use super::{RepositoryError, SaleFilter, SalesStore};
use crate::models::{NewSalesRep, Sale, SaleInput, SalesRep};

#[derive(Default)]
struct Tables {
    reps: Vec<SalesRep>,
    sales: Vec<Sale>,
}

/// Vec-backed store mirroring the `PostgreSQL` semantics the handlers rely on.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> T {
        let mut tables = self
            .tables
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut tables)
    }

    /// Every sale regardless of the active flag.
    pub fn all_sales(&self) -> Vec<Sale> {
        self.with(|t| t.sales.clone())
    }

    /// A rep regardless of the active flag.
    pub fn any_sales_rep(&self, id: SalesRepId) -> Option<SalesRep> {
        self.with(|t| t.reps.iter().find(|r| r.id == id).cloned())
    }
}

#[async_trait]
impl SalesStore for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn list_sales_reps(&self) -> Result<Vec<SalesRep>, RepositoryError> {
        let mut reps: Vec<SalesRep> =
            self.with(|t| t.reps.iter().filter(|r| r.active).cloned().collect());
        reps.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reps)
    }

    async fn get_sales_rep(&self, id: SalesRepId) -> Result<Option<SalesRep>, RepositoryError> {
        Ok(self.with(|t| t.reps.iter().find(|r| r.id == id && r.active).cloned()))
    }

    async fn create_sales_rep(&self, rep: NewSalesRep) -> Result<SalesRep, RepositoryError> {
        self.with(|t| {
            if t.reps.iter().any(|r| r.active && r.email == rep.email) {
                return Err(RepositoryError::Conflict("email already exists".to_owned()));
            }
            let now = Utc::now();
            let created = SalesRep {
                id: SalesRepId::generate(),
                name: rep.name,
                email: rep.email,
                phone: rep.phone,
                password_hash: rep.password_hash,
                lockout: LoginLockout::default(),
                active: true,
                created_at: now,
                updated_at: now,
            };
            t.reps.push(created.clone());
            Ok(created)
        })
    }

    async fn record_failed_login(
        &self,
        id: SalesRepId,
        now: DateTime<Utc>,
    ) -> Result<FailureOutcome, RepositoryError> {
        self.with(|t| {
            let rep = t
                .reps
                .iter_mut()
                .find(|r| r.id == id && r.active)
                .ok_or(RepositoryError::NotFound)?;
            rep.updated_at = Utc::now();
            Ok(rep.lockout.register_failure(now))
        })
    }

    async fn clear_lockout(
        &self,
        id: SalesRepId,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        self.with(|t| {
            let rep = t.reps.iter_mut().find(|r| r.id == id && r.active);
            if let Some(rep) = rep.filter(|r| !r.lockout.is_locked(now)) {
                rep.lockout.register_success();
                rep.updated_at = Utc::now();
            }
        });
        Ok(())
    }

    async fn update_password_hash(
        &self,
        id: SalesRepId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        self.with(|t| {
            let rep = t
                .reps
                .iter_mut()
                .find(|r| r.id == id && r.active)
                .ok_or(RepositoryError::NotFound)?;
            password_hash.clone_into(&mut rep.password_hash);
            rep.updated_at = Utc::now();
            Ok(())
        })
    }

    async fn deactivate_sales_rep(&self, id: SalesRepId) -> Result<u64, RepositoryError> {
        self.with(|t| {
            let now = Utc::now();
            let rep = t
                .reps
                .iter_mut()
                .find(|r| r.id == id && r.active)
                .ok_or(RepositoryError::NotFound)?;
            rep.active = false;
            rep.updated_at = now;

            let mut deactivated = 0;
            for sale in t.sales.iter_mut().filter(|s| s.rep_id == id && s.active) {
                sale.active = false;
                sale.updated_at = now;
                deactivated += 1;
            }
            Ok(deactivated)
        })
    }

    async fn count_sales_reps(&self) -> Result<u64, RepositoryError> {
        Ok(self.with(|t| t.reps.iter().filter(|r| r.active).count() as u64))
    }

    async fn list_sales(&self, filter: SaleFilter) -> Result<Vec<Sale>, RepositoryError> {
        let mut sales: Vec<Sale> =
            self.with(|t| t.sales.iter().filter(|s| filter.matches(s)).cloned().collect());
        sales.sort_by(|a, b| b.sold_at.cmp(&a.sold_at));
        Ok(sales)
    }

    async fn get_sale(&self, id: SaleId) -> Result<Option<Sale>, RepositoryError> {
        Ok(self.with(|t| t.sales.iter().find(|s| s.id == id && s.active).cloned()))
    }

    async fn create_sale(
        &self,
        rep_id: SalesRepId,
        input: SaleInput,
    ) -> Result<Sale, RepositoryError> {
        let now = Utc::now();
        let sale = Sale {
            id: SaleId::generate(),
            rep_id,
            customer_name: input.customer_name,
            tax_id: input.tax_id,
            phone: input.phone,
            address: input.address,
            postal_code: input.postal_code,
            product: input.product,
            amount: input.amount,
            status: input.status,
            sold_at: input.sold_at,
            notes: input.notes,
            active: true,
            created_at: now,
            updated_at: now,
        };
        self.with(|t| t.sales.push(sale.clone()));
        Ok(sale)
    }

    async fn update_sale(&self, id: SaleId, input: SaleInput) -> Result<Sale, RepositoryError> {
        self.with(|t| {
            let sale = t
                .sales
                .iter_mut()
                .find(|s| s.id == id && s.active)
                .ok_or(RepositoryError::NotFound)?;
            sale.customer_name = input.customer_name;
            sale.tax_id = input.tax_id;
            sale.phone = input.phone;
            sale.address = input.address;
            sale.postal_code = input.postal_code;
            sale.product = input.product;
            sale.amount = input.amount;
            sale.status = input.status;
            sale.sold_at = input.sold_at;
            sale.notes = input.notes;
            sale.updated_at = Utc::now();
            Ok(sale.clone())
        })
    }

    async fn delete_sale(&self, id: SaleId) -> Result<(), RepositoryError> {
        self.with(|t| {
            let before = t.sales.len();
            t.sales.retain(|s| !(s.id == id && s.active));
            if t.sales.len() == before {
                return Err(RepositoryError::NotFound);
            }
            Ok(())
        })
    }

    async fn sales_stats(&self, filter: SaleFilter) -> Result<SalesStats, RepositoryError> {
        Ok(self.with(|t| {
            SalesStats::from_sales(
                t.sales
                    .iter()
                    .filter(|s| filter.matches(s))
                    .map(|s| (s.status, s.amount)),
            )
        }))
    }

    async fn count_reps_with_sales(&self, filter: SaleFilter) -> Result<u64, RepositoryError> {
        Ok(self.with(|t| {
            let mut reps: Vec<SalesRepId> = t
                .sales
                .iter()
                .filter(|s| filter.matches(s))
                .map(|s| s.rep_id)
                .collect();
            reps.sort_unstable();
            reps.dedup();
            reps.len() as u64
        }))
    }
}
