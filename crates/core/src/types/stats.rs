//! Sales statistics block shown on the dashboards.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::amount::Amount;
use super::status::SaleStatus;

/// Sale counts per status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusCounts {
    /// `pendente` sales.
    pub pending: u64,
    /// `andamento` sales.
    pub in_progress: u64,
    /// `instalado` sales.
    pub installed: u64,
    /// `cancelado` sales.
    pub cancelled: u64,
}

impl StatusCounts {
    /// Count one more sale with `status`.
    pub const fn record(&mut self, status: SaleStatus) {
        match status {
            SaleStatus::Pendente => self.pending += 1,
            SaleStatus::Andamento => self.in_progress += 1,
            SaleStatus::Instalado => self.installed += 1,
            SaleStatus::Cancelado => self.cancelled += 1,
        }
    }

    /// Sum across all statuses.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.pending + self.in_progress + self.installed + self.cancelled
    }
}

/// Aggregate figures over a set of sales.
///
/// `total_sales` is always the sum of the per-status counts, and
/// `average_ticket` is zero when there are no sales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SalesStats {
    /// Number of sales.
    #[serde(rename = "totalVendas")]
    pub total_sales: u64,
    /// Sum of sale amounts.
    #[serde(rename = "valorTotal", with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    /// Mean sale amount, two decimal places.
    #[serde(rename = "ticketMedio", with = "rust_decimal::serde::float")]
    pub average_ticket: Decimal,
    /// Pending sales.
    #[serde(rename = "pendentes")]
    pub pending: u64,
    /// In-progress sales.
    #[serde(rename = "andamento")]
    pub in_progress: u64,
    /// Installed sales.
    #[serde(rename = "conectados")]
    pub installed: u64,
    /// Cancelled sales.
    #[serde(rename = "cancelados")]
    pub cancelled: u64,
}

impl SalesStats {
    /// Build the block from per-status counts and the amount sum, as
    /// returned by an aggregate query.
    #[must_use]
    pub fn from_parts(counts: StatusCounts, total_amount: Decimal) -> Self {
        let total_sales = counts.total();
        let average_ticket = if total_sales == 0 {
            Decimal::ZERO
        } else {
            (total_amount / Decimal::from(total_sales))
                .round_dp_with_strategy(Amount::SCALE, RoundingStrategy::MidpointAwayFromZero)
        };

        Self {
            total_sales,
            total_amount,
            average_ticket,
            pending: counts.pending,
            in_progress: counts.in_progress,
            installed: counts.installed,
            cancelled: counts.cancelled,
        }
    }

    /// Aggregate an iterator of `(status, amount)` pairs.
    pub fn from_sales<I>(sales: I) -> Self
    where
        I: IntoIterator<Item = (SaleStatus, Amount)>,
    {
        let mut counts = StatusCounts::default();
        let mut total = Decimal::ZERO;
        for (status, amount) in sales {
            counts.record(status);
            total += amount.value();
        }
        Self::from_parts(counts, total)
    }
}
