//! Dashboard response bodies.

use serde::{Deserialize, Serialize};

use gestao_vendas_core::{MonthFilter, SalesStats};

/// Label used for `periodo` when no filter is applied.
pub const ALL_TIME: &str = "todos";

fn period_label(period: Option<&MonthFilter>) -> String {
    period.map_or_else(|| ALL_TIME.to_owned(), ToString::to_string)
}

/// `GET /api/dashboard/{vendedorId}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepDashboard {
    #[serde(flatten)]
    pub stats: SalesStats,
    #[serde(rename = "periodo")]
    pub period: String,
}

impl RepDashboard {
    #[must_use]
    pub fn new(stats: SalesStats, period: Option<&MonthFilter>) -> Self {
        Self {
            stats,
            period: period_label(period),
        }
    }
}

/// `GET /api/dashboard-geral`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralDashboard {
    #[serde(flatten)]
    pub stats: SalesStats,
    /// Active reps in the system.
    #[serde(rename = "totalVendedores")]
    pub total_reps: u64,
    /// Distinct reps with at least one sale in the period.
    #[serde(rename = "vendedoresAtivos")]
    pub reps_with_sales: u64,
    #[serde(rename = "periodo")]
    pub period: String,
}

impl GeneralDashboard {
    #[must_use]
    pub fn new(
        stats: SalesStats,
        total_reps: u64,
        reps_with_sales: u64,
        period: Option<&MonthFilter>,
    ) -> Self {
        Self {
            stats,
            total_reps,
            reps_with_sales,
            period: period_label(period),
        }
    }
}
