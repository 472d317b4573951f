//! Dashboard route handlers.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
};
use tracing::instrument;

use super::{PeriodQuery, parse_period, parse_rep_id};
use crate::db::SaleFilter;
use crate::error::Result;
use crate::models::{GeneralDashboard, RepDashboard};
use crate::state::AppState;

/// Statistics for one rep's active sales.
#[instrument(skip(state))]
pub async fn rep(
    State(state): State<AppState>,
    Path(rep_id): Path<String>,
    query: std::result::Result<Query<PeriodQuery>, QueryRejection>,
) -> Result<Json<RepDashboard>> {
    let Query(query) = query?;
    let rep_id = parse_rep_id(&rep_id)?;
    let period = parse_period(query.mes.as_deref())?;

    let stats = state
        .store()
        .sales_stats(SaleFilter::new(Some(rep_id), period))
        .await?;
    Ok(Json(RepDashboard::new(stats, period.as_ref())))
}

/// Statistics across every active sale, plus rep counts.
#[instrument(skip(state))]
pub async fn general(
    State(state): State<AppState>,
    query: std::result::Result<Query<PeriodQuery>, QueryRejection>,
) -> Result<Json<GeneralDashboard>> {
    let Query(query) = query?;
    let period = parse_period(query.mes.as_deref())?;
    let filter = SaleFilter::new(None, period);
    let store = state.store();

    let stats = store.sales_stats(filter).await?;
    let total_reps = store.count_sales_reps().await?;
    let reps_with_sales = store.count_reps_with_sales(filter).await?;

    Ok(Json(GeneralDashboard::new(
        stats,
        total_reps,
        reps_with_sales,
        period.as_ref(),
    )))
}
