//! HTTP route handlers for the REST API.
//!
//! # Route Structure
//!
//! ```text
//! # Sales reps
//! GET    /api/vendedores                   - List active reps
//! POST   /api/vendedores                   - Create rep
//! POST   /api/vendedores/login             - Login (own rate limit)
//! DELETE /api/vendedores/{id}              - Deactivate rep (password required)
//!
//! # Sales
//! GET    /api/vendas?vendedorId=&mes=      - List sales
//! POST   /api/vendas                       - Create sale
//! GET    /api/vendas/{vendedorId}?mes=     - List a rep's sales
//! PUT    /api/vendas/{id}                  - Update sale
//! DELETE /api/vendas/{id}                  - Delete sale
//!
//! # Dashboards
//! GET    /api/dashboard/{vendedorId}?mes=  - Per-rep statistics
//! GET    /api/dashboard-geral?mes=         - Global statistics
//!
//! # Lookups
//! GET    /api/consulta-cnpj/{cnpj}         - Company registry
//! GET    /api/consulta-cep/{cep}           - Postal code
//! ```

pub mod dashboard;
pub mod lookup;
pub mod sales;
pub mod sales_reps;

#[cfg(test)]
pub(crate) mod test_support;

use axum::{
    Router,
    routing::{delete, get, post},
};
use serde::Deserialize;

use gestao_vendas_core::{MonthFilter, SalesRepId};

use crate::error::AppError;
use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::models::ValidationErrors;
use crate::state::AppState;

/// `?mes=` query parameter shared by listings and dashboards.
#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    #[serde(default)]
    pub mes: Option<String>,
}

/// Parse an optional `mes` value. Blank means no filter.
pub(crate) fn parse_period(raw: Option<&str>) -> Result<Option<MonthFilter>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => MonthFilter::parse(raw).map(Some).map_err(|e| {
            tracing::debug!(error = %e, mes = raw, "Rejected month filter");
            ValidationErrors::single("mes", "Mês deve estar no formato AAAA ou AAAA-MM").into()
        }),
    }
}

/// Parse a rep id from a path or query value.
pub(crate) fn parse_rep_id(raw: &str) -> Result<SalesRepId, AppError> {
    raw.parse::<SalesRepId>()
        .map_err(|_| ValidationErrors::single("vendedorId", "Vendedor inválido").into())
}

/// Create the sales rep routes router. The login route is added separately.
fn sales_rep_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/vendedores",
            get(sales_reps::list).post(sales_reps::create),
        )
        .route("/vendedores/{id}", delete(sales_reps::deactivate))
}

/// Create the login router.
fn login_routes() -> Router<AppState> {
    Router::new().route("/vendedores/login", post(sales_reps::login))
}

/// Create the sales routes router.
fn sale_routes() -> Router<AppState> {
    Router::new()
        .route("/vendas", get(sales::list).post(sales::create))
        .route(
            "/vendas/{id}",
            get(sales::list_for_rep)
                .put(sales::update)
                .delete(sales::delete),
        )
}

/// Create the dashboard and lookup routes router.
fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard/{id}", get(dashboard::rep))
        .route("/dashboard-geral", get(dashboard::general))
        .route("/consulta-cnpj/{cnpj}", get(lookup::cnpj))
        .route("/consulta-cep/{cep}", get(lookup::cep))
}

fn api_router(login: Router<AppState>) -> Router<AppState> {
    Router::new()
        .merge(sales_rep_routes())
        .merge(login)
        .merge(sale_routes())
        .merge(report_routes())
}

/// All API routes under `/api`, without rate limiting.
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/api", api_router(login_routes()))
}

/// All API routes under `/api`, rate limited per client IP.
///
/// `trust_proxy` makes the limiters key on reverse-proxy headers.
pub fn routes(trust_proxy: bool) -> Router<AppState> {
    let login = login_routes().layer(auth_rate_limiter(trust_proxy));
    Router::new().nest("/api", api_router(login).layer(api_rate_limiter(trust_proxy)))
}
