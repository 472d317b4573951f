//! Sale route handlers.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

use gestao_vendas_core::SaleId;

use super::{PeriodQuery, parse_period, parse_rep_id};
use crate::db::{RepositoryError, SaleFilter};
use crate::error::{AppError, Result};
use crate::models::{Sale, SaleRequest};
use crate::state::AppState;

const SALE_NOT_FOUND: &str = "Venda não encontrada";

/// `GET /api/vendas` query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct SalesQuery {
    #[serde(default, rename = "vendedorId")]
    pub vendedor_id: Option<String>,
    #[serde(default)]
    pub mes: Option<String>,
}

fn sale_not_found() -> AppError {
    AppError::NotFound(SALE_NOT_FOUND.to_owned())
}

fn parse_sale_id(raw: &str) -> Result<SaleId> {
    raw.parse::<SaleId>().map_err(|_| sale_not_found())
}

/// List active sales, optionally for one rep and/or period.
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    query: std::result::Result<Query<SalesQuery>, QueryRejection>,
) -> Result<Json<Vec<Sale>>> {
    let Query(query) = query?;
    let rep_id = match query.vendedor_id.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(parse_rep_id(raw)?),
    };
    let period = parse_period(query.mes.as_deref())?;

    let sales = state
        .store()
        .list_sales(SaleFilter::new(rep_id, period))
        .await?;
    Ok(Json(sales))
}

/// List one rep's active sales.
#[instrument(skip(state))]
pub async fn list_for_rep(
    State(state): State<AppState>,
    Path(rep_id): Path<String>,
    query: std::result::Result<Query<PeriodQuery>, QueryRejection>,
) -> Result<Json<Vec<Sale>>> {
    let Query(query) = query?;
    let rep_id = parse_rep_id(&rep_id)?;
    let period = parse_period(query.mes.as_deref())?;

    let sales = state
        .store()
        .list_sales(SaleFilter::new(Some(rep_id), period))
        .await?;
    Ok(Json(sales))
}

/// Create a sale for an active rep.
#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SaleRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Sale>)> {
    let Json(request) = payload?;
    let (rep_id, input) = request.validate_new(Utc::now())?;

    if state.store().get_sales_rep(rep_id).await?.is_none() {
        return Err(AppError::NotFound("Vendedor não encontrado".to_owned()));
    }

    let sale = state.store().create_sale(rep_id, input).await?;
    tracing::info!(sale_id = %sale.id, %rep_id, "Sale created");
    Ok((StatusCode::CREATED, Json(sale)))
}

/// Replace the editable fields of a sale.
#[instrument(skip(state, payload))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<SaleRequest>, JsonRejection>,
) -> Result<Json<Sale>> {
    let id = parse_sale_id(&id)?;
    let Json(request) = payload?;
    let input = request.validate_update(Utc::now())?;

    let sale = state
        .store()
        .update_sale(id, input)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => sale_not_found(),
            other => other.into(),
        })?;
    Ok(Json(sale))
}

/// Permanently delete a sale.
#[instrument(skip(state))]
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode> {
    let id = parse_sale_id(&id)?;

    state.store().delete_sale(id).await.map_err(|e| match e {
        RepositoryError::NotFound => sale_not_found(),
        other => other.into(),
    })?;

    tracing::info!(sale_id = %id, "Sale deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::Method;
    use serde_json::{Value, json};

    use gestao_vendas_core::SalesRepId;

    use crate::routes::test_support::{seed_rep, send, test_app};

    fn sale_body(rep_id: SalesRepId, valor: Value, data: &str) -> Value {
        json!({
            "vendedorId": rep_id,
            "nomeCompleto": "João da Silva",
            "contato": "(11) 91234-5678",
            "planoNegociado": "Fibra 500MB",
            "valor": valor,
            "dataVenda": data,
        })
    }

    #[tokio::test]
    async fn test_create_rounds_amount() {
        let (app, store) = test_app();
        let rep = seed_rep(&store, "ana@empresa.com").await;

        for (input, expected) in [
            (json!(99.999), 100.0),
            (json!(10.005), 10.01),
            (json!("79,90"), 79.9),
            (json!(0), 0.0),
        ] {
            let (status, sale) = send(
                &app,
                Method::POST,
                "/api/vendas",
                Some(sale_body(rep.id, input, "2024-03-10")),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
            assert_eq!(sale["valor"].as_f64().unwrap(), expected);
            assert_eq!(sale["status"], "pendente");
            assert_eq!(sale["cliente"], "João da Silva");
        }
    }

    #[tokio::test]
    async fn test_create_rejects_amount_past_column_range() {
        let (app, store) = test_app();
        let rep = seed_rep(&store, "ana@empresa.com").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/vendas",
            Some(sale_body(rep.id, json!(1e13), "2024-03-10")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"][0]["campo"], "valor");
        assert!(store.all_sales().is_empty());

        let (status, sale) = send(
            &app,
            Method::POST,
            "/api/vendas",
            Some(sale_body(rep.id, json!("999999999999.99"), "2024-03-10")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(sale["valor"].as_f64().unwrap(), 999_999_999_999.99);
    }

    #[tokio::test]
    async fn test_create_requires_existing_rep() {
        let (app, _) = test_app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/vendas",
            Some(sale_body(SalesRepId::generate(), json!(10), "2024-03-10")),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Vendedor não encontrado");
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_fields() {
        let (app, store) = test_app();
        let rep = seed_rep(&store, "ana@empresa.com").await;

        let mut body = sale_body(rep.id, json!(-1), "2999-01-01");
        body["status"] = json!("vendido");
        let (status, body) = send(&app, Method::POST, "/api/vendas", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let fields: Vec<&str> = body["details"]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["campo"].as_str().unwrap())
            .collect();
        assert_eq!(fields.len(), 3);
        for field in ["valor", "status", "dataVenda"] {
            assert!(fields.contains(&field), "missing {field}");
        }
    }

    #[tokio::test]
    async fn test_month_filter_boundaries() {
        let (app, store) = test_app();
        let rep = seed_rep(&store, "ana@empresa.com").await;

        for data in ["2024-02-29T23:59:59Z", "2024-03-01", "2024-03-31T23:59:59Z", "2024-04-01"] {
            let (status, _) = send(
                &app,
                Method::POST,
                "/api/vendas",
                Some(sale_body(rep.id, json!(50), data)),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, march) = send(&app, Method::GET, "/api/vendas?mes=2024-03", None).await;
        assert_eq!(status, StatusCode::OK);
        let dates: Vec<&str> = march
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["dataVenda"].as_str().unwrap())
            .collect();
        assert_eq!(dates.len(), 2);
        assert!(dates[0].starts_with("2024-03-31"));
        assert!(dates[1].starts_with("2024-03-01"));

        let (_, year) = send(&app, Method::GET, "/api/vendas?mes=2024", None).await;
        assert_eq!(year.as_array().unwrap().len(), 4);

        let uri = format!("/api/vendas/{}?mes=2024-04", rep.id);
        let (_, april) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(april.as_array().unwrap().len(), 1);

        let (status, body) = send(&app, Method::GET, "/api/vendas?mes=2024-13", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"][0]["campo"], "mes");
    }

    #[tokio::test]
    async fn test_list_rejects_malformed_query() {
        let (app, _) = test_app();
        let (status, body) =
            send(&app, Method::GET, "/api/vendas?mes=2024&mes=2025", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Parâmetros de consulta inválidos");
    }

    #[tokio::test]
    async fn test_list_filters_by_rep() {
        let (app, store) = test_app();
        let ana = seed_rep(&store, "ana@empresa.com").await;
        let bia = seed_rep(&store, "bia@empresa.com").await;

        for rep in [ana.id, bia.id, bia.id] {
            send(
                &app,
                Method::POST,
                "/api/vendas",
                Some(sale_body(rep, json!(10), "2024-01-15")),
            )
            .await;
        }

        let (_, all) = send(&app, Method::GET, "/api/vendas", None).await;
        assert_eq!(all.as_array().unwrap().len(), 3);

        let uri = format!("/api/vendas?vendedorId={}", bia.id);
        let (_, mine) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(mine.as_array().unwrap().len(), 2);

        let (status, _) = send(&app, Method::GET, "/api/vendas?vendedorId=abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let (app, store) = test_app();
        let rep = seed_rep(&store, "ana@empresa.com").await;
        let (_, sale) = send(
            &app,
            Method::POST,
            "/api/vendas",
            Some(sale_body(rep.id, json!(10), "2024-01-15")),
        )
        .await;
        let uri = format!("/api/vendas/{}", sale["id"].as_str().unwrap());

        let (status, updated) = send(
            &app,
            Method::PUT,
            &uri,
            Some(json!({
                "cliente": "Maria",
                "produto": "Fibra 1GB",
                "valor": "149.90",
                "status": "instalado",
                "dataVenda": "2024-01-20",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["cliente"], "Maria");
        assert_eq!(updated["status"], "instalado");
        assert_eq!(updated["valor"].as_f64().unwrap(), 149.9);
        assert_eq!(updated["vendedorId"], json!(rep.id));
        assert!(updated["telefone"].is_null());

        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(store.all_sales().is_empty());

        let (status, body) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Venda não encontrada");

        let (status, _) = send(
            &app,
            Method::PUT,
            &uri,
            Some(json!({ "cliente": "A", "produto": "B", "valor": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
