//! Helpers for driving the API router in handler tests.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header::CONTENT_TYPE},
};
use serde_json::Value;
use tower::ServiceExt;

use gestao_vendas_core::{Email, Phone};

use crate::config::LookupConfig;
use crate::db::SalesStore;
use crate::db::memory::MemoryStore;
use crate::models::{NewSalesRep, SalesRep};
use crate::state::AppState;

/// Password used for every seeded rep.
pub const PASSWORD: &str = "Vendas2024";

/// API router over a fresh in-memory store. Lookups point at a closed port.
pub fn test_app() -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let lookup = LookupConfig {
        cnpj_api_url: "http://127.0.0.1:1/cnpj".to_owned(),
        cep_api_url: "http://127.0.0.1:1/ws".to_owned(),
    };
    let state = AppState::new(store.clone(), &lookup).unwrap();
    (super::api_routes().with_state(state), store)
}

/// Insert a rep directly, with a cheap bcrypt hash of [`PASSWORD`].
pub async fn seed_rep(store: &MemoryStore, email: &str) -> SalesRep {
    store
        .create_sales_rep(NewSalesRep {
            name: "Vendedor Teste".to_owned(),
            email: Email::parse(email).unwrap(),
            phone: Phone::parse("11987654321").unwrap(),
            password_hash: bcrypt::hash(PASSWORD, 4).unwrap(),
        })
        .await
        .unwrap()
}

/// Send one request and decode the JSON reply (`Value::Null` for an empty body).
pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header(CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}
