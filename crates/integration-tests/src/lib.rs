//! Integration tests for Gestão de Vendas.
//!
//! # Running Tests
//!
//! ```bash
//! # Migrate and start the server against a scratch database
//! cargo run -p gestao-vendas-cli -- migrate
//! cargo run -p gestao-vendas-server
//!
//! # Run the ignored tests against it
//! GESTAO_BASE_URL=http://localhost:3000 cargo test -p gestao-vendas-integration-tests -- --ignored
//! ```
//!
//! The server rate-limits `/api` per client IP, so run the suite against a
//! freshly started server.

#![allow(clippy::expect_used, clippy::missing_panics_doc)]

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

/// Password used for every rep the tests create.
pub const PASSWORD: &str = "Vendas2024";

/// Base URL of the server under test (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("GESTAO_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// HTTP client for the tests.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .build()
        .expect("Failed to create HTTP client")
}

/// An email no other test run has used.
#[must_use]
pub fn unique_email() -> String {
    format!("teste-{}@example.com", uuid::Uuid::new_v4().simple())
}

/// Create a rep through the API and return its JSON.
pub async fn create_rep(client: &Client, email: &str) -> Value {
    let resp = client
        .post(format!("{}/api/vendedores", base_url()))
        .json(&json!({
            "nome": "Vendedor Integração",
            "email": email,
            "telefone": "(11) 98765-4321",
            "senha": PASSWORD,
        }))
        .send()
        .await
        .expect("Failed to create rep");

    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json().await.expect("Failed to decode rep")
}

/// Create a sale through the API and return its JSON.
pub async fn create_sale(client: &Client, rep_id: &Value, valor: Value, data: &str) -> Value {
    let resp = client
        .post(format!("{}/api/vendas", base_url()))
        .json(&json!({
            "vendedorId": rep_id,
            "nomeCompleto": "Cliente Integração",
            "contato": "(11) 91234-5678",
            "planoNegociado": "Fibra 500MB",
            "valor": valor,
            "dataVenda": data,
        }))
        .send()
        .await
        .expect("Failed to create sale");

    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json().await.expect("Failed to decode sale")
}

/// Deactivate a rep so repeated runs leave no active test data behind.
pub async fn deactivate_rep(client: &Client, rep_id: &Value) {
    let id = rep_id.as_str().expect("rep id is a string");
    let _ = client
        .delete(format!("{}/api/vendedores/{id}", base_url()))
        .json(&json!({ "senha": PASSWORD }))
        .send()
        .await;
}
