//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`; every error body is JSON with an `error` message.

use std::sync::OnceLock;

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::models::ValidationErrors;
use crate::services::auth::AuthError;
use crate::services::lookup::{LookupError, LookupService};

/// Whether 500 responses carry the underlying error text.
static EXPOSE_DETAILS: OnceLock<bool> = OnceLock::new();

/// Include error details in 500 responses. Call once at startup; development only.
pub fn set_expose_details(expose: bool) {
    let _ = EXPOSE_DETAILS.set(expose);
}

fn expose_details() -> bool {
    EXPOSE_DETAILS.get().copied().unwrap_or(false)
}

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// One or more request fields failed validation.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// External lookup failed.
    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),

    /// Resource not found. The message is shown to the client.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client. The message is shown to the client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection, "Rejected request body");
        Self::BadRequest("JSON inválido".to_owned())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!(error = %rejection, "Rejected query string");
        Self::BadRequest("Parâmetros de consulta inválidos".to_owned())
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    success: Option<bool>,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl ErrorBody {
    fn new(error: impl Into<String>) -> Self {
        Self {
            success: None,
            error: error.into(),
            details: None,
        }
    }

    /// Login-style body with `success: false`.
    fn auth(error: impl Into<String>) -> Self {
        Self {
            success: Some(false),
            ..Self::new(error)
        }
    }

    fn internal(error: impl Into<String>, cause: &AppError, expose: bool) -> Self {
        Self {
            details: expose.then(|| serde_json::Value::String(cause.to_string())),
            ..Self::new(error)
        }
    }
}

const INTERNAL_MESSAGE: &str = "Erro interno do servidor";
const INVALID_DATA_MESSAGE: &str = "Dados inválidos";

impl AppError {
    fn is_server_error(&self) -> bool {
        match self {
            Self::Database(err) => !matches!(
                err,
                RepositoryError::Conflict(_)
                    | RepositoryError::CheckViolation(_)
                    | RepositoryError::NotFound
            ),
            Self::Auth(err) => matches!(err, AuthError::Repository(_) | AuthError::PasswordHash),
            Self::Lookup(err) => matches!(err, LookupError::Upstream { .. }),
            Self::Validation(_) | Self::NotFound(_) | Self::BadRequest(_) => false,
        }
    }

    fn status_and_body(&self, expose: bool) -> (StatusCode, ErrorBody) {
        match self {
            Self::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    details: serde_json::to_value(errors.errors()).ok(),
                    ..ErrorBody::new(INVALID_DATA_MESSAGE)
                },
            ),
            Self::Database(err) => match err {
                RepositoryError::Conflict(_) => {
                    (StatusCode::CONFLICT, ErrorBody::new("Registro duplicado"))
                }
                RepositoryError::CheckViolation(_) => {
                    (StatusCode::BAD_REQUEST, ErrorBody::new(INVALID_DATA_MESSAGE))
                }
                RepositoryError::NotFound => (
                    StatusCode::NOT_FOUND,
                    ErrorBody::new("Registro não encontrado"),
                ),
                _ => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::internal(INTERNAL_MESSAGE, self, expose),
                ),
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => (
                    StatusCode::UNAUTHORIZED,
                    ErrorBody::auth("Credenciais inválidas"),
                ),
                AuthError::IncorrectPassword => {
                    (StatusCode::UNAUTHORIZED, ErrorBody::auth("Senha incorreta"))
                }
                AuthError::Locked { .. } => (
                    StatusCode::TOO_MANY_REQUESTS,
                    ErrorBody::auth(
                        "Conta temporariamente bloqueada devido a tentativas excessivas",
                    ),
                ),
                AuthError::LockedNow { .. } => (
                    StatusCode::TOO_MANY_REQUESTS,
                    ErrorBody::auth(format!(
                        "Conta bloqueada por {} minutos devido a tentativas excessivas",
                        gestao_vendas_core::LoginLockout::LOCK_MINUTES
                    )),
                ),
                AuthError::RepNotFound => (
                    StatusCode::NOT_FOUND,
                    ErrorBody::new("Vendedor não encontrado"),
                ),
                AuthError::EmailTaken => {
                    (StatusCode::CONFLICT, ErrorBody::new("Email já cadastrado"))
                }
                AuthError::Repository(_) | AuthError::PasswordHash => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::internal(INTERNAL_MESSAGE, self, expose),
                ),
            },
            Self::Lookup(err) => match err {
                LookupError::InvalidInput { service, expected } => (
                    StatusCode::BAD_REQUEST,
                    ErrorBody::new(format!(
                        "{} deve conter {expected} dígitos",
                        service.label()
                    )),
                ),
                LookupError::NotFound(message) => {
                    (StatusCode::NOT_FOUND, ErrorBody::new(message.clone()))
                }
                LookupError::Upstream { service, .. } => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::internal(upstream_message(*service), self, expose),
                ),
            },
            Self::NotFound(message) => (StatusCode::NOT_FOUND, ErrorBody::new(message.clone())),
            Self::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, ErrorBody::new(message.clone()))
            }
        }
    }
}

fn upstream_message(service: LookupService) -> String {
    format!("{INTERNAL_MESSAGE} ao consultar {}", service.label())
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let (status, body) = self.status_and_body(expose_details());
        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context to a sales rep.
///
/// Call after a successful login so later errors on the request carry the rep.
pub fn set_sentry_user(rep_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(rep_id.to_string()),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn body_json(err: &AppError, expose: bool) -> (StatusCode, serde_json::Value) {
        let (status, body) = err.status_and_body(expose);
        (status, serde_json::to_value(body).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("Venda não encontrada".to_string());
        assert_eq!(err.to_string(), "Not found: Venda não encontrada");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::Conflict("email".into()))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::CheckViolation("x".into()))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::Locked { until: Utc::now() })),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::EmailTaken)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::Database(
                sqlx::Error::PoolTimedOut
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_validation_body() {
        let err = AppError::Validation(ValidationErrors::single("email", "Email inválido"));
        let (status, json) = body_json(&err, false);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Dados inválidos");
        assert_eq!(json["details"][0]["campo"], "email");
        assert_eq!(json["details"][0]["mensagem"], "Email inválido");
        assert!(json.get("success").is_none());
    }

    #[test]
    fn test_credentials_body_is_generic() {
        let (status, json) = body_json(&AppError::Auth(AuthError::InvalidCredentials), false);
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Credenciais inválidas");
    }

    #[test]
    fn test_internal_details_only_when_exposed() {
        let err = AppError::Database(RepositoryError::Database(sqlx::Error::PoolTimedOut));

        let (_, hidden) = body_json(&err, false);
        assert_eq!(hidden["error"], "Erro interno do servidor");
        assert!(hidden.get("details").is_none());

        let (_, shown) = body_json(&err, true);
        assert!(
            shown["details"]
                .as_str()
                .unwrap()
                .starts_with("Database error: database error: pool timed out")
        );
    }

    #[test]
    fn test_query_rejection_is_json_bad_request() {
        let rejection = axum::extract::Query::<std::collections::HashMap<String, u8>>::try_from_uri(
            &"/api/vendas?mes=abc".parse::<axum::http::Uri>().unwrap(),
        )
        .unwrap_err();
        let (status, json) = body_json(&AppError::from(rejection), false);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Parâmetros de consulta inválidos");
    }

    #[test]
    fn test_lookup_messages() {
        let err = AppError::Lookup(LookupError::InvalidInput {
            service: LookupService::Cnpj,
            expected: 14,
        });
        let (status, json) = body_json(&err, false);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "CNPJ deve conter 14 dígitos");

        assert_eq!(
            upstream_message(LookupService::Cep),
            "Erro interno do servidor ao consultar CEP"
        );
    }
}
