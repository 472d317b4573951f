//! Sales rep route handlers.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::Utc;
use tracing::instrument;

use gestao_vendas_core::SalesRepId;

use crate::error::{AppError, Result, set_sentry_user};
use crate::models::{
    ConfirmPasswordRequest, CreateSalesRepRequest, LoginRequest, LoginResponse, SalesRepResponse,
    ValidationErrors,
};
use crate::services::AuthError;
use crate::state::AppState;

/// List active reps, newest first.
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<SalesRepResponse>>> {
    let reps = state.store().list_sales_reps().await?;
    Ok(Json(reps.iter().map(SalesRepResponse::from).collect()))
}

/// Create a rep.
#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateSalesRepRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SalesRepResponse>)> {
    let Json(request) = payload?;
    let valid = request.validate()?;
    let rep = state.auth().register(valid).await?;
    Ok((StatusCode::CREATED, Json(SalesRepResponse::from(&rep))))
}

/// Log a rep in with id and password.
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>> {
    let Json(request) = payload?;

    let mut errors = ValidationErrors::new();
    let rep_id = request.vendedor_id.as_deref().map(str::trim).unwrap_or_default();
    if rep_id.is_empty() {
        errors.push("vendedorId", "Vendedor é obrigatório");
    }
    let password = request.senha.unwrap_or_default();
    if password.is_empty() {
        errors.push("senha", "Senha é obrigatória");
    }
    if !errors.is_empty() {
        return Err(errors.into());
    }

    // A malformed id is just an unknown rep.
    let rep_id = rep_id
        .parse::<SalesRepId>()
        .map_err(|_| AuthError::InvalidCredentials)?;

    let rep = state.auth().login(rep_id, &password, Utc::now()).await?;
    set_sentry_user(&rep.id);

    Ok(Json(LoginResponse {
        success: true,
        message: "Login realizado com sucesso".to_owned(),
        sales_rep: SalesRepResponse::from(&rep),
    }))
}

/// Deactivate a rep and its sales, after re-checking the rep's password.
#[instrument(skip(state, payload))]
pub async fn deactivate(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<ConfirmPasswordRequest>, JsonRejection>,
) -> Result<StatusCode> {
    let rep_id = id
        .parse::<SalesRepId>()
        .map_err(|_| AuthError::RepNotFound)?;

    let Json(request) = payload?;
    let password = request.senha.unwrap_or_default();
    if password.is_empty() {
        return Err(ValidationErrors::single("senha", "Senha é obrigatória").into());
    }

    state
        .auth()
        .confirm_password(rep_id, &password, Utc::now())
        .await?;

    let sales = state
        .store()
        .deactivate_sales_rep(rep_id)
        .await
        .map_err(|e| match e {
            crate::db::RepositoryError::NotFound => AppError::from(AuthError::RepNotFound),
            other => other.into(),
        })?;

    tracing::info!(%rep_id, sales, "Sales rep deactivated");
    Ok(StatusCode::NO_CONTENT)
}
