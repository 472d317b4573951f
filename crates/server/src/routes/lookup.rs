//! CNPJ and CEP lookup route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use crate::error::Result;
use crate::services::lookup::{CepInfo, CnpjInfo};
use crate::state::AppState;

/// Look up a company by CNPJ.
#[instrument(skip(state))]
pub async fn cnpj(State(state): State<AppState>, Path(cnpj): Path<String>) -> Result<Json<CnpjInfo>> {
    Ok(Json(state.lookup().cnpj(&cnpj).await?))
}

/// Look up an address by CEP.
#[instrument(skip(state))]
pub async fn cep(State(state): State<AppState>, Path(cep): Path<String>) -> Result<Json<CepInfo>> {
    Ok(Json(state.lookup().cep(&cep).await?))
}
