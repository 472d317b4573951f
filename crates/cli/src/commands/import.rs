//! Legacy data import.
//!
//! Loads a JSON export of the old in-memory arrays into an empty database:
//!
//! ```json
//! { "vendedores": [{ "id": "...", "nome": "...", "email": "...",
//!                    "telefone": "...", "senha": "$2b$12$..." }],
//!   "vendas": [{ "id": "...", "vendedorId": "...", "nomeCompleto": "...",
//!                "planoNegociado": "...", "valor": 99.9 }] }
//! ```
//!
//! The whole export is validated before anything is written. Nothing is
//! imported when the database already holds reps or sales. Password hashes
//! are copied as-is; bcrypt hashes are upgraded on the rep's next login.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Deserialize;

use gestao_vendas_core::{Email, LoginLockout, Phone, SaleId, SalesRepId};
use gestao_vendas_server::db::{self, RepositoryError, SaleRepository, SalesRepRepository};
use gestao_vendas_server::models::sales_rep::{MAX_NAME_LENGTH, MIN_NAME_LENGTH};
use gestao_vendas_server::models::{Sale, SaleRequest, SalesRep, ValidationErrors};

use super::{MissingDatabaseUrl, database_url};

/// Errors from the legacy import.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error(transparent)]
    Config(#[from] MissingDatabaseUrl),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid export file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid {kind} {id}: {reason}")]
    InvalidRecord {
        kind: &'static str,
        id: String,
        reason: String,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Outcome of an import run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    /// Reps imported, or already present when nothing was imported.
    pub sales_reps: u64,
    /// Sales imported, or already present when nothing was imported.
    pub sales: u64,
    /// Whether any rows were written.
    pub imported: bool,
}

/// Top-level shape of the export file.
#[derive(Debug, Default, Deserialize)]
pub struct LegacyExport {
    #[serde(default)]
    pub vendedores: Vec<LegacySalesRep>,
    #[serde(default)]
    pub vendas: Vec<LegacySale>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacySalesRep {
    pub id: String,
    pub nome: String,
    pub email: String,
    pub telefone: String,
    /// Password hash, never plaintext.
    pub senha: String,
    #[serde(default)]
    pub data_inclusao: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tentativas_login: u32,
    #[serde(default = "active_default")]
    pub ativo: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacySale {
    pub id: String,
    #[serde(flatten)]
    pub fields: SaleRequest,
    #[serde(default = "active_default")]
    pub ativo: bool,
    #[serde(default)]
    pub data_criacao: Option<DateTime<Utc>>,
}

const fn active_default() -> bool {
    true
}

/// Records ready to insert.
#[derive(Debug)]
pub struct PreparedImport {
    pub sales_reps: Vec<SalesRep>,
    pub sales: Vec<Sale>,
}

/// Read, validate and (unless `dry_run`) import an export file.
pub async fn run(path: &Path, dry_run: bool) -> Result<ImportSummary, ImportError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let export: LegacyExport = serde_json::from_str(&raw)?;
    let prepared = prepare(export, Utc::now())?;

    let to_import = ImportSummary {
        sales_reps: prepared.sales_reps.len() as u64,
        sales: prepared.sales.len() as u64,
        imported: false,
    };
    if dry_run {
        tracing::info!(
            vendedores = to_import.sales_reps,
            vendas = to_import.sales,
            "Dry run: export is valid, nothing written"
        );
        return Ok(to_import);
    }

    let pool = db::create_pool(&database_url()?).await?;
    let reps = SalesRepRepository::new(&pool);
    let sales = SaleRepository::new(&pool);

    let existing_reps = reps.count_all().await?;
    let existing_sales = sales.count_all().await?;
    if existing_reps > 0 || existing_sales > 0 {
        tracing::info!(
            vendedores = existing_reps,
            vendas = existing_sales,
            "Database already has data, skipping import"
        );
        return Ok(ImportSummary {
            sales_reps: existing_reps,
            sales: existing_sales,
            imported: false,
        });
    }

    for rep in &prepared.sales_reps {
        reps.insert_existing(rep).await?;
    }
    tracing::info!(count = prepared.sales_reps.len(), "Sales reps imported");

    for sale in &prepared.sales {
        sales.insert_existing(sale).await?;
    }
    tracing::info!(count = prepared.sales.len(), "Sales imported");

    Ok(ImportSummary {
        imported: true,
        ..to_import
    })
}

/// Validate every record and convert it to its domain type.
///
/// Fails on the first bad record so a partial export is never written.
pub fn prepare(export: LegacyExport, now: DateTime<Utc>) -> Result<PreparedImport, ImportError> {
    let mut active_emails = HashSet::new();
    let mut rep_active: HashMap<SalesRepId, bool> = HashMap::new();
    let mut sales_reps = Vec::with_capacity(export.vendedores.len());

    for legacy in export.vendedores {
        let rep = convert_rep(legacy, now)?;
        if rep_active.insert(rep.id, rep.active).is_some() {
            return Err(invalid("vendedor", &rep.id.to_string(), "duplicate id"));
        }
        if rep.active && !active_emails.insert(rep.email.clone()) {
            return Err(invalid("vendedor", &rep.id.to_string(), "duplicate email"));
        }
        sales_reps.push(rep);
    }

    let mut sale_ids = HashSet::new();
    let mut sales = Vec::with_capacity(export.vendas.len());

    for legacy in export.vendas {
        let sale = convert_sale(legacy, now)?;
        let Some(&owner_active) = rep_active.get(&sale.rep_id) else {
            return Err(invalid(
                "venda",
                &sale.id.to_string(),
                &format!("unknown vendedor {}", sale.rep_id),
            ));
        };
        if !sale_ids.insert(sale.id) {
            return Err(invalid("venda", &sale.id.to_string(), "duplicate id"));
        }
        // Sales of a deactivated rep stay hidden.
        sales.push(Sale {
            active: sale.active && owner_active,
            ..sale
        });
    }

    Ok(PreparedImport { sales_reps, sales })
}

fn convert_rep(legacy: LegacySalesRep, now: DateTime<Utc>) -> Result<SalesRep, ImportError> {
    let id_label = legacy.id.clone();
    let id = legacy
        .id
        .parse::<SalesRepId>()
        .map_err(|e| invalid("vendedor", &id_label, &format!("invalid id: {e}")))?;

    let name = legacy.nome.trim();
    if !(MIN_NAME_LENGTH..=MAX_NAME_LENGTH).contains(&name.chars().count()) {
        return Err(invalid("vendedor", &id_label, "invalid nome"));
    }
    let email = Email::parse(&legacy.email)
        .map_err(|e| invalid("vendedor", &id_label, &format!("invalid email: {e}")))?;
    let phone = Phone::parse(&legacy.telefone)
        .map_err(|e| invalid("vendedor", &id_label, &format!("invalid telefone: {e}")))?;
    if !is_password_hash(&legacy.senha) {
        return Err(invalid("vendedor", &id_label, "senha is not a bcrypt or argon2 hash"));
    }

    let created_at = legacy.data_inclusao.unwrap_or(now);
    Ok(SalesRep {
        id,
        name: name.to_owned(),
        email,
        phone,
        password_hash: legacy.senha,
        lockout: LoginLockout {
            failed_attempts: legacy
                .tentativas_login
                .min(LoginLockout::MAX_FAILED_ATTEMPTS - 1),
            locked_until: None,
        },
        active: legacy.ativo,
        created_at,
        updated_at: created_at,
    })
}

fn convert_sale(legacy: LegacySale, now: DateTime<Utc>) -> Result<Sale, ImportError> {
    let id_label = legacy.id.clone();
    let id = legacy
        .id
        .parse::<SaleId>()
        .map_err(|e| invalid("venda", &id_label, &format!("invalid id: {e}")))?;

    let (rep_id, input) = legacy
        .fields
        .validate_new(now)
        .map_err(|errors| invalid("venda", &id_label, &describe(&errors)))?;

    let created_at = legacy.data_criacao.unwrap_or(input.sold_at);
    Ok(Sale {
        id,
        rep_id,
        customer_name: input.customer_name,
        tax_id: input.tax_id,
        phone: input.phone,
        address: input.address,
        postal_code: input.postal_code,
        product: input.product,
        amount: input.amount,
        status: input.status,
        sold_at: input.sold_at,
        notes: input.notes,
        active: legacy.ativo,
        created_at,
        updated_at: created_at,
    })
}

fn is_password_hash(value: &str) -> bool {
    value.starts_with("$2") || value.starts_with("$argon2")
}

fn describe(errors: &ValidationErrors) -> String {
    errors
        .errors()
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

fn invalid(kind: &'static str, id: &str, reason: &str) -> ImportError {
    ImportError::InvalidRecord {
        kind,
        id: id.to_owned(),
        reason: reason.to_owned(),
    }
}
