//! CLI subcommands.

pub mod import;
pub mod migrate;

use secrecy::SecretString;

/// Error raised when no database URL is configured.
#[derive(Debug, thiserror::Error)]
#[error("Missing environment variable: GESTAO_DATABASE_URL (or DATABASE_URL)")]
pub struct MissingDatabaseUrl;

/// Database URL from the environment, after loading `.env`.
pub fn database_url() -> Result<SecretString, MissingDatabaseUrl> {
    let _ = dotenvy::dotenv();

    std::env::var("GESTAO_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| MissingDatabaseUrl)
}
