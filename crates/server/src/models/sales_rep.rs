//! Sales rep domain types and request bodies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gestao_vendas_core::{
    Email, EmailError, LoginLockout, PasswordPolicyError, Phone, PhoneError, SalesRepId,
    validate_password_strength,
};

use super::validation::ValidationErrors;

/// Minimum rep name length, in characters.
pub const MIN_NAME_LENGTH: usize = 2;
/// Maximum rep name length, in characters.
pub const MAX_NAME_LENGTH: usize = 100;

/// A sales rep account (domain type).
///
/// Holds the password hash; never serialize this directly, use
/// [`SalesRepResponse`].
#[derive(Debug, Clone)]
pub struct SalesRep {
    /// Unique rep ID.
    pub id: SalesRepId,
    /// Display name.
    pub name: String,
    /// Login email, lowercase.
    pub email: Email,
    /// Contact phone.
    pub phone: Phone,
    /// Argon2 PHC string, or a bcrypt hash carried over from the legacy system.
    pub password_hash: String,
    /// Failed-login bookkeeping.
    pub lockout: LoginLockout,
    /// False once the rep has been deactivated.
    pub active: bool,
    /// When the rep was created.
    pub created_at: DateTime<Utc>,
    /// When the rep was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Validated fields for inserting a rep.
#[derive(Debug, Clone)]
pub struct NewSalesRep {
    pub name: String,
    pub email: Email,
    pub phone: Phone,
    pub password_hash: String,
}

/// Public view of a rep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesRepResponse {
    pub id: SalesRepId,
    #[serde(rename = "nome")]
    pub name: String,
    pub email: String,
    #[serde(rename = "telefone")]
    pub phone: String,
    #[serde(rename = "tentativasLogin")]
    pub failed_login_attempts: u32,
    #[serde(rename = "bloqueadoAte")]
    pub locked_until: Option<DateTime<Utc>>,
    #[serde(rename = "ativo")]
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&SalesRep> for SalesRepResponse {
    fn from(rep: &SalesRep) -> Self {
        Self {
            id: rep.id,
            name: rep.name.clone(),
            email: rep.email.to_string(),
            phone: rep.phone.to_string(),
            failed_login_attempts: rep.lockout.failed_attempts,
            locked_until: rep.lockout.locked_until,
            active: rep.active,
            created_at: rep.created_at,
            updated_at: rep.updated_at,
        }
    }
}

/// Body of `POST /api/vendedores`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateSalesRepRequest {
    #[serde(default)]
    pub nome: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub telefone: Option<String>,
    #[serde(default)]
    pub senha: Option<String>,
}

/// A create request that passed validation. The password is still plaintext.
#[derive(Debug)]
pub struct ValidSalesRep {
    pub name: String,
    pub email: Email,
    pub phone: Phone,
    pub password: String,
}

impl CreateSalesRepRequest {
    /// Validate every field, collecting all failures.
    ///
    /// # Errors
    ///
    /// Returns the field errors if any field is missing or malformed.
    pub fn validate(self) -> Result<ValidSalesRep, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = self.nome.as_deref().map(str::trim).unwrap_or_default();
        let name_len = name.chars().count();
        if name.is_empty() {
            errors.push("nome", "Nome é obrigatório");
        } else if !(MIN_NAME_LENGTH..=MAX_NAME_LENGTH).contains(&name_len) {
            errors.push(
                "nome",
                format!("Nome deve ter entre {MIN_NAME_LENGTH} e {MAX_NAME_LENGTH} caracteres"),
            );
        }

        let email = match Email::parse(self.email.as_deref().unwrap_or_default()) {
            Ok(email) => Some(email),
            Err(EmailError::Empty) => {
                errors.push("email", "Email é obrigatório");
                None
            }
            Err(_) => {
                errors.push("email", "Email inválido");
                None
            }
        };

        let phone = match Phone::parse(self.telefone.as_deref().unwrap_or_default()) {
            Ok(phone) => Some(phone),
            Err(PhoneError::Empty) => {
                errors.push("telefone", "Telefone é obrigatório");
                None
            }
            Err(PhoneError::TooLong { max }) => {
                errors.push("telefone", format!("Telefone deve ter no máximo {max} caracteres"));
                None
            }
            Err(PhoneError::InvalidFormat) => {
                errors.push("telefone", "Telefone deve ser um celular brasileiro válido");
                None
            }
        };

        let password = self.senha.unwrap_or_default();
        match validate_password_strength(&password) {
            Ok(()) => {}
            Err(PasswordPolicyError::Length) => errors.push(
                "senha",
                format!(
                    "Senha deve ter entre {} e {} caracteres",
                    gestao_vendas_core::MIN_PASSWORD_LENGTH,
                    gestao_vendas_core::MAX_PASSWORD_LENGTH
                ),
            ),
            Err(PasswordPolicyError::Composition) => errors.push(
                "senha",
                "Senha deve conter pelo menos uma letra minúscula, uma maiúscula e um número",
            ),
        }

        match (email, phone) {
            (Some(email), Some(phone)) if errors.is_empty() => Ok(ValidSalesRep {
                name: name.to_owned(),
                email,
                phone,
                password,
            }),
            _ => Err(errors),
        }
    }
}

/// Body of `POST /api/vendedores/login`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub vendedor_id: Option<String>,
    #[serde(default)]
    pub senha: Option<String>,
}

/// Body of `DELETE /api/vendedores/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfirmPasswordRequest {
    #[serde(default)]
    pub senha: Option<String>,
}

/// Successful login reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    #[serde(rename = "vendedor")]
    pub sales_rep: SalesRepResponse,
}
