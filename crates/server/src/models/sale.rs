//! Sale domain types and request bodies.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use gestao_vendas_core::{Amount, AmountError, SaleId, SaleStatus, SalesRepId};

use super::validation::{ValidationErrors, optional_text, required_text};

pub const MAX_CUSTOMER_NAME_LENGTH: usize = 100;
pub const MAX_TAX_ID_LENGTH: usize = 18;
pub const MAX_PHONE_LENGTH: usize = 20;
pub const MAX_ADDRESS_LENGTH: usize = 200;
pub const MAX_POSTAL_CODE_LENGTH: usize = 10;
pub const MAX_PRODUCT_LENGTH: usize = 100;
pub const MAX_NOTES_LENGTH: usize = 500;

/// A sale record.
///
/// Serializes to the shape the frontend reads (`vendedorId`, `cliente`,
/// `valor`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: SaleId,
    #[serde(rename = "vendedorId")]
    pub rep_id: SalesRepId,
    #[serde(rename = "cliente")]
    pub customer_name: String,
    #[serde(rename = "cpfCnpj")]
    pub tax_id: Option<String>,
    #[serde(rename = "telefone")]
    pub phone: Option<String>,
    #[serde(rename = "endereco")]
    pub address: Option<String>,
    #[serde(rename = "cep")]
    pub postal_code: Option<String>,
    #[serde(rename = "produto")]
    pub product: String,
    #[serde(rename = "valor")]
    pub amount: Amount,
    pub status: SaleStatus,
    #[serde(rename = "dataVenda")]
    pub sold_at: DateTime<Utc>,
    #[serde(rename = "observacoes")]
    pub notes: Option<String>,
    #[serde(rename = "ativo")]
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated, editable fields of a sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleInput {
    pub customer_name: String,
    pub tax_id: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub product: String,
    pub amount: Amount,
    pub status: SaleStatus,
    pub sold_at: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Body of `POST /api/vendas` and `PUT /api/vendas/{id}`.
///
/// Accepts both the frontend's form names (`nomeCompleto`, `contato`,
/// `planoNegociado`) and the stored names (`cliente`, `telefone`, `produto`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRequest {
    #[serde(default)]
    pub vendedor_id: Option<String>,
    #[serde(default, alias = "nomeCompleto")]
    pub cliente: Option<String>,
    #[serde(default)]
    pub cpf_cnpj: Option<String>,
    #[serde(default, alias = "contato")]
    pub telefone: Option<String>,
    #[serde(default)]
    pub endereco: Option<String>,
    #[serde(default)]
    pub cep: Option<String>,
    #[serde(default, alias = "planoNegociado")]
    pub produto: Option<String>,
    #[serde(default)]
    pub valor: Option<serde_json::Value>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub data_venda: Option<String>,
    #[serde(default)]
    pub observacoes: Option<String>,
}

impl SaleRequest {
    /// Validate the fields of a new sale, including the owning rep id.
    ///
    /// # Errors
    ///
    /// Returns every field that failed validation.
    pub fn validate_new(
        self,
        now: DateTime<Utc>,
    ) -> Result<(SalesRepId, SaleInput), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let rep_id = match self.vendedor_id.as_deref().map(str::trim) {
            None | Some("") => {
                errors.push("vendedorId", "Vendedor é obrigatório");
                None
            }
            Some(raw) => SalesRepId::from_str(raw).map_or_else(
                |_| {
                    errors.push("vendedorId", "Vendedor inválido");
                    None
                },
                Some,
            ),
        };

        let input = self.collect_fields(&mut errors, now);
        match (rep_id, input) {
            (Some(rep_id), Some(input)) if errors.is_empty() => Ok((rep_id, input)),
            _ => Err(errors),
        }
    }

    /// Validate the editable fields of an existing sale. `vendedorId` is ignored.
    ///
    /// # Errors
    ///
    /// Returns every field that failed validation.
    pub fn validate_update(self, now: DateTime<Utc>) -> Result<SaleInput, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        match self.collect_fields(&mut errors, now) {
            Some(input) if errors.is_empty() => Ok(input),
            _ => Err(errors),
        }
    }

    fn collect_fields(self, errors: &mut ValidationErrors, now: DateTime<Utc>) -> Option<SaleInput> {
        let customer_name = required_text(
            errors,
            "cliente",
            "Nome do cliente",
            self.cliente.as_deref(),
            MAX_CUSTOMER_NAME_LENGTH,
        );
        let tax_id = optional_text(
            errors,
            "cpfCnpj",
            "CPF/CNPJ",
            self.cpf_cnpj.as_deref(),
            MAX_TAX_ID_LENGTH,
        );
        let phone = optional_text(
            errors,
            "telefone",
            "Telefone",
            self.telefone.as_deref(),
            MAX_PHONE_LENGTH,
        );
        let address = optional_text(
            errors,
            "endereco",
            "Endereço",
            self.endereco.as_deref(),
            MAX_ADDRESS_LENGTH,
        );
        let postal_code = optional_text(
            errors,
            "cep",
            "CEP",
            self.cep.as_deref(),
            MAX_POSTAL_CODE_LENGTH,
        );
        let product = required_text(
            errors,
            "produto",
            "Produto",
            self.produto.as_deref(),
            MAX_PRODUCT_LENGTH,
        );
        let notes = optional_text(
            errors,
            "observacoes",
            "Observações",
            self.observacoes.as_deref(),
            MAX_NOTES_LENGTH,
        );

        let amount = match self.valor.as_ref().map(parse_amount) {
            None | Some(Err(AmountInputError::Missing)) => {
                errors.push("valor", "Valor é obrigatório");
                None
            }
            Some(Err(AmountInputError::NotANumber)) => {
                errors.push("valor", "Valor deve ser um número");
                None
            }
            Some(Err(AmountInputError::Negative)) => {
                errors.push("valor", "Valor deve ser maior ou igual a zero");
                None
            }
            Some(Err(AmountInputError::TooLarge)) => {
                errors.push("valor", format!("Valor deve ser no máximo {}", Amount::MAX));
                None
            }
            Some(Ok(amount)) => Some(amount),
        };

        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => Some(SaleStatus::default()),
            Some(raw) => raw.parse::<SaleStatus>().map_or_else(
                |_| {
                    errors.push(
                        "status",
                        "Status deve ser pendente, andamento, instalado ou cancelado",
                    );
                    None
                },
                Some,
            ),
        };

        let sold_at = match self.data_venda.as_deref().map(str::trim) {
            None | Some("") => Some(now),
            Some(raw) => match parse_sale_date(raw) {
                Some(at) if at > now => {
                    errors.push("dataVenda", "Data da venda não pode ser no futuro");
                    None
                }
                Some(at) => Some(at),
                None => {
                    errors.push("dataVenda", "Data da venda inválida");
                    None
                }
            },
        };

        Some(SaleInput {
            customer_name: customer_name?,
            tax_id,
            phone,
            address,
            postal_code,
            product: product?,
            amount: amount?,
            status: status?,
            sold_at: sold_at?,
            notes,
        })
    }
}

#[derive(Debug, PartialEq, Eq)]
enum AmountInputError {
    Missing,
    NotANumber,
    Negative,
    TooLarge,
}

/// Accept a JSON number or a numeric string (`"89.90"` or `"89,90"`).
fn parse_amount(value: &serde_json::Value) -> Result<Amount, AmountInputError> {
    let decimal = match value {
        serde_json::Value::Null => return Err(AmountInputError::Missing),
        serde_json::Value::Number(n) => {
            let parsed = Decimal::from_str(&n.to_string())
                .or_else(|_| Decimal::from_scientific(&n.to_string()));
            // Finite floats past the Decimal range are still numbers, just too big.
            if parsed.is_err() && n.as_f64().is_some_and(|f| f.abs() >= 1e12) {
                return Err(if n.as_f64().is_some_and(f64::is_sign_negative) {
                    AmountInputError::Negative
                } else {
                    AmountInputError::TooLarge
                });
            }
            parsed
        }
        serde_json::Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Err(AmountInputError::Missing);
            }
            if s.contains('.') {
                Decimal::from_str(s)
            } else {
                Decimal::from_str(&s.replace(',', "."))
            }
        }
        _ => return Err(AmountInputError::NotANumber),
    }
    .map_err(|_| AmountInputError::NotANumber)?;

    Amount::new(decimal).map_err(|e| match e {
        AmountError::Negative => AmountInputError::Negative,
        AmountError::TooLarge => AmountInputError::TooLarge,
    })
}

/// Parse `YYYY-MM-DD` (midnight UTC) or an RFC 3339 timestamp.
fn parse_sale_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
