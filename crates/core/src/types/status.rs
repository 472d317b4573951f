//! Sale lifecycle status.

use serde::{Deserialize, Deserializer, Serialize};

/// Where a sale is in its installation lifecycle.
///
/// Serialized in lowercase Portuguese (`pendente`, `andamento`, `instalado`,
/// `cancelado`). Parsing is case-insensitive and also accepts the label the
/// frontend shows for in-progress sales ("Em Andamento").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    /// Sold, not yet scheduled.
    #[default]
    Pendente,
    /// Installation in progress.
    Andamento,
    /// Installed and connected.
    Instalado,
    /// Cancelled by the customer or the rep.
    Cancelado,
}

impl SaleStatus {
    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pendente => "pendente",
            Self::Andamento => "andamento",
            Self::Instalado => "instalado",
            Self::Cancelado => "cancelado",
        }
    }
}

impl std::fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SaleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pendente" => Ok(Self::Pendente),
            "andamento" | "em andamento" | "em_andamento" => Ok(Self::Andamento),
            "instalado" => Ok(Self::Instalado),
            "cancelado" => Ok(Self::Cancelado),
            _ => Err(format!("invalid sale status: {s}")),
        }
    }
}

impl<'de> Deserialize<'de> for SaleStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// Stored as TEXT guarded by a CHECK constraint rather than a Postgres enum.
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for SaleStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for SaleStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(s.parse()?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for SaleStatus {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
    }
}
