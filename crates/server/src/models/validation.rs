//! Field-level validation errors for request bodies.
//!
//! Request DTOs validate every field and collect all failures before
//! returning, so the client can highlight each bad input at once.

use serde::Serialize;

/// One rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Wire name of the field (e.g. `nomeCompleto`).
    #[serde(rename = "campo")]
    pub field: String,
    /// Human-readable reason, in Portuguese.
    #[serde(rename = "mensagem")]
    pub message: String,
}

/// Every field that failed validation for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("{} invalid field(s)", .errors.len())]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// An empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// A collection holding a single error.
    #[must_use]
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    /// Record a failure for `field`.
    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_owned(),
            message: message.into(),
        });
    }

    /// Whether no failures were recorded.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// The recorded failures, in field order.
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Whether `field` has a recorded failure.
    #[cfg(test)]
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

/// Trim a required text field and check its length.
///
/// Returns the trimmed value, or records an error and returns `None`.
pub fn required_text(
    errors: &mut ValidationErrors,
    field: &str,
    label: &str,
    value: Option<&str>,
    max: usize,
) -> Option<String> {
    let value = value.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        errors.push(field, format!("{label} é obrigatório"));
        return None;
    }
    if value.chars().count() > max {
        errors.push(field, format!("{label} deve ter no máximo {max} caracteres"));
        return None;
    }
    Some(value.to_owned())
}

/// Trim an optional text field and check its length. Blank becomes `None`.
pub fn optional_text(
    errors: &mut ValidationErrors,
    field: &str,
    label: &str,
    value: Option<&str>,
    max: usize,
) -> Option<String> {
    let value = value.map(str::trim).filter(|v| !v.is_empty())?;
    if value.chars().count() > max {
        errors.push(field, format!("{label} deve ter no máximo {max} caracteres"));
        return None;
    }
    Some(value.to_owned())
}
