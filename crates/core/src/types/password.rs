//! Password strength policy for sales-rep accounts.

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Maximum password length, in characters.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Reasons a password is rejected.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordPolicyError {
    /// Shorter than [`MIN_PASSWORD_LENGTH`] or longer than [`MAX_PASSWORD_LENGTH`].
    #[error("password must be between {MIN_PASSWORD_LENGTH} and {MAX_PASSWORD_LENGTH} characters")]
    Length,
    /// Missing a lowercase letter, an uppercase letter or a digit.
    #[error("password must contain at least one lowercase letter, one uppercase letter and one digit")]
    Composition,
}

/// Check a plaintext password against the account policy.
///
/// # Errors
///
/// Returns [`PasswordPolicyError::Length`] before checking composition, so a
/// short password always reports the length problem first.
pub fn validate_password_strength(password: &str) -> Result<(), PasswordPolicyError> {
    let len = password.chars().count();
    if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&len) {
        return Err(PasswordPolicyError::Length);
    }

    let has_lower = password.chars().any(char::is_lowercase);
    let has_upper = password.chars().any(char::is_uppercase);
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if has_lower && has_upper && has_digit {
        Ok(())
    } else {
        Err(PasswordPolicyError::Composition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_strong_password() {
        assert_eq!(validate_password_strength("Vendas2024"), Ok(()));
        assert_eq!(validate_password_strength("aB3456"), Ok(()));
    }

    #[test]
    fn test_rejects_short_and_long() {
        assert_eq!(
            validate_password_strength("aB3"),
            Err(PasswordPolicyError::Length)
        );
        let long = format!("aB1{}", "x".repeat(MAX_PASSWORD_LENGTH));
        assert_eq!(
            validate_password_strength(&long),
            Err(PasswordPolicyError::Length)
        );
    }

    #[test]
    fn test_rejects_missing_character_classes() {
        assert_eq!(
            validate_password_strength("alllowercase1"),
            Err(PasswordPolicyError::Composition)
        );
        assert_eq!(
            validate_password_strength("ALLUPPER1"),
            Err(PasswordPolicyError::Composition)
        );
        assert_eq!(
            validate_password_strength("NoDigitsHere"),
            Err(PasswordPolicyError::Composition)
        );
    }
}
