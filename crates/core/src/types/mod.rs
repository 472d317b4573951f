//! Domain types for Gestão de Vendas.
//!
//! Parse-don't-validate wrappers for the values that cross the API boundary,
//! plus the pure state machines the server persists.

pub mod amount;
pub mod email;
pub mod id;
pub mod lockout;
pub mod password;
pub mod period;
pub mod phone;
pub mod stats;
pub mod status;

pub use amount::{Amount, AmountError};
pub use email::{Email, EmailError};
pub use id::*;
pub use lockout::{FailureOutcome, LoginLockout};
pub use password::{
    MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH, PasswordPolicyError, validate_password_strength,
};
pub use period::{MonthFilter, MonthFilterError};
pub use phone::{Phone, PhoneError};
pub use stats::{SalesStats, StatusCounts};
pub use status::SaleStatus;
