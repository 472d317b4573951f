//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Rep registration, password login and lockout
//! - `lookup` - CNPJ and CEP lookups against public APIs, cached

pub mod auth;
pub mod lookup;

pub use auth::{AuthError, AuthService};
pub use lookup::{LookupClient, LookupError};
