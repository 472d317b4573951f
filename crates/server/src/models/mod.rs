//! Domain models and request/response bodies for the REST API.
//!
//! Rust names are English; the JSON wire names stay in Portuguese because
//! the frontend reads them.

pub mod dashboard;
pub mod sale;
pub mod sales_rep;
pub mod validation;

pub use dashboard::{GeneralDashboard, RepDashboard};
pub use sale::{Sale, SaleInput, SaleRequest};
pub use sales_rep::{
    ConfirmPasswordRequest, CreateSalesRepRequest, LoginRequest, LoginResponse, NewSalesRep,
    SalesRep, SalesRepResponse, ValidSalesRep,
};
pub use validation::{FieldError, ValidationErrors};
