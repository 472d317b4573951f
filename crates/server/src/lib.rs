//! Gestão de Vendas server library.
//!
//! Sales rep accounts, sales records, dashboards and the CNPJ/CEP lookup
//! proxy, exposed as a library so the binary, the CLI and tests share it.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
