//! Gestão de Vendas Core - Shared types library.
//!
//! This crate provides the domain types used across all Gestão de Vendas
//! components:
//! - `server` - REST API and static frontend host
//! - `cli` - Command-line tools for migrations and legacy data import
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP clients. Login lockout bookkeeping and dashboard
//! aggregation live here so they can be tested without a database.
//!
//! # Modules
//!
//! - [`types`] - IDs, contact fields, amounts, statuses, periods, lockout and statistics

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
