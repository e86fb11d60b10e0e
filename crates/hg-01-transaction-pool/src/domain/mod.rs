//! # Domain Layer - Transaction Pool
//!
//! - `config`: `TransactionPoolConfig`
//! - `errors`: `TransactionPoolError`
//! - `nexus`: `TransactionPoolNexus`

pub mod config;
pub mod errors;
pub mod nexus;

pub use config::*;
pub use errors::*;
pub use nexus::*;
