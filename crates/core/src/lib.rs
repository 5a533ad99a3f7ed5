//! Core types for the ledger vector store
//!
//! Domain types shared by the storage, engine and CLI crates: deployment
//! config, embedding literals, cosine distance and query shapes.

mod config;
mod constants;
mod embedding;
mod env_config;
mod error;
mod query;

pub use config::*;
pub use constants::*;
pub use embedding::*;
pub use env_config::*;
pub use error::*;
pub use query::*;
