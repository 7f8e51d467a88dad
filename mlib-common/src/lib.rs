//! # Music Library Common Library
//!
//! Shared code for the music library catalog service:
//! - Error types
//! - Trusted static configuration (lookup-table registry, catalog item
//!   schema, report column specifications)
//! - Database pool initialization and schema creation
//! - Account credential hashing

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod text;

pub use error::{Error, Result};
