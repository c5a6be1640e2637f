//! Shared types, errors, and configuration for Kasira.
//!
//! This crate provides common types used across all other crates:
//! - Minor-unit money types (integer amounts, never floats)
//! - Typed IDs for type-safe entity references
//! - Pagination types for list endpoints
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
