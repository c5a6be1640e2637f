//! Core business logic for Kasira.
//!
//! This crate contains pure business logic with ZERO web or database
//! dependencies. All domain types, validation rules, and calculations live
//! here.
//!
//! # Modules
//!
//! - `ledger` - Double-entry journal types and balance validation
//! - `payment` - Receive-payment allocation, posting, and reversal engines
//! - `reports` - Account statement and receivables aging aggregation

pub mod ledger;
pub mod payment;
pub mod reports;
