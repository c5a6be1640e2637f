//! Double-entry journal types and balance validation.
//!
//! This module implements the ledger foundation:
//! - Journal entries and debit/credit lines
//! - Balance validation (debits must equal credits)
//! - Exact reversal of a posted journal entry
//! - Error types for ledger operations

pub mod entry;
pub mod error;
pub mod validation;

pub use entry::{EntryType, JournalEntry, JournalLine, JournalSource};
pub use error::LedgerError;
pub use validation::validate_lines;
