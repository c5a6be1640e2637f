//! Receivables reporting.
//!
//! This module provides pure aggregation logic over committed ledger state:
//! - Account statements with running balances
//! - Receivables aging summaries

pub mod aging;
pub mod error;
pub mod statement;
pub mod types;


pub use aging::AgingService;
pub use error::ReportError;
pub use statement::StatementService;
pub use types::{
    Account, AccountStatement, AgingBucket, AgingSummary, NormalBalance, OpenItem,
    StatementEntry, StatementLine, StatementTotals,
};
