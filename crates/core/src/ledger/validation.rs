//! Business rule validation for journal lines.

use super::entry::{EntryType, JournalLine};
use super::error::LedgerError;

/// Validates that a set of journal lines forms a well-formed, balanced entry.
///
/// This is the hard invariant checked before any posting commits: a failure
/// here means the line-construction code is buggy, so the whole operation
/// must abort with nothing applied.
///
/// # Errors
///
/// Returns `LedgerError::Validation` for structural problems and
/// `LedgerError::LedgerImbalance` when debits do not equal credits.
pub fn validate_lines(lines: &[JournalLine]) -> Result<(), LedgerError> {
    if lines.is_empty() {
        return Err(LedgerError::Validation(
            "journal entry must have at least one line".to_string(),
        ));
    }

    let mut total_debits: i64 = 0;
    let mut total_credits: i64 = 0;
    let mut has_debit = false;
    let mut has_credit = false;

    for line in lines {
        if line.amount <= 0 {
            return Err(LedgerError::Validation(
                "journal line amount must be positive".to_string(),
            ));
        }

        match line.entry_type {
            EntryType::Debit => {
                total_debits += line.amount;
                has_debit = true;
            }
            EntryType::Credit => {
                total_credits += line.amount;
                has_credit = true;
            }
        }
    }

    if !has_debit || !has_credit {
        return Err(LedgerError::Validation(
            "journal entry must have both debit and credit lines".to_string(),
        ));
    }

    if total_debits != total_credits {
        return Err(LedgerError::LedgerImbalance {
            debit: total_debits,
            credit: total_credits,
        });
    }

    Ok(())
}
