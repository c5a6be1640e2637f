//! Report data types.

use chrono::NaiveDate;
use kasira_shared::types::{AccountId, Currency, CustomerId, InvoiceId, JournalEntryId, PageMeta};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::entry::EntryType;

/// Which side increases an account's balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalBalance {
    /// Assets and expenses: debits increase the balance.
    DebitNormal,
    /// Liabilities, equity and revenue: credits increase the balance.
    CreditNormal,
}

impl NormalBalance {
    /// Signed balance effect of one line on an account of this normal side.
    #[must_use]
    pub fn balance_change(&self, entry_type: EntryType, amount: i64) -> i64 {
        match (self, entry_type) {
            (Self::DebitNormal, EntryType::Debit) | (Self::CreditNormal, EntryType::Credit) => {
                amount
            }
            (Self::DebitNormal, EntryType::Credit) | (Self::CreditNormal, EntryType::Debit) => {
                -amount
            }
        }
    }
}

/// Chart-of-accounts entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// Account code, e.g. `1100`.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Which side increases this account's balance.
    pub normal_balance: NormalBalance,
}

/// One journal line affecting an account, as input to statement generation.
#[derive(Debug, Clone)]
pub struct StatementEntry {
    /// The journal entry the line belongs to.
    pub journal_id: JournalEntryId,
    /// Business date of the journal entry.
    pub entry_date: NaiveDate,
    /// Creation order within the ledger; tie-breaker for same-date entries.
    pub sequence: u64,
    /// Journal entry description.
    pub description: String,
    /// Debit or credit.
    pub entry_type: EntryType,
    /// Line amount in minor units.
    pub amount: i64,
}

/// One rendered statement line with its running balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementLine {
    /// The journal entry the line belongs to.
    pub journal_id: JournalEntryId,
    /// Business date.
    pub entry_date: NaiveDate,
    /// Journal entry description.
    pub description: String,
    /// Debit amount, zero when the line is a credit.
    pub debit: i64,
    /// Credit amount, zero when the line is a debit.
    pub credit: i64,
    /// Account balance after this line.
    pub running_balance: i64,
}

/// Statement period totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementTotals {
    /// Sum of debit lines in the period.
    pub total_debit: i64,
    /// Sum of credit lines in the period.
    pub total_credit: i64,
}

/// A paginated account statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountStatement {
    /// The account the statement covers.
    pub account_id: AccountId,
    /// Currency the amounts are denominated in.
    pub currency: Currency,
    /// Period start (inclusive).
    pub period_start: NaiveDate,
    /// Period end (inclusive).
    pub period_end: NaiveDate,
    /// Balance carried in from before the period.
    pub opening_balance: i64,
    /// Balance after the last line of the period.
    pub closing_balance: i64,
    /// Period totals.
    pub totals: StatementTotals,
    /// Lines for the requested page, running balances intact.
    pub lines: Vec<StatementLine>,
    /// Pagination metadata.
    pub meta: PageMeta,
}

/// An open invoice as input to aging, reduced to what bucketing needs.
#[derive(Debug, Clone)]
pub struct OpenItem {
    /// The invoice.
    pub invoice_id: InvoiceId,
    /// The invoiced customer.
    pub customer_id: CustomerId,
    /// Outstanding balance.
    pub remaining: i64,
    /// Due date; `None` is never overdue.
    pub due_date: Option<NaiveDate>,
    /// Whether the invoice has been partially settled.
    pub is_partial: bool,
}

/// One aging bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgingBucket {
    /// Human-readable bucket label, e.g. `1-30` or `90+`.
    pub label: String,
    /// Lower bound of days overdue (inclusive).
    pub min_days: u32,
    /// Upper bound of days overdue (inclusive); `None` for the open-ended
    /// final bucket.
    pub max_days: Option<u32>,
    /// Outstanding amount in this bucket.
    pub amount: i64,
    /// Number of invoices in this bucket.
    pub count: u32,
    /// Share of the total outstanding, one decimal place.
    pub percent: Decimal,
}

/// Receivables aging summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgingSummary {
    /// The date the aging was computed against.
    pub as_of: NaiveDate,
    /// Currency the amounts are denominated in.
    pub currency: Currency,
    /// Sum of all outstanding balances.
    pub total_outstanding: i64,
    /// Number of open invoices.
    pub total_count: u32,
    /// Outstanding not yet due (includes invoices without a due date).
    pub current_amount: i64,
    /// Number of invoices not yet due.
    pub current_count: u32,
    /// Outstanding past due.
    pub overdue_amount: i64,
    /// Number of invoices past due.
    pub overdue_count: u32,
    /// Number of partially settled invoices, counted across all buckets.
    pub partial_count: u32,
    /// Overdue sub-buckets, ordered from least to most overdue.
    pub buckets: Vec<AgingBucket>,
}
