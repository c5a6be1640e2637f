//! Journal entry domain types.

use chrono::{DateTime, NaiveDate, Utc};
use kasira_shared::types::{AccountId, JournalEntryId, JournalLineId, PaymentId, TenantId};
use serde::{Deserialize, Serialize};

/// Type of journal line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// Debit entry (increases assets/expenses, decreases liabilities/equity/revenue).
    Debit,
    /// Credit entry (decreases assets/expenses, increases liabilities/equity/revenue).
    Credit,
}

impl EntryType {
    /// Returns the opposite side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Debit => Self::Credit,
            Self::Credit => Self::Debit,
        }
    }
}

/// Back-reference from a journal entry to the record that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source_type", content = "source_id", rename_all = "snake_case")]
pub enum JournalSource {
    /// Journal created by posting a payment.
    Payment(PaymentId),
    /// Reversing journal created by voiding a payment.
    PaymentVoid(PaymentId),
}

/// A single debit or credit line in a journal entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalLine {
    /// Unique identifier for this line.
    pub id: JournalLineId,
    /// The journal entry this line belongs to.
    pub journal_id: JournalEntryId,
    /// The account affected by this line.
    pub account_id: AccountId,
    /// Whether this is a debit or credit.
    pub entry_type: EntryType,
    /// Amount in minor currency units (always positive).
    pub amount: i64,
    /// Optional description for this line item.
    pub memo: Option<String>,
}

impl JournalLine {
    /// Returns the signed amount (positive for debit, negative for credit).
    #[must_use]
    pub const fn signed_amount(&self) -> i64 {
        match self.entry_type {
            EntryType::Debit => self.amount,
            EntryType::Credit => -self.amount,
        }
    }
}

/// A balanced journal entry.
///
/// Immutable once created; a void never edits an entry, it creates a new
/// reversing entry via [`JournalEntry::reversed`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Unique identifier.
    pub id: JournalEntryId,
    /// Tenant this entry belongs to.
    pub tenant_id: TenantId,
    /// Business date of the entry.
    pub entry_date: NaiveDate,
    /// Human-readable description.
    pub description: String,
    /// Back-reference to the originating record.
    pub source: JournalSource,
    /// Ordered debit/credit lines.
    pub lines: Vec<JournalLine>,
    /// When the entry was created.
    pub created_at: DateTime<Utc>,
}

impl JournalEntry {
    /// Sum of all debit lines.
    #[must_use]
    pub fn total_debit(&self) -> i64 {
        self.lines
            .iter()
            .filter(|l| l.entry_type == EntryType::Debit)
            .map(|l| l.amount)
            .sum()
    }

    /// Sum of all credit lines.
    #[must_use]
    pub fn total_credit(&self) -> i64 {
        self.lines
            .iter()
            .filter(|l| l.entry_type == EntryType::Credit)
            .map(|l| l.amount)
            .sum()
    }

    /// Returns true if debits equal credits.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.total_debit() == self.total_credit()
    }

    /// Builds the exact reversing entry: every line mirrored (debit becomes
    /// credit and vice versa), same amounts, same accounts, fresh line ids.
    #[must_use]
    pub fn reversed(
        &self,
        id: JournalEntryId,
        source: JournalSource,
        description: String,
        entry_date: NaiveDate,
        created_at: DateTime<Utc>,
    ) -> Self {
        let lines = self
            .lines
            .iter()
            .map(|line| JournalLine {
                id: JournalLineId::new(),
                journal_id: id,
                account_id: line.account_id,
                entry_type: line.entry_type.opposite(),
                amount: line.amount,
                memo: line.memo.clone(),
            })
            .collect();

        Self {
            id,
            tenant_id: self.tenant_id,
            entry_date,
            description,
            source,
            lines,
            created_at,
        }
    }
}
