//! Committed ledger state.

use std::collections::HashMap;

use kasira_core::ledger::entry::JournalEntry;
use kasira_core::payment::{Deposit, Invoice, NumberSequence, Payment};
use kasira_core::reports::Account;
use kasira_shared::types::{
    AccountId, CustomerId, DepositId, InvoiceId, PaymentId, TenantId,
};
use serde::{Deserialize, Serialize};

/// A customer master record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    /// Unique identifier.
    pub id: CustomerId,
    /// Tenant this customer belongs to.
    pub tenant_id: TenantId,
    /// Display name.
    pub name: String,
}

/// A journal entry with its ledger creation sequence.
///
/// The sequence is the tie-breaker for statement ordering when multiple
/// entries share a business date.
#[derive(Debug, Clone)]
pub struct StoredJournal {
    /// The immutable journal entry.
    pub entry: JournalEntry,
    /// Position in ledger creation order.
    pub sequence: u64,
}

/// The whole committed state, guarded by the store's lock.
#[derive(Debug, Default)]
pub(crate) struct State {
    pub customers: HashMap<CustomerId, Customer>,
    pub accounts: HashMap<AccountId, Account>,
    pub invoices: HashMap<InvoiceId, Invoice>,
    pub deposits: HashMap<DepositId, Deposit>,
    pub payments: HashMap<PaymentId, Payment>,
    pub journals: Vec<StoredJournal>,
    pub sequences: HashMap<(TenantId, i32), NumberSequence>,
}

impl State {
    /// Appends a journal entry, assigning the next creation sequence.
    pub fn push_journal(&mut self, entry: JournalEntry) {
        let sequence = self.journals.len() as u64;
        self.journals.push(StoredJournal { entry, sequence });
    }
}
