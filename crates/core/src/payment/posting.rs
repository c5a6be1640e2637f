//! Ledger posting engine: turns a draft payment and its allocation plan
//! into a balanced journal entry plus the balance writes that go with it.
//!
//! The engine emits a complete change-set; the store applies it as a single
//! atomic unit or not at all. The balance invariant is checked here, before
//! anything is committed: an imbalance is a bug, never a recoverable state.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use kasira_shared::types::{
    AccountId, AllocationId, DepositId, InvoiceId, JournalEntryId, JournalLineId,
};

use super::allocation::AllocationPlan;
use super::types::{Allocation, Deposit, InvoiceStatus, Payment, PaymentSource};
use crate::ledger::entry::{EntryType, JournalEntry, JournalLine, JournalSource};
use crate::ledger::error::LedgerError;
use crate::ledger::validation::validate_lines;

/// The chart-of-accounts entries used for journal line construction.
#[derive(Debug, Clone, Copy)]
pub struct PostingAccounts {
    /// Bank/cash account receiving the funds.
    pub bank: AccountId,
    /// Accounts receivable.
    pub accounts_receivable: AccountId,
    /// Discount / contra-revenue account.
    pub payment_discount: AccountId,
    /// Customer deposit liability account.
    pub customer_deposits: AccountId,
}

/// A balance write-back for one invoice touched by the posting.
#[derive(Debug, Clone)]
pub struct InvoiceUpdate {
    /// The invoice to update.
    pub invoice_id: InvoiceId,
    /// New outstanding balance.
    pub remaining: i64,
    /// Recalculated settlement status.
    pub status: InvoiceStatus,
    /// Version the plan was computed against; apply must fail on mismatch.
    pub expected_version: i64,
}

/// A decrement of the source deposit's remaining balance.
#[derive(Debug, Clone)]
pub struct DepositDecrement {
    /// The deposit to decrement.
    pub deposit_id: DepositId,
    /// Amount drawn.
    pub amount: i64,
    /// Version the plan was computed against; apply must fail on mismatch.
    pub expected_version: i64,
}

/// Complete change-set produced by posting a payment.
#[derive(Debug, Clone)]
pub struct PostingOutcome {
    /// The balanced journal entry to persist.
    pub journal: JournalEntry,
    /// Finalized allocation records owned by the payment.
    pub allocations: Vec<Allocation>,
    /// Sum of invoice applications.
    pub allocated_amount: i64,
    /// Residual not matched to any invoice.
    pub unapplied_amount: i64,
    /// Balance write-backs for touched invoices.
    pub invoice_updates: Vec<InvoiceUpdate>,
    /// Draw against the source deposit, when source is a deposit.
    pub deposit_decrement: Option<DepositDecrement>,
    /// Deposit created from the unapplied amount, if any.
    pub created_deposit: Option<Deposit>,
}

/// Ledger posting engine.
pub struct PostingEngine;

impl PostingEngine {
    /// Builds the journal entry and balance write-set for a draft payment.
    ///
    /// Line construction:
    /// 1. Debit the settlement account (bank/cash, or the deposit liability
    ///    account when the source is a deposit) for the net cash drawn
    ///    (`total − discount`).
    /// 2. Debit the discount account for the discount, if nonzero.
    /// 3. Credit accounts receivable for the amount settled against
    ///    invoices (`allocations + discount`).
    /// 4. Credit the deposit liability account for the unapplied residual,
    ///    if positive, and create a matching deposit record.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStatus` unless the payment is in draft, and
    /// `LedgerImbalance` if the constructed lines fail the balance check.
    pub fn post(
        payment: &Payment,
        plan: &AllocationPlan,
        accounts: &PostingAccounts,
        now: DateTime<Utc>,
    ) -> Result<PostingOutcome, LedgerError> {
        if !payment.status.can_post() {
            return Err(LedgerError::InvalidStatus {
                operation: "post",
                actual: payment.status,
            });
        }
        if plan.total_amount != payment.total_amount
            || plan.discount_amount != payment.discount_amount
        {
            return Err(LedgerError::Internal(
                "allocation plan does not match payment header".to_string(),
            ));
        }

        let journal_id = JournalEntryId::new();
        let mut lines = Vec::with_capacity(4);

        let settlement_account = match payment.source {
            PaymentSource::Cash => accounts.bank,
            PaymentSource::Deposit(_) => accounts.customer_deposits,
        };
        let net_settlement = plan.total_amount - plan.discount_amount;
        if net_settlement > 0 {
            lines.push(make_line(
                journal_id,
                settlement_account,
                EntryType::Debit,
                net_settlement,
            ));
        }
        if plan.discount_amount > 0 {
            lines.push(make_line(
                journal_id,
                accounts.payment_discount,
                EntryType::Debit,
                plan.discount_amount,
            ));
        }

        let receivable_settled = plan.allocated_amount + plan.discount_amount;
        if receivable_settled > 0 {
            lines.push(make_line(
                journal_id,
                accounts.accounts_receivable,
                EntryType::Credit,
                receivable_settled,
            ));
        }
        if plan.unapplied_amount > 0 {
            lines.push(make_line(
                journal_id,
                accounts.customer_deposits,
                EntryType::Credit,
                plan.unapplied_amount,
            ));
        }

        // Hard invariant: debits must equal credits before anything commits.
        validate_lines(&lines)?;

        let journal = JournalEntry {
            id: journal_id,
            tenant_id: payment.tenant_id,
            entry_date: payment.payment_date,
            description: format!("Payment {}", payment.number),
            source: JournalSource::Payment(payment.id),
            lines,
            created_at: now,
        };

        let allocations = plan
            .allocations
            .iter()
            .map(|planned| Allocation {
                id: AllocationId::new(),
                payment_id: payment.id,
                invoice_id: planned.invoice_id,
                remaining_before: planned.remaining_before,
                amount_applied: planned.amount_applied,
                remaining_after: planned.remaining_after,
            })
            .collect();

        // One write-back per invoice: the last planned application carries
        // the final remaining balance.
        let mut update_index: HashMap<InvoiceId, usize> = HashMap::new();
        let mut invoice_updates: Vec<InvoiceUpdate> = Vec::new();
        for planned in &plan.allocations {
            let update = InvoiceUpdate {
                invoice_id: planned.invoice_id,
                remaining: planned.remaining_after,
                status: planned.new_status,
                expected_version: planned.invoice_version,
            };
            match update_index.get(&planned.invoice_id) {
                Some(&i) => invoice_updates[i] = update,
                None => {
                    update_index.insert(planned.invoice_id, invoice_updates.len());
                    invoice_updates.push(update);
                }
            }
        }

        let deposit_decrement = plan.deposit_draw.as_ref().map(|draw| DepositDecrement {
            deposit_id: draw.deposit_id,
            amount: draw.amount,
            expected_version: draw.deposit_version,
        });

        let created_deposit = (plan.unapplied_amount > 0).then(|| Deposit {
            id: DepositId::new(),
            tenant_id: payment.tenant_id,
            customer_id: payment.customer_id,
            initial_amount: plan.unapplied_amount,
            remaining: plan.unapplied_amount,
            is_active: true,
            source_payment_id: Some(payment.id),
            version: 1,
        });

        Ok(PostingOutcome {
            journal,
            allocations,
            allocated_amount: plan.allocated_amount,
            unapplied_amount: plan.unapplied_amount,
            invoice_updates,
            deposit_decrement,
            created_deposit,
        })
    }
}

fn make_line(
    journal_id: JournalEntryId,
    account_id: AccountId,
    entry_type: EntryType,
    amount: i64,
) -> JournalLine {
    JournalLine {
        id: JournalLineId::new(),
        journal_id,
        account_id,
        entry_type,
        amount,
        memo: None,
    }
}
