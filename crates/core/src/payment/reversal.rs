//! Reversal engine: voids a posted payment.
//!
//! A void never edits the original journal entry. It creates a new entry
//! with every line mirrored, restores each touched invoice to the
//! `remaining_before` snapshot stored on its allocation at post time, and
//! undoes any deposit movement. Restoration uses the stored snapshots, not
//! a recomputation: that is the only way to guarantee an exact inverse.

use chrono::{DateTime, Utc};
use kasira_shared::types::{DepositId, InvoiceId, JournalEntryId};

use super::types::{Invoice, InvoiceStatus, Payment, PaymentSource};
use crate::ledger::entry::{JournalEntry, JournalSource};
use crate::ledger::error::LedgerError;
use crate::ledger::validation::validate_lines;

/// Restores one invoice to its pre-post state.
#[derive(Debug, Clone)]
pub struct InvoiceRestore {
    /// The invoice to restore.
    pub invoice_id: InvoiceId,
    /// The outstanding balance to restore (the stored `remaining_before`).
    pub remaining: i64,
    /// Status recalculated from the restored balance.
    pub status: InvoiceStatus,
    /// The balance the invoice is expected to hold right now (the stored
    /// `remaining_after`). If the live value differs, another posting
    /// touched the invoice since this payment posted and the void must be
    /// rejected rather than overwrite newer state.
    pub expected_remaining: i64,
}

/// Re-increments a consumed source deposit.
#[derive(Debug, Clone)]
pub struct DepositRestore {
    /// The deposit to restore.
    pub deposit_id: DepositId,
    /// Amount to add back (the amount originally drawn).
    pub amount: i64,
}

/// Complete change-set produced by voiding a payment.
#[derive(Debug, Clone)]
pub struct VoidOutcome {
    /// The reversing journal entry to persist.
    pub journal: JournalEntry,
    /// Invoice balance restorations.
    pub invoice_restores: Vec<InvoiceRestore>,
    /// Source deposit re-increment, when the payment drew from a deposit.
    pub deposit_restore: Option<DepositRestore>,
    /// Overpayment-created deposit to invalidate, if any.
    pub invalidate_deposit: Option<DepositId>,
    /// Timestamp recorded on the voided payment.
    pub voided_at: DateTime<Utc>,
}

/// Reversal engine.
pub struct ReversalEngine;

impl ReversalEngine {
    /// Builds the reversing journal and restore-set for a posted payment.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStatus` unless the payment is posted (voiding an
    /// already-voided or still-draft payment fails here), and
    /// `Validation` when the reason is blank.
    pub fn void<F>(
        payment: &Payment,
        original: &JournalEntry,
        reason: &str,
        invoice_lookup: F,
        now: DateTime<Utc>,
    ) -> Result<VoidOutcome, LedgerError>
    where
        F: Fn(InvoiceId) -> Result<Invoice, LedgerError>,
    {
        if !payment.status.can_void() {
            return Err(LedgerError::InvalidStatus {
                operation: "void",
                actual: payment.status,
            });
        }
        if reason.trim().is_empty() {
            return Err(LedgerError::Validation(
                "void reason must not be blank".to_string(),
            ));
        }
        if payment.journal_id != Some(original.id) {
            return Err(LedgerError::Internal(
                "journal entry does not belong to this payment".to_string(),
            ));
        }

        let journal = original.reversed(
            JournalEntryId::new(),
            JournalSource::PaymentVoid(payment.id),
            format!("Void {}: {}", payment.number, reason.trim()),
            now.date_naive(),
            now,
        );
        validate_lines(&journal.lines)?;

        // Per invoice: the first allocation recorded the pre-post balance,
        // the last one recorded the balance the invoice should hold now.
        let mut invoice_restores: Vec<InvoiceRestore> = Vec::new();
        for allocation in &payment.allocations {
            match invoice_restores
                .iter_mut()
                .find(|r| r.invoice_id == allocation.invoice_id)
            {
                Some(existing) => existing.expected_remaining = allocation.remaining_after,
                None => {
                    let invoice = invoice_lookup(allocation.invoice_id)?;
                    invoice_restores.push(InvoiceRestore {
                        invoice_id: allocation.invoice_id,
                        remaining: allocation.remaining_before,
                        status: InvoiceStatus::from_remaining(
                            allocation.remaining_before,
                            invoice.amount,
                        ),
                        expected_remaining: allocation.remaining_after,
                    });
                }
            }
        }

        let deposit_restore = match payment.source {
            PaymentSource::Cash => None,
            PaymentSource::Deposit(deposit_id) => {
                let amount = payment.total_amount - payment.discount_amount;
                (amount > 0).then_some(DepositRestore { deposit_id, amount })
            }
        };

        Ok(VoidOutcome {
            journal,
            invoice_restores,
            deposit_restore,
            invalidate_deposit: payment.created_deposit_id,
            voided_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::entry::{EntryType, JournalLine};
    use crate::payment::types::{Allocation, PaymentMethod, PaymentStatus};
    use chrono::NaiveDate;
    use kasira_shared::types::{
        AccountId, AllocationId, CustomerId, JournalLineId, PaymentId, TenantId, UserId,
    };

    struct Fixture {
        payment: Payment,
        journal: JournalEntry,
        invoice: Invoice,
        bank: AccountId,
        receivable: AccountId,
    }

    fn posted_fixture() -> Fixture {
        let now = Utc::now();
        let bank = AccountId::new();
        let receivable = AccountId::new();
        let payment_id = PaymentId::new();
        let journal_id = JournalEntryId::new();
        let tenant_id = TenantId::new();
        let customer_id = CustomerId::new();

        let invoice = Invoice {
            id: kasira_shared::types::InvoiceId::new(),
            tenant_id,
            customer_id,
            amount: 5_000_000,
            remaining: 0,
            due_date: None,
            status: InvoiceStatus::Paid,
            version: 2,
        };

        let journal = JournalEntry {
            id: journal_id,
            tenant_id,
            entry_date: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            description: "Payment RCV-2026-0001".to_string(),
            source: JournalSource::Payment(payment_id),
            lines: vec![
                JournalLine {
                    id: JournalLineId::new(),
                    journal_id,
                    account_id: bank,
                    entry_type: EntryType::Debit,
                    amount: 5_000_000,
                    memo: None,
                },
                JournalLine {
                    id: JournalLineId::new(),
                    journal_id,
                    account_id: receivable,
                    entry_type: EntryType::Credit,
                    amount: 5_000_000,
                    memo: None,
                },
            ],
            created_at: now,
        };

        let payment = Payment {
            id: payment_id,
            tenant_id,
            number: "RCV-2026-0001".to_string(),
            customer_id,
            payment_date: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            method: PaymentMethod::BankTransfer,
            source: PaymentSource::Cash,
            bank_account_id: bank,
            total_amount: 5_000_000,
            discount_amount: 0,
            allocated_amount: 5_000_000,
            unapplied_amount: 0,
            status: PaymentStatus::Posted,
            journal_id: Some(journal_id),
            void_journal_id: None,
            created_deposit_id: None,
            void_reason: None,
            voided_at: None,
            voided_by: None,
            created_by: UserId::new(),
            created_at: now,
            updated_at: now,
            allocations: vec![Allocation {
                id: AllocationId::new(),
                payment_id,
                invoice_id: invoice.id,
                remaining_before: 5_000_000,
                amount_applied: 5_000_000,
                remaining_after: 0,
            }],
        };

        Fixture {
            payment,
            journal,
            invoice,
            bank,
            receivable,
        }
    }

    #[test]
    fn test_void_mirrors_journal_and_restores_invoice() {
        // Void reverses Dr Bank 5,000,000 / Cr A/R 5,000,000.
        let f = posted_fixture();
        let invoice = f.invoice.clone();

        let outcome = ReversalEngine::void(
            &f.payment,
            &f.journal,
            "duplicate entry",
            |_| Ok(invoice.clone()),
            Utc::now(),
        )
        .unwrap();

        // Reversing journal: Dr A/R 5,000,000 / Cr Bank 5,000,000.
        let debit = outcome
            .journal
            .lines
            .iter()
            .find(|l| l.entry_type == EntryType::Debit)
            .unwrap();
        let credit = outcome
            .journal
            .lines
            .iter()
            .find(|l| l.entry_type == EntryType::Credit)
            .unwrap();
        assert_eq!(debit.account_id, f.receivable);
        assert_eq!(debit.amount, 5_000_000);
        assert_eq!(credit.account_id, f.bank);
        assert_eq!(credit.amount, 5_000_000);
        assert!(outcome.journal.is_balanced());
        assert_eq!(
            outcome.journal.source,
            JournalSource::PaymentVoid(f.payment.id)
        );

        // Invoice restored to pre-post balance.
        assert_eq!(outcome.invoice_restores.len(), 1);
        let restore = &outcome.invoice_restores[0];
        assert_eq!(restore.remaining, 5_000_000);
        assert_eq!(restore.status, InvoiceStatus::Open);
        assert_eq!(restore.expected_remaining, 0);
    }

    #[test]
    fn test_void_requires_posted_status() {
        let mut f = posted_fixture();
        let invoice = f.invoice.clone();

        f.payment.status = PaymentStatus::Draft;
        let result = ReversalEngine::void(
            &f.payment,
            &f.journal,
            "reason",
            |_| Ok(invoice.clone()),
            Utc::now(),
        );
        assert!(matches!(
            result,
            Err(LedgerError::InvalidStatus {
                operation: "void",
                actual: PaymentStatus::Draft,
            })
        ));

        // Voiding an already-voided payment is rejected the same way.
        f.payment.status = PaymentStatus::Voided;
        let result = ReversalEngine::void(
            &f.payment,
            &f.journal,
            "reason",
            |_| Ok(invoice.clone()),
            Utc::now(),
        );
        assert!(matches!(result, Err(LedgerError::InvalidStatus { .. })));
    }

    #[test]
    fn test_void_requires_reason() {
        let f = posted_fixture();
        let invoice = f.invoice.clone();

        for blank in ["", "   ", "\t"] {
            let result = ReversalEngine::void(
                &f.payment,
                &f.journal,
                blank,
                |_| Ok(invoice.clone()),
                Utc::now(),
            );
            assert!(matches!(result, Err(LedgerError::Validation(_))));
        }
    }

    #[test]
    fn test_void_restores_source_deposit() {
        let mut f = posted_fixture();
        let deposit_id = DepositId::new();
        f.payment.source = PaymentSource::Deposit(deposit_id);
        let invoice = f.invoice.clone();

        let outcome = ReversalEngine::void(
            &f.payment,
            &f.journal,
            "wrong deposit",
            |_| Ok(invoice.clone()),
            Utc::now(),
        )
        .unwrap();

        let restore = outcome.deposit_restore.unwrap();
        assert_eq!(restore.deposit_id, deposit_id);
        assert_eq!(restore.amount, 5_000_000);
    }

    #[test]
    fn test_void_invalidates_created_deposit() {
        let mut f = posted_fixture();
        let created = DepositId::new();
        f.payment.created_deposit_id = Some(created);
        let invoice = f.invoice.clone();

        let outcome = ReversalEngine::void(
            &f.payment,
            &f.journal,
            "customer refunded",
            |_| Ok(invoice.clone()),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(outcome.invalidate_deposit, Some(created));
    }

    #[test]
    fn test_void_rejects_mismatched_journal() {
        let mut f = posted_fixture();
        f.payment.journal_id = Some(JournalEntryId::new());
        let invoice = f.invoice.clone();

        let result = ReversalEngine::void(
            &f.payment,
            &f.journal,
            "reason",
            |_| Ok(invoice.clone()),
            Utc::now(),
        );
        assert!(matches!(result, Err(LedgerError::Internal(_))));
    }
}
