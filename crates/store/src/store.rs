//! The ledger store.
//!
//! All mutating operations take the write lock once, run every validation
//! against the locked state, and only then apply the engine's change-set.
//! Version re-checks guard the apply step: a mismatch means another commit
//! touched an entity between snapshot and apply, and the whole operation
//! fails with `ConcurrentModification` so the caller can retry.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{Datelike, NaiveDate, Utc};
use tracing::{info, warn};

use kasira_core::ledger::error::LedgerError;
use kasira_core::payment::{
    AllocationEngine, AllocationPlan, AllocationRequest, CreatePaymentInput, Deposit, Invoice,
    NumberSequence, Payment, PaymentMethod, PaymentNumber, PaymentSource, PaymentStatus,
    PostingAccounts, PostingEngine, ReversalEngine,
};
use kasira_core::reports::{
    Account, AccountStatement, AgingService, AgingSummary, OpenItem, ReportError,
    StatementEntry, StatementService,
};
use kasira_shared::config::AppConfig;
use kasira_shared::types::{
    AccountId, Currency, CustomerId, DepositId, InvoiceId, PageRequest, PaymentId, TenantId,
    UserId,
};

use crate::state::{Customer, State};

/// Fields of a draft payment that can be replaced before posting.
#[derive(Debug, Clone)]
pub struct UpdateDraftInput {
    /// Business date of the payment.
    pub payment_date: NaiveDate,
    /// How the customer paid.
    pub payment_method: PaymentMethod,
    /// Bank/cash account receiving the funds.
    pub bank_account_id: AccountId,
    /// Total settlement amount in minor units.
    pub total_amount: i64,
    /// Discount granted as part of the settlement.
    pub discount_amount: i64,
    /// Where the settled funds are drawn from.
    pub source: PaymentSource,
    /// Replacement invoice applications.
    pub allocations: Vec<AllocationRequest>,
}

/// In-memory transactional ledger store.
pub struct LedgerStore {
    state: RwLock<State>,
    prefix: String,
    pad_width: usize,
    brackets: Vec<u32>,
    currency: Currency,
}

impl LedgerStore {
    /// Creates an empty store configured from application settings.
    #[must_use]
    pub fn new(config: &AppConfig) -> Self {
        Self {
            state: RwLock::new(State::default()),
            prefix: config.sequence.prefix.clone(),
            pad_width: config.sequence.pad_width,
            brackets: config.aging.normalized_brackets(),
            currency: config.report.currency,
        }
    }

    // ------------------------------------------------------------------
    // Master data
    // ------------------------------------------------------------------

    /// Inserts a customer record.
    ///
    /// # Errors
    ///
    /// Returns an error if the state lock is poisoned.
    pub fn insert_customer(&self, customer: Customer) -> Result<(), LedgerError> {
        let mut state = self.write_state()?;
        state.customers.insert(customer.id, customer);
        Ok(())
    }

    /// Inserts a chart-of-accounts entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the state lock is poisoned.
    pub fn insert_account(&self, account: Account) -> Result<(), LedgerError> {
        let mut state = self.write_state()?;
        state.accounts.insert(account.id, account);
        Ok(())
    }

    /// Inserts an open invoice.
    ///
    /// # Errors
    ///
    /// Returns an error if the state lock is poisoned.
    pub fn insert_invoice(&self, invoice: Invoice) -> Result<(), LedgerError> {
        let mut state = self.write_state()?;
        state.invoices.insert(invoice.id, invoice);
        Ok(())
    }

    /// Inserts a customer deposit.
    ///
    /// # Errors
    ///
    /// Returns an error if the state lock is poisoned.
    pub fn insert_deposit(&self, deposit: Deposit) -> Result<(), LedgerError> {
        let mut state = self.write_state()?;
        state.deposits.insert(deposit.id, deposit);
        Ok(())
    }

    /// Fetches a payment by id.
    ///
    /// # Errors
    ///
    /// Returns `PaymentNotFound` when the payment does not exist.
    pub fn payment(&self, id: PaymentId) -> Result<Payment, LedgerError> {
        let state = self.read_state()?;
        state
            .payments
            .get(&id)
            .cloned()
            .ok_or(LedgerError::PaymentNotFound(id))
    }

    /// Fetches an invoice by id.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceNotFound` when the invoice does not exist.
    pub fn invoice(&self, id: InvoiceId) -> Result<Invoice, LedgerError> {
        let state = self.read_state()?;
        state
            .invoices
            .get(&id)
            .cloned()
            .ok_or(LedgerError::InvoiceNotFound(id))
    }

    /// Fetches a deposit by id.
    ///
    /// # Errors
    ///
    /// Returns `DepositNotFound` when the deposit does not exist.
    pub fn deposit(&self, id: DepositId) -> Result<Deposit, LedgerError> {
        let state = self.read_state()?;
        state
            .deposits
            .get(&id)
            .cloned()
            .ok_or(LedgerError::DepositNotFound(id))
    }

    // ------------------------------------------------------------------
    // Payment lifecycle
    // ------------------------------------------------------------------

    /// Creates a payment in draft, or posts it in the same call when
    /// `save_as_draft` is false.
    ///
    /// The allocation engine validates the whole request before the draft
    /// is stored, so an invalid payment never lands at all. The payment
    /// number is assigned from the tenant/year counter under the same
    /// write lock that stores the draft.
    ///
    /// # Errors
    ///
    /// Returns the first validation or lookup failure; nothing is stored
    /// in that case.
    pub fn create_payment(
        &self,
        input: CreatePaymentInput,
        accounts: &PostingAccounts,
    ) -> Result<Payment, LedgerError> {
        let now = Utc::now();
        let mut state = self.write_state()?;

        let customer = state
            .customers
            .get(&input.customer_id)
            .ok_or(LedgerError::CustomerNotFound(input.customer_id))?;
        if customer.tenant_id != input.tenant_id {
            return Err(LedgerError::CustomerNotFound(input.customer_id));
        }
        if !state.accounts.contains_key(&input.bank_account_id) {
            return Err(LedgerError::AccountNotFound(input.bank_account_id));
        }

        let plan = plan_against(
            &state,
            input.tenant_id,
            input.customer_id,
            input.total_amount,
            input.discount_amount,
            &input.allocations,
            input.source,
        )?;

        let year = input.payment_date.year();
        let sequence = state
            .sequences
            .entry((input.tenant_id, year))
            .or_insert_with(|| NumberSequence::new(input.tenant_id, year))
            .next(year);
        let number = PaymentNumber::format(&self.prefix, year, sequence, self.pad_width);

        let payment_id = PaymentId::new();
        let payment = Payment {
            id: payment_id,
            tenant_id: input.tenant_id,
            number,
            customer_id: input.customer_id,
            payment_date: input.payment_date,
            method: input.payment_method,
            source: input.source,
            bank_account_id: input.bank_account_id,
            total_amount: input.total_amount,
            discount_amount: input.discount_amount,
            allocated_amount: plan.allocated_amount,
            unapplied_amount: plan.unapplied_amount,
            status: PaymentStatus::Draft,
            journal_id: None,
            void_journal_id: None,
            created_deposit_id: None,
            void_reason: None,
            voided_at: None,
            voided_by: None,
            created_by: input.created_by,
            created_at: now,
            updated_at: now,
            allocations: draft_allocations(payment_id, &plan),
        };
        info!(
            payment_id = %payment.id,
            number = %payment.number,
            "Payment created"
        );
        state.payments.insert(payment_id, payment);

        if !input.save_as_draft {
            if let Err(err) = post_locked(&mut state, payment_id, accounts) {
                // Keep create-and-post atomic: the draft goes away too.
                state.payments.remove(&payment_id);
                return Err(err);
            }
        }

        state
            .payments
            .get(&payment_id)
            .cloned()
            .ok_or(LedgerError::PaymentNotFound(payment_id))
    }

    /// Replaces the mutable fields of a draft payment.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStatus` unless the payment is still in draft, or
    /// the first validation failure of the new allocation set.
    pub fn update_draft_payment(
        &self,
        id: PaymentId,
        input: UpdateDraftInput,
    ) -> Result<Payment, LedgerError> {
        let now = Utc::now();
        let mut state = self.write_state()?;

        let payment = state
            .payments
            .get(&id)
            .ok_or(LedgerError::PaymentNotFound(id))?;
        if !payment.status.is_editable() {
            return Err(LedgerError::InvalidStatus {
                operation: "update",
                actual: payment.status,
            });
        }
        let tenant_id = payment.tenant_id;
        let customer_id = payment.customer_id;
        if !state.accounts.contains_key(&input.bank_account_id) {
            return Err(LedgerError::AccountNotFound(input.bank_account_id));
        }

        let plan = plan_against(
            &state,
            tenant_id,
            customer_id,
            input.total_amount,
            input.discount_amount,
            &input.allocations,
            input.source,
        )?;

        let payment = state
            .payments
            .get_mut(&id)
            .ok_or(LedgerError::PaymentNotFound(id))?;
        payment.payment_date = input.payment_date;
        payment.method = input.payment_method;
        payment.bank_account_id = input.bank_account_id;
        payment.total_amount = input.total_amount;
        payment.discount_amount = input.discount_amount;
        payment.source = input.source;
        payment.allocated_amount = plan.allocated_amount;
        payment.unapplied_amount = plan.unapplied_amount;
        payment.allocations = draft_allocations(id, &plan);
        payment.updated_at = now;
        Ok(payment.clone())
    }

    /// Deletes a draft payment and its allocations.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStatus` for posted or voided payments: those are
    /// audit records and can never be deleted.
    pub fn delete_draft_payment(&self, id: PaymentId) -> Result<(), LedgerError> {
        let mut state = self.write_state()?;
        let payment = state
            .payments
            .get(&id)
            .ok_or(LedgerError::PaymentNotFound(id))?;
        if !payment.status.is_editable() {
            return Err(LedgerError::InvalidStatus {
                operation: "delete",
                actual: payment.status,
            });
        }
        state.payments.remove(&id);
        Ok(())
    }

    /// Posts a draft payment to the ledger.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStatus` unless the payment is in draft,
    /// `ConcurrentModification` when a touched entity changed since the
    /// plan snapshot, or any validation failure. Nothing is applied on
    /// error.
    pub fn post_payment(
        &self,
        id: PaymentId,
        accounts: &PostingAccounts,
    ) -> Result<Payment, LedgerError> {
        let mut state = self.write_state()?;
        post_locked(&mut state, id, accounts)?;
        state
            .payments
            .get(&id)
            .cloned()
            .ok_or(LedgerError::PaymentNotFound(id))
    }

    /// Voids a posted payment.
    ///
    /// Creates the reversing journal entry, restores invoice balances to
    /// their pre-post snapshots, returns any drawn deposit amount, and
    /// invalidates a deposit the payment created from an overpayment.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStatus` unless the payment is posted,
    /// `ConcurrentModification` when a touched invoice moved since the
    /// post, and `Validation` when an overpayment deposit has already
    /// been partially consumed. Nothing is applied on error.
    pub fn void_payment(
        &self,
        id: PaymentId,
        reason: &str,
        voided_by: UserId,
    ) -> Result<Payment, LedgerError> {
        let now = Utc::now();
        let mut state = self.write_state()?;

        let payment = state
            .payments
            .get(&id)
            .cloned()
            .ok_or(LedgerError::PaymentNotFound(id))?;
        let journal = payment
            .journal_id
            .and_then(|journal_id| {
                state
                    .journals
                    .iter()
                    .find(|j| j.entry.id == journal_id)
                    .map(|j| j.entry.clone())
            })
            .ok_or_else(|| {
                LedgerError::Internal(format!("journal entry missing for payment {id}"))
            })?;

        let outcome = ReversalEngine::void(
            &payment,
            &journal,
            reason,
            |invoice_id| lookup_invoice(&state, payment.tenant_id, payment.customer_id, invoice_id),
            now,
        )?;

        // Verify everything before the first mutation.
        for restore in &outcome.invoice_restores {
            let invoice = state
                .invoices
                .get(&restore.invoice_id)
                .ok_or(LedgerError::InvoiceNotFound(restore.invoice_id))?;
            if invoice.remaining != restore.expected_remaining {
                warn!(
                    payment_id = %id,
                    invoice_id = %restore.invoice_id,
                    "Invoice changed since posting, void rejected"
                );
                return Err(LedgerError::ConcurrentModification);
            }
        }
        if let Some(deposit_id) = outcome.invalidate_deposit {
            let deposit = state
                .deposits
                .get(&deposit_id)
                .ok_or(LedgerError::DepositNotFound(deposit_id))?;
            if deposit.remaining != deposit.initial_amount {
                return Err(LedgerError::Validation(format!(
                    "deposit {deposit_id} created by this payment has been partially consumed"
                )));
            }
        }
        if let Some(restore) = &outcome.deposit_restore {
            if !state.deposits.contains_key(&restore.deposit_id) {
                return Err(LedgerError::DepositNotFound(restore.deposit_id));
            }
        }

        // Apply.
        for restore in &outcome.invoice_restores {
            if let Some(invoice) = state.invoices.get_mut(&restore.invoice_id) {
                invoice.remaining = restore.remaining;
                invoice.status = restore.status;
                invoice.version += 1;
            }
        }
        if let Some(deposit_id) = outcome.invalidate_deposit {
            if let Some(deposit) = state.deposits.get_mut(&deposit_id) {
                deposit.is_active = false;
                deposit.remaining = 0;
                deposit.version += 1;
            }
        }
        if let Some(restore) = &outcome.deposit_restore {
            if let Some(deposit) = state.deposits.get_mut(&restore.deposit_id) {
                deposit.remaining += restore.amount;
                deposit.version += 1;
            }
        }
        let void_journal_id = outcome.journal.id;
        state.push_journal(outcome.journal);

        let payment = state
            .payments
            .get_mut(&id)
            .ok_or(LedgerError::PaymentNotFound(id))?;
        payment.status = PaymentStatus::Voided;
        payment.void_journal_id = Some(void_journal_id);
        payment.void_reason = Some(reason.trim().to_string());
        payment.voided_at = Some(outcome.voided_at);
        payment.voided_by = Some(voided_by);
        payment.updated_at = now;
        info!(
            payment_id = %id,
            number = %payment.number,
            "Payment voided"
        );
        Ok(payment.clone())
    }

    // ------------------------------------------------------------------
    // Reports
    // ------------------------------------------------------------------

    /// Builds a paginated statement for one account over a date range.
    ///
    /// Only committed journal entries are visible.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` for an unknown account and `Validation`
    /// for an inverted date range.
    pub fn account_statement(
        &self,
        account_id: AccountId,
        period_start: NaiveDate,
        period_end: NaiveDate,
        page: &PageRequest,
    ) -> Result<AccountStatement, LedgerError> {
        let state = self.read_state()?;
        let account = state
            .accounts
            .get(&account_id)
            .ok_or(LedgerError::AccountNotFound(account_id))?;

        let entries: Vec<StatementEntry> = state
            .journals
            .iter()
            .flat_map(|stored| {
                stored
                    .entry
                    .lines
                    .iter()
                    .filter(|line| line.account_id == account_id)
                    .map(|line| StatementEntry {
                        journal_id: stored.entry.id,
                        entry_date: stored.entry.entry_date,
                        sequence: stored.sequence,
                        description: stored.entry.description.clone(),
                        entry_type: line.entry_type,
                        amount: line.amount,
                    })
            })
            .collect();

        StatementService::account_statement(
            account,
            self.currency,
            &entries,
            period_start,
            period_end,
            page,
        )
        .map_err(|err| match err {
            ReportError::AccountNotFound(id) => LedgerError::AccountNotFound(id),
            ReportError::InvalidDateRange { .. } => LedgerError::Validation(err.to_string()),
        })
    }

    /// Summarizes a tenant's open receivables by days overdue.
    ///
    /// # Errors
    ///
    /// Returns an error if the state lock is poisoned.
    pub fn receivables_aging(
        &self,
        tenant_id: TenantId,
        as_of: NaiveDate,
    ) -> Result<AgingSummary, LedgerError> {
        let state = self.read_state()?;
        let items: Vec<OpenItem> = state
            .invoices
            .values()
            .filter(|invoice| invoice.tenant_id == tenant_id && invoice.remaining > 0)
            .map(|invoice| OpenItem {
                invoice_id: invoice.id,
                customer_id: invoice.customer_id,
                remaining: invoice.remaining,
                due_date: invoice.due_date,
                is_partial: invoice.status == kasira_core::payment::InvoiceStatus::Partial,
            })
            .collect();
        Ok(AgingService::aging_summary(
            &items,
            self.currency,
            as_of,
            &self.brackets,
        ))
    }

    // ------------------------------------------------------------------
    // Lock plumbing
    // ------------------------------------------------------------------

    fn read_state(&self) -> Result<RwLockReadGuard<'_, State>, LedgerError> {
        self.state
            .read()
            .map_err(|_| LedgerError::Internal("state lock poisoned".to_string()))
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, State>, LedgerError> {
        self.state
            .write()
            .map_err(|_| LedgerError::Internal("state lock poisoned".to_string()))
    }
}

/// Runs the allocation engine against locked state.
fn plan_against(
    state: &State,
    tenant_id: TenantId,
    customer_id: CustomerId,
    total_amount: i64,
    discount_amount: i64,
    requests: &[AllocationRequest],
    source: PaymentSource,
) -> Result<AllocationPlan, LedgerError> {
    AllocationEngine::plan(
        total_amount,
        discount_amount,
        requests,
        source,
        |id| lookup_invoice(state, tenant_id, customer_id, id),
        |id| lookup_deposit(state, tenant_id, customer_id, id),
    )
}

fn lookup_invoice(
    state: &State,
    tenant_id: TenantId,
    customer_id: CustomerId,
    id: InvoiceId,
) -> Result<Invoice, LedgerError> {
    let invoice = state
        .invoices
        .get(&id)
        .ok_or(LedgerError::InvoiceNotFound(id))?;
    // Cross-tenant ids are indistinguishable from unknown ids.
    if invoice.tenant_id != tenant_id {
        return Err(LedgerError::InvoiceNotFound(id));
    }
    if invoice.customer_id != customer_id {
        return Err(LedgerError::Validation(format!(
            "invoice {id} belongs to a different customer"
        )));
    }
    Ok(invoice.clone())
}

fn lookup_deposit(
    state: &State,
    tenant_id: TenantId,
    customer_id: CustomerId,
    id: DepositId,
) -> Result<Deposit, LedgerError> {
    let deposit = state
        .deposits
        .get(&id)
        .ok_or(LedgerError::DepositNotFound(id))?;
    if deposit.tenant_id != tenant_id {
        return Err(LedgerError::DepositNotFound(id));
    }
    if deposit.customer_id != customer_id {
        return Err(LedgerError::Validation(format!(
            "deposit {id} belongs to a different customer"
        )));
    }
    Ok(deposit.clone())
}

/// Materializes a plan's applications as allocation rows on a draft.
fn draft_allocations(
    payment_id: PaymentId,
    plan: &AllocationPlan,
) -> Vec<kasira_core::payment::Allocation> {
    plan.allocations
        .iter()
        .map(|planned| kasira_core::payment::Allocation {
            id: kasira_shared::types::AllocationId::new(),
            payment_id,
            invoice_id: planned.invoice_id,
            remaining_before: planned.remaining_before,
            amount_applied: planned.amount_applied,
            remaining_after: planned.remaining_after,
        })
        .collect()
}

/// Posts a draft payment against already-locked state.
fn post_locked(
    state: &mut State,
    id: PaymentId,
    accounts: &PostingAccounts,
) -> Result<(), LedgerError> {
    let now = Utc::now();
    let payment = state
        .payments
        .get(&id)
        .cloned()
        .ok_or(LedgerError::PaymentNotFound(id))?;

    // Re-plan from current state so posting always works against live
    // balances, not the ones the draft was created with.
    let requests: Vec<AllocationRequest> = payment
        .allocations
        .iter()
        .map(|a| AllocationRequest {
            invoice_id: a.invoice_id,
            amount_applied: a.amount_applied,
        })
        .collect();
    let plan = plan_against(
        state,
        payment.tenant_id,
        payment.customer_id,
        payment.total_amount,
        payment.discount_amount,
        &requests,
        payment.source,
    )?;

    let outcome = match PostingEngine::post(&payment, &plan, accounts, now) {
        Ok(outcome) => outcome,
        Err(err) => {
            if matches!(err, LedgerError::LedgerImbalance { .. }) {
                warn!(payment_id = %id, error = %err, "Journal imbalance, posting aborted");
            }
            return Err(err);
        }
    };

    // Verify versions before the first mutation.
    for update in &outcome.invoice_updates {
        let invoice = state
            .invoices
            .get(&update.invoice_id)
            .ok_or(LedgerError::InvoiceNotFound(update.invoice_id))?;
        if invoice.version != update.expected_version {
            warn!(
                payment_id = %id,
                invoice_id = %update.invoice_id,
                "Invoice version moved during posting"
            );
            return Err(LedgerError::ConcurrentModification);
        }
    }
    if let Some(decrement) = &outcome.deposit_decrement {
        let deposit = state
            .deposits
            .get(&decrement.deposit_id)
            .ok_or(LedgerError::DepositNotFound(decrement.deposit_id))?;
        if deposit.version != decrement.expected_version {
            warn!(
                payment_id = %id,
                deposit_id = %decrement.deposit_id,
                "Deposit version moved during posting"
            );
            return Err(LedgerError::ConcurrentModification);
        }
    }

    // Apply.
    for update in &outcome.invoice_updates {
        if let Some(invoice) = state.invoices.get_mut(&update.invoice_id) {
            invoice.remaining = update.remaining;
            invoice.status = update.status;
            invoice.version += 1;
        }
    }
    if let Some(decrement) = &outcome.deposit_decrement {
        if let Some(deposit) = state.deposits.get_mut(&decrement.deposit_id) {
            deposit.remaining -= decrement.amount;
            deposit.version += 1;
        }
    }
    let created_deposit_id = outcome.created_deposit.as_ref().map(|d| d.id);
    if let Some(deposit) = outcome.created_deposit {
        state.deposits.insert(deposit.id, deposit);
    }
    let journal_id = outcome.journal.id;
    state.push_journal(outcome.journal);

    let payment = state
        .payments
        .get_mut(&id)
        .ok_or(LedgerError::PaymentNotFound(id))?;
    payment.status = PaymentStatus::Posted;
    payment.journal_id = Some(journal_id);
    payment.allocated_amount = outcome.allocated_amount;
    payment.unapplied_amount = outcome.unapplied_amount;
    payment.created_deposit_id = created_deposit_id;
    payment.allocations = outcome.allocations;
    payment.updated_at = now;
    info!(
        payment_id = %id,
        number = %payment.number,
        journal_id = %journal_id,
        "Payment posted"
    );
    Ok(())
}
