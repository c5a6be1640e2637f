//! Property-based tests for posting and reversal.

use proptest::prelude::*;
use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use kasira_shared::types::{AccountId, CustomerId, InvoiceId, PaymentId, TenantId, UserId};

use super::allocation::AllocationEngine;
use super::posting::{PostingAccounts, PostingEngine};
use super::reversal::ReversalEngine;
use super::types::{
    AllocationRequest, Deposit, Invoice, InvoiceStatus, Payment, PaymentMethod, PaymentSource,
    PaymentStatus,
};
use crate::ledger::error::LedgerError;

fn valid_applications() -> impl Strategy<Value = Vec<(i64, i64)>> {
    prop::collection::vec(
        (1i64..10_000_000i64).prop_flat_map(|remaining| {
            (Just(remaining), 1i64..=remaining)
        }),
        1..6,
    )
}

struct Scenario {
    invoices: HashMap<InvoiceId, Invoice>,
    requests: Vec<AllocationRequest>,
    payment: Payment,
    accounts: PostingAccounts,
}

fn build_scenario(applications: &[(i64, i64)], discount: i64, extra: i64) -> Scenario {
    let tenant_id = TenantId::new();
    let customer_id = CustomerId::new();
    let mut invoices = HashMap::new();
    let mut requests = Vec::new();
    for &(remaining, requested) in applications {
        let invoice = Invoice {
            id: InvoiceId::new(),
            tenant_id,
            customer_id,
            amount: remaining,
            remaining,
            due_date: None,
            status: InvoiceStatus::Open,
            version: 1,
        };
        requests.push(AllocationRequest {
            invoice_id: invoice.id,
            amount_applied: requested,
        });
        invoices.insert(invoice.id, invoice);
    }
    let allocated: i64 = requests.iter().map(|r| r.amount_applied).sum();
    let total = allocated + discount + extra;

    let now = Utc::now();
    let payment = Payment {
        id: PaymentId::new(),
        tenant_id,
        number: "RCV-2026-0001".to_string(),
        customer_id,
        payment_date: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
        method: PaymentMethod::BankTransfer,
        source: PaymentSource::Cash,
        bank_account_id: AccountId::new(),
        total_amount: total,
        discount_amount: discount,
        allocated_amount: 0,
        unapplied_amount: 0,
        status: PaymentStatus::Draft,
        journal_id: None,
        void_journal_id: None,
        created_deposit_id: None,
        void_reason: None,
        voided_at: None,
        voided_by: None,
        created_by: UserId::new(),
        created_at: now,
        updated_at: now,
        allocations: vec![],
    };

    Scenario {
        invoices,
        requests,
        payment,
        accounts: PostingAccounts {
            bank: AccountId::new(),
            accounts_receivable: AccountId::new(),
            payment_discount: AccountId::new(),
            customer_deposits: AccountId::new(),
        },
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every journal entry produced by posting is balanced.
    #[test]
    fn prop_posted_journal_always_balanced(
        applications in valid_applications(),
        discount in 0i64..1_000_000i64,
        extra in 0i64..2_000_000i64,
    ) {
        let scenario = build_scenario(&applications, discount, extra);
        let plan = AllocationEngine::plan(
            scenario.payment.total_amount,
            discount,
            &scenario.requests,
            PaymentSource::Cash,
            |id| scenario.invoices.get(&id).cloned().ok_or(LedgerError::InvoiceNotFound(id)),
            |id| Err::<Deposit, _>(LedgerError::DepositNotFound(id)),
        )?;

        let outcome =
            PostingEngine::post(&scenario.payment, &plan, &scenario.accounts, Utc::now())?;

        prop_assert!(outcome.journal.is_balanced());
        prop_assert_eq!(
            outcome.journal.total_debit(),
            scenario.payment.total_amount
        );
        prop_assert_eq!(
            outcome.allocated_amount + outcome.unapplied_amount + discount,
            scenario.payment.total_amount
        );
        // An overpayment residual always becomes a deposit, and only then.
        prop_assert_eq!(outcome.created_deposit.is_some(), extra > 0);
    }

    /// Posting then voiding restores every invoice to its original balance,
    /// and the reversing journal mirrors the original exactly.
    #[test]
    fn prop_void_is_exact_inverse_of_post(
        applications in valid_applications(),
        discount in 0i64..1_000_000i64,
        extra in 0i64..2_000_000i64,
    ) {
        let scenario = build_scenario(&applications, discount, extra);
        let plan = AllocationEngine::plan(
            scenario.payment.total_amount,
            discount,
            &scenario.requests,
            PaymentSource::Cash,
            |id| scenario.invoices.get(&id).cloned().ok_or(LedgerError::InvoiceNotFound(id)),
            |id| Err::<Deposit, _>(LedgerError::DepositNotFound(id)),
        )?;
        let outcome =
            PostingEngine::post(&scenario.payment, &plan, &scenario.accounts, Utc::now())?;

        // The posted payment, as the store would persist it.
        let mut posted = scenario.payment.clone();
        posted.status = PaymentStatus::Posted;
        posted.journal_id = Some(outcome.journal.id);
        posted.allocated_amount = outcome.allocated_amount;
        posted.unapplied_amount = outcome.unapplied_amount;
        posted.created_deposit_id = outcome.created_deposit.as_ref().map(|d| d.id);
        posted.allocations = outcome.allocations.clone();

        let void = ReversalEngine::void(
            &posted,
            &outcome.journal,
            "property check",
            |id| scenario.invoices.get(&id).cloned().ok_or(LedgerError::InvoiceNotFound(id)),
            Utc::now(),
        )?;

        prop_assert!(void.journal.is_balanced());
        prop_assert_eq!(void.journal.total_debit(), outcome.journal.total_credit());

        // Each touched invoice goes back to its pre-post balance and status.
        for restore in &void.invoice_restores {
            let original = &scenario.invoices[&restore.invoice_id];
            prop_assert_eq!(restore.remaining, original.remaining);
            prop_assert_eq!(
                restore.status,
                InvoiceStatus::from_remaining(original.remaining, original.amount)
            );
        }
        prop_assert_eq!(void.invalidate_deposit, posted.created_deposit_id);
    }
}
