//! Property-based tests for the allocation engine.

use proptest::prelude::*;
use std::collections::HashMap;

use kasira_shared::types::{CustomerId, DepositId, InvoiceId, TenantId};

use super::allocation::AllocationEngine;
use super::types::{AllocationRequest, Deposit, Invoice, InvoiceStatus, PaymentSource};
use crate::ledger::error::LedgerError;

/// Strategy for a set of open invoices with a requested application against
/// each: `(remaining, requested)` pairs where the request never exceeds the
/// remaining balance.
fn valid_applications() -> impl Strategy<Value = Vec<(i64, i64)>> {
    prop::collection::vec(
        (1i64..10_000_000i64).prop_flat_map(|remaining| {
            (Just(remaining), 1i64..=remaining)
        }),
        1..8,
    )
}

fn build_invoices(applications: &[(i64, i64)]) -> (HashMap<InvoiceId, Invoice>, Vec<AllocationRequest>) {
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
    (invoices, requests)
}

fn no_deposit(id: DepositId) -> Result<Deposit, LedgerError> {
    Err(LedgerError::DepositNotFound(id))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// For any valid plan, `allocated + unapplied + discount == total`.
    #[test]
    fn prop_amounts_always_reconcile(
        applications in valid_applications(),
        discount in 0i64..1_000_000i64,
        extra in 0i64..2_000_000i64,
    ) {
        let (invoices, requests) = build_invoices(&applications);
        let allocated: i64 = requests.iter().map(|r| r.amount_applied).sum();
        let total = allocated + discount + extra;

        let plan = AllocationEngine::plan(
            total,
            discount,
            &requests,
            PaymentSource::Cash,
            |id| invoices.get(&id).cloned().ok_or(LedgerError::InvoiceNotFound(id)),
            no_deposit,
        )?;

        prop_assert_eq!(plan.allocated_amount, allocated);
        prop_assert_eq!(plan.unapplied_amount, extra);
        prop_assert_eq!(
            plan.allocated_amount + plan.unapplied_amount + plan.discount_amount,
            plan.total_amount
        );
    }

    /// Every planned allocation carries consistent snapshots and a status
    /// that matches the post-application balance.
    #[test]
    fn prop_allocation_snapshots_consistent(applications in valid_applications()) {
        let (invoices, requests) = build_invoices(&applications);
        let total: i64 = requests.iter().map(|r| r.amount_applied).sum();

        let plan = AllocationEngine::plan(
            total,
            0,
            &requests,
            PaymentSource::Cash,
            |id| invoices.get(&id).cloned().ok_or(LedgerError::InvoiceNotFound(id)),
            no_deposit,
        )?;

        for planned in &plan.allocations {
            prop_assert_eq!(
                planned.remaining_after,
                planned.remaining_before - planned.amount_applied
            );
            let invoice = &invoices[&planned.invoice_id];
            prop_assert_eq!(
                planned.new_status,
                InvoiceStatus::from_remaining(planned.remaining_after, invoice.amount)
            );
            prop_assert!(planned.remaining_after >= 0);
        }
    }

    /// Applying more than an invoice's remaining balance is always rejected,
    /// no matter the payment total.
    #[test]
    fn prop_over_allocation_always_rejected(
        remaining in 1i64..10_000_000i64,
        excess in 1i64..1_000_000i64,
    ) {
        let (invoices, _) = build_invoices(&[(remaining, 1)]);
        let invoice_id = *invoices.keys().next().unwrap();
        let requests = vec![AllocationRequest {
            invoice_id,
            amount_applied: remaining + excess,
        }];

        let result = AllocationEngine::plan(
            remaining + excess,
            0,
            &requests,
            PaymentSource::Cash,
            |id| invoices.get(&id).cloned().ok_or(LedgerError::InvoiceNotFound(id)),
            no_deposit,
        );

        prop_assert!(
            matches!(result, Err(LedgerError::OverAllocation { .. })),
            "expected OverAllocation, got {:?}",
            result
        );
    }

    /// A deposit draw never exceeds the deposit's remaining balance, and the
    /// plan fails cleanly when the deposit cannot cover the total.
    #[test]
    fn prop_deposit_draw_within_balance(
        remaining in 1i64..10_000_000i64,
        deposit_remaining in 1i64..10_000_000i64,
    ) {
        let (invoices, requests) = build_invoices(&[(remaining, remaining)]);
        let deposit = Deposit {
            id: DepositId::new(),
            tenant_id: TenantId::new(),
            customer_id: CustomerId::new(),
            initial_amount: deposit_remaining,
            remaining: deposit_remaining,
            is_active: true,
            source_payment_id: None,
            version: 1,
        };

        let result = AllocationEngine::plan(
            remaining,
            0,
            &requests,
            PaymentSource::Deposit(deposit.id),
            |id| invoices.get(&id).cloned().ok_or(LedgerError::InvoiceNotFound(id)),
            |_| Ok(deposit.clone()),
        );

        if deposit_remaining >= remaining {
            let plan = result?;
            let draw = plan.deposit_draw.unwrap();
            prop_assert_eq!(draw.amount, remaining);
            prop_assert!(draw.remaining_after >= 0);
        } else {
            prop_assert!(
                matches!(result, Err(LedgerError::InsufficientDeposit { .. })),
                "expected InsufficientDeposit, got {:?}",
                result
            );
        }
    }
}
