//! Allocation engine: distributes a payment across open invoices.
//!
//! This stage is pure computation. It validates the requested applications
//! against invoice and deposit snapshots and produces an allocation plan;
//! no ledger state is mutated until the posting stage commits.

use std::collections::HashMap;

use kasira_shared::types::{DepositId, InvoiceId};

use super::types::{AllocationRequest, Deposit, Invoice, InvoiceStatus, PaymentSource};
use crate::ledger::error::LedgerError;

/// One planned invoice application, with pre/post snapshots.
#[derive(Debug, Clone)]
pub struct PlannedAllocation {
    /// The invoice to settle.
    pub invoice_id: InvoiceId,
    /// Invoice remaining balance before this application.
    pub remaining_before: i64,
    /// Amount applied.
    pub amount_applied: i64,
    /// Invoice remaining balance after this application.
    pub remaining_after: i64,
    /// Status the invoice will transition to.
    pub new_status: InvoiceStatus,
    /// Invoice version observed at planning time.
    pub invoice_version: i64,
}

/// Planned draw against an existing customer deposit.
#[derive(Debug, Clone)]
pub struct DepositDraw {
    /// The deposit being consumed.
    pub deposit_id: DepositId,
    /// Deposit remaining balance before the draw.
    pub remaining_before: i64,
    /// Amount drawn.
    pub amount: i64,
    /// Deposit remaining balance after the draw.
    pub remaining_after: i64,
    /// Deposit version observed at planning time.
    pub deposit_version: i64,
}

/// A finalized allocation plan for one payment.
#[derive(Debug, Clone)]
pub struct AllocationPlan {
    /// Total settlement amount.
    pub total_amount: i64,
    /// Discount granted.
    pub discount_amount: i64,
    /// Sum of invoice applications.
    pub allocated_amount: i64,
    /// Residual not matched to any invoice; if positive, an overpayment
    /// convertible into a customer deposit.
    pub unapplied_amount: i64,
    /// Planned invoice applications, in caller order.
    pub allocations: Vec<PlannedAllocation>,
    /// Planned deposit draw when the payment source is a deposit.
    pub deposit_draw: Option<DepositDraw>,
}

/// Allocation engine.
///
/// Contains pure planning logic with no storage dependencies; lookups are
/// supplied as closures by the caller.
pub struct AllocationEngine;

impl AllocationEngine {
    /// Validates the requested applications and produces an allocation plan.
    ///
    /// Validation order is fail-fast and mutation-free:
    /// 1. Total must be positive, discount non-negative.
    /// 2. Each requested amount must be positive and within the invoice's
    ///    remaining balance (cumulative when an invoice appears repeatedly).
    /// 3. Allocations plus discount must not exceed the total.
    /// 4. A deposit source must cover the full total.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` if any rule fails; nothing is mutated.
    pub fn plan<I, D>(
        total_amount: i64,
        discount_amount: i64,
        requests: &[AllocationRequest],
        source: PaymentSource,
        invoice_lookup: I,
        deposit_lookup: D,
    ) -> Result<AllocationPlan, LedgerError>
    where
        I: Fn(InvoiceId) -> Result<Invoice, LedgerError>,
        D: Fn(DepositId) -> Result<Deposit, LedgerError>,
    {
        if total_amount <= 0 {
            return Err(LedgerError::Validation(
                "payment total must be positive".to_string(),
            ));
        }
        if discount_amount < 0 {
            return Err(LedgerError::Validation(
                "discount amount must not be negative".to_string(),
            ));
        }

        // Track each invoice's running remaining balance so repeated
        // applications to the same invoice validate against the
        // already-reduced value.
        let mut remaining_by_invoice: HashMap<InvoiceId, (i64, i64, i64)> = HashMap::new();
        let mut allocations = Vec::with_capacity(requests.len());
        let mut allocated_amount: i64 = 0;

        for request in requests {
            if request.amount_applied <= 0 {
                return Err(LedgerError::Validation(
                    "allocation amount must be positive".to_string(),
                ));
            }

            let (remaining, invoice_amount, version) =
                match remaining_by_invoice.get(&request.invoice_id) {
                    Some(&cached) => cached,
                    None => {
                        let invoice = invoice_lookup(request.invoice_id)?;
                        (invoice.remaining, invoice.amount, invoice.version)
                    }
                };

            if request.amount_applied > remaining {
                return Err(LedgerError::OverAllocation {
                    invoice_id: request.invoice_id,
                    requested: request.amount_applied,
                    remaining,
                });
            }

            let remaining_after = remaining - request.amount_applied;
            allocations.push(PlannedAllocation {
                invoice_id: request.invoice_id,
                remaining_before: remaining,
                amount_applied: request.amount_applied,
                remaining_after,
                new_status: InvoiceStatus::from_remaining(remaining_after, invoice_amount),
                invoice_version: version,
            });
            remaining_by_invoice
                .insert(request.invoice_id, (remaining_after, invoice_amount, version));
            allocated_amount += request.amount_applied;
        }

        let applied = allocated_amount + discount_amount;
        if applied > total_amount {
            return Err(LedgerError::PaymentOverAllocated {
                applied,
                total: total_amount,
            });
        }
        let unapplied_amount = total_amount - applied;

        let deposit_draw = match source {
            PaymentSource::Cash => None,
            PaymentSource::Deposit(deposit_id) => {
                let deposit = deposit_lookup(deposit_id)?;
                if !deposit.is_active {
                    return Err(LedgerError::Validation(format!(
                        "deposit {deposit_id} is no longer active"
                    )));
                }
                if deposit.remaining < total_amount {
                    return Err(LedgerError::InsufficientDeposit {
                        deposit_id,
                        requested: total_amount,
                        remaining: deposit.remaining,
                    });
                }
                // The draw excludes the discount: only the net settlement
                // leaves the deposit balance.
                let amount = total_amount - discount_amount;
                Some(DepositDraw {
                    deposit_id,
                    remaining_before: deposit.remaining,
                    amount,
                    remaining_after: deposit.remaining - amount,
                    deposit_version: deposit.version,
                })
            }
        };

        Ok(AllocationPlan {
            total_amount,
            discount_amount,
            allocated_amount,
            unapplied_amount,
            allocations,
            deposit_draw,
        })
    }
}
