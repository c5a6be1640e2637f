//! Receive-payment domain logic.
//!
//! This module implements the payment lifecycle:
//! - Domain types for payments, invoices, deposits and allocations
//! - Allocation planning (matching a payment against open invoices)
//! - Posting (turning a plan into a balanced journal entry)
//! - Reversal (voiding a posted payment with a mirrored entry)
//! - Sequential payment numbering

pub mod allocation;
pub mod posting;
pub mod reversal;
pub mod sequence;
pub mod types;

#[cfg(test)]
mod allocation_props;
#[cfg(test)]
mod posting_props;

pub use allocation::{AllocationEngine, AllocationPlan, DepositDraw, PlannedAllocation};
pub use posting::{
    DepositDecrement, InvoiceUpdate, PostingAccounts, PostingEngine, PostingOutcome,
};
pub use reversal::{DepositRestore, InvoiceRestore, ReversalEngine, VoidOutcome};
pub use sequence::{NumberSequence, PaymentNumber};
pub use types::{
    Allocation, AllocationRequest, CreatePaymentInput, Deposit, Invoice, InvoiceStatus, Payment,
    PaymentMethod, PaymentSource, PaymentStatus,
};
