//! Receive-payment domain types.
//!
//! A payment is created in draft, posted into an immutable journal entry,
//! and voided (never deleted) once posted. Amounts are integer minor
//! currency units throughout.

use chrono::{DateTime, NaiveDate, Utc};
use kasira_shared::types::{
    AccountId, AllocationId, CustomerId, DepositId, InvoiceId, JournalEntryId, PaymentId,
    TenantId, UserId,
};
use serde::{Deserialize, Serialize};

/// How the customer paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash.
    Cash,
    /// Bank transfer.
    BankTransfer,
}

/// Where the settled funds are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source_type", content = "source_deposit_id", rename_all = "snake_case")]
pub enum PaymentSource {
    /// Fresh cash received into a bank/cash account.
    Cash,
    /// Drawn against an existing customer deposit balance.
    Deposit(DepositId),
}

/// Payment lifecycle status. Transitions are one-way:
/// `Draft` → `Posted` → `Voided`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Payment is being drafted and can be modified.
    Draft,
    /// Payment has been posted to the ledger (immutable).
    Posted,
    /// Payment has been voided (terminal, kept for audit).
    Voided,
}

impl PaymentStatus {
    /// Returns true if the payment can be modified.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Draft)
    }

    /// Returns true if the payment is immutable.
    #[must_use]
    pub fn is_immutable(&self) -> bool {
        matches!(self, Self::Posted | Self::Voided)
    }

    /// Returns true if the payment can be posted.
    #[must_use]
    pub fn can_post(&self) -> bool {
        matches!(self, Self::Draft)
    }

    /// Returns true if the payment can be voided.
    #[must_use]
    pub fn can_void(&self) -> bool {
        matches!(self, Self::Posted)
    }
}

/// Invoice settlement status, recalculated from the remaining balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    /// Nothing applied yet.
    Open,
    /// Partially settled.
    Partial,
    /// Fully settled.
    Paid,
}

impl InvoiceStatus {
    /// Derives the status from a remaining balance.
    #[must_use]
    pub fn from_remaining(remaining: i64, invoice_amount: i64) -> Self {
        if remaining == 0 {
            Self::Paid
        } else if remaining < invoice_amount {
            Self::Partial
        } else {
            Self::Open
        }
    }
}

/// An open invoice as seen by the allocation engine.
///
/// This is a read snapshot; the store owns the authoritative record and its
/// optimistic version counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    /// Unique identifier.
    pub id: InvoiceId,
    /// Tenant this invoice belongs to.
    pub tenant_id: TenantId,
    /// The invoiced customer.
    pub customer_id: CustomerId,
    /// Original invoice amount.
    pub amount: i64,
    /// Outstanding balance.
    pub remaining: i64,
    /// Due date; `None` means the invoice is never considered overdue.
    pub due_date: Option<NaiveDate>,
    /// Current settlement status.
    pub status: InvoiceStatus,
    /// Optimistic concurrency version.
    pub version: i64,
}

/// A customer advance-payment balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deposit {
    /// Unique identifier.
    pub id: DepositId,
    /// Tenant this deposit belongs to.
    pub tenant_id: TenantId,
    /// The customer who owns the balance.
    pub customer_id: CustomerId,
    /// Amount at creation.
    pub initial_amount: i64,
    /// Remaining balance available to draw.
    pub remaining: i64,
    /// False once invalidated (e.g. its creating payment was voided).
    pub is_active: bool,
    /// Set when the deposit was auto-created from a payment's overpayment.
    pub source_payment_id: Option<PaymentId>,
    /// Optimistic concurrency version.
    pub version: i64,
}

/// A link between one payment and one invoice.
///
/// Stores the invoice's remaining balance before and after the application
/// so that a later void can restore the exact pre-post state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Allocation {
    /// Unique identifier.
    pub id: AllocationId,
    /// Owning payment.
    pub payment_id: PaymentId,
    /// The invoice settled by this allocation.
    pub invoice_id: InvoiceId,
    /// Invoice remaining balance before application.
    pub remaining_before: i64,
    /// Amount applied to the invoice.
    pub amount_applied: i64,
    /// Invoice remaining balance after application.
    pub remaining_after: i64,
}

impl Allocation {
    /// Checks the allocation bookkeeping invariant.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.remaining_after == self.remaining_before - self.amount_applied
            && self.amount_applied <= self.remaining_before
            && self.amount_applied > 0
    }
}

/// A customer cash receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    /// Unique identifier.
    pub id: PaymentId,
    /// Tenant this payment belongs to.
    pub tenant_id: TenantId,
    /// Sequential human-readable number, e.g. `RCV-2026-0001`.
    pub number: String,
    /// The paying customer.
    pub customer_id: CustomerId,
    /// Business date of the payment.
    pub payment_date: NaiveDate,
    /// How the customer paid.
    pub method: PaymentMethod,
    /// Where the settled funds are drawn from.
    pub source: PaymentSource,
    /// Bank/cash account receiving the funds.
    pub bank_account_id: AccountId,
    /// Total settlement amount.
    pub total_amount: i64,
    /// Discount granted as part of the settlement.
    pub discount_amount: i64,
    /// Sum of invoice allocations (computed on post).
    pub allocated_amount: i64,
    /// Portion not matched to any invoice (computed on post).
    pub unapplied_amount: i64,
    /// Lifecycle status.
    pub status: PaymentStatus,
    /// Journal entry created on post.
    pub journal_id: Option<JournalEntryId>,
    /// Reversing journal entry created on void.
    pub void_journal_id: Option<JournalEntryId>,
    /// Deposit auto-created from the unapplied amount on post.
    pub created_deposit_id: Option<DepositId>,
    /// Reason supplied when the payment was voided.
    pub void_reason: Option<String>,
    /// When the payment was voided.
    pub voided_at: Option<DateTime<Utc>>,
    /// Who voided the payment.
    pub voided_by: Option<UserId>,
    /// User who created the payment.
    pub created_by: UserId,
    /// When the payment was created.
    pub created_at: DateTime<Utc>,
    /// When the payment was last updated.
    pub updated_at: DateTime<Utc>,
    /// Invoice allocations owned by this payment.
    #[serde(default)]
    pub allocations: Vec<Allocation>,
}

impl Payment {
    /// Checks the payment amount invariant:
    /// `allocated + unapplied + discount == total`.
    #[must_use]
    pub fn amounts_consistent(&self) -> bool {
        self.allocated_amount + self.unapplied_amount + self.discount_amount == self.total_amount
    }
}

/// A requested application of part of a payment to one invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationRequest {
    /// The invoice to settle.
    pub invoice_id: InvoiceId,
    /// Amount to apply, in minor units (must be positive).
    pub amount_applied: i64,
}

/// Input for creating a new payment.
#[derive(Debug, Clone)]
pub struct CreatePaymentInput {
    /// The tenant this payment belongs to.
    pub tenant_id: TenantId,
    /// The paying customer.
    pub customer_id: CustomerId,
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
    /// Caller-ordered invoice applications.
    pub allocations: Vec<AllocationRequest>,
    /// Keep the payment in draft instead of posting immediately.
    pub save_as_draft: bool,
    /// The user creating the payment.
    pub created_by: UserId,
}
