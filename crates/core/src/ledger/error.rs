//! Ledger error types for validation and state errors.
//!
//! This module defines all errors that can occur during receive-payment
//! operations: input validation, missing references, allocation limits,
//! lifecycle state violations, and the fatal ledger-imbalance class.

use kasira_shared::types::{AccountId, CustomerId, DepositId, InvoiceId, PaymentId};
use thiserror::Error;

use crate::payment::types::PaymentStatus;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Malformed or missing input, caught before any mutation.
    #[error("Validation error: {0}")]
    Validation(String),

    // ========== Not Found Errors ==========
    /// Customer not found.
    #[error("Customer not found: {0}")]
    CustomerNotFound(CustomerId),

    /// Invoice not found.
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(InvoiceId),

    /// Deposit not found.
    #[error("Deposit not found: {0}")]
    DepositNotFound(DepositId),

    /// Payment not found.
    #[error("Payment not found: {0}")]
    PaymentNotFound(PaymentId),

    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    // ========== Allocation Errors ==========
    /// Allocation exceeds the invoice's remaining balance.
    #[error(
        "Allocation of {requested} exceeds remaining balance {remaining} on invoice {invoice_id}"
    )]
    OverAllocation {
        /// The invoice being over-allocated.
        invoice_id: InvoiceId,
        /// The requested allocation amount.
        requested: i64,
        /// The invoice's remaining balance.
        remaining: i64,
    },

    /// Allocations plus discount exceed the payment total.
    #[error("Allocations plus discount ({applied}) exceed payment total ({total})")]
    PaymentOverAllocated {
        /// Sum of allocations plus discount.
        applied: i64,
        /// The payment's total amount.
        total: i64,
    },

    /// Deposit draw exceeds the deposit's remaining balance.
    #[error("Deposit {deposit_id} has {remaining} remaining, requested {requested}")]
    InsufficientDeposit {
        /// The deposit being drawn.
        deposit_id: DepositId,
        /// The amount requested from the deposit.
        requested: i64,
        /// The deposit's remaining balance.
        remaining: i64,
    },

    // ========== Lifecycle State Errors ==========
    /// Operation attempted on a payment in the wrong lifecycle state.
    #[error("Cannot {operation} payment in {actual:?} status")]
    InvalidStatus {
        /// The operation that was attempted (e.g. "post", "void").
        operation: &'static str,
        /// The payment's actual status.
        actual: PaymentStatus,
    },

    // ========== Internal Invariant Violations ==========
    /// Journal debits do not equal credits. This is a programming error:
    /// the transaction must abort and never be retried.
    #[error("Journal is not balanced. Debit: {debit}, Credit: {credit}")]
    LedgerImbalance {
        /// Total debit amount.
        debit: i64,
        /// Total credit amount.
        credit: i64,
    },

    // ========== Concurrency Errors ==========
    /// Concurrent modification detected on a touched invoice or deposit.
    #[error("Concurrent modification detected, please retry")]
    ConcurrentModification,

    // ========== Internal Errors ==========
    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Returns the stable symbolic error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::CustomerNotFound(_) => "CUSTOMER_NOT_FOUND",
            Self::InvoiceNotFound(_) => "INVOICE_NOT_FOUND",
            Self::DepositNotFound(_) => "DEPOSIT_NOT_FOUND",
            Self::PaymentNotFound(_) => "PAYMENT_NOT_FOUND",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::OverAllocation { .. } | Self::PaymentOverAllocated { .. } => "OVER_ALLOCATION",
            Self::InsufficientDeposit { .. } => "INSUFFICIENT_DEPOSIT",
            Self::InvalidStatus { .. } => "INVALID_STATUS",
            Self::LedgerImbalance { .. } => "LEDGER_IMBALANCE",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation and business rule errors
            Self::Validation(_)
            | Self::OverAllocation { .. }
            | Self::PaymentOverAllocated { .. }
            | Self::InsufficientDeposit { .. }
            | Self::InvalidStatus { .. } => 400,

            // 404 Not Found
            Self::CustomerNotFound(_)
            | Self::InvoiceNotFound(_)
            | Self::DepositNotFound(_)
            | Self::PaymentNotFound(_)
            | Self::AccountNotFound(_) => 404,

            // 409 Conflict - concurrency errors
            Self::ConcurrentModification => 409,

            // 500 Internal Server Error - never recoverable by the caller
            Self::LedgerImbalance { .. } | Self::Internal(_) => 500,
        }
    }

    /// Returns true if this error is retryable.
    ///
    /// Only contention errors are retryable. Ledger imbalance is a bug, not
    /// transient contention, and must never be retried automatically.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification)
    }
}

impl From<LedgerError> for kasira_shared::AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err {
            LedgerError::Validation(_) => Self::Validation(message),
            LedgerError::CustomerNotFound(_)
            | LedgerError::InvoiceNotFound(_)
            | LedgerError::DepositNotFound(_)
            | LedgerError::PaymentNotFound(_)
            | LedgerError::AccountNotFound(_) => Self::NotFound(message),
            LedgerError::OverAllocation { .. }
            | LedgerError::PaymentOverAllocated { .. }
            | LedgerError::InsufficientDeposit { .. }
            | LedgerError::InvalidStatus { .. } => Self::BusinessRule(message),
            LedgerError::ConcurrentModification => Self::Conflict(message),
            LedgerError::LedgerImbalance { .. } | LedgerError::Internal(_) => {
                Self::Internal(message)
            }
        }
    }
}
