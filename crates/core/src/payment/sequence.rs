//! Sequential payment numbering.
//!
//! Numbers look like `RCV-2026-0001`: a configurable prefix, the calendar
//! year of the payment date, and a per-tenant counter that resets each
//! year. The counter is zero-padded to a configurable width but keeps
//! growing past it (`RCV-2026-10000` after `RCV-2026-9999`).

use kasira_shared::types::TenantId;
use serde::{Deserialize, Serialize};

/// Per-tenant, per-year payment number counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumberSequence {
    /// The tenant this counter belongs to.
    pub tenant_id: TenantId,
    /// Calendar year the counter is scoped to.
    pub year: i32,
    /// Last value handed out; 0 means none yet.
    pub last_value: u64,
}

impl NumberSequence {
    /// Creates a fresh counter for a tenant.
    #[must_use]
    pub fn new(tenant_id: TenantId, year: i32) -> Self {
        Self {
            tenant_id,
            year,
            last_value: 0,
        }
    }

    /// Advances the counter and returns the next sequence value.
    ///
    /// A year rollover resets the counter to 1.
    pub fn next(&mut self, year: i32) -> u64 {
        if year != self.year {
            self.year = year;
            self.last_value = 0;
        }
        self.last_value += 1;
        self.last_value
    }
}

/// Formats payment numbers from prefix, year and sequence value.
pub struct PaymentNumber;

impl PaymentNumber {
    /// Renders `PREFIX-YYYY-NNNN` with the counter zero-padded to
    /// `pad_width` digits. Values wider than the pad are rendered in full.
    #[must_use]
    pub fn format(prefix: &str, year: i32, sequence: u64, pad_width: usize) -> String {
        format!("{prefix}-{year}-{sequence:0>pad_width$}")
    }
}
