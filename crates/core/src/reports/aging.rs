//! Receivables aging.

use chrono::NaiveDate;
use kasira_shared::types::Currency;
use rust_decimal::Decimal;

use super::types::{AgingBucket, AgingSummary, OpenItem};

/// Service for generating receivables aging summaries.
pub struct AgingService;

impl AgingService {
    /// Buckets open invoices by how many days past due they are at `as_of`.
    ///
    /// `brackets` must already be normalized (positive, sorted ascending,
    /// deduplicated). With brackets `[30, 60, 90]` the overdue buckets are
    /// `1-30`, `31-60`, `61-90` and `90+`. An invoice due on or after
    /// `as_of`, or with no due date at all, counts as current.
    #[must_use]
    pub fn aging_summary(
        items: &[OpenItem],
        currency: Currency,
        as_of: NaiveDate,
        brackets: &[u32],
    ) -> AgingSummary {
        let mut buckets = build_buckets(brackets);

        let mut total_outstanding: i64 = 0;
        let mut total_count: u32 = 0;
        let mut current_amount: i64 = 0;
        let mut current_count: u32 = 0;
        let mut overdue_amount: i64 = 0;
        let mut overdue_count: u32 = 0;
        let mut partial_count: u32 = 0;

        for item in items {
            if item.remaining <= 0 {
                continue;
            }
            total_outstanding += item.remaining;
            total_count += 1;
            if item.is_partial {
                partial_count += 1;
            }

            let days_overdue = item
                .due_date
                .map_or(0, |due| (as_of - due).num_days().max(0));
            if days_overdue == 0 {
                current_amount += item.remaining;
                current_count += 1;
                continue;
            }
            overdue_amount += item.remaining;
            overdue_count += 1;

            // The final bucket is open-ended, so a match always exists.
            if let Some(bucket) = buckets.iter_mut().find(|b| {
                days_overdue >= i64::from(b.min_days)
                    && b.max_days.is_none_or(|max| days_overdue <= i64::from(max))
            }) {
                bucket.amount += item.remaining;
                bucket.count += 1;
            }
        }

        for bucket in &mut buckets {
            bucket.percent = percent_of(bucket.amount, total_outstanding);
        }

        AgingSummary {
            as_of,
            currency,
            total_outstanding,
            total_count,
            current_amount,
            current_count,
            overdue_amount,
            overdue_count,
            partial_count,
            buckets,
        }
    }
}

fn build_buckets(brackets: &[u32]) -> Vec<AgingBucket> {
    let mut buckets = Vec::with_capacity(brackets.len() + 1);
    let mut lower: u32 = 1;
    for &upper in brackets {
        buckets.push(AgingBucket {
            label: format!("{lower}-{upper}"),
            min_days: lower,
            max_days: Some(upper),
            amount: 0,
            count: 0,
            percent: Decimal::ZERO,
        });
        lower = upper + 1;
    }
    let over = brackets.last().copied().unwrap_or(0);
    buckets.push(AgingBucket {
        label: format!("{over}+"),
        min_days: lower,
        max_days: None,
        amount: 0,
        count: 0,
        percent: Decimal::ZERO,
    });
    buckets
}

fn percent_of(amount: i64, total: i64) -> Decimal {
    if total == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(amount) * Decimal::ONE_HUNDRED / Decimal::from(total)).round_dp(1)
}
