//! Account statement generation.

use kasira_shared::types::{Currency, PageRequest, PageResponse};

use super::error::ReportError;
use super::types::{Account, AccountStatement, StatementEntry, StatementLine, StatementTotals};
use crate::ledger::entry::EntryType;

/// Service for generating account statements.
pub struct StatementService;

impl StatementService {
    /// Builds a paginated statement for one account over a date range.
    ///
    /// The opening balance is the signed sum of every line dated strictly
    /// before the range start, per the account's normal side. Lines are
    /// ordered by entry date with ledger creation order as the tie-breaker,
    /// and the running balance is computed over the full ordered set before
    /// the page is sliced, so it stays correct on any page.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` when the start date is after the end date.
    pub fn account_statement(
        account: &Account,
        currency: Currency,
        entries: &[StatementEntry],
        period_start: chrono::NaiveDate,
        period_end: chrono::NaiveDate,
        page: &PageRequest,
    ) -> Result<AccountStatement, ReportError> {
        if period_start > period_end {
            return Err(ReportError::InvalidDateRange {
                start: period_start,
                end: period_end,
            });
        }

        let mut ordered: Vec<&StatementEntry> = entries.iter().collect();
        ordered.sort_by_key(|e| (e.entry_date, e.sequence));

        let opening_balance: i64 = ordered
            .iter()
            .filter(|e| e.entry_date < period_start)
            .map(|e| account.normal_balance.balance_change(e.entry_type, e.amount))
            .sum();

        let mut running = opening_balance;
        let mut total_debit: i64 = 0;
        let mut total_credit: i64 = 0;
        let mut lines: Vec<StatementLine> = Vec::new();
        for entry in ordered
            .iter()
            .filter(|e| e.entry_date >= period_start && e.entry_date <= period_end)
        {
            running += account
                .normal_balance
                .balance_change(entry.entry_type, entry.amount);
            let (debit, credit) = match entry.entry_type {
                EntryType::Debit => {
                    total_debit += entry.amount;
                    (entry.amount, 0)
                }
                EntryType::Credit => {
                    total_credit += entry.amount;
                    (0, entry.amount)
                }
            };
            lines.push(StatementLine {
                journal_id: entry.journal_id,
                entry_date: entry.entry_date,
                description: entry.description.clone(),
                debit,
                credit,
                running_balance: running,
            });
        }
        let closing_balance = running;

        let total = lines.len() as u64;
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
        let page_lines: Vec<StatementLine> = lines
            .into_iter()
            .skip(offset)
            .take(limit)
            .collect();
        let paged = PageResponse::new(page_lines, page.page, page.per_page, total);

        Ok(AccountStatement {
            account_id: account.id,
            currency,
            period_start,
            period_end,
            opening_balance,
            closing_balance,
            totals: StatementTotals {
                total_debit,
                total_credit,
            },
            lines: paged.data,
            meta: paged.meta,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::types::NormalBalance;
    use chrono::NaiveDate;
    use kasira_shared::types::{AccountId, JournalEntryId};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn make_account(normal_balance: NormalBalance) -> Account {
        Account {
            id: AccountId::new(),
            code: "1100".to_string(),
            name: "Bank".to_string(),
            normal_balance,
        }
    }

    fn make_entry(
        entry_date: NaiveDate,
        sequence: u64,
        entry_type: EntryType,
        amount: i64,
    ) -> StatementEntry {
        StatementEntry {
            journal_id: JournalEntryId::new(),
            entry_date,
            sequence,
            description: format!("entry {sequence}"),
            entry_type,
            amount,
        }
    }

    #[test]
    fn test_opening_balance_sums_prior_lines() {
        let account = make_account(NormalBalance::DebitNormal);
        let entries = vec![
            make_entry(date(2026, 2, 1), 1, EntryType::Debit, 1_000_000),
            make_entry(date(2026, 2, 15), 2, EntryType::Credit, 400_000),
            make_entry(date(2026, 3, 5), 3, EntryType::Debit, 250_000),
        ];

        let statement = StatementService::account_statement(
            &account,
            Currency::Idr,
            &entries,
            date(2026, 3, 1),
            date(2026, 3, 31),
            &PageRequest::default(),
        )
        .unwrap();

        assert_eq!(statement.opening_balance, 600_000);
        assert_eq!(statement.lines.len(), 1);
        assert_eq!(statement.lines[0].running_balance, 850_000);
        assert_eq!(statement.closing_balance, 850_000);
        assert_eq!(statement.totals.total_debit, 250_000);
        assert_eq!(statement.totals.total_credit, 0);
    }

    #[test]
    fn test_credit_normal_account_signs() {
        let account = make_account(NormalBalance::CreditNormal);
        let entries = vec![
            make_entry(date(2026, 3, 1), 1, EntryType::Credit, 500_000),
            make_entry(date(2026, 3, 2), 2, EntryType::Debit, 200_000),
        ];

        let statement = StatementService::account_statement(
            &account,
            Currency::Idr,
            &entries,
            date(2026, 3, 1),
            date(2026, 3, 31),
            &PageRequest::default(),
        )
        .unwrap();

        assert_eq!(statement.lines[0].running_balance, 500_000);
        assert_eq!(statement.lines[1].running_balance, 300_000);
        assert_eq!(statement.closing_balance, 300_000);
    }

    #[test]
    fn test_same_date_lines_keep_creation_order() {
        let account = make_account(NormalBalance::DebitNormal);
        // Inserted out of order; sequence restores ledger order.
        let entries = vec![
            make_entry(date(2026, 3, 10), 7, EntryType::Credit, 100_000),
            make_entry(date(2026, 3, 10), 3, EntryType::Debit, 300_000),
        ];

        let statement = StatementService::account_statement(
            &account,
            Currency::Idr,
            &entries,
            date(2026, 3, 1),
            date(2026, 3, 31),
            &PageRequest::default(),
        )
        .unwrap();

        assert_eq!(statement.lines[0].debit, 300_000);
        assert_eq!(statement.lines[0].running_balance, 300_000);
        assert_eq!(statement.lines[1].running_balance, 200_000);
    }

    #[test]
    fn test_running_balance_correct_across_pages() {
        let account = make_account(NormalBalance::DebitNormal);
        let entries: Vec<StatementEntry> = (1..=5)
            .map(|i| make_entry(date(2026, 3, i), u64::from(i), EntryType::Debit, 100_000))
            .collect();

        let page2 = StatementService::account_statement(
            &account,
            Currency::Idr,
            &entries,
            date(2026, 3, 1),
            date(2026, 3, 31),
            &PageRequest { page: 2, per_page: 2 },
        )
        .unwrap();

        // Page two starts at the third line; its balance reflects all prior lines.
        assert_eq!(page2.lines.len(), 2);
        assert_eq!(page2.lines[0].running_balance, 300_000);
        assert_eq!(page2.lines[1].running_balance, 400_000);
        assert_eq!(page2.meta.total, 5);
        assert_eq!(page2.meta.total_pages, 3);
        assert_eq!(page2.closing_balance, 500_000);
    }

    #[test]
    fn test_invalid_date_range() {
        let account = make_account(NormalBalance::DebitNormal);
        let result = StatementService::account_statement(
            &account,
            Currency::Idr,
            &[],
            date(2026, 4, 1),
            date(2026, 3, 1),
            &PageRequest::default(),
        );
        assert!(matches!(result, Err(ReportError::InvalidDateRange { .. })));
    }

    #[test]
    fn test_empty_period() {
        let account = make_account(NormalBalance::DebitNormal);
        let entries = vec![make_entry(date(2026, 1, 5), 1, EntryType::Debit, 50_000)];

        let statement = StatementService::account_statement(
            &account,
            Currency::Idr,
            &entries,
            date(2026, 3, 1),
            date(2026, 3, 31),
            &PageRequest::default(),
        )
        .unwrap();

        assert_eq!(statement.opening_balance, 50_000);
        assert_eq!(statement.closing_balance, 50_000);
        assert!(statement.lines.is_empty());
        assert_eq!(statement.meta.total, 0);
    }
}
