use crate::error::{ErpFinanceError, Result};
use crate::schema::{
    AccountGroup, AccountGroupRow, BalanceSheetFilters, BalanceSide, FiscalYear, Period,
};
use crate::utils::build_period_list;
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Source of per-period account group rows for the balance sheet.
///
/// Rows for a group come back in display order. The roll-up row of the
/// group is flagged with `is_grand_total`, and the first row carries the
/// group's opening balance.
pub trait LedgerAggregator {
    fn period_list(&self, filters: &BalanceSheetFilters) -> Result<Vec<Period>>;

    fn account_group_rows(
        &self,
        company: &str,
        group: AccountGroup,
        periods: &[Period],
        currency: Option<&str>,
    ) -> Result<Vec<AccountGroupRow>>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub company: String,
    pub account: String,
    pub account_name: String,
    pub group: AccountGroup,
    pub posting_date: NaiveDate,
    pub debit: f64,
    pub credit: f64,
}

impl LedgerEntry {
    fn signed_amount(&self) -> f64 {
        match self.group.balance_side() {
            BalanceSide::Debit => self.debit - self.credit,
            BalanceSide::Credit => self.credit - self.debit,
        }
    }
}

/// Ledger held entirely in memory. Balances are closing balances at the end
/// of each period, so every period value includes the opening balance.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    fiscal_years: Vec<FiscalYear>,
    entries: Vec<LedgerEntry>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fiscal_year(mut self, fiscal_year: FiscalYear) -> Self {
        self.add_fiscal_year(fiscal_year);
        self
    }

    pub fn add_fiscal_year(&mut self, fiscal_year: FiscalYear) {
        self.fiscal_years.push(fiscal_year);
        self.fiscal_years.sort_by_key(|fy| fy.year_start_date);
    }

    pub fn post(&mut self, entry: LedgerEntry) {
        self.entries.push(entry);
    }

    pub fn fiscal_year(&self, name: &str) -> Result<&FiscalYear> {
        self.fiscal_years
            .iter()
            .find(|fy| fy.name == name)
            .ok_or_else(|| ErpFinanceError::FiscalYearNotFound(name.to_string()))
    }

    pub fn fiscal_years_between(&self, from: &str, to: &str) -> Result<Vec<FiscalYear>> {
        let start = self.fiscal_year(from)?.year_start_date;
        let end = self.fiscal_year(to)?.year_end_date;

        if start > end {
            return Err(ErpFinanceError::InvalidPeriodRange { from: start, to: end });
        }

        Ok(self
            .fiscal_years
            .iter()
            .filter(|fy| fy.year_start_date >= start && fy.year_end_date <= end)
            .cloned()
            .collect())
    }
}

impl LedgerAggregator for InMemoryLedger {
    fn period_list(&self, filters: &BalanceSheetFilters) -> Result<Vec<Period>> {
        let years = self.fiscal_years_between(&filters.from_fiscal_year, &filters.to_fiscal_year)?;
        build_period_list(&years, filters.periodicity)
    }

    fn account_group_rows(
        &self,
        company: &str,
        group: AccountGroup,
        periods: &[Period],
        currency: Option<&str>,
    ) -> Result<Vec<AccountGroupRow>> {
        let Some(first_period) = periods.first() else {
            return Ok(Vec::new());
        };
        let report_start = first_period.from_date;

        let mut accounts: BTreeMap<&str, Vec<&LedgerEntry>> = BTreeMap::new();
        for entry in self
            .entries
            .iter()
            .filter(|e| e.company == company && e.group == group)
        {
            accounts.entry(entry.account.as_str()).or_default().push(entry);
        }

        let currency = currency.map(str::to_string);
        let mut account_rows = Vec::new();

        for (account, entries) in &accounts {
            let opening: f64 = entries
                .iter()
                .filter(|e| e.posting_date < report_start)
                .map(|e| e.signed_amount())
                .sum();

            let mut row = AccountGroupRow {
                account: Some(account.to_string()),
                account_name: entries[0].account_name.clone(),
                currency: currency.clone(),
                opening_balance: Some(opening),
                indent: 1,
                ..Default::default()
            };

            for period in periods {
                let closing: f64 = entries
                    .iter()
                    .filter(|e| e.posting_date <= period.to_date)
                    .map(|e| e.signed_amount())
                    .sum();
                row.set_value(&period.key, closing);
            }
            row.recompute_total(periods);

            if opening == 0.0 && row.values.values().all(|v| *v == 0.0) {
                debug!("Skipping {} with no balance in range", account);
                continue;
            }
            account_rows.push(row);
        }

        if account_rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut root = AccountGroupRow {
            account: Some(group.root_account_name().to_string()),
            account_name: group.root_account_name().to_string(),
            currency: currency.clone(),
            opening_balance: Some(
                account_rows
                    .iter()
                    .filter_map(|r| r.opening_balance)
                    .sum(),
            ),
            ..Default::default()
        };
        let mut grand_total = AccountGroupRow::synthetic(group.total_label(), currency);
        grand_total.is_grand_total = true;

        for period in periods {
            let sum: f64 = account_rows.iter().map(|r| r.value_at(&period.key)).sum();
            root.set_value(&period.key, sum);
            grand_total.set_value(&period.key, sum);
        }
        root.recompute_total(periods);
        grand_total.recompute_total(periods);

        debug!(
            "{:?} rows for {}: {} accounts, opening balance {:?}",
            group,
            company,
            account_rows.len(),
            root.opening_balance
        );

        let mut rows = Vec::with_capacity(account_rows.len() + 3);
        rows.push(root);
        rows.extend(account_rows);
        rows.push(grand_total);
        rows.push(AccountGroupRow::default());

        Ok(rows)
    }
}
