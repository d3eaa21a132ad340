//! # ERP Finance
//!
//! Balance sheet reconciliation and payroll processing over ERP ledgers.
//!
//! ## Core Concepts
//!
//! - **Account Group Rows**: per-period balances for the Asset, Liability and Equity
//!   groups, supplied by a [`LedgerAggregator`]
//! - **Provisional Profit / Loss**: assets minus liabilities and equity, shown until
//!   closing entries are booked
//! - **Unclosed Fiscal Years**: a non-zero difference between the brought-forward
//!   balances of the three groups, carried as an adjustment row
//! - **Payroll**: salary slip creation, submission and the payroll journal entry,
//!   driven through a [`PayrollStore`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use erp_finance::*;
//!
//! let filters = BalanceSheetFilters {
//!     company: "ACME Corp".to_string(),
//!     from_fiscal_year: "2023".to_string(),
//!     to_fiscal_year: "2023".to_string(),
//!     periodicity: Periodicity::Quarterly,
//! };
//!
//! let result = BalanceSheetProcessor::new(&ledger, &TabularRenderer)
//!     .execute(&filters, &ReportSettings::default())?;
//!
//! if let Some(message) = &result.message {
//!     println!("warning: {}", message);
//! }
//! ```

pub mod chart;
pub mod error;
pub mod ledger;
pub mod payroll;
pub mod reconciler;
pub mod render;
pub mod schema;
pub mod utils;

pub use chart::{build_chart_series, ChartData, ChartSeries};
pub use error::{ErpFinanceError, Result};
pub use ledger::{InMemoryLedger, LedgerAggregator, LedgerEntry};
pub use payroll::*;
pub use reconciler::{check_opening_balance, compute_provisional_profit_loss, BalanceSheetReconciler};
pub use render::{ReportRenderer, TabularRenderer};
pub use schema::*;
pub use utils::*;

use log::{debug, info};
use serde::Serialize;

/// What the host receives from a balance sheet run: column layout, data
/// rows, an optional warning and the chart payload.
#[derive(Debug, Clone, Serialize)]
pub struct BalanceSheetResult {
    pub columns: Vec<Column>,
    pub data: Vec<AccountGroupRow>,
    pub message: Option<String>,
    pub chart: ChartData,
}

impl BalanceSheetResult {
    pub fn into_parts(self) -> (Vec<Column>, Vec<AccountGroupRow>, Option<String>, ChartData) {
        (self.columns, self.data, self.message, self.chart)
    }

    pub fn to_csv(&self) -> String {
        render::rows_to_csv(&self.columns, &self.data)
    }

    pub fn to_markdown(&self, title: &str) -> String {
        render::rows_to_markdown(title, &self.columns, &self.data)
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

pub struct BalanceSheetProcessor<'a, L: LedgerAggregator + ?Sized, R: ReportRenderer + ?Sized> {
    ledger: &'a L,
    renderer: &'a R,
}

impl<'a, L: LedgerAggregator + ?Sized, R: ReportRenderer + ?Sized> BalanceSheetProcessor<'a, L, R> {
    pub fn new(ledger: &'a L, renderer: &'a R) -> Self {
        Self { ledger, renderer }
    }

    pub fn execute(
        &self,
        filters: &BalanceSheetFilters,
        settings: &ReportSettings,
    ) -> Result<BalanceSheetResult> {
        info!(
            "Building balance sheet for {} ({} to {}, {:?})",
            filters.company, filters.from_fiscal_year, filters.to_fiscal_year, filters.periodicity
        );

        let periods = self.ledger.period_list(filters)?;
        let currency = settings.currency_for(&filters.company);
        let precision = settings.precision();

        let [asset, liability, equity] = AccountGroup::ALL.map(|group| {
            self.ledger
                .account_group_rows(&filters.company, group, &periods, currency.as_deref())
        });
        let (asset, liability, equity) = (asset?, liability?, equity?);

        debug!(
            "Fetched {} asset, {} liability and {} equity rows over {} periods",
            asset.len(),
            liability.len(),
            equity.len(),
            periods.len()
        );

        let reconciler = BalanceSheetReconciler::new(&periods, currency, precision);

        let (mut provisional_profit_loss, total_row) =
            reconciler.provisional_profit_loss(&asset, &liability, &equity);

        let (message, opening_balance) = reconciler.check_opening_balance(&asset, &liability, &equity);

        let mut unclosed = None;
        if let Some(discrepancy) = opening_balance {
            if round_to_precision(discrepancy, DEFAULT_FLOAT_PRECISION) != 0.0 {
                unclosed = Some(reconciler.unclosed_years_row(discrepancy));
                provisional_profit_loss = reconciler.offset_profit_loss(
                    discrepancy,
                    provisional_profit_loss,
                    total_row.as_ref(),
                );
            }
        }

        let columns = self
            .renderer
            .columns(filters.periodicity, &periods, Some(&filters.company));
        let chart = build_chart_series(&columns, &asset, &liability, &equity);

        let mut data = Vec::with_capacity(asset.len() + liability.len() + equity.len() + 3);
        data.extend(asset);
        data.extend(liability);
        data.extend(equity);
        data.extend(unclosed);
        data.extend(provisional_profit_loss);
        data.extend(total_row);

        Ok(BalanceSheetResult {
            columns,
            data,
            message,
            chart,
        })
    }
}

pub fn execute_balance_sheet<L: LedgerAggregator + ?Sized>(
    ledger: &L,
    filters: &BalanceSheetFilters,
    settings: &ReportSettings,
) -> Result<BalanceSheetResult> {
    BalanceSheetProcessor::new(ledger, &TabularRenderer).execute(filters, settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry(account: &str, group: AccountGroup, posting_date: NaiveDate, debit: f64, credit: f64) -> LedgerEntry {
        LedgerEntry {
            company: "Test Company".to_string(),
            account: account.to_string(),
            account_name: account.to_string(),
            group,
            posting_date,
            debit,
            credit,
        }
    }

    fn filters() -> BalanceSheetFilters {
        BalanceSheetFilters {
            company: "Test Company".to_string(),
            from_fiscal_year: "2023".to_string(),
            to_fiscal_year: "2023".to_string(),
            periodicity: Periodicity::HalfYearly,
        }
    }

    fn ledger() -> InMemoryLedger {
        InMemoryLedger::new().with_fiscal_year(FiscalYear {
            name: "2023".to_string(),
            year_start_date: date(2023, 1, 1),
            year_end_date: date(2023, 12, 31),
        })
    }

    #[test]
    fn test_end_to_end_with_profit() {
        let mut ledger = ledger();
        ledger.post(entry("Cash", AccountGroup::Asset, date(2023, 2, 1), 1000.0, 0.0));
        ledger.post(entry("Capital", AccountGroup::Equity, date(2023, 2, 1), 0.0, 800.0));

        let settings = ReportSettings::from_json(r#"{"company_currencies": {"Test Company": "USD"}}"#).unwrap();
        let result = execute_balance_sheet(&ledger, &filters(), &settings).unwrap();

        assert!(result.message.is_none());
        assert_eq!(result.columns.len(), 4);

        let last = result.data.last().unwrap();
        assert_eq!(last.account_name, "Total (Credit)");
        assert_eq!(last.value_at("jun_2023"), 1000.0);

        let pl = &result.data[result.data.len() - 2];
        assert_eq!(pl.account_name, "Provisional Profit / Loss (Credit)");
        assert_eq!(pl.value_at("dec_2023"), 200.0);
        assert_eq!(pl.currency.as_deref(), Some("USD"));

        assert_eq!(result.chart.series.len(), 2);
        assert!(result.chart.series("Liabilities").is_none());
    }

    #[test]
    fn test_end_to_end_unclosed_year() {
        let mut ledger = ledger();
        ledger.post(entry("Cash", AccountGroup::Asset, date(2022, 12, 1), 1000.0, 0.0));
        ledger.post(entry("Loan", AccountGroup::Liability, date(2022, 12, 1), 0.0, 600.0));
        ledger.post(entry("Capital", AccountGroup::Equity, date(2022, 12, 1), 0.0, 350.0));

        let result = execute_balance_sheet(&ledger, &filters(), &ReportSettings::default()).unwrap();
        assert_eq!(result.message.as_deref(), Some("Previous Financial Year is not closed"));

        let names: Vec<&str> = result.data.iter().rev().take(3).map(|r| r.account_name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Total (Credit)",
                "Provisional Profit / Loss (Credit)",
                "Unclosed Fiscal Years Profit / Loss (Credit)"
            ]
        );

        let unclosed = &result.data[result.data.len() - 3];
        assert_eq!(unclosed.value_at("jun_2023"), 50.0);
        assert!((unclosed.total - 100.0).abs() < 1e-9);

        let pl = &result.data[result.data.len() - 2];
        assert_eq!(pl.value_at("jun_2023"), 0.0);
        assert_eq!(pl.value_at("dec_2023"), 0.0);
    }

    #[test]
    fn test_sub_cent_discrepancy_warns_without_adjusting() {
        let mut ledger = ledger();
        ledger.post(entry("Cash", AccountGroup::Asset, date(2022, 12, 1), 1000.003, 0.0));
        ledger.post(entry("Loan", AccountGroup::Liability, date(2022, 12, 1), 0.0, 600.0));
        ledger.post(entry("Capital", AccountGroup::Equity, date(2022, 12, 1), 0.0, 400.0));

        let settings = ReportSettings::from_json(r#"{"float_precision": 3}"#).unwrap();
        let result = execute_balance_sheet(&ledger, &filters(), &settings).unwrap();

        assert_eq!(result.message.as_deref(), Some("Previous Financial Year is not closed"));
        assert!(result
            .data
            .iter()
            .all(|r| r.account_name != "Unclosed Fiscal Years Profit / Loss (Credit)"));

        let pl = &result.data[result.data.len() - 2];
        assert_eq!(pl.account_name, "Provisional Profit / Loss (Credit)");
        assert!((pl.value_at("jun_2023") - 0.003).abs() < 1e-9);
        assert!((pl.value_at("dec_2023") - 0.003).abs() < 1e-9);
    }

    #[test]
    fn test_oversized_precision_keeps_balanced_sheet_closed() {
        let mut ledger = ledger();
        ledger.post(entry("Cash", AccountGroup::Asset, date(2022, 12, 1), 1000.0, 0.0));
        ledger.post(entry("Loan", AccountGroup::Liability, date(2022, 12, 1), 0.0, 600.0));
        ledger.post(entry("Capital", AccountGroup::Equity, date(2022, 12, 1), 0.0, 400.0));

        let settings = ReportSettings::from_json(r#"{"float_precision": 400}"#).unwrap();
        let result = execute_balance_sheet(&ledger, &filters(), &settings).unwrap();

        assert!(result.message.is_none());
        assert!(result.data.iter().all(|r| r.values.values().all(|v| v.is_finite())));
        assert_eq!(result.data.last().unwrap().value_at("dec_2023"), 1000.0);
    }
}
