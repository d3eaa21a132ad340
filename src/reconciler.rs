use crate::schema::{AccountGroupRow, Period, DEFAULT_FLOAT_PRECISION};
use crate::utils::round_to_precision;
use log::{debug, warn};

pub const PROVISIONAL_PROFIT_LOSS_LABEL: &str = "Provisional Profit / Loss (Credit)";
pub const TOTAL_CREDIT_LABEL: &str = "Total (Credit)";
pub const UNCLOSED_YEARS_LABEL: &str = "Unclosed Fiscal Years Profit / Loss (Credit)";
pub const UNCLOSED_YEAR_MESSAGE: &str = "Previous Financial Year is not closed";

/// Derives the synthetic balance sheet rows that make the asset side and the
/// liability plus equity side agree for every period.
pub struct BalanceSheetReconciler<'a> {
    periods: &'a [Period],
    currency: Option<String>,
    precision: u32,
}

impl<'a> BalanceSheetReconciler<'a> {
    pub fn new(periods: &'a [Period], currency: Option<String>, precision: u32) -> Self {
        Self {
            periods,
            currency,
            precision,
        }
    }

    /// Returns `(provisional_profit_loss, total_row)`.
    ///
    /// Both are `None` when there is no asset side or no liability/equity
    /// side to compare. The profit/loss row alone is dropped when it is zero
    /// in every period.
    pub fn provisional_profit_loss(
        &self,
        asset: &[AccountGroupRow],
        liability: &[AccountGroupRow],
        equity: &[AccountGroupRow],
    ) -> (Option<AccountGroupRow>, Option<AccountGroupRow>) {
        if asset.is_empty() || (liability.is_empty() && equity.is_empty()) {
            return (None, None);
        }

        let asset_total = AccountGroupRow::grand_total(asset);
        let liability_total = AccountGroupRow::grand_total(liability);
        let equity_total = AccountGroupRow::grand_total(equity);

        let mut profit_loss =
            AccountGroupRow::synthetic(PROVISIONAL_PROFIT_LOSS_LABEL, self.currency.clone());
        let mut total_row = AccountGroupRow::synthetic(TOTAL_CREDIT_LABEL, self.currency.clone());
        let mut has_value = false;

        for period in self.periods {
            let effective_liability = value_of(liability_total, &period.key)
                + value_of(equity_total, &period.key);

            let period_profit_loss = value_of(asset_total, &period.key) - effective_liability;
            let period_total = effective_liability + period_profit_loss;

            if period_profit_loss != 0.0 {
                has_value = true;
            }

            profit_loss.set_value(&period.key, period_profit_loss);
            profit_loss.total += period_profit_loss;

            total_row.set_value(&period.key, period_total);
            total_row.total += period_total;

            debug!(
                "{}: provisional profit/loss {} against liabilities and equity {}",
                period.key, period_profit_loss, effective_liability
            );
        }

        if has_value {
            (Some(profit_loss), Some(total_row))
        } else {
            (None, Some(total_row))
        }
    }

    /// Compares brought-forward balances of the three groups. A non-zero
    /// difference means the previous fiscal year was never closed.
    pub fn check_opening_balance(
        &self,
        asset: &[AccountGroupRow],
        liability: &[AccountGroupRow],
        equity: &[AccountGroupRow],
    ) -> (Option<String>, Option<f64>) {
        let opening = |rows: &[AccountGroupRow]| {
            rows.first()
                .and_then(|r| r.opening_balance)
                .map(|v| round_to_precision(v, self.precision))
                .unwrap_or(0.0)
        };

        let discrepancy = round_to_precision(
            opening(asset) - opening(liability) - opening(equity),
            self.precision,
        );

        if discrepancy == 0.0 {
            return (None, None);
        }

        warn!(
            "Opening balances differ by {}: previous financial year is not closed",
            discrepancy
        );
        (Some(UNCLOSED_YEAR_MESSAGE.to_string()), Some(discrepancy))
    }

    /// Row carrying the unclosed-years discrepancy in every period.
    pub fn unclosed_years_row(&self, discrepancy: f64) -> AccountGroupRow {
        let mut row = AccountGroupRow::synthetic(UNCLOSED_YEARS_LABEL, self.currency.clone());
        for period in self.periods {
            row.set_value(&period.key, discrepancy);
        }
        row.recompute_total(self.periods);
        row
    }

    /// Offsets the provisional profit/loss by the unclosed-years discrepancy
    /// so the statement still balances. The total row is left as computed.
    ///
    /// A profit/loss row suppressed for being all zero is brought back when
    /// there is a total row to balance against.
    pub fn offset_profit_loss(
        &self,
        discrepancy: f64,
        profit_loss: Option<AccountGroupRow>,
        total_row: Option<&AccountGroupRow>,
    ) -> Option<AccountGroupRow> {
        let mut row = match (profit_loss, total_row) {
            (Some(row), _) => row,
            (None, Some(_)) => {
                AccountGroupRow::synthetic(PROVISIONAL_PROFIT_LOSS_LABEL, self.currency.clone())
            }
            (None, None) => return None,
        };

        for period in self.periods {
            let adjusted = row.value_at(&period.key) - discrepancy;
            row.set_value(&period.key, adjusted);
        }
        row.recompute_total(self.periods);

        Some(row)
    }
}

fn value_of(row: Option<&AccountGroupRow>, key: &str) -> f64 {
    row.map(|r| r.value_at(key)).unwrap_or(0.0)
}

pub fn compute_provisional_profit_loss(
    asset: &[AccountGroupRow],
    liability: &[AccountGroupRow],
    equity: &[AccountGroupRow],
    periods: &[Period],
    currency: Option<String>,
) -> (Option<AccountGroupRow>, Option<AccountGroupRow>) {
    let reconciler = BalanceSheetReconciler::new(periods, currency, DEFAULT_FLOAT_PRECISION);
    reconciler.provisional_profit_loss(asset, liability, equity)
}

pub fn check_opening_balance(
    asset: &[AccountGroupRow],
    liability: &[AccountGroupRow],
    equity: &[AccountGroupRow],
    precision: u32,
) -> (Option<String>, Option<f64>) {
    let reconciler = BalanceSheetReconciler::new(&[], None, precision);
    reconciler.check_opening_balance(asset, liability, equity)
}
