use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_FLOAT_PRECISION: u32 = 2;

/// Digits an f64 can still resolve; larger settings are clamped to this.
pub const MAX_FLOAT_PRECISION: u32 = 15;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum AccountGroup {
    #[schemars(description = "Resources owned by the company: cash, receivables, inventory, fixed assets (debit balance)")]
    Asset,

    #[schemars(description = "Obligations owed to creditors: payables, loans, accrued expenses (credit balance)")]
    Liability,

    #[schemars(description = "Owner's residual interest: share capital, reserves and surplus (credit balance)")]
    Equity,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum BalanceSide {
    Debit,
    Credit,
}

impl AccountGroup {
    pub const ALL: [AccountGroup; 3] = [AccountGroup::Asset, AccountGroup::Liability, AccountGroup::Equity];

    pub fn balance_side(&self) -> BalanceSide {
        match self {
            AccountGroup::Asset => BalanceSide::Debit,
            AccountGroup::Liability | AccountGroup::Equity => BalanceSide::Credit,
        }
    }

    /// Name of the series this group contributes to the balance sheet chart.
    pub fn section_label(&self) -> &'static str {
        match self {
            AccountGroup::Asset => "Assets",
            AccountGroup::Liability => "Liabilities",
            AccountGroup::Equity => "Equity",
        }
    }

    pub fn root_account_name(&self) -> &'static str {
        match self {
            AccountGroup::Asset => "Application of Funds (Assets)",
            AccountGroup::Liability => "Source of Funds (Liabilities)",
            AccountGroup::Equity => "Equity",
        }
    }

    pub fn total_label(&self) -> String {
        format!("Total {:?} ({:?})", self, self.balance_side())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum Periodicity {
    #[schemars(description = "One column per calendar month of the fiscal years")]
    Monthly,

    #[schemars(description = "One column per three months, counted from the fiscal year start")]
    Quarterly,

    #[schemars(description = "One column per six months, counted from the fiscal year start")]
    HalfYearly,

    #[schemars(description = "One column per fiscal year")]
    Yearly,
}

impl Periodicity {
    pub fn months(&self) -> u32 {
        match self {
            Periodicity::Monthly => 1,
            Periodicity::Quarterly => 3,
            Periodicity::HalfYearly => 6,
            Periodicity::Yearly => 12,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct FiscalYear {
    pub name: String,
    pub year_start_date: NaiveDate,
    pub year_end_date: NaiveDate,
}

/// A reporting interval. `key` addresses the interval's value inside
/// [`AccountGroupRow::values`]; `label` is what a column header shows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Period {
    pub key: String,
    pub label: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AccountGroupRow {
    pub account: Option<String>,
    pub account_name: String,
    pub currency: Option<String>,
    pub values: BTreeMap<String, f64>,
    pub total: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opening_balance: Option<f64>,
    #[serde(default)]
    pub indent: u32,
    /// Marks the roll-up row summarising every account of its group.
    #[serde(default)]
    pub is_grand_total: bool,
    #[serde(default)]
    pub warn_if_negative: bool,
}

impl AccountGroupRow {
    /// A row that belongs to no ledger account (totals, adjustments).
    pub fn synthetic(account_name: impl Into<String>, currency: Option<String>) -> Self {
        Self {
            account: None,
            account_name: account_name.into(),
            currency,
            warn_if_negative: true,
            ..Default::default()
        }
    }

    /// Amount for a period key; absent keys read as zero.
    pub fn value_at(&self, key: &str) -> f64 {
        self.values.get(key).copied().unwrap_or(0.0)
    }

    pub fn set_value(&mut self, key: &str, value: f64) {
        self.values.insert(key.to_string(), value);
    }

    pub fn values_in_order(&self, periods: &[Period]) -> Vec<f64> {
        periods.iter().map(|p| self.value_at(&p.key)).collect()
    }

    pub fn recompute_total(&mut self, periods: &[Period]) {
        self.total = self.values_in_order(periods).iter().sum();
    }

    pub fn is_blank(&self) -> bool {
        self.account.is_none() && self.account_name.is_empty() && self.values.is_empty()
    }

    /// Finds the group's grand-total row within an ordered row sequence.
    pub fn grand_total(rows: &[AccountGroupRow]) -> Option<&AccountGroupRow> {
        rows.iter().find(|r| r.is_grand_total)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BalanceSheetFilters {
    #[schemars(description = "The company whose ledgers are reported")]
    pub company: String,

    #[schemars(description = "Name of the first fiscal year covered by the report")]
    pub from_fiscal_year: String,

    #[schemars(description = "Name of the last fiscal year covered by the report")]
    pub to_fiscal_year: String,

    #[schemars(description = "Width of each reporting column")]
    pub periodicity: Periodicity,
}

impl BalanceSheetFilters {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(BalanceSheetFilters)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

/// Host-level configuration the report needs. Passed in explicitly so
/// the reconciliation stays a pure function of its arguments.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ReportSettings {
    #[serde(default)]
    #[schemars(description = "Decimal digits used when comparing opening balances. Defaults to 2.")]
    pub float_precision: Option<u32>,

    #[serde(default)]
    #[schemars(description = "Default currency per company name")]
    pub company_currencies: BTreeMap<String, String>,
}

impl ReportSettings {
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn precision(&self) -> u32 {
        match self.float_precision {
            Some(p) if p > 0 => p.min(MAX_FLOAT_PRECISION),
            _ => DEFAULT_FLOAT_PRECISION,
        }
    }

    pub fn currency_for(&self, company: &str) -> Option<String> {
        self.company_currencies.get(company).cloned()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ColumnType {
    Link,
    Data,
    Currency,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Column {
    pub fieldname: String,
    pub label: String,
    pub fieldtype: ColumnType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default)]
    pub hidden: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period(key: &str) -> Period {
        Period {
            key: key.to_string(),
            label: key.to_string(),
            from_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            to_date: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
        }
    }

    #[test]
    fn test_missing_values_read_as_zero() {
        let mut row = AccountGroupRow::synthetic("Total (Credit)", None);
        row.set_value("p1", 10.0);

        assert_eq!(row.value_at("p1"), 10.0);
        assert_eq!(row.value_at("p2"), 0.0);

        row.recompute_total(&[period("p1"), period("p2")]);
        assert!((row.total - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_grand_total_uses_flag_not_position() {
        let mut total = AccountGroupRow::synthetic("Total Asset (Debit)", None);
        total.is_grand_total = true;
        let rows = vec![
            AccountGroupRow::synthetic("Assets", None),
            total,
            AccountGroupRow::synthetic("Cash", None),
        ];

        let found = AccountGroupRow::grand_total(&rows).unwrap();
        assert_eq!(found.account_name, "Total Asset (Debit)");
        assert!(AccountGroupRow::grand_total(&rows[2..]).is_none());
    }

    #[test]
    fn test_settings_defaults() {
        let settings = ReportSettings::from_json("{}").unwrap();
        assert_eq!(settings.precision(), 2);
        assert_eq!(settings.currency_for("Acme"), None);

        let settings = ReportSettings::from_json(
            r#"{"float_precision": 3, "company_currencies": {"Acme": "EUR"}}"#,
        )
        .unwrap();
        assert_eq!(settings.precision(), 3);
        assert_eq!(settings.currency_for("Acme").as_deref(), Some("EUR"));
    }

    #[test]
    fn test_oversized_precision_is_clamped() {
        let settings = ReportSettings::from_json(r#"{"float_precision": 400}"#).unwrap();
        assert_eq!(settings.precision(), MAX_FLOAT_PRECISION);

        let settings = ReportSettings::from_json(r#"{"float_precision": 4294967295}"#).unwrap();
        assert_eq!(settings.precision(), MAX_FLOAT_PRECISION);
    }

    #[test]
    fn test_filters_schema_generation() {
        let schema_json = BalanceSheetFilters::schema_as_json().unwrap();
        assert!(schema_json.contains("from_fiscal_year"));
        assert!(schema_json.contains("periodicity"));
        assert!(schema_json.contains("HalfYearly"));
    }

    #[test]
    fn test_group_labels() {
        assert_eq!(AccountGroup::Asset.total_label(), "Total Asset (Debit)");
        assert_eq!(AccountGroup::Equity.total_label(), "Total Equity (Credit)");
        assert_eq!(AccountGroup::Liability.balance_side(), BalanceSide::Credit);
    }
}
