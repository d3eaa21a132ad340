use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum DocStatus {
    Draft,
    Submitted,
    Cancelled,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ComponentType {
    Earnings,
    Deductions,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SalarySlipStatus {
    Draft,
    Submitted,
    Paid,
    Cancelled,
}

/// Selection criteria for one payroll run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct PayrollFilters {
    #[schemars(description = "Company whose employees are paid")]
    pub company: String,

    #[serde(default)]
    pub branch: Option<String>,

    #[serde(default)]
    pub department: Option<String>,

    #[serde(default)]
    pub designation: Option<String>,

    #[schemars(description = "First day of the payroll window")]
    pub from_date: Option<NaiveDate>,

    #[schemars(description = "Last day of the payroll window")]
    pub to_date: Option<NaiveDate>,

    #[serde(default)]
    pub posting_date: Option<NaiveDate>,

    #[serde(default)]
    #[schemars(description = "Fiscal year name stamped on month-based salary slips")]
    pub fiscal_year: Option<String>,

    #[serde(default)]
    #[schemars(description = "Calendar month (1-12) stamped on month-based salary slips")]
    pub month: Option<u32>,

    #[serde(default)]
    #[schemars(description = "Pay from timesheets instead of monthly salary structures")]
    pub salary_slip_based_on_timesheet: bool,

    #[serde(default)]
    #[schemars(description = "Bank or cash account credited with net pay")]
    pub payment_account: Option<String>,
}

impl PayrollFilters {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(PayrollFilters)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: String,
    pub employee_name: String,
    pub company: String,
    pub branch: Option<String>,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub date_of_joining: Option<NaiveDate>,
    pub relieving_date: Option<NaiveDate>,
    pub docstatus: DocStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalaryStructure {
    pub name: String,
    pub company: String,
    pub docstatus: DocStatus,
    pub salary_slip_based_on_timesheet: bool,
    pub employees: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SalaryDetail {
    pub salary_component: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalarySlip {
    pub name: String,
    pub employee: String,
    pub employee_name: String,
    pub company: String,
    pub branch: Option<String>,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub salary_structure: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub posting_date: Option<NaiveDate>,
    pub fiscal_year: Option<String>,
    pub month: Option<u32>,
    pub salary_slip_based_on_timesheet: bool,
    pub docstatus: DocStatus,
    pub earnings: Vec<SalaryDetail>,
    pub deductions: Vec<SalaryDetail>,
    pub net_pay: f64,
    pub rounded_total: f64,
    pub journal_entry: Option<String>,
}

impl SalarySlip {
    pub fn status(&self) -> SalarySlipStatus {
        match (self.docstatus, &self.journal_entry) {
            (DocStatus::Cancelled, _) => SalarySlipStatus::Cancelled,
            (DocStatus::Draft, _) => SalarySlipStatus::Draft,
            (DocStatus::Submitted, Some(_)) => SalarySlipStatus::Paid,
            (DocStatus::Submitted, None) => SalarySlipStatus::Submitted,
        }
    }

    pub fn components(&self, component_type: ComponentType) -> &[SalaryDetail] {
        match component_type {
            ComponentType::Earnings => &self.earnings,
            ComponentType::Deductions => &self.deductions,
        }
    }
}

/// A draft salary slip as requested by a payroll run. The store fills in
/// the components and amounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSalarySlip {
    pub employee: String,
    pub employee_name: String,
    pub company: String,
    pub branch: Option<String>,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub salary_slip_based_on_timesheet: bool,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub fiscal_year: Option<String>,
    pub month: Option<u32>,
    pub posting_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JournalEntryAccount {
    pub account: String,
    pub debit_in_account_currency: f64,
    pub credit_in_account_currency: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub voucher_type: String,
    pub user_remark: String,
    pub company: String,
    pub posting_date: NaiveDate,
    pub accounts: Vec<JournalEntryAccount>,
    pub cheque_no: Option<String>,
    pub cheque_date: Option<NaiveDate>,
}

impl JournalEntry {
    pub fn total_debit(&self) -> f64 {
        self.accounts.iter().map(|a| a.debit_in_account_currency).sum()
    }

    pub fn total_credit(&self) -> f64 {
        self.accounts.iter().map(|a| a.credit_in_account_currency).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MonthDetails {
    pub year: i32,
    pub month_start_date: NaiveDate,
    pub month_end_date: NaiveDate,
    pub month_days: u32,
}
