use super::types::{
    DocStatus, Employee, JournalEntry, NewSalarySlip, SalaryDetail, SalarySlip, SalaryStructure,
};
use crate::error::{ErpFinanceError, Result};
use crate::schema::FiscalYear;
use std::collections::{BTreeMap, BTreeSet};

/// Persistence seam for payroll runs. Implementations own document naming
/// and whatever validation happens on submit.
pub trait PayrollStore {
    fn employees(&self, company: &str) -> Result<Vec<Employee>>;
    fn salary_structures(&self, company: &str, based_on_timesheet: bool) -> Result<Vec<SalaryStructure>>;
    fn salary_slips(&self, company: &str) -> Result<Vec<SalarySlip>>;
    fn insert_salary_slip(&mut self, slip: NewSalarySlip) -> Result<String>;
    fn submit_salary_slip(&mut self, name: &str) -> Result<()>;
    fn component_account(&self, salary_component: &str, company: &str) -> Result<Option<String>>;
    fn submit_journal_entry(&mut self, entry: JournalEntry) -> Result<String>;
    fn mark_salary_slip_paid(&mut self, name: &str, journal_entry: &str) -> Result<()>;
    fn fiscal_year(&self, name: &str) -> Result<Option<FiscalYear>>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryPayrollStore {
    pub employees: Vec<Employee>,
    pub structures: Vec<SalaryStructure>,
    pub slips: Vec<SalarySlip>,
    pub journal_entries: Vec<(String, JournalEntry)>,
    pub fiscal_years: Vec<FiscalYear>,
    pay: BTreeMap<String, (Vec<SalaryDetail>, Vec<SalaryDetail>)>,
    component_accounts: BTreeMap<(String, String), String>,
    rejected: BTreeSet<String>,
    reject_journal_entries: bool,
}

impl InMemoryPayrollStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Earnings and deductions copied onto every slip created for `employee`.
    pub fn set_pay(&mut self, employee: &str, earnings: Vec<SalaryDetail>, deductions: Vec<SalaryDetail>) {
        self.pay.insert(employee.to_string(), (earnings, deductions));
    }

    pub fn set_component_account(&mut self, salary_component: &str, company: &str, account: &str) {
        self.component_accounts.insert(
            (salary_component.to_string(), company.to_string()),
            account.to_string(),
        );
    }

    /// Makes `submit_salary_slip` fail for the named slip.
    pub fn reject_submission(&mut self, slip_name: &str) {
        self.rejected.insert(slip_name.to_string());
    }

    pub fn reject_journal_entries(&mut self, reject: bool) {
        self.reject_journal_entries = reject;
    }

    pub fn slip(&self, name: &str) -> Option<&SalarySlip> {
        self.slips.iter().find(|s| s.name == name)
    }

    fn slip_mut(&mut self, name: &str) -> Result<&mut SalarySlip> {
        self.slips
            .iter_mut()
            .find(|s| s.name == name)
            .ok_or_else(|| ErpFinanceError::StoreError(format!("Salary Slip {} not found", name)))
    }
}

impl PayrollStore for InMemoryPayrollStore {
    fn employees(&self, company: &str) -> Result<Vec<Employee>> {
        Ok(self
            .employees
            .iter()
            .filter(|e| e.company == company)
            .cloned()
            .collect())
    }

    fn salary_structures(&self, company: &str, based_on_timesheet: bool) -> Result<Vec<SalaryStructure>> {
        Ok(self
            .structures
            .iter()
            .filter(|s| s.company == company && s.salary_slip_based_on_timesheet == based_on_timesheet)
            .cloned()
            .collect())
    }

    fn salary_slips(&self, company: &str) -> Result<Vec<SalarySlip>> {
        Ok(self
            .slips
            .iter()
            .filter(|s| s.company == company)
            .cloned()
            .collect())
    }

    fn insert_salary_slip(&mut self, slip: NewSalarySlip) -> Result<String> {
        let name = format!("Sal Slip/{}/{:05}", slip.employee, self.slips.len() + 1);
        let (earnings, deductions) = self.pay.get(&slip.employee).cloned().unwrap_or_default();

        let gross: f64 = earnings.iter().map(|d| d.amount).sum();
        let deducted: f64 = deductions.iter().map(|d| d.amount).sum();
        let net_pay = gross - deducted;

        let salary_structure = self
            .structures
            .iter()
            .find(|s| s.docstatus != DocStatus::Cancelled && s.employees.contains(&slip.employee))
            .map(|s| s.name.clone());

        self.slips.push(SalarySlip {
            name: name.clone(),
            employee: slip.employee,
            employee_name: slip.employee_name,
            company: slip.company,
            branch: slip.branch,
            department: slip.department,
            designation: slip.designation,
            salary_structure,
            start_date: slip.start_date,
            end_date: slip.end_date,
            posting_date: slip.posting_date,
            fiscal_year: slip.fiscal_year,
            month: slip.month,
            salary_slip_based_on_timesheet: slip.salary_slip_based_on_timesheet,
            docstatus: DocStatus::Draft,
            earnings,
            deductions,
            net_pay,
            rounded_total: net_pay.round(),
            journal_entry: None,
        });

        Ok(name)
    }

    fn submit_salary_slip(&mut self, name: &str) -> Result<()> {
        if self.rejected.contains(name) {
            return Err(ErpFinanceError::StoreError(format!(
                "Salary Slip {} failed validation on submit",
                name
            )));
        }
        let slip = self.slip_mut(name)?;
        slip.docstatus = DocStatus::Submitted;
        Ok(())
    }

    fn component_account(&self, salary_component: &str, company: &str) -> Result<Option<String>> {
        Ok(self
            .component_accounts
            .get(&(salary_component.to_string(), company.to_string()))
            .cloned())
    }

    fn submit_journal_entry(&mut self, entry: JournalEntry) -> Result<String> {
        if self.reject_journal_entries {
            return Err(ErpFinanceError::StoreError(
                "Journal Entry could not be submitted".to_string(),
            ));
        }
        let name = format!("JV-{:05}", self.journal_entries.len() + 1);
        self.journal_entries.push((name.clone(), entry));
        Ok(name)
    }

    fn mark_salary_slip_paid(&mut self, name: &str, journal_entry: &str) -> Result<()> {
        let slip = self.slip_mut(name)?;
        slip.journal_entry = Some(journal_entry.to_string());
        Ok(())
    }

    fn fiscal_year(&self, name: &str) -> Result<Option<FiscalYear>> {
        Ok(self.fiscal_years.iter().find(|fy| fy.name == name).cloned())
    }
}
