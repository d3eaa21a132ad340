use super::outcome::{
    JournalEntryLog, NotSubmittedReason, SalarySlipCreationLog, SalarySlipSubmissionLog,
};
use super::store::PayrollStore;
use super::types::{
    ComponentType, DocStatus, Employee, JournalEntry, JournalEntryAccount, MonthDetails,
    NewSalarySlip, PayrollFilters, SalarySlip,
};
use crate::error::{ErpFinanceError, Result};
use crate::schema::FiscalYear;
use crate::utils::{add_months, last_day_of_month};
use chrono::{Datelike, NaiveDate};
use log::{debug, info, warn};
use std::collections::{BTreeMap, BTreeSet};

pub const PAYROLL_VOUCHER_TYPE: &str = "Bank Entry";

/// Runs one payroll window: picks employees, creates and submits their
/// salary slips and posts the resulting journal entry.
pub struct PayrollProcessor<'a, S: PayrollStore + ?Sized> {
    store: &'a mut S,
    filters: &'a PayrollFilters,
}

impl<'a, S: PayrollStore + ?Sized> PayrollProcessor<'a, S> {
    pub fn new(store: &'a mut S, filters: &'a PayrollFilters) -> Self {
        Self { store, filters }
    }

    /// Returns the payroll window once company and both dates are set.
    pub fn check_mandatory(&self) -> Result<(NaiveDate, NaiveDate)> {
        if self.filters.company.trim().is_empty() {
            return Err(ErpFinanceError::MissingMandatoryField("company".to_string()));
        }
        let from_date = self
            .filters
            .from_date
            .ok_or_else(|| ErpFinanceError::MissingMandatoryField("from_date".to_string()))?;
        let to_date = self
            .filters
            .to_date
            .ok_or_else(|| ErpFinanceError::MissingMandatoryField("to_date".to_string()))?;
        Ok((from_date, to_date))
    }

    fn matches_filters(
        &self,
        branch: &Option<String>,
        department: &Option<String>,
        designation: &Option<String>,
    ) -> bool {
        let matches = |wanted: &Option<String>, actual: &Option<String>| match wanted {
            Some(w) if !w.is_empty() => actual.as_deref() == Some(w.as_str()),
            _ => true,
        };
        matches(&self.filters.branch, branch)
            && matches(&self.filters.department, department)
            && matches(&self.filters.designation, designation)
    }

    /// Active employees matching the filters who are assigned to a live
    /// salary structure of the company and employed for the whole window.
    pub fn employee_list(&self) -> Result<Vec<Employee>> {
        let (from_date, to_date) = self.check_mandatory()?;
        let company = &self.filters.company;

        let assigned: BTreeSet<String> = self
            .store
            .salary_structures(company, self.filters.salary_slip_based_on_timesheet)?
            .into_iter()
            .filter(|s| s.docstatus != DocStatus::Cancelled)
            .flat_map(|s| s.employees)
            .collect();

        if assigned.is_empty() {
            debug!("No salary structure for {}", company);
            return Ok(Vec::new());
        }

        let employees = self
            .store
            .employees(company)?
            .into_iter()
            .filter(|e| e.docstatus != DocStatus::Cancelled)
            .filter(|e| assigned.contains(&e.id))
            .filter(|e| self.matches_filters(&e.branch, &e.department, &e.designation))
            .filter(|e| e.date_of_joining.map_or(true, |d| d <= from_date))
            .filter(|e| e.relieving_date.map_or(true, |d| d >= to_date))
            .collect();

        Ok(employees)
    }

    /// Creates a draft salary slip for every selected employee that has no
    /// live slip inside the window yet.
    pub fn create_salary_slips(&mut self) -> Result<SalarySlipCreationLog> {
        let (from_date, to_date) = self.check_mandatory()?;
        let employees = self.employee_list()?;
        let existing = self.store.salary_slips(&self.filters.company)?;

        info!(
            "Creating salary slips for {} employees of {} ({} to {})",
            employees.len(),
            self.filters.company,
            from_date,
            to_date
        );

        let mut log = SalarySlipCreationLog::default();

        for employee in employees {
            let already_created = existing.iter().any(|s| {
                s.docstatus != DocStatus::Cancelled
                    && s.employee == employee.id
                    && s.start_date >= from_date
                    && s.end_date <= to_date
            });
            if already_created {
                debug!("Salary slip already exists for {}", employee.id);
                continue;
            }

            let based_on_timesheet = self.filters.salary_slip_based_on_timesheet;
            let slip = NewSalarySlip {
                employee: employee.id,
                employee_name: employee.employee_name,
                company: self.filters.company.clone(),
                branch: employee.branch,
                department: employee.department,
                designation: employee.designation,
                salary_slip_based_on_timesheet: based_on_timesheet,
                start_date: from_date,
                end_date: to_date,
                fiscal_year: if based_on_timesheet {
                    None
                } else {
                    self.filters.fiscal_year.clone()
                },
                month: if based_on_timesheet { None } else { self.filters.month },
                posting_date: self.filters.posting_date,
            };

            let name = self.store.insert_salary_slip(slip)?;
            log.created.push(name);
        }

        Ok(log)
    }

    /// Slips of the window in the given state that are not yet paid out.
    pub fn salary_slip_list(&self, docstatus: DocStatus) -> Result<Vec<SalarySlip>> {
        let (from_date, to_date) = self.check_mandatory()?;

        Ok(self
            .store
            .salary_slips(&self.filters.company)?
            .into_iter()
            .filter(|s| s.docstatus == docstatus)
            .filter(|s| s.start_date >= from_date && s.end_date <= to_date)
            .filter(|s| s.journal_entry.as_deref().map_or(true, str::is_empty))
            .filter(|s| s.salary_slip_based_on_timesheet == self.filters.salary_slip_based_on_timesheet)
            .filter(|s| self.matches_filters(&s.branch, &s.department, &s.designation))
            .collect())
    }

    /// Submits every draft slip of the window. Slips with negative net pay
    /// or that the store refuses stay in draft and are reported.
    pub fn submit_salary_slips(&mut self) -> Result<SalarySlipSubmissionLog> {
        let drafts = self.salary_slip_list(DocStatus::Draft)?;
        let mut log = SalarySlipSubmissionLog::default();

        for slip in drafts {
            if slip.net_pay < 0.0 {
                warn!("Not submitting {}: net pay {} is negative", slip.name, slip.net_pay);
                log.not_submitted
                    .push((slip.name, NotSubmittedReason::NegativeNetPay(slip.net_pay)));
                continue;
            }

            match self.store.submit_salary_slip(&slip.name) {
                Ok(()) => log.submitted.push(slip.name),
                Err(e) => {
                    warn!("Submitting {} failed: {}", slip.name, e);
                    log.not_submitted
                        .push((slip.name, NotSubmittedReason::Rejected(e.to_string())));
                }
            }
        }

        info!(
            "Submitted {} salary slips, {} left in draft",
            log.submitted.len(),
            log.not_submitted.len()
        );

        Ok(log)
    }

    /// Sum of rounded totals over submitted slips of the window.
    pub fn total_salary(&self) -> Result<f64> {
        let (from_date, to_date) = self.check_mandatory()?;

        Ok(self
            .store
            .salary_slips(&self.filters.company)?
            .iter()
            .filter(|s| s.docstatus == DocStatus::Submitted)
            .filter(|s| s.start_date >= from_date && s.end_date <= to_date)
            .filter(|s| self.matches_filters(&s.branch, &s.department, &s.designation))
            .map(|s| s.rounded_total)
            .sum())
    }

    pub fn salary_component_account(&self, salary_component: &str) -> Result<String> {
        self.store
            .component_account(salary_component, &self.filters.company)?
            .ok_or_else(|| ErpFinanceError::MissingComponentAccount(salary_component.to_string()))
    }

    /// Amounts of one component type over submitted, unpaid slips, summed
    /// per salary component and then per the component's default account.
    pub fn salary_component_totals(&self, component_type: ComponentType) -> Result<BTreeMap<String, f64>> {
        let slips = self.salary_slip_list(DocStatus::Submitted)?;

        let mut by_component: BTreeMap<&str, f64> = BTreeMap::new();
        for detail in slips.iter().flat_map(|s| s.components(component_type)) {
            *by_component.entry(detail.salary_component.as_str()).or_default() += detail.amount;
        }

        let mut by_account: BTreeMap<String, f64> = BTreeMap::new();
        for (component, amount) in by_component {
            let account = self.salary_component_account(component)?;
            *by_account.entry(account).or_default() += amount;
        }

        Ok(by_account)
    }

    /// Books earnings against deductions and the payment account, then
    /// marks the paid slips with the journal entry.
    pub fn make_journal_entry(
        &mut self,
        reference_number: Option<String>,
        reference_date: Option<NaiveDate>,
        posting_date: NaiveDate,
    ) -> Result<JournalEntryLog> {
        let (from_date, to_date) = self.check_mandatory()?;
        let earnings = self.salary_component_totals(ComponentType::Earnings)?;
        let deductions = self.salary_component_totals(ComponentType::Deductions)?;

        if earnings.is_empty() && deductions.is_empty() {
            return Ok(JournalEntryLog::default());
        }

        let payment_account = self
            .filters
            .payment_account
            .clone()
            .filter(|a| !a.is_empty())
            .ok_or_else(|| ErpFinanceError::MissingPaymentAccount(self.filters.company.clone()))?;

        let mut accounts = Vec::with_capacity(earnings.len() + deductions.len() + 1);
        let mut net_payable = 0.0;

        for (account, amount) in earnings {
            net_payable += amount;
            accounts.push(JournalEntryAccount {
                account,
                debit_in_account_currency: amount,
                credit_in_account_currency: 0.0,
            });
        }
        for (account, amount) in deductions {
            net_payable -= amount;
            accounts.push(JournalEntryAccount {
                account,
                debit_in_account_currency: 0.0,
                credit_in_account_currency: amount,
            });
        }
        accounts.push(JournalEntryAccount {
            account: payment_account,
            debit_in_account_currency: 0.0,
            credit_in_account_currency: net_payable,
        });

        let entry = JournalEntry {
            voucher_type: PAYROLL_VOUCHER_TYPE.to_string(),
            user_remark: format!("Payment of salary from {} to {}", from_date, to_date),
            company: self.filters.company.clone(),
            posting_date,
            accounts,
            cheque_no: reference_number,
            cheque_date: reference_date,
        };

        let journal_entry = match self.store.submit_journal_entry(entry) {
            Ok(name) => name,
            Err(e) => {
                warn!("Payroll journal entry was not submitted: {}", e);
                return Ok(JournalEntryLog {
                    journal_entry: None,
                    error: Some(e.to_string()),
                });
            }
        };

        info!("Posted payroll journal entry {} ({:.2} net)", journal_entry, net_payable);
        self.update_salary_slip_status(&journal_entry)?;

        Ok(JournalEntryLog {
            journal_entry: Some(journal_entry),
            error: None,
        })
    }

    fn update_salary_slip_status(&mut self, journal_entry: &str) -> Result<()> {
        for slip in self.salary_slip_list(DocStatus::Submitted)? {
            self.store.mark_salary_slip_paid(&slip.name, journal_entry)?;
        }
        Ok(())
    }
}

/// Start, end and length of `month` inside `fiscal_year`. Months earlier
/// in the calendar than the fiscal year's first month fall in the following
/// calendar year.
pub fn month_details_for(fiscal_year: &FiscalYear, month: u32) -> Result<MonthDetails> {
    if !(1..=12).contains(&month) {
        return Err(ErpFinanceError::InvalidMonth(month));
    }

    let year_start = fiscal_year.year_start_date;
    let offset = if month >= year_start.month() {
        month - year_start.month()
    } else {
        12 - year_start.month() + month
    };

    let month_start_date = add_months(year_start, offset)?;
    let month_end_date = last_day_of_month(month_start_date.year(), month)?;

    Ok(MonthDetails {
        year: month_start_date.year(),
        month_start_date,
        month_end_date,
        month_days: month_end_date.day(),
    })
}

pub fn month_details<S: PayrollStore + ?Sized>(
    store: &S,
    fiscal_year: &str,
    month: u32,
) -> Result<MonthDetails> {
    let fiscal_year = store
        .fiscal_year(fiscal_year)?
        .ok_or_else(|| ErpFinanceError::FiscalYearNotFound(fiscal_year.to_string()))?;
    month_details_for(&fiscal_year, month)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fiscal_year() -> FiscalYear {
        FiscalYear {
            name: "2023-2024".to_string(),
            year_start_date: NaiveDate::from_ymd_opt(2023, 4, 1).unwrap(),
            year_end_date: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        }
    }

    #[test]
    fn test_month_details_same_calendar_year() {
        let details = month_details_for(&fiscal_year(), 6).unwrap();
        assert_eq!(details.year, 2023);
        assert_eq!(details.month_start_date, NaiveDate::from_ymd_opt(2023, 6, 1).unwrap());
        assert_eq!(details.month_end_date, NaiveDate::from_ymd_opt(2023, 6, 30).unwrap());
        assert_eq!(details.month_days, 30);
    }

    #[test]
    fn test_month_details_rolls_into_next_year() {
        let details = month_details_for(&fiscal_year(), 2).unwrap();
        assert_eq!(details.year, 2024);
        assert_eq!(details.month_start_date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(details.month_days, 29);
    }

    #[test]
    fn test_month_details_rejects_bad_month() {
        assert!(matches!(
            month_details_for(&fiscal_year(), 13),
            Err(ErpFinanceError::InvalidMonth(13))
        ));
    }
}
