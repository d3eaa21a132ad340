use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SalarySlipCreationLog {
    pub created: Vec<String>,
}

impl fmt::Display for SalarySlipCreationLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.created.is_empty() {
            return write!(
                f,
                "No employee for the above selected criteria OR salary slip already created"
            );
        }
        write!(f, "Salary Slip Created\n\n{}", self.created.join("\n"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum NotSubmittedReason {
    NegativeNetPay(f64),
    Rejected(String),
}

impl fmt::Display for NotSubmittedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotSubmittedReason::NegativeNetPay(net_pay) => {
                write!(f, "net pay {:.2} is less than 0", net_pay)
            }
            NotSubmittedReason::Rejected(reason) => write!(f, "{}", reason),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SalarySlipSubmissionLog {
    pub submitted: Vec<String>,
    pub not_submitted: Vec<(String, NotSubmittedReason)>,
}

impl SalarySlipSubmissionLog {
    pub fn is_empty(&self) -> bool {
        self.submitted.is_empty() && self.not_submitted.is_empty()
    }
}

impl fmt::Display for SalarySlipSubmissionLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "No salary slip found to submit for the above selected criteria");
        }

        if !self.submitted.is_empty() {
            write!(f, "Salary Slips Submitted:\n\n{}", self.submitted.join("\n"))?;
        }

        if !self.not_submitted.is_empty() {
            if !self.submitted.is_empty() {
                write!(f, "\n\n")?;
            }
            writeln!(f, "Not Submitted Salary Slips:")?;
            for (name, reason) in &self.not_submitted {
                write!(f, "\n{}: {}", name, reason)?;
            }
            write!(
                f,
                "\n\nCheck that net pay is not negative and that the employee master is \
                 complete, then submit the Salary Slip again."
            )?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct JournalEntryLog {
    pub journal_entry: Option<String>,
    pub error: Option<String>,
}

impl fmt::Display for JournalEntryLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.journal_entry, &self.error) {
            (Some(name), _) => write!(f, "Journal Entry Submitted\n{}", name),
            (None, Some(error)) => write!(f, "Journal Entry not submitted: {}", error),
            (None, None) => write!(f, "No submitted Salary Slip found"),
        }
    }
}
