use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ErpFinanceError {
    #[error("Please set {0}")]
    MissingMandatoryField(String),

    #[error("Fiscal Year {0} not found")]
    FiscalYearNotFound(String),

    #[error("Invalid month {0}: must be between 1 and 12")]
    InvalidMonth(u32),

    #[error("Invalid period range: {from} is after {to}")]
    InvalidPeriodRange { from: NaiveDate, to: NaiveDate },

    #[error("Please set default account in Salary Component {0}")]
    MissingComponentAccount(String),

    #[error("Please set payment account for company {0}")]
    MissingPaymentAccount(String),

    #[error("Date calculation error: {0}")]
    DateError(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ErpFinanceError>;
