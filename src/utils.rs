use crate::error::{ErpFinanceError, Result};
use crate::schema::{FiscalYear, Period, Periodicity, MAX_FLOAT_PRECISION};
use chrono::{Datelike, Days, Months, NaiveDate};

pub fn last_day_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    let next_month = if month == 12 { 1 } else { month + 1 };
    let next_year = if month == 12 { year + 1 } else { year };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.checked_sub_days(Days::new(1)))
        .ok_or_else(|| {
            ErpFinanceError::DateError(format!("No month {} in year {}", month, year))
        })
}

pub fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate> {
    date.checked_add_months(Months::new(months)).ok_or_else(|| {
        ErpFinanceError::DateError(format!("Cannot add {} months to {}", months, date))
    })
}

pub fn months_between(start: NaiveDate, end: NaiveDate) -> i32 {
    let year_diff = end.year() - start.year();
    let month_diff = end.month() as i32 - start.month() as i32;
    year_diff * 12 + month_diff
}

/// Rounds half away from zero to `precision` decimal digits, at most
/// [`MAX_FLOAT_PRECISION`].
pub fn round_to_precision(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision.min(MAX_FLOAT_PRECISION) as i32);
    (value * factor).round() / factor
}

pub fn period_key(to_date: NaiveDate) -> String {
    to_date.format("%b_%Y").to_string().to_lowercase()
}

/// Splits the span covered by `fiscal_years` into consecutive reporting
/// periods of the requested width. The last period is clipped to the end of
/// the final fiscal year.
///
/// Yearly periods are labelled with the fiscal year ending on the same date
/// when there is one; every other period is labelled `Mon YYYY` after its
/// end date.
pub fn build_period_list(
    fiscal_years: &[FiscalYear],
    periodicity: Periodicity,
) -> Result<Vec<Period>> {
    let (first, last) = match (fiscal_years.first(), fiscal_years.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => {
            return Err(ErpFinanceError::MissingMandatoryField(
                "from_fiscal_year".to_string(),
            ))
        }
    };

    let start = first.year_start_date;
    let end = last.year_end_date;
    if start > end {
        return Err(ErpFinanceError::InvalidPeriodRange {
            from: start,
            to: end,
        });
    }

    let step = periodicity.months();
    let span = months_between(start, end).max(0) as u32 + 1;
    let mut periods = Vec::with_capacity(span.div_ceil(step) as usize);
    let mut from_date = start;

    while from_date <= end {
        let next_start = add_months(from_date, step)?;
        let mut to_date = next_start.checked_sub_days(Days::new(1)).ok_or_else(|| {
            ErpFinanceError::DateError(format!("No day before {}", next_start))
        })?;
        if to_date > end {
            to_date = end;
        }

        let label = match periodicity {
            Periodicity::Yearly => fiscal_years
                .iter()
                .find(|fy| fy.year_end_date == to_date)
                .map(|fy| fy.name.clone())
                .unwrap_or_else(|| to_date.format("%b %Y").to_string()),
            _ => to_date.format("%b %Y").to_string(),
        };

        periods.push(Period {
            key: period_key(to_date),
            label,
            from_date,
            to_date,
        });

        from_date = next_start;
    }

    Ok(periods)
}
