use crate::schema::{AccountGroupRow, Column, ColumnType, Period, Periodicity};
use crate::chart::LABEL_COLUMNS;

/// Turns a period list into the column layout of a report.
pub trait ReportRenderer {
    fn columns(&self, periodicity: Periodicity, periods: &[Period], company: Option<&str>) -> Vec<Column>;
}

/// Account and currency label columns followed by one currency column per
/// period.
#[derive(Debug, Clone, Default)]
pub struct TabularRenderer;

impl ReportRenderer for TabularRenderer {
    fn columns(&self, _periodicity: Periodicity, periods: &[Period], company: Option<&str>) -> Vec<Column> {
        let mut columns = Vec::with_capacity(periods.len() + LABEL_COLUMNS);

        columns.push(Column {
            fieldname: "account".to_string(),
            label: "Account".to_string(),
            fieldtype: ColumnType::Link,
            options: Some("Account".to_string()),
            width: Some(300),
            hidden: false,
        });

        columns.push(Column {
            fieldname: "currency".to_string(),
            label: "Currency".to_string(),
            fieldtype: ColumnType::Link,
            options: Some("Currency".to_string()),
            width: None,
            hidden: company.is_some(),
        });

        for period in periods {
            columns.push(Column {
                fieldname: period.key.clone(),
                label: period.label.clone(),
                fieldtype: ColumnType::Currency,
                options: Some("currency".to_string()),
                width: Some(150),
                hidden: false,
            });
        }

        columns
    }
}

fn period_columns(columns: &[Column]) -> &[Column] {
    columns.get(LABEL_COLUMNS..).unwrap_or(&[])
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn rows_to_csv(columns: &[Column], rows: &[AccountGroupRow]) -> String {
    let periods = period_columns(columns);
    let mut output = String::new();

    output.push_str("Account,Currency");
    for column in periods {
        output.push(',');
        output.push_str(&csv_field(&column.label));
    }
    output.push_str(",Total\n");

    for row in rows.iter().filter(|r| !r.is_blank()) {
        output.push_str(&csv_field(&row.account_name));
        output.push(',');
        output.push_str(row.currency.as_deref().unwrap_or(""));
        for column in periods {
            output.push_str(&format!(",{:.2}", row.value_at(&column.fieldname)));
        }
        output.push_str(&format!(",{:.2}\n", row.total));
    }

    output
}

pub fn rows_to_markdown(title: &str, columns: &[Column], rows: &[AccountGroupRow]) -> String {
    let periods = period_columns(columns);
    let mut output = String::new();

    output.push_str(&format!("# {}\n\n", title));

    output.push_str("| Account |");
    for column in periods {
        output.push_str(&format!(" {} |", column.label));
    }
    output.push('\n');

    output.push_str("|---|");
    for _ in periods {
        output.push_str("---:|");
    }
    output.push('\n');

    for row in rows.iter().filter(|r| !r.is_blank()) {
        let name = format!("{}{}", "&nbsp;".repeat(row.indent as usize * 2), row.account_name);
        let name = if row.account.is_none() {
            format!("**{}**", name)
        } else {
            name
        };
        output.push_str(&format!("| {} |", name));

        for column in periods {
            let value = row.value_at(&column.fieldname);
            let marker = if row.warn_if_negative && value < 0.0 { " ⚠" } else { "" };
            output.push_str(&format!(" {:.2}{} |", value, marker));
        }
        output.push('\n');
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn periods() -> Vec<Period> {
        vec![
            Period {
                key: "jan_2023".to_string(),
                label: "Jan 2023".to_string(),
                from_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
                to_date: NaiveDate::from_ymd_opt(2023, 1, 31).unwrap(),
            },
            Period {
                key: "feb_2023".to_string(),
                label: "Feb 2023".to_string(),
                from_date: NaiveDate::from_ymd_opt(2023, 2, 1).unwrap(),
                to_date: NaiveDate::from_ymd_opt(2023, 2, 28).unwrap(),
            },
        ]
    }

    #[test]
    fn test_columns_layout() {
        let columns = TabularRenderer.columns(Periodicity::Monthly, &periods(), Some("Acme"));

        assert_eq!(columns.len(), 4);
        assert_eq!(columns[0].fieldname, "account");
        assert_eq!(columns[0].width, Some(300));
        assert!(columns[1].hidden);
        assert_eq!(columns[2].fieldname, "jan_2023");
        assert_eq!(columns[3].label, "Feb 2023");
        assert_eq!(columns[3].fieldtype, ColumnType::Currency);
    }

    #[test]
    fn test_markdown_flags_negative_synthetic_rows() {
        let columns = TabularRenderer.columns(Periodicity::Monthly, &periods(), None);
        let mut row = AccountGroupRow::synthetic("Provisional Profit / Loss (Credit)", None);
        row.set_value("jan_2023", -5.0);

        let markdown = rows_to_markdown("Balance Sheet", &columns, &[row, AccountGroupRow::default()]);

        assert!(markdown.contains("# Balance Sheet"));
        assert!(markdown.contains("**Provisional Profit / Loss (Credit)**"));
        assert!(markdown.contains("-5.00 ⚠"));
        assert_eq!(markdown.lines().count(), 5);
    }

    #[test]
    fn test_csv_quotes_labels_with_commas() {
        let columns = TabularRenderer.columns(Periodicity::Monthly, &periods(), None);
        let mut row = AccountGroupRow::synthetic("Loans, Secured", Some("USD".to_string()));
        row.set_value("feb_2023", 12.5);
        row.total = 12.5;

        let csv = rows_to_csv(&columns, &[row]);
        let mut lines = csv.lines();

        assert_eq!(lines.next(), Some("Account,Currency,Jan 2023,Feb 2023,Total"));
        assert_eq!(lines.next(), Some("\"Loans, Secured\",USD,0.00,12.50,12.50"));
    }
}
