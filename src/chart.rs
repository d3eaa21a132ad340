use crate::schema::{AccountGroup, AccountGroupRow, Column};
use serde::{Serialize, Serializer};
use serde_json::{json, Value};

/// Number of leading report columns that hold row labels, not periods.
pub const LABEL_COLUMNS: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub name: String,
    pub values: Vec<f64>,
}

/// Chart payload. Serialises as
/// `{"data": {"x": "x", "columns": [["x", labels..], [name, values..], ..]}}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartData {
    pub x_labels: Vec<String>,
    pub series: Vec<ChartSeries>,
}

impl ChartData {
    pub fn series(&self, name: &str) -> Option<&ChartSeries> {
        self.series.iter().find(|s| s.name == name)
    }

    pub fn to_value(&self) -> Value {
        let mut columns: Vec<Value> = Vec::with_capacity(self.series.len() + 1);

        let mut x_axis = vec![Value::from("x")];
        x_axis.extend(self.x_labels.iter().map(|l| Value::from(l.as_str())));
        columns.push(Value::Array(x_axis));

        for series in &self.series {
            let mut column = vec![Value::from(series.name.as_str())];
            column.extend(series.values.iter().map(|v| json!(v)));
            columns.push(Value::Array(column));
        }

        json!({
            "data": {
                "x": "x",
                "columns": columns,
            }
        })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.to_value())
    }
}

impl Serialize for ChartData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// Builds the assets / liabilities / equity chart from the report columns.
/// A group with no rows contributes no series.
pub fn build_chart_series(
    columns: &[Column],
    asset: &[AccountGroupRow],
    liability: &[AccountGroupRow],
    equity: &[AccountGroupRow],
) -> ChartData {
    let period_columns = columns.get(LABEL_COLUMNS..).unwrap_or(&[]);

    let x_labels = period_columns.iter().map(|c| c.label.clone()).collect();

    let series = [
        (AccountGroup::Asset, asset),
        (AccountGroup::Liability, liability),
        (AccountGroup::Equity, equity),
    ]
    .into_iter()
    .filter(|(_, rows)| !rows.is_empty())
    .map(|(group, rows)| {
        let grand_total = AccountGroupRow::grand_total(rows);
        ChartSeries {
            name: group.section_label().to_string(),
            values: period_columns
                .iter()
                .map(|c| grand_total.map(|r| r.value_at(&c.fieldname)).unwrap_or(0.0))
                .collect(),
        }
    })
    .collect();

    ChartData { x_labels, series }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnType;

    fn column(fieldname: &str, label: &str) -> Column {
        Column {
            fieldname: fieldname.to_string(),
            label: label.to_string(),
            fieldtype: ColumnType::Currency,
            options: None,
            width: None,
            hidden: false,
        }
    }

    fn columns() -> Vec<Column> {
        vec![
            column("account", "Account"),
            column("currency", "Currency"),
            column("jan_2023", "Jan 2023"),
            column("feb_2023", "Feb 2023"),
        ]
    }

    fn group(values: &[(&str, f64)]) -> Vec<AccountGroupRow> {
        let mut total = AccountGroupRow::synthetic("Total", None);
        total.is_grand_total = true;
        for (key, value) in values {
            total.set_value(key, *value);
        }
        vec![AccountGroupRow::synthetic("Root", None), total, AccountGroupRow::default()]
    }

    #[test]
    fn test_chart_skips_label_columns() {
        let asset = group(&[("jan_2023", 100.0), ("feb_2023", 120.0)]);
        let liability = group(&[("jan_2023", 60.0)]);
        let equity = group(&[("feb_2023", 20.0)]);

        let chart = build_chart_series(&columns(), &asset, &liability, &equity);

        assert_eq!(chart.x_labels, vec!["Jan 2023", "Feb 2023"]);
        assert_eq!(chart.series.len(), 3);
        assert_eq!(chart.series("Assets").unwrap().values, vec![100.0, 120.0]);
        assert_eq!(chart.series("Liabilities").unwrap().values, vec![60.0, 0.0]);
        assert_eq!(chart.series("Equity").unwrap().values, vec![0.0, 20.0]);
    }

    #[test]
    fn test_empty_group_is_omitted() {
        let asset = group(&[("jan_2023", 100.0)]);
        let chart = build_chart_series(&columns(), &asset, &[], &[]);

        assert_eq!(chart.series.len(), 1);
        assert!(chart.series("Liabilities").is_none());
        assert_eq!(chart.x_labels.len(), 2);
    }

    #[test]
    fn test_chart_json_shape() {
        let asset = group(&[("jan_2023", 100.0), ("feb_2023", 120.0)]);
        let chart = build_chart_series(&columns(), &asset, &[], &[]);

        let value = serde_json::to_value(&chart).unwrap();
        assert_eq!(value["data"]["x"], "x");
        assert_eq!(value["data"]["columns"][0], json!(["x", "Jan 2023", "Feb 2023"]));
        assert_eq!(value["data"]["columns"][1], json!(["Assets", 100.0, 120.0]));
    }
}
