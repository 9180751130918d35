//! Tabular input: named columns of numbers, text or missing cells.
//!
//! A `Dataset` is read-only once built. Charts only ever select columns,
//! filter rows by index and read values.

use crate::error::NeonError;
use anyhow::{Context, Result};
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// A single cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
    Missing,
}

impl Value {
    /// Parse a raw CSV cell. Empty and the usual NA spellings become `Missing`.
    pub fn parse(raw: &str) -> Self {
        let s = raw.trim();
        match s {
            "" | "NA" | "N/A" | "NaN" | "nan" | "null" | "None" => Value::Missing,
            _ => match s.parse::<f64>() {
                Ok(v) if v.is_finite() => Value::Number(v),
                _ => Value::Text(s.to_string()),
            },
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Display form used for categories and legend labels.
    /// Whole numbers print without a decimal point (`3`, not `3.0`).
    pub fn label(&self) -> Option<String> {
        match self {
            Value::Number(v) if v.fract() == 0.0 && v.abs() < 1e15 => {
                Some(format!("{}", *v as i64))
            }
            Value::Number(v) => Some(v.to_string()),
            Value::Text(s) => Some(s.clone()),
            Value::Missing => None,
        }
    }

    fn from_json(v: &serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Missing,
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Missing),
            serde_json::Value::String(s) => Value::parse(s),
            serde_json::Value::Bool(b) => Value::Text(b.to_string()),
            other => Value::Text(other.to_string()),
        }
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn numeric(name: impl Into<String>, values: impl IntoIterator<Item = f64>) -> Self {
        Self::new(name, values.into_iter().map(Value::Number).collect())
    }

    pub fn text<S: Into<String>>(name: impl Into<String>, values: impl IntoIterator<Item = S>) -> Self {
        Self::new(name, values.into_iter().map(|s| Value::Text(s.into())).collect())
    }

    /// True when every present cell is a number and at least one is present.
    pub fn is_numeric(&self) -> bool {
        let mut any = false;
        for v in &self.values {
            match v {
                Value::Number(_) => any = true,
                Value::Missing => {}
                Value::Text(_) => return false,
            }
        }
        any
    }
}

/// A labeled list of numbers, the input shape of box plots.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub values: Vec<f64>,
}

impl Series {
    pub fn new(label: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            label: label.into(),
            values,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    rows: usize,
}

impl Dataset {
    /// Build from columns; all columns must have the same length.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let rows = columns.first().map(|c| c.values.len()).unwrap_or(0);
        for c in &columns {
            if c.values.len() != rows {
                return Err(NeonError::RaggedColumns {
                    column: c.name.clone(),
                    expected: rows,
                    found: c.values.len(),
                }
                .into());
            }
        }
        Ok(Self { columns, rows })
    }

    /// Read a CSV file with a header row.
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("cannot open {}", path.display()))?;
        Self::from_csv_reader(file).with_context(|| format!("cannot parse {}", path.display()))
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new().flexible(false).from_reader(reader);
        let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
        let mut values: Vec<Vec<Value>> = vec![Vec::new(); headers.len()];
        for record in rdr.records() {
            let record = record?;
            for (i, cell) in record.iter().enumerate() {
                values[i].push(Value::parse(cell));
            }
        }
        Self::from_columns(
            headers
                .into_iter()
                .zip(values)
                .map(|(name, vals)| Column::new(name, vals))
                .collect(),
        )
    }

    /// Parse a JSON array of flat records. Keys of one record come back sorted
    /// (serde_json maps are ordered by key), new keys of later records are
    /// appended. Absent keys are missing cells.
    pub fn from_json_records(json: &str) -> Result<Self> {
        let records: Vec<serde_json::Map<String, serde_json::Value>> = serde_json::from_str(json)?;
        let mut names: Vec<String> = Vec::new();
        for rec in &records {
            for key in rec.keys() {
                if !names.contains(key) {
                    names.push(key.clone());
                }
            }
        }
        let columns = names
            .into_iter()
            .map(|name| {
                let vals = records
                    .iter()
                    .map(|rec| rec.get(&name).map(Value::from_json).unwrap_or(Value::Missing))
                    .collect();
                Column::new(name, vals)
            })
            .collect();
        Self::from_columns(columns)
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Result<&Column, NeonError> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| NeonError::MissingColumn(name.to_string()))
    }

    pub fn value(&self, column: &str, row: usize) -> Result<&Value, NeonError> {
        let col = self.column(column)?;
        col.values.get(row).ok_or_else(|| {
            NeonError::InvalidInput(format!("row {row} out of range for {} rows", self.rows))
        })
    }

    /// Numeric view of a column. Text cells are an error, missing cells are `None`.
    pub fn numeric(&self, name: &str) -> Result<Vec<Option<f64>>, NeonError> {
        let col = self.column(name)?;
        col.values
            .iter()
            .enumerate()
            .map(|(row, v)| match v {
                Value::Number(x) => Ok(Some(*x)),
                Value::Missing => Ok(None),
                Value::Text(s) => Err(NeonError::NotNumeric {
                    column: name.to_string(),
                    row,
                    value: s.clone(),
                }),
            })
            .collect()
    }

    /// Names of all numeric columns, in dataset order.
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.is_numeric())
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Row order sorted by a column. Numbers sort numerically, text lexically,
    /// missing cells always go last. The sort is stable.
    pub fn sorted_rows(&self, by: &str, descending: bool) -> Result<Vec<usize>, NeonError> {
        let col = self.column(by)?;
        let mut idx: Vec<usize> = (0..self.rows).collect();
        idx.sort_by(|&a, &b| {
            use std::cmp::Ordering;
            let (va, vb) = (&col.values[a], &col.values[b]);
            match (va, vb) {
                (Value::Missing, Value::Missing) => Ordering::Equal,
                (Value::Missing, _) => Ordering::Greater,
                (_, Value::Missing) => Ordering::Less,
                _ => {
                    let ord = match (va, vb) {
                        (Value::Number(x), Value::Number(y)) => x.total_cmp(y),
                        _ => va.label().cmp(&vb.label()),
                    };
                    if descending { ord.reverse() } else { ord }
                }
            }
        });
        Ok(idx)
    }

    /// Collect the numeric values of `value_col` grouped by the categories of
    /// `by_col`, categories in first-seen order. Missing cells are dropped.
    pub fn grouped_values(&self, value_col: &str, by_col: &str) -> Result<Vec<Series>> {
        let values = self.numeric(value_col)?;
        let by = self.column(by_col)?;
        let mut out: Vec<Series> = Vec::new();
        for (row, v) in values.iter().enumerate() {
            let (Some(v), Some(key)) = (v, by.values[row].label()) else {
                continue;
            };
            match out.iter_mut().find(|s| s.label == key) {
                Some(s) => s.values.push(*v),
                None => out.push(Series::new(key, vec![*v])),
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_cells_are_typed() {
        let csv = "city,temp,note\nTokyo,21.5,warm\nOsaka,,NA\nKyoto,19,\n";
        let ds = Dataset::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.column_names(), vec!["city", "temp", "note"]);
        assert_eq!(ds.numeric("temp").unwrap(), vec![Some(21.5), None, Some(19.0)]);
        assert!(ds.column("note").unwrap().values[1].is_missing());
        assert_eq!(ds.numeric_columns(), vec!["temp"]);
    }

    #[test]
    fn text_in_numeric_column_is_reported() {
        let ds = Dataset::from_columns(vec![Column::text("a", ["1", "x"])]).unwrap();
        // "1" was given as text on purpose; numeric() only accepts Number cells.
        let err = ds.numeric("a").unwrap_err();
        assert!(matches!(err, NeonError::NotNumeric { row: 0, .. }));
    }

    #[test]
    fn ragged_columns_rejected() {
        let err = Dataset::from_columns(vec![
            Column::numeric("a", [1.0, 2.0]),
            Column::numeric("b", [1.0]),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("`b`"));
    }

    #[test]
    fn sorted_rows_puts_missing_last() {
        let ds = Dataset::from_columns(vec![Column::new(
            "v",
            vec![Value::Number(2.0), Value::Missing, Value::Number(5.0), Value::Number(1.0)],
        )])
        .unwrap();
        assert_eq!(ds.sorted_rows("v", true).unwrap(), vec![2, 0, 3, 1]);
        assert_eq!(ds.sorted_rows("v", false).unwrap(), vec![3, 0, 2, 1]);
    }

    #[test]
    fn whole_numbers_label_without_decimals() {
        assert_eq!(Value::Number(3.0).label().as_deref(), Some("3"));
        assert_eq!(Value::Number(2.5).label().as_deref(), Some("2.5"));
        assert_eq!(Value::Missing.label(), None);
    }

    #[test]
    fn value_past_the_last_row_is_an_error() {
        let ds = Dataset::from_columns(vec![Column::numeric("v", [1.0, 2.0])]).unwrap();
        assert_eq!(ds.value("v", 1).unwrap(), &Value::Number(2.0));
        assert!(matches!(ds.value("v", 2), Err(NeonError::InvalidInput(_))));
    }
}
