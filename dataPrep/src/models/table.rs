use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use serde::{Deserialize, Serialize};
use crate::utils::error::{PrepError, PrepResult};

/// A single table cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Number(f64),
    Text(String),
}

impl Value {
    /// Parse a raw cell: integer first, then float, otherwise text.
    pub fn parse(raw: &str) -> Option<Value> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return Some(Value::Integer(i));
        }
        if let Ok(x) = trimmed.parse::<f64>() {
            return Some(Value::Number(x));
        }
        Some(Value::Text(trimmed.to_string()))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Number(x) => Some(*x),
            Value::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Number(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Number(x)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Integer(i as i64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

// Numbers sort before text; integers and floats compare numerically.
impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Text(_), _) => Ordering::Greater,
            (_, Value::Text(_)) => Ordering::Less,
            (a, b) => {
                let (x, y) = (a.as_f64().unwrap_or(f64::NAN), b.as_f64().unwrap_or(f64::NAN));
                x.total_cmp(&y)
            }
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

/// One record of a table: an index label plus named cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub label: String,
    pub cells: BTreeMap<String, Value>,
}

impl Row {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            cells: BTreeMap::new(),
        }
    }

    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    pub fn set(&mut self, column: &str, value: impl Into<Value>) {
        self.cells.insert(column.to_string(), value.into());
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        self.cells.remove(column)
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells.get(column)
    }

    pub fn value(&self, column: &str) -> PrepResult<&Value> {
        self.cells.get(column).ok_or_else(|| {
            PrepError::LookupFailure(format!("column '{}' in row '{}'", column, self.label))
        })
    }

    pub fn number(&self, column: &str) -> PrepResult<f64> {
        self.value(column)?.as_f64().ok_or_else(|| {
            PrepError::LookupFailure(format!(
                "numeric value for column '{}' in row '{}'",
                column, self.label
            ))
        })
    }

    /// Integral cell value; fractional or non-finite numbers are rejected.
    pub fn integer(&self, column: &str) -> PrepResult<i64> {
        match self.value(column)? {
            Value::Integer(i) => Ok(*i),
            Value::Number(x) if x.is_finite() && x.fract() == 0.0 && x.abs() < i64::MAX as f64 => Ok(*x as i64),
            other => Err(PrepError::LookupFailure(format!(
                "integer value for column '{}' in row '{}', found '{}'",
                column, self.label, other
            ))),
        }
    }

    /// Non-negative integral value that fits `u32`, e.g. a year or a lifetime.
    pub fn unsigned(&self, column: &str) -> PrepResult<u32> {
        let value = self.integer(column)?;
        u32::try_from(value).map_err(|_| {
            PrepError::LookupFailure(format!(
                "non-negative integer for column '{}' in row '{}', found {}",
                column, self.label, value
            ))
        })
    }

    /// Text representation of a cell; numbers are rendered, not rejected.
    pub fn text(&self, column: &str) -> PrepResult<String> {
        Ok(self.value(column)?.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn find(&self, label: &str) -> Option<&Row> {
        self.rows.iter().find(|row| row.label == label)
    }

    /// Union of all cell names in first-seen order.
    pub fn column_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for row in &self.rows {
            for name in row.cells.keys() {
                if !names.iter().any(|n| n == name) {
                    names.push(name.clone());
                }
            }
        }
        names
    }

    /// Fails with the first row that lacks `column`.
    pub fn require_column(&self, column: &str) -> PrepResult<()> {
        match self.rows.iter().find(|row| row.get(column).is_none()) {
            Some(row) => Err(PrepError::LookupFailure(format!(
                "column '{}' in row '{}'",
                column, row.label
            ))),
            None => Ok(()),
        }
    }

    pub fn numbers(&self, column: &str) -> PrepResult<Vec<f64>> {
        self.rows.iter().map(|row| row.number(column)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_prefers_integer_then_float() {
        assert_eq!(Value::parse("42"), Some(Value::Integer(42)));
        assert_eq!(Value::parse("0.45"), Some(Value::Number(0.45)));
        assert_eq!(Value::parse("chp"), Some(Value::Text("chp".to_string())));
        assert_eq!(Value::parse("  "), None);
    }

    #[test]
    fn mixed_numbers_compare_numerically() {
        assert_eq!(Value::Integer(3), Value::Number(3.0));
        assert!(Value::Integer(2) < Value::Number(2.5));
        assert!(Value::Number(1e9) < Value::Text("a".to_string()));
    }

    #[test]
    fn missing_column_reports_row_and_column() {
        let row = Row::new("pp_7").with("capacity", 12.0);
        assert_eq!(row.number("capacity").unwrap(), 12.0);
        match row.number("efficiency_el") {
            Err(PrepError::LookupFailure(msg)) => {
                assert!(msg.contains("efficiency_el"));
                assert!(msg.contains("pp_7"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn integer_accessors_reject_lossy_values() {
        let row = Row::new("pv_2025")
            .with("year", 2025i64)
            .with("lifetime", 25.0)
            .with("fractional", 2025.7)
            .with("negative", -3.0)
            .with("huge", 1e12)
            .with("name", "pv");
        assert_eq!(row.unsigned("year").unwrap(), 2025);
        assert_eq!(row.unsigned("lifetime").unwrap(), 25);
        assert_eq!(row.integer("negative").unwrap(), -3);
        for column in ["fractional", "negative", "huge", "name"] {
            assert!(
                matches!(row.unsigned(column), Err(PrepError::LookupFailure(_))),
                "{} accepted",
                column
            );
        }
        assert!(row.integer("fractional").is_err());
    }

    #[test]
    fn column_names_keep_first_seen_order() {
        let table = Table::from_rows(vec![
            Row::new("a").with("capacity", 1.0),
            Row::new("b").with("capacity", 2.0).with("cluster", 1i64),
        ]);
        assert_eq!(table.column_names(), vec!["capacity", "cluster"]);
        assert!(table.require_column("cluster").is_err());
    }
}
