use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{Datelike, NaiveDate};

// ---------------------------------------------------------------------------
// Recognised column names
// ---------------------------------------------------------------------------

pub const REGION: &str = "Region";
pub const PRODUCT: &str = "Product";
pub const CHANNEL: &str = "Channel";
pub const DATE: &str = "Date";
pub const SALES: &str = "Sales";
pub const LEADS: &str = "Leads";
pub const CONVERSIONS: &str = "Conversions";
pub const MARKETING_SPEND: &str = "Marketing_Spend";
pub const CUSTOMER_SEGMENT: &str = "Customer_Segment";

/// Derived: `Conversions / Leads`, missing when `Leads` is zero.
pub const CONVERSION_RATE: &str = "Conversion_Rate";
/// Derived: `YYYY-MM` of `Date`.
pub const MONTH: &str = "Month";

/// Categorical columns that get a sidebar multi-select.
pub const FILTER_COLUMNS: [&str; 3] = [REGION, PRODUCT, CHANNEL];

// ---------------------------------------------------------------------------
// Value – a single cell
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value.
/// Used as a key in `BTreeMap` / `BTreeSet` downstream, so `Value` must be `Ord`.
#[derive(Debug, Clone)]
pub enum Value {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Null,
}

// -- Manual Eq/Ord so we can put Value in BTreeSet --

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use Value::*;
        fn discriminant(v: &Value) -> u8 {
            match v {
                Null => 0,
                Number(_) => 1,
                Text(_) => 2,
                Date(_) => 3,
            }
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            // -0.0 and 0.0 are one key
            (Number(a), Number(b)) => (a + 0.0).total_cmp(&(b + 0.0)),
            (Text(a), Text(b)) => a.cmp(b),
            (Date(a), Date(b)) => a.cmp(b),
            _ => discriminant(self).cmp(&discriminant(other)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{s}"),
            Value::Number(v) => write!(f, "{v}"),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Null => Ok(()),
        }
    }
}

impl Value {
    /// Numeric view of the cell; `None` for anything but a finite number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(v) if v.is_finite() => Some(*v),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the CSV
// ---------------------------------------------------------------------------

/// A single record: column_name → value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub values: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(values: BTreeMap<String, Value>) -> Self {
        Self { values }
    }

    /// Cell for `column`; absent columns read as `Null`.
    pub fn get(&self, column: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.values.get(column).unwrap_or(&NULL)
    }

    pub fn number(&self, column: &str) -> Option<f64> {
        self.get(column).as_f64()
    }

    pub fn date(&self, column: &str) -> Option<NaiveDate> {
        self.get(column).as_date()
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed dataset with its column schema.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// All records (rows), in file order.
    pub records: Vec<Record>,
    /// Column names in header order, derived columns appended.
    pub column_names: Vec<String>,
}

impl Dataset {
    /// Build a dataset from parsed records, appending the derived
    /// `Conversion_Rate` and `Month` columns when their inputs exist.
    pub fn from_records(column_names: Vec<String>, records: Vec<Record>) -> Self {
        let mut dataset = Dataset {
            records,
            column_names,
        };
        dataset.derive_columns();
        dataset
    }

    fn derive_columns(&mut self) {
        if self.has_columns(&[LEADS, CONVERSIONS]) && !self.has_column(CONVERSION_RATE) {
            for record in &mut self.records {
                let rate = conversion_rate(record.number(CONVERSIONS), record.number(LEADS));
                record.values.insert(CONVERSION_RATE.to_string(), rate);
            }
            self.column_names.push(CONVERSION_RATE.to_string());
        }

        if self.has_column(DATE) && !self.has_column(MONTH) {
            for record in &mut self.records {
                let month = match record.date(DATE) {
                    Some(d) => Value::Text(format!("{:04}-{:02}", d.year(), d.month())),
                    None => Value::Null,
                };
                record.values.insert(MONTH.to_string(), month);
            }
            self.column_names.push(MONTH.to_string());
        }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_names.iter().any(|c| c == column)
    }

    /// Capability check: the schema is a superset of `columns`.
    pub fn has_columns(&self, columns: &[&str]) -> bool {
        columns.iter().all(|c| self.has_column(c))
    }

    /// Sorted distinct non-missing values of `column`; empty when absent.
    pub fn distinct_values(&self, column: &str) -> BTreeSet<Value> {
        if !self.has_column(column) {
            return BTreeSet::new();
        }
        self.records
            .iter()
            .map(|r| r.get(column))
            .filter(|v| !v.is_null())
            .cloned()
            .collect()
    }

    /// Earliest and latest parseable date in `column`.
    pub fn date_span(&self, column: &str) -> Option<(NaiveDate, NaiveDate)> {
        let mut dates = self.records.iter().filter_map(|r| r.date(column));
        let first = dates.next()?;
        Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// `conversions / leads`, missing on zero leads or missing inputs.
pub fn conversion_rate(conversions: Option<f64>, leads: Option<f64>) -> Value {
    match (conversions, leads) {
        (Some(c), Some(l)) if l != 0.0 => Value::Number(c / l),
        _ => Value::Null,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build a dataset from `(column, value)` rows; the schema is the
    /// union of the columns in first-seen order.
    pub(crate) fn dataset(rows: &[&[(&str, Value)]]) -> Dataset {
        let mut columns: Vec<String> = Vec::new();
        let mut records = Vec::new();
        for row in rows {
            let mut values = BTreeMap::new();
            for (col, val) in row.iter() {
                if !columns.iter().any(|c| c == col) {
                    columns.push(col.to_string());
                }
                values.insert(col.to_string(), val.clone());
            }
            records.push(Record::new(values));
        }
        Dataset::from_records(columns, records)
    }

    pub(crate) fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    pub(crate) fn date(s: &str) -> Value {
        Value::Date(NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap())
    }

    #[test]
    fn conversion_rate_is_missing_on_zero_leads() {
        let ds = dataset(&[
            &[(LEADS, Value::Number(10.0)), (CONVERSIONS, Value::Number(5.0))],
            &[(LEADS, Value::Number(0.0)), (CONVERSIONS, Value::Number(5.0))],
            &[(LEADS, Value::Null), (CONVERSIONS, Value::Number(1.0))],
        ]);
        assert!(ds.has_column(CONVERSION_RATE));
        assert_eq!(ds.records[0].get(CONVERSION_RATE), &Value::Number(0.5));
        assert_eq!(ds.records[1].get(CONVERSION_RATE), &Value::Null);
        assert_eq!(ds.records[2].get(CONVERSION_RATE), &Value::Null);
    }

    #[test]
    fn derived_columns_need_their_inputs() {
        let ds = dataset(&[&[(SALES, Value::Number(1.0)), (LEADS, Value::Number(2.0))]]);
        assert!(!ds.has_column(CONVERSION_RATE));
        assert!(!ds.has_column(MONTH));
        assert_eq!(ds.column_names, vec![SALES.to_string(), LEADS.to_string()]);
    }

    #[test]
    fn month_follows_date() {
        let ds = dataset(&[&[(DATE, date("2024-03-09"))], &[(DATE, Value::Null)]]);
        assert_eq!(ds.records[0].get(MONTH), &text("2024-03"));
        assert_eq!(ds.records[1].get(MONTH), &Value::Null);
        assert_eq!(ds.column_names.last().map(String::as_str), Some(MONTH));
    }

    #[test]
    fn distinct_values_skip_nulls_and_absent_columns() {
        let ds = dataset(&[
            &[(REGION, text("West"))],
            &[(REGION, text("East"))],
            &[(REGION, Value::Null)],
            &[(REGION, text("West"))],
        ]);
        let values: Vec<Value> = ds.distinct_values(REGION).into_iter().collect();
        assert_eq!(values, vec![text("East"), text("West")]);
        assert!(ds.distinct_values(PRODUCT).is_empty());
    }

    #[test]
    fn date_span_ignores_missing_dates() {
        let ds = dataset(&[
            &[(DATE, date("2024-02-01"))],
            &[(DATE, Value::Null)],
            &[(DATE, date("2023-12-31"))],
        ]);
        let (lo, hi) = ds.date_span(DATE).unwrap();
        assert_eq!(Value::Date(lo), date("2023-12-31"));
        assert_eq!(Value::Date(hi), date("2024-02-01"));
        assert!(dataset(&[&[(DATE, Value::Null)]]).date_span(DATE).is_none());
    }

    #[test]
    fn values_order_across_variants() {
        assert!(Value::Null < Value::Number(-1.0));
        assert!(Value::Number(1e9) < text("a"));
        assert!(text("z") < date("2000-01-01"));
        assert_eq!(Value::Number(3.0).to_string(), "3");
        assert_eq!(Value::Number(0.125).to_string(), "0.125");
    }

    #[test]
    fn signed_zeros_are_one_value() {
        assert_eq!(Value::Number(-0.0), Value::Number(0.0));
        assert_eq!(
            Value::Number(-0.0).cmp(&Value::Number(0.0)),
            std::cmp::Ordering::Equal
        );
        let ds = dataset(&[
            &[(REGION, Value::Number(-0.0))],
            &[(REGION, Value::Number(0.0))],
        ]);
        assert_eq!(ds.distinct_values(REGION).len(), 1);
    }
}
