use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use thiserror::Error;

use super::model::{Dataset, Record, Value, DATE};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV row {row}: {source}")]
    Csv {
        row: usize,
        #[source]
        source: csv::Error,
    },
    #[error("CSV file has no header row")]
    MissingHeader,
}

/// Which text encoding the file was decoded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Latin1,
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a sales dataset from a CSV file with a header row.
pub fn load_file(path: &Path) -> Result<Dataset, LoadError> {
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let (text, encoding) = decode_text(&bytes);
    if encoding == TextEncoding::Latin1 {
        log::warn!(
            "{} is not valid UTF-8, decoded as ISO-8859-1",
            path.display()
        );
    }
    parse_csv(&text)
}

/// Decode raw file bytes: UTF-8 first (BOM stripped), ISO-8859-1 on failure.
///
/// ISO-8859-1 maps every byte to a code point, so the fallback cannot fail.
pub fn decode_text(bytes: &[u8]) -> (Cow<'_, str>, TextEncoding) {
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => (Cow::Borrowed(s), TextEncoding::Utf8),
        Err(_) => (encoding_rs::mem::decode_latin1(bytes), TextEncoding::Latin1),
    }
}

// ---------------------------------------------------------------------------
// CSV parsing
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one record per line.
/// The `Date` column is parsed as dates (unparseable → missing); every
/// other cell is a number when it parses as one, text otherwise.
pub fn parse_csv(text: &str) -> Result<Dataset, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|source| LoadError::Csv { row: 0, source })?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(LoadError::MissingHeader);
    }

    let mut records = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let row = result.map_err(|source| LoadError::Csv {
            row: row_no + 1,
            source,
        })?;

        let mut values = BTreeMap::new();
        for (col_idx, col_name) in headers.iter().enumerate() {
            let raw = row.get(col_idx).unwrap_or("");
            let value = if col_name == DATE {
                parse_date(raw).map_or(Value::Null, Value::Date)
            } else {
                guess_value_type(raw)
            };
            values.insert(col_name.clone(), value);
        }

        records.push(Record::new(values));
    }

    let dataset = Dataset::from_records(headers, records);
    log::info!(
        "Parsed {} records with columns {:?}",
        dataset.len(),
        dataset.column_names
    );
    Ok(dataset)
}

/// Cell tokens read as missing, besides the empty string.
const MISSING_TOKENS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn is_missing(s: &str) -> bool {
    s.is_empty() || MISSING_TOKENS.contains(&s)
}

fn guess_value_type(s: &str) -> Value {
    let s = s.trim();
    if is_missing(s) {
        return Value::Null;
    }
    match s.parse::<f64>() {
        // `+ 0.0` folds -0.0 into 0.0
        Ok(f) if f.is_finite() => Value::Number(f + 0.0),
        _ => Value::Text(s.to_string()),
    }
}

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Parse a calendar date; any time-of-day part is dropped.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}
