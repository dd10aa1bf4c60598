//! Named dataframes with typed column extraction.

use std::io::Cursor;

use polars::prelude::*;
use reflens_core::{ReflensError, Result};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Convert a polars failure into the crate-wide error type.
pub(crate) fn table_error(err: PolarsError) -> ReflensError {
    ReflensError::Table(err.to_string())
}

/// A loaded table with the name it is reported under in errors.
///
/// Column accessors cast on the fly: integer accessors turn anything that
/// is not a number into a null, text accessors render every value as text.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    frame: DataFrame,
    columns: Vec<String>,
}

impl Table {
    pub fn new(name: impl Into<String>, frame: DataFrame) -> Self {
        let columns = frame
            .get_column_names()
            .iter()
            .map(|c| c.as_str().to_string())
            .collect();
        Self {
            name: name.into(),
            frame,
            columns,
        }
    }

    /// Decode Parquet bytes.
    pub fn from_parquet_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let frame = ParquetReader::new(Cursor::new(bytes))
            .finish()
            .map_err(table_error)?;
        Ok(Self::new(name, frame))
    }

    /// Decode CSV bytes with a header row.
    ///
    /// A leading UTF-8 byte-order mark is skipped. Every column is read as
    /// text; typed accessors cast later.
    pub fn from_csv_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let bytes = match bytes.strip_prefix(UTF8_BOM) {
            Some(rest) => rest.to_vec(),
            None => bytes,
        };
        let frame = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()
            .map_err(table_error)?;
        Ok(Self::new(name, frame))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub(crate) fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Rows where `keep` is `true`, in their original order.
    pub fn filter_rows(&self, keep: &[bool]) -> Result<Table> {
        let mask = BooleanChunked::from_slice("keep".into(), keep);
        let frame = self.frame.filter(&mask).map_err(table_error)?;
        Ok(Self::new(self.name.clone(), frame))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// The first of `candidates` that the table has.
    pub fn first_present<'a>(&self, candidates: &[&'a str]) -> Option<&'a str> {
        candidates.iter().copied().find(|c| self.has_column(c))
    }

    /// Error describing a missing `column`.
    pub fn missing(&self, column: &str) -> ReflensError {
        ReflensError::MissingColumn {
            table: self.name.clone(),
            column: column.to_string(),
            available: self.columns.clone(),
        }
    }

    /// Text values of a required column.
    pub fn text(&self, column: &str) -> Result<Vec<Option<String>>> {
        self.optional_text(column)?
            .ok_or_else(|| self.missing(column))
    }

    /// Text values of a column, or `None` if the table lacks it.
    pub fn optional_text(&self, column: &str) -> Result<Option<Vec<Option<String>>>> {
        let Some(series) = self.series(column)? else {
            return Ok(None);
        };
        let cast = series.cast(&DataType::String).map_err(table_error)?;
        let values = cast
            .str()
            .map_err(table_error)?
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect();
        Ok(Some(values))
    }

    /// Integer values of a required column.
    pub fn int(&self, column: &str) -> Result<Vec<Option<i64>>> {
        self.optional_int(column)?
            .ok_or_else(|| self.missing(column))
    }

    /// Integer values of a column, or `None` if the table lacks it.
    ///
    /// Text such as `"42"` or `"42.0"` is parsed. Fractional, out-of-range,
    /// and non-numeric values become null whatever the column type.
    pub fn optional_int(&self, column: &str) -> Result<Option<Vec<Option<i64>>>> {
        let Some(series) = self.series(column)? else {
            return Ok(None);
        };
        let dtype = series.dtype();
        let numeric = if matches!(dtype, DataType::String) {
            series
                .str()
                .map_err(table_error)?
                .into_iter()
                .map(|v| v.and_then(parse_int))
                .collect()
        } else if dtype.is_float() {
            series
                .cast(&DataType::Float64)
                .map_err(table_error)?
                .f64()
                .map_err(table_error)?
                .into_iter()
                .map(|v| v.and_then(float_to_int))
                .collect()
        } else {
            series
                .cast(&DataType::Int64)
                .map_err(table_error)?
                .i64()
                .map_err(table_error)?
                .into_iter()
                .collect()
        };
        Ok(Some(numeric))
    }

    fn series(&self, column: &str) -> Result<Option<Series>> {
        if !self.has_column(column) {
            return Ok(None);
        }
        let column = self.frame.column(column).map_err(table_error)?;
        Ok(Some(column.as_materialized_series().clone()))
    }
}

fn parse_int(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(v) = raw.parse::<i64>() {
        return Some(v);
    }
    // pandas writes integer columns with nulls as floats ("42.0")
    float_to_int(raw.parse::<f64>().ok()?)
}

// 2^63 is exactly representable; i64::MAX is not.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

fn float_to_int(f: f64) -> Option<i64> {
    let integral = f.is_finite() && f.fract() == 0.0;
    (integral && (-I64_BOUND..I64_BOUND).contains(&f)).then_some(f as i64)
}
