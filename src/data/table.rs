//! Row-oriented tables holding tidy observations.

use crate::error::{Result, TidyError};
use crate::schema::is_text_column;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// A single table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// String value (identifiers, labels, raw representations).
    Text(String),
    /// Numeric reading.
    Number(f64),
    /// Missing value (`NA`).
    Missing,
}

impl Value {
    /// Text cell.
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// Numeric cell; NaN and infinities are stored as missing.
    pub fn number(v: f64) -> Self {
        if v.is_finite() {
            Value::Number(v)
        } else {
            Value::Missing
        }
    }

    /// Numeric cell from an optional reading.
    pub fn from_option(v: Option<f64>) -> Self {
        v.map(Value::number).unwrap_or(Value::Missing)
    }

    /// Check if this is a missing value.
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Try to get as a string slice.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as f64.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// String form used when the cell acts as a join or lookup key.
    ///
    /// Numbers are rendered with `Display`, so an identifier column that was
    /// inferred as numeric (`906793`) still matches its text spelling.
    pub fn key(&self) -> Option<String> {
        match self {
            Value::Text(s) => Some(s.clone()),
            Value::Number(v) => Some(v.to_string()),
            Value::Missing => None,
        }
    }

    fn parse(raw: &str, numeric: bool) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == "NA" || trimmed == "na" {
            return Value::Missing;
        }
        if numeric {
            match trimmed.parse::<f64>() {
                Ok(v) => Value::number(v),
                Err(_) => Value::Missing,
            }
        } else {
            Value::Text(raw.to_string())
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{}", s),
            Value::Number(v) => write!(f, "{}", v),
            Value::Missing => write!(f, "NA"),
        }
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

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::number(v)
    }
}

/// An in-memory table: named columns and rows of equal width.
///
/// Tables are never mutated by the library's transforms; each operation
/// builds and returns a new table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub(super) columns: Vec<String>,
    pub(super) rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create an empty table with the given column names.
    pub fn new<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let mut seen = HashSet::new();
        for name in &columns {
            if !seen.insert(name.as_str()) {
                return Err(TidyError::DuplicateColumn(name.clone()));
            }
        }
        Ok(Self {
            columns,
            rows: Vec::new(),
        })
    }

    /// Create a table from column names and rows.
    pub fn from_rows<I, S>(columns: I, rows: Vec<Vec<Value>>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new(columns)?;
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Append a row. Used while building a table; rows must match the column count.
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(TidyError::DimensionMismatch {
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Column names in order.
    #[inline]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All rows.
    #[inline]
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of rows.
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    #[inline]
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// True when the table has no rows. An empty table is a valid result.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Check if a column exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Position of a column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Position of a column, or `MissingColumn`.
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| TidyError::MissingColumn(name.to_string()))
    }

    /// Get a row by index.
    pub fn row(&self, idx: usize) -> Option<&[Value]> {
        self.rows.get(idx).map(|r| r.as_slice())
    }

    /// Get a single cell.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[col])
    }

    /// All values of a column.
    pub fn column(&self, name: &str) -> Result<Vec<&Value>> {
        let col = self.require_column(name)?;
        Ok(self.rows.iter().map(|r| &r[col]).collect())
    }

    /// Text cells of a column; `None` for non-text cells.
    pub fn column_text(&self, name: &str) -> Result<Vec<Option<&str>>> {
        let col = self.require_column(name)?;
        Ok(self.rows.iter().map(|r| r[col].as_text()).collect())
    }

    /// Numeric cells of a column; `None` for missing or text cells.
    pub fn column_number(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let col = self.require_column(name)?;
        Ok(self.rows.iter().map(|r| r[col].as_number()).collect())
    }

    /// Distinct key values of a column in first-seen order, skipping missing cells.
    pub fn distinct_keys(&self, name: &str) -> Result<Vec<String>> {
        let col = self.require_column(name)?;
        let mut seen = HashSet::new();
        let mut keys = Vec::new();
        for row in &self.rows {
            if let Some(k) = row[col].key() {
                if seen.insert(k.clone()) {
                    keys.push(k);
                }
            }
        }
        Ok(keys)
    }

    /// Keep rows for which the predicate holds.
    pub fn filter<F>(&self, predicate: F) -> Table
    where
        F: Fn(&[Value]) -> bool,
    {
        Table {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|r| predicate(r))
                .cloned()
                .collect(),
        }
    }

    /// Subset rows by index.
    pub fn select_rows(&self, indices: &[usize]) -> Result<Table> {
        let mut rows = Vec::with_capacity(indices.len());
        for &idx in indices {
            let row = self.rows.get(idx).ok_or_else(|| {
                TidyError::InvalidParameter(format!("Row index {} out of bounds", idx))
            })?;
            rows.push(row.clone());
        }
        Ok(Table {
            columns: self.columns.clone(),
            rows,
        })
    }

    /// Return a copy with an extra column appended.
    pub fn with_column(&self, name: &str, values: Vec<Value>) -> Result<Table> {
        if self.has_column(name) {
            return Err(TidyError::DuplicateColumn(name.to_string()));
        }
        if values.len() != self.n_rows() {
            return Err(TidyError::DimensionMismatch {
                expected: self.n_rows(),
                actual: values.len(),
            });
        }
        let mut columns = self.columns.clone();
        columns.push(name.to_string());
        let rows = self
            .rows
            .iter()
            .zip(values)
            .map(|(row, v)| {
                let mut row = row.clone();
                row.push(v);
                row
            })
            .collect();
        Ok(Table { columns, rows })
    }

    /// Row-wise union of tables.
    ///
    /// Output columns are the first table's columns followed by columns first
    /// seen in later tables. Cells a table does not carry become missing.
    pub fn concat(tables: &[Table]) -> Table {
        let mut columns: Vec<String> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for table in tables {
            for name in &table.columns {
                if !index.contains_key(name) {
                    index.insert(name.clone(), columns.len());
                    columns.push(name.clone());
                }
            }
        }

        let mut rows = Vec::with_capacity(tables.iter().map(|t| t.n_rows()).sum());
        for table in tables {
            let positions: Vec<usize> = table.columns.iter().map(|c| index[c]).collect();
            for row in &table.rows {
                let mut out = vec![Value::Missing; columns.len()];
                for (value, &pos) in row.iter().zip(&positions) {
                    out[pos] = value.clone();
                }
                rows.push(out);
            }
        }

        Table { columns, rows }
    }

    /// Load a table from a TSV file with a header row.
    ///
    /// `NA` and empty cells are read as missing. A column is numeric when every
    /// non-missing value parses as a number, except for identifier and label
    /// columns of the canonical formats, which are always text.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_tsv_reader(BufReader::new(file))
    }

    /// Load a table from any TSV source.
    pub fn from_tsv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .from_reader(reader);

        let header: Vec<String> = rdr.headers()?.iter().map(String::from).collect();
        if header.is_empty() {
            return Err(TidyError::EmptyData("TSV has no header".to_string()));
        }

        let mut raw: Vec<Vec<String>> = Vec::new();
        for record in rdr.records() {
            let record = record?;
            raw.push(record.iter().map(String::from).collect());
        }

        let numeric: Vec<bool> = header
            .iter()
            .enumerate()
            .map(|(col, name)| {
                !is_text_column(name)
                    && raw.iter().any(|r| !is_na(&r[col]))
                    && raw
                        .iter()
                        .all(|r| is_na(&r[col]) || r[col].trim().parse::<f64>().is_ok())
            })
            .collect();

        let rows = raw
            .iter()
            .map(|r| {
                r.iter()
                    .zip(&numeric)
                    .map(|(cell, &num)| Value::parse(cell, num))
                    .collect()
            })
            .collect();

        Self::from_rows(header, rows)
    }

    /// Write the table to a TSV file. Missing cells are written as `NA`.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        self.to_tsv_writer(BufWriter::new(file))
    }

    /// Write the table as TSV to any sink.
    pub fn to_tsv_writer<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_writer(writer);
        wtr.write_record(&self.columns)?;
        for row in &self.rows {
            wtr.write_record(row.iter().map(|v| v.to_string()))?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Serialize as a JSON array of row objects (`{"column": value, ...}`).
    pub fn to_json_records(&self) -> Result<String> {
        let mut records = Vec::with_capacity(self.n_rows());
        for row in &self.rows {
            let mut record = serde_json::Map::new();
            for (name, value) in self.columns.iter().zip(row) {
                record.insert(name.clone(), serde_json::to_value(value)?);
            }
            records.push(serde_json::Value::Object(record));
        }
        Ok(serde_json::to_string_pretty(&records)?)
    }
}

fn is_na(raw: &str) -> bool {
    let t = raw.trim();
    t.is_empty() || t == "NA" || t == "na"
}
