//! Typed tall rows and table summaries.

use crate::data::{Table, Value};
use crate::error::{Result, TidyError};
use crate::schema::{check_df_format, col, TableKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::HashSet;

/// One measurement in the tall format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TallRow {
    /// Biological sample.
    pub sample_id: String,
    /// Measured feature (gene, drug, ...).
    pub assayed_id: String,
    /// Assay or source kind (e.g. `rna`, `mutation`, `ic50`).
    pub data_type: String,
    /// Raw representation of the reading.
    pub original: Option<String>,
    /// Numeric reading used for analysis.
    pub value: Option<f64>,
}

impl TallRow {
    /// Create a row whose `original` is the formatted value.
    pub fn new(sample_id: &str, assayed_id: &str, data_type: &str, value: Option<f64>) -> Self {
        Self {
            sample_id: sample_id.to_string(),
            assayed_id: assayed_id.to_string(),
            data_type: data_type.to_string(),
            original: value.map(|v| v.to_string()),
            value,
        }
    }

    fn into_values(self) -> Vec<Value> {
        vec![
            Value::Text(self.sample_id),
            Value::Text(self.assayed_id),
            Value::Text(self.data_type),
            self.original.map(Value::Text).unwrap_or(Value::Missing),
            Value::from_option(self.value),
        ]
    }
}

impl Table {
    /// Empty table with the tall columns.
    pub fn empty_tall() -> Table {
        Table {
            columns: TableKind::Tall
                .columns()
                .iter()
                .map(|c| c.to_string())
                .collect(),
            rows: Vec::new(),
        }
    }

    /// Build a tall table from typed rows.
    pub fn from_tall_rows<I: IntoIterator<Item = TallRow>>(rows: I) -> Table {
        let mut table = Table::empty_tall();
        table.rows = rows.into_iter().map(TallRow::into_values).collect();
        table
    }

    /// Read the canonical columns of a tall table as typed rows.
    ///
    /// Extra columns are ignored.
    pub fn tall_rows(&self) -> Result<Vec<TallRow>> {
        check_df_format(self, TableKind::Tall)?;
        let sample = self.require_column(col::SAMPLE_ID)?;
        let assayed = self.require_column(col::ASSAYED_ID)?;
        let data_type = self.require_column(col::DATA_TYPE)?;
        let original = self.require_column(col::ORIGINAL)?;
        let value = self.require_column(col::VALUE)?;

        self.rows
            .iter()
            .enumerate()
            .map(|(i, r)| {
                Ok(TallRow {
                    sample_id: r[sample].key().ok_or(TidyError::NullSampleId { row: i })?,
                    assayed_id: r[assayed].key().unwrap_or_default(),
                    data_type: r[data_type].key().unwrap_or_default(),
                    original: r[original].key(),
                    value: r[value].as_number(),
                })
            })
            .collect()
    }
}

/// Summary statistics for a tidy table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSummary {
    pub rows: usize,
    pub samples: usize,
    pub missing_values: usize,
    /// Rows per `data_type` (tall tables only).
    pub rows_per_type: BTreeMap<String, usize>,
}

impl TableSummary {
    /// Summarize a table carrying at least a `sample_id` column.
    pub fn of(table: &Table) -> Result<Self> {
        let sample = table.require_column(col::SAMPLE_ID)?;
        let samples: HashSet<String> = table
            .rows()
            .iter()
            .filter_map(|r| r[sample].key())
            .collect();

        let mut rows_per_type = BTreeMap::new();
        if let Some(dt) = table.column_index(col::DATA_TYPE) {
            for row in table.rows() {
                if let Some(k) = row[dt].key() {
                    *rows_per_type.entry(k).or_insert(0) += 1;
                }
            }
        }

        let value_columns: Vec<usize> = [
            col::VALUE,
            col::FEATURE_VALUE1,
            col::FEATURE_VALUE2,
            col::RESP_VALUE,
            col::FEATURE_VALUE,
        ]
        .iter()
        .filter_map(|c| table.column_index(c))
        .collect();
        let missing_values = table
            .rows()
            .iter()
            .map(|r| value_columns.iter().filter(|&&c| r[c].is_missing()).count())
            .sum();

        Ok(Self {
            rows: table.n_rows(),
            samples: samples.len(),
            missing_values,
            rows_per_type,
        })
    }
}

impl std::fmt::Display for TableSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Rows:           {}", self.rows)?;
        writeln!(f, "Samples:        {}", self.samples)?;
        writeln!(f, "Missing values: {}", self.missing_values)?;
        for (data_type, n) in &self.rows_per_type {
            writeln!(f, "  {}: {}", data_type, n)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tall_rows() {
        let table = Table::from_tall_rows(vec![
            TallRow::new("S1", "BRAF", "rna", Some(1.0)),
            TallRow::new("S2", "BRAF", "rna", None),
        ]);
        assert_eq!(table.columns(), TableKind::Tall.columns());
        assert_eq!(table.n_rows(), 2);
        assert_eq!(table.get(0, "original").unwrap().as_text(), Some("1"));
        assert!(table.get(1, "value").unwrap().is_missing());
    }

    #[test]
    fn test_tall_rows_roundtrip() {
        let rows = vec![
            TallRow::new("S1", "BRAF", "rna", Some(1.5)),
            TallRow::new("S1", "EGFR", "cnv", Some(-0.5)),
        ];
        let table = Table::from_tall_rows(rows.clone());
        assert_eq!(table.tall_rows().unwrap(), rows);
    }

    #[test]
    fn test_tall_rows_rejects_other_formats() {
        let table = Table::new(["sample_id", "value"]).unwrap();
        assert!(table.tall_rows().is_err());
    }

    #[test]
    fn test_summary() {
        let table = Table::from_tall_rows(vec![
            TallRow::new("S1", "BRAF", "rna", Some(1.0)),
            TallRow::new("S2", "BRAF", "rna", None),
            TallRow::new("S1", "erlotinib", "ic50", Some(2.0)),
        ]);
        let summary = TableSummary::of(&table).unwrap();
        assert_eq!(summary.rows, 3);
        assert_eq!(summary.samples, 2);
        assert_eq!(summary.missing_values, 1);
        assert_eq!(summary.rows_per_type["rna"], 2);
        assert_eq!(summary.rows_per_type["ic50"], 1);
        assert!(summary.to_string().contains("ic50: 1"));
    }
}
