//! Dense assay matrix (features × samples).

use crate::error::{Result, TidyError};
use nalgebra::DMatrix;
use std::collections::HashMap;

/// A dense matrix of readings indexed by internal feature and sample ids.
///
/// Rows are features (genes, drugs, transcripts), columns are samples. Missing
/// readings are stored as NaN. An optional matrix of raw cell strings keeps
/// the untransformed representation (e.g. a mutation call such as `V600E`
/// next to its 0/1 encoding).
#[derive(Debug, Clone)]
pub struct AssayMatrix {
    values: DMatrix<f64>,
    raw: Option<DMatrix<String>>,
    feature_ids: Vec<String>,
    sample_ids: Vec<String>,
    feature_index: HashMap<String, usize>,
    sample_index: HashMap<String, usize>,
}

impl AssayMatrix {
    /// Create from a dense matrix and its row/column identifiers.
    pub fn new(
        values: DMatrix<f64>,
        feature_ids: Vec<String>,
        sample_ids: Vec<String>,
    ) -> Result<Self> {
        let (nrows, ncols) = values.shape();
        if nrows != feature_ids.len() {
            return Err(TidyError::DimensionMismatch {
                expected: nrows,
                actual: feature_ids.len(),
            });
        }
        if ncols != sample_ids.len() {
            return Err(TidyError::DimensionMismatch {
                expected: ncols,
                actual: sample_ids.len(),
            });
        }
        let feature_index = build_index(&feature_ids, "feature")?;
        let sample_index = build_index(&sample_ids, "sample")?;
        Ok(Self {
            values,
            raw: None,
            feature_ids,
            sample_ids,
            feature_index,
            sample_index,
        })
    }

    /// Create from row-major data, one inner `Vec` per feature.
    pub fn from_rows(
        rows: Vec<Vec<f64>>,
        feature_ids: Vec<String>,
        sample_ids: Vec<String>,
    ) -> Result<Self> {
        let n_samples = sample_ids.len();
        for row in &rows {
            if row.len() != n_samples {
                return Err(TidyError::DimensionMismatch {
                    expected: n_samples,
                    actual: row.len(),
                });
            }
        }
        let values = DMatrix::from_row_iterator(rows.len(), n_samples, rows.into_iter().flatten());
        Self::new(values, feature_ids, sample_ids)
    }

    /// Attach raw cell strings (same shape, row-major) used for the `original` column.
    pub fn with_raw(mut self, raw: Vec<Vec<String>>) -> Result<Self> {
        let (nrows, ncols) = self.values.shape();
        if raw.len() != nrows {
            return Err(TidyError::DimensionMismatch {
                expected: nrows,
                actual: raw.len(),
            });
        }
        for row in &raw {
            if row.len() != ncols {
                return Err(TidyError::DimensionMismatch {
                    expected: ncols,
                    actual: row.len(),
                });
            }
        }
        self.raw = Some(DMatrix::from_row_iterator(
            nrows,
            ncols,
            raw.into_iter().flatten(),
        ));
        Ok(self)
    }

    /// Number of features (rows).
    #[inline]
    pub fn n_features(&self) -> usize {
        self.values.nrows()
    }

    /// Number of samples (columns).
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.values.ncols()
    }

    /// Internal feature identifiers.
    #[inline]
    pub fn feature_ids(&self) -> &[String] {
        &self.feature_ids
    }

    /// Internal sample identifiers.
    #[inline]
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Row index of an internal feature id.
    pub fn feature_position(&self, id: &str) -> Option<usize> {
        self.feature_index.get(id).copied()
    }

    /// Column index of an internal sample id.
    pub fn sample_position(&self, id: &str) -> Option<usize> {
        self.sample_index.get(id).copied()
    }

    /// Reading at (row, col); `None` when missing.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.values
            .get((row, col))
            .copied()
            .filter(|v| !v.is_nan())
    }

    /// Untransformed representation of a cell.
    ///
    /// Falls back to the formatted reading when no raw strings are attached,
    /// and to `None` when the cell is missing.
    pub fn original(&self, row: usize, col: usize) -> Option<String> {
        match &self.raw {
            Some(raw) => raw
                .get((row, col))
                .filter(|s| !s.is_empty() && s.as_str() != "NA")
                .cloned(),
            None => self.get(row, col).map(|v| v.to_string()),
        }
    }

    /// Underlying dense matrix.
    #[inline]
    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }
}

fn build_index(ids: &[String], kind: &str) -> Result<HashMap<String, usize>> {
    let mut index = HashMap::with_capacity(ids.len());
    for (i, id) in ids.iter().enumerate() {
        if index.insert(id.clone(), i).is_some() {
            return Err(TidyError::InvalidParameter(format!(
                "Duplicate {} id '{}'",
                kind, id
            )));
        }
    }
    Ok(index)
}
