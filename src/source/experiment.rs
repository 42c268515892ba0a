//! Single-assay source and the core melt from matrix to tall rows.

use super::{combined, AssayQuery, GatherRequest, Selector, TallSource, UnresolvedPolicy};
use crate::data::{Annotation, AssayMatrix, Table, TallRow};
use crate::error::{Result, TidyError};
use crate::schema::col;
use std::collections::HashSet;

/// Key column of the default feature annotation.
pub const FEATURE_KEY: &str = "feature_id";

/// One assay: a features × samples matrix tagged with its data type.
///
/// Features are addressed through the feature annotation, which maps alias
/// columns (e.g. `Symbol`) onto the matrix row ids. Samples may carry their
/// own annotation for alias lookup on the column axis.
#[derive(Debug, Clone)]
pub struct Experiment {
    data_type: String,
    matrix: AssayMatrix,
    features: Annotation,
    samples: Option<Annotation>,
}

impl Experiment {
    /// Create an experiment whose features are known only by their internal ids.
    pub fn new(data_type: &str, matrix: AssayMatrix) -> Self {
        let features = Annotation::new(FEATURE_KEY, matrix.feature_ids().to_vec());
        Self {
            data_type: data_type.to_string(),
            matrix,
            features,
            samples: None,
        }
    }

    /// Attach a feature annotation (key column = matrix row ids).
    pub fn with_features(mut self, features: Annotation) -> Self {
        self.features = features;
        self
    }

    /// Attach a sample annotation (key column = matrix column ids).
    pub fn with_samples(mut self, samples: Annotation) -> Self {
        self.samples = Some(samples);
        self
    }

    #[inline]
    pub fn data_type(&self) -> &str {
        &self.data_type
    }

    #[inline]
    pub fn matrix(&self) -> &AssayMatrix {
        &self.matrix
    }

    #[inline]
    pub fn features(&self) -> &Annotation {
        &self.features
    }

    #[inline]
    pub fn samples(&self) -> Option<&Annotation> {
        self.samples.as_ref()
    }

    /// Melt the selected sub-matrix into tall rows, feature-major.
    ///
    /// `fallback_samples` is used when the experiment has no sample annotation
    /// of its own. Requested ids this experiment cannot resolve go through
    /// the query's policy.
    pub(crate) fn melt(
        &self,
        query: &AssayQuery,
        fallback_samples: Option<&Annotation>,
    ) -> Result<Table> {
        let (table, misses) = self.melt_partial(query, fallback_samples)?;
        misses.apply(query.unresolved)?;
        Ok(table)
    }

    /// Like [`Experiment::melt`], but return requested ids this experiment
    /// does not carry instead of applying the policy to them.
    pub(crate) fn melt_partial(
        &self,
        query: &AssayQuery,
        fallback_samples: Option<&Annotation>,
    ) -> Result<(Table, Misses)> {
        let sample_annotation = self.samples.as_ref().or(fallback_samples);
        let (features, feature_misses) = resolve_axis(
            Axis {
                kind: "feature",
                key: FEATURE_KEY,
                selector: &query.features,
                column: query.feature_col.as_deref(),
                annotation: Some(&self.features),
                matrix_ids: self.matrix.feature_ids(),
            },
            |id| self.matrix.feature_position(id),
            query.unresolved,
        )?;
        let (samples, sample_misses) = resolve_axis(
            Axis {
                kind: "sample",
                key: col::SAMPLE_ID,
                selector: &query.samples,
                column: query.sample_col.as_deref(),
                annotation: sample_annotation,
                matrix_ids: self.matrix.sample_ids(),
            },
            |id| self.matrix.sample_position(id),
            query.unresolved,
        )?;

        let mut rows = Vec::with_capacity(features.len() * samples.len());
        for (f, feature_label) in &features {
            for (s, sample_label) in &samples {
                rows.push(TallRow {
                    sample_id: sample_label.clone(),
                    assayed_id: feature_label.clone(),
                    data_type: self.data_type.clone(),
                    original: self.matrix.original(*f, *s),
                    value: self.matrix.get(*f, *s),
                });
            }
        }

        log::debug!(
            "Gathered {} rows from '{}' ({} features x {} samples)",
            rows.len(),
            self.data_type,
            features.len(),
            samples.len()
        );
        let misses = Misses {
            features: feature_misses,
            samples: sample_misses,
        };
        Ok((Table::from_tall_rows(rows), misses))
    }
}

impl TallSource for Experiment {
    fn gather(&self, request: &GatherRequest) -> Result<Table> {
        combined::gather_from(std::slice::from_ref(self), &[], None, request)
    }
}

/// Gather tall rows from a single experiment.
pub fn gather_assay(experiment: &Experiment, query: &AssayQuery) -> Result<Table> {
    experiment.melt(query, None)
}

/// Requested ids that matched nothing, as `(id, lookup column)`.
#[derive(Debug, Clone, Default)]
pub(crate) struct Misses {
    pub(crate) features: Vec<(String, String)>,
    pub(crate) samples: Vec<(String, String)>,
}

impl Misses {
    fn apply(&self, policy: UnresolvedPolicy) -> Result<()> {
        for (id, column) in &self.features {
            policy.unresolved("feature", id, column)?;
        }
        for (id, column) in &self.samples {
            policy.unresolved("sample", id, column)?;
        }
        Ok(())
    }
}

/// One matrix axis and how its ids are looked up.
struct Axis<'a> {
    kind: &'a str,
    /// Column name reported for ids addressed without an annotation.
    key: &'a str,
    selector: &'a Selector,
    column: Option<&'a str>,
    annotation: Option<&'a Annotation>,
    matrix_ids: &'a [String],
}

/// Resolve a selector on one matrix axis to `(position, label)` pairs.
///
/// With an alias column, requested ids are looked up in that column and the
/// alias becomes the label; without one, ids address the matrix directly.
/// Labels are unique in the output. Requested ids matching nothing are
/// returned for the caller to judge; ambiguous ones go through `policy` here.
fn resolve_axis<F>(
    axis: Axis<'_>,
    position: F,
    policy: UnresolvedPolicy,
) -> Result<(Vec<(usize, String)>, Vec<(String, String)>)>
where
    F: Fn(&str) -> Option<usize>,
{
    let Axis {
        kind,
        key,
        selector,
        column,
        annotation,
        matrix_ids,
    } = axis;
    let lookup = match (column, annotation) {
        (None, _) => None,
        (Some(col), Some(ann)) if ann.has_column(col) => Some((col, ann)),
        (Some(col), _) => return Err(TidyError::MissingColumn(col.to_string())),
    };
    let column_name = column
        .or_else(|| annotation.map(Annotation::key_column))
        .unwrap_or(key);

    let mut out = Vec::new();
    let mut misses = Vec::new();
    match selector.ids() {
        None => {
            let mut seen = HashSet::new();
            for (pos, id) in matrix_ids.iter().enumerate() {
                let label = match lookup {
                    None => id.clone(),
                    Some((col, ann)) => match ann.label(col, id)? {
                        Some(l) => l.to_string(),
                        None => {
                            policy.unresolved(kind, id, col)?;
                            continue;
                        }
                    },
                };
                if !seen.insert(label.clone()) {
                    policy.ambiguous(kind, &label, column_name)?;
                    continue;
                }
                out.push((pos, label));
            }
        }
        Some(requested) => {
            for alias in requested {
                let candidates: Vec<usize> = match lookup {
                    None => position(alias).into_iter().collect(),
                    Some((col, ann)) => ann
                        .resolve(col, alias)?
                        .into_iter()
                        .filter_map(|id| position(id))
                        .collect(),
                };
                match candidates.first() {
                    None => misses.push((alias.to_string(), column_name.to_string())),
                    Some(&pos) => {
                        if candidates.len() > 1 {
                            policy.ambiguous(kind, alias, column_name)?;
                        }
                        out.push((pos, alias.to_string()));
                    }
                }
            }
        }
    }
    Ok((out, misses))
}
