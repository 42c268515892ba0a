//! Extraction adapters turning assay sources into tall tables.
//!
//! A source is either a single [`Experiment`] or a [`MultiAssaySource`]
//! bundling several experiments plus optional response data. Both implement
//! [`TallSource`]; [`Source`] selects between them explicitly.

mod combined;
mod experiment;
mod multi;

pub use combined::{gather_combined, gather_response};
pub use experiment::{gather_assay, Experiment};
pub use multi::MultiAssaySource;

use crate::data::Table;
use crate::error::{Result, TidyError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Identifier selector. `All` leaves the axis unfiltered.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selector {
    /// Every identifier the source offers.
    #[default]
    All,
    /// Only the listed identifiers, in this order.
    Only(Vec<String>),
}

impl Selector {
    /// Select the listed identifiers.
    pub fn only<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Selector::Only(ids.into_iter().map(Into::into).collect())
    }

    /// Check if the selector is unfiltered.
    pub fn is_all(&self) -> bool {
        matches!(self, Selector::All)
    }

    /// Whether `id` passes the selector.
    pub fn contains(&self, id: &str) -> bool {
        match self {
            Selector::All => true,
            Selector::Only(ids) => ids.iter().any(|i| i == id),
        }
    }

    /// Requested ids with duplicates removed, in request order; `None` for `All`.
    pub fn ids(&self) -> Option<Vec<&str>> {
        match self {
            Selector::All => None,
            Selector::Only(ids) => {
                let mut seen = HashSet::new();
                Some(
                    ids.iter()
                        .map(String::as_str)
                        .filter(|id| seen.insert(*id))
                        .collect(),
                )
            }
        }
    }
}

/// What to do with identifiers that cannot be resolved against a lookup table.
///
/// Applies to aliases that match nothing and to aliases matching several
/// internal ids; in the latter case the non-failing policies keep the first
/// match in annotation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedPolicy {
    /// Drop silently.
    Ignore,
    /// Drop and emit a warning through `log`.
    #[default]
    Warn,
    /// Fail the whole call.
    Fail,
}

impl UnresolvedPolicy {
    /// Apply the policy to an identifier with no match.
    pub(crate) fn unresolved(&self, kind: &str, id: &str, column: &str) -> Result<()> {
        match self {
            UnresolvedPolicy::Ignore => Ok(()),
            UnresolvedPolicy::Warn => {
                log::warn!("Dropping unresolved {} '{}' (column '{}')", kind, id, column);
                Ok(())
            }
            UnresolvedPolicy::Fail => Err(TidyError::UnresolvedIdentifier {
                kind: kind.to_string(),
                id: id.to_string(),
                column: column.to_string(),
            }),
        }
    }

    /// Apply the policy to an identifier with several matches.
    pub(crate) fn ambiguous(&self, kind: &str, id: &str, column: &str) -> Result<()> {
        match self {
            UnresolvedPolicy::Ignore => Ok(()),
            UnresolvedPolicy::Warn => {
                log::warn!(
                    "Ambiguous {} '{}' (column '{}'), keeping first match",
                    kind,
                    id,
                    column
                );
                Ok(())
            }
            UnresolvedPolicy::Fail => Err(TidyError::AmbiguousIdentifier {
                kind: kind.to_string(),
                id: id.to_string(),
                column: column.to_string(),
            }),
        }
    }
}

/// Selection over a single experiment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssayQuery {
    /// Samples to keep.
    #[serde(default)]
    pub samples: Selector,
    /// Sample alias column used to select and label samples; internal ids when unset.
    #[serde(default)]
    pub sample_col: Option<String>,
    /// Features to keep.
    #[serde(default)]
    pub features: Selector,
    /// Feature alias column used to select and label features; internal ids when unset.
    #[serde(default)]
    pub feature_col: Option<String>,
    #[serde(default)]
    pub unresolved: UnresolvedPolicy,
}

impl AssayQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples(mut self, samples: Selector) -> Self {
        self.samples = samples;
        self
    }

    pub fn sample_col(mut self, column: &str) -> Self {
        self.sample_col = Some(column.to_string());
        self
    }

    pub fn features(mut self, features: Selector) -> Self {
        self.features = features;
        self
    }

    pub fn feature_col(mut self, column: &str) -> Self {
        self.feature_col = Some(column.to_string());
        self
    }

    pub fn unresolved(mut self, policy: UnresolvedPolicy) -> Self {
        self.unresolved = policy;
        self
    }
}

/// Selection over a source, possibly spanning several data types and response data.
///
/// `feature_cols` is aligned positionally with the selected data types: it is
/// either empty (internal ids everywhere) or holds exactly one alias column per
/// selected type. `responses` set to `None` skips response data entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatherRequest {
    #[serde(default)]
    pub samples: Selector,
    #[serde(default)]
    pub sample_col: Option<String>,
    #[serde(default)]
    pub features: Selector,
    #[serde(default)]
    pub data_types: Selector,
    #[serde(default)]
    pub feature_cols: Vec<String>,
    #[serde(default)]
    pub responses: Option<Selector>,
    #[serde(default)]
    pub response_types: Selector,
    #[serde(default)]
    pub resp_col: Option<String>,
    #[serde(default)]
    pub unresolved: UnresolvedPolicy,
}

impl GatherRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples(mut self, samples: Selector) -> Self {
        self.samples = samples;
        self
    }

    pub fn sample_col(mut self, column: &str) -> Self {
        self.sample_col = Some(column.to_string());
        self
    }

    pub fn features(mut self, features: Selector) -> Self {
        self.features = features;
        self
    }

    /// Restrict to data types, each labelled through its own alias column.
    pub fn data_types(mut self, data_types: Selector, feature_cols: Vec<String>) -> Self {
        self.data_types = data_types;
        self.feature_cols = feature_cols;
        self
    }

    /// Also gather response data for these response ids.
    pub fn responses(mut self, responses: Selector) -> Self {
        self.responses = Some(responses);
        self
    }

    pub fn response_types(mut self, response_types: Selector) -> Self {
        self.response_types = response_types;
        self
    }

    pub fn resp_col(mut self, column: &str) -> Self {
        self.resp_col = Some(column.to_string());
        self
    }

    pub fn unresolved(mut self, policy: UnresolvedPolicy) -> Self {
        self.unresolved = policy;
        self
    }

    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(TidyError::from)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(TidyError::from)
    }

    /// Per-experiment query for genetic data using `feature_col`.
    pub(crate) fn assay_query(&self, feature_col: Option<&str>) -> AssayQuery {
        AssayQuery {
            samples: self.samples.clone(),
            sample_col: self.sample_col.clone(),
            features: self.features.clone(),
            feature_col: feature_col.map(String::from),
            unresolved: self.unresolved,
        }
    }

    /// Per-experiment query for response data.
    pub(crate) fn response_query(&self) -> AssayQuery {
        AssayQuery {
            samples: self.samples.clone(),
            sample_col: self.sample_col.clone(),
            features: self.responses.clone().unwrap_or_default(),
            feature_col: self.resp_col.clone(),
            unresolved: self.unresolved,
        }
    }
}

/// Anything that can be flattened into a tall table.
pub trait TallSource {
    /// Gather the requested measurements as tall rows.
    fn gather(&self, request: &GatherRequest) -> Result<Table>;
}

/// A data source, tagged by kind.
#[derive(Debug, Clone)]
pub enum Source {
    Single(Experiment),
    Multi(MultiAssaySource),
}

impl TallSource for Source {
    fn gather(&self, request: &GatherRequest) -> Result<Table> {
        match self {
            Source::Single(experiment) => experiment.gather(request),
            Source::Multi(source) => source.gather(request),
        }
    }
}

impl From<Experiment> for Source {
    fn from(experiment: Experiment) -> Self {
        Source::Single(experiment)
    }
}

impl From<MultiAssaySource> for Source {
    fn from(source: MultiAssaySource) -> Self {
        Source::Multi(source)
    }
}

/// Gather from any source.
pub fn gather<S: TallSource + ?Sized>(source: &S, request: &GatherRequest) -> Result<Table> {
    source.gather(request)
}
