//! Pipeline runner for composing gather, harmonize and pairing steps.

use crate::data::Table;
use crate::error::{Result, TidyError};
use crate::harmonize::{cell_line_ids, convert_ids, filter_id_type};
use crate::reshape::{drop_self_pairs, make_genetic_vs_genetic, make_response_vs_genetic, PairFilter};
use crate::schema::{col, get_df_format};
use crate::source::{GatherRequest, Selector, TallSource};
use serde::{Deserialize, Serialize};

/// A step applied to the gathered table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PipelineStep {
    /// Rewrite `sample_id` through the identifier map.
    ///
    /// Uses the map given to [`Pipeline::with_id_map`], or the bundled cell
    /// line crosswalk. `id_type` restricts the map to one scheme first.
    ConvertIds {
        from_col: String,
        to_col: String,
        #[serde(default)]
        extra_cols: Vec<String>,
        #[serde(default)]
        id_type: Option<String>,
    },
    /// Pair the tall table with itself into genetic-vs-genetic rows.
    PairGenetic { left: PairFilter, right: PairFilter },
    /// Split the tall table by response data type and pair responses with the rest.
    ///
    /// `responses.data_types` must list the response data types explicitly.
    PairResponse {
        responses: PairFilter,
        genetics: PairFilter,
    },
    /// Remove self-pairings from a genetic-vs-genetic table.
    DropSelfPairs,
}

/// Pipeline configuration for serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Name of the pipeline.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Steps to execute.
    pub steps: Vec<PipelineStep>,
}

impl PipelineConfig {
    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(TidyError::from)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(TidyError::from)
    }
}

/// Builder for constructing and running extraction pipelines.
#[derive(Debug, Clone)]
pub struct Pipeline {
    steps: Vec<PipelineStep>,
    name: String,
    id_map: Option<Table>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    /// Create a new empty pipeline.
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            name: "unnamed".to_string(),
            id_map: None,
        }
    }

    /// Create from a config.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            steps: config.steps.clone(),
            name: config.name.clone(),
            id_map: None,
        }
    }

    /// Set the pipeline name.
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Use `id_map` instead of the bundled crosswalk for identifier conversion.
    pub fn with_id_map(mut self, id_map: Table) -> Self {
        self.id_map = Some(id_map);
        self
    }

    /// Add identifier conversion.
    pub fn convert_ids(mut self, from_col: &str, to_col: &str, extra_cols: &[&str]) -> Self {
        self.steps.push(PipelineStep::ConvertIds {
            from_col: from_col.to_string(),
            to_col: to_col.to_string(),
            extra_cols: extra_cols.iter().map(|c| c.to_string()).collect(),
            id_type: None,
        });
        self
    }

    /// Add identifier conversion restricted to one identifier scheme.
    pub fn convert_ids_of_type(
        mut self,
        id_type: &str,
        from_col: &str,
        to_col: &str,
        extra_cols: &[&str],
    ) -> Self {
        self.steps.push(PipelineStep::ConvertIds {
            from_col: from_col.to_string(),
            to_col: to_col.to_string(),
            extra_cols: extra_cols.iter().map(|c| c.to_string()).collect(),
            id_type: Some(id_type.to_string()),
        });
        self
    }

    /// Add genetic-vs-genetic pairing.
    pub fn pair_genetic(mut self, left: PairFilter, right: PairFilter) -> Self {
        self.steps.push(PipelineStep::PairGenetic { left, right });
        self
    }

    /// Add response-vs-genetic pairing.
    pub fn pair_response(mut self, responses: PairFilter, genetics: PairFilter) -> Self {
        self.steps
            .push(PipelineStep::PairResponse { responses, genetics });
        self
    }

    /// Add self-pair removal.
    pub fn drop_self_pairs(mut self) -> Self {
        self.steps.push(PipelineStep::DropSelfPairs);
        self
    }

    /// Steps in execution order.
    pub fn steps(&self) -> &[PipelineStep] {
        &self.steps
    }

    /// Convert to config for serialization.
    pub fn to_config(&self, description: Option<&str>) -> PipelineConfig {
        PipelineConfig {
            name: self.name.clone(),
            description: description.map(String::from),
            steps: self.steps.clone(),
        }
    }

    /// Gather from `source`, then apply every step.
    pub fn run<S: TallSource + ?Sized>(&self, source: &S, request: &GatherRequest) -> Result<Table> {
        let table = source.gather(request)?;
        log::debug!("Pipeline '{}': gathered {} rows", self.name, table.n_rows());
        self.apply(table)
    }

    /// Apply every step to an already gathered table.
    pub fn apply(&self, table: Table) -> Result<Table> {
        let mut table = table;
        for (i, step) in self.steps.iter().enumerate() {
            table = self.apply_step(step, &table).map_err(|e| {
                TidyError::Pipeline(format!("Step {} ({:?}) failed: {}", i + 1, step, e))
            })?;
            log::debug!(
                "Pipeline '{}': step {} left {} rows ({})",
                self.name,
                i + 1,
                table.n_rows(),
                get_df_format(&table)
                    .kind
                    .map(|k| k.name())
                    .unwrap_or("unrecognized")
            );
        }
        Ok(table)
    }

    fn apply_step(&self, step: &PipelineStep, table: &Table) -> Result<Table> {
        match step {
            PipelineStep::ConvertIds {
                from_col,
                to_col,
                extra_cols,
                id_type,
            } => {
                let base = match &self.id_map {
                    Some(map) => map,
                    None => cell_line_ids()?,
                };
                let filtered;
                let map = match id_type {
                    Some(t) => {
                        filtered = filter_id_type(base, t)?;
                        &filtered
                    }
                    None => base,
                };
                let extras: Vec<&str> = extra_cols.iter().map(String::as_str).collect();
                convert_ids(table, map, from_col, to_col, &extras)
            }
            PipelineStep::PairGenetic { left, right } => {
                make_genetic_vs_genetic(table, left, right, None)
            }
            PipelineStep::PairResponse {
                responses,
                genetics,
            } => {
                let response_types = match &responses.data_types {
                    Selector::Only(types) => types.clone(),
                    Selector::All => {
                        return Err(TidyError::InvalidParameter(
                            "PairResponse needs explicit response data types".to_string(),
                        ))
                    }
                };
                let data_type = table.require_column(col::DATA_TYPE)?;
                let genetic_rows = table.filter(|r| {
                    r[data_type]
                        .key()
                        .map(|t| !response_types.contains(&t))
                        .unwrap_or(true)
                });
                make_response_vs_genetic(table, &genetic_rows, responses, genetics)
            }
            PipelineStep::DropSelfPairs => drop_self_pairs(table),
        }
    }
}
