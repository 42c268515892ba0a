//! Multi-assay source bundling experiments and response panels.

use super::{combined, AssayQuery, Experiment, GatherRequest, TallSource};
use crate::data::{Annotation, Table};
use crate::error::{Result, TidyError};

/// Several experiments over a shared sample set, plus optional response data.
///
/// Genetic experiments and response experiments (drug × sample matrices, one
/// per sensitivity measure) are kept apart so a request can address them
/// separately. Data type names are unique across both groups.
#[derive(Debug, Clone, Default)]
pub struct MultiAssaySource {
    experiments: Vec<Experiment>,
    responses: Vec<Experiment>,
    samples: Option<Annotation>,
}

impl MultiAssaySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a genetic experiment.
    pub fn with_experiment(mut self, experiment: Experiment) -> Result<Self> {
        self.check_unique(experiment.data_type())?;
        self.experiments.push(experiment);
        Ok(self)
    }

    /// Add a response experiment.
    pub fn with_response(mut self, response: Experiment) -> Result<Self> {
        self.check_unique(response.data_type())?;
        self.responses.push(response);
        Ok(self)
    }

    /// Sample annotation shared by experiments that have none of their own.
    pub fn with_sample_annotation(mut self, samples: Annotation) -> Self {
        self.samples = Some(samples);
        self
    }

    fn check_unique(&self, data_type: &str) -> Result<()> {
        if self.experiment(data_type).is_some() || self.response(data_type).is_some() {
            return Err(TidyError::InvalidParameter(format!(
                "Duplicate data type '{}'",
                data_type
            )));
        }
        Ok(())
    }

    /// Genetic experiments in insertion order.
    pub fn experiments(&self) -> &[Experiment] {
        &self.experiments
    }

    /// Response experiments in insertion order.
    pub fn responses(&self) -> &[Experiment] {
        &self.responses
    }

    /// Shared sample annotation.
    pub fn sample_annotation(&self) -> Option<&Annotation> {
        self.samples.as_ref()
    }

    /// Look up a genetic experiment by data type.
    pub fn experiment(&self, data_type: &str) -> Option<&Experiment> {
        self.experiments.iter().find(|e| e.data_type() == data_type)
    }

    /// Look up a response experiment by measure name.
    pub fn response(&self, data_type: &str) -> Option<&Experiment> {
        self.responses.iter().find(|e| e.data_type() == data_type)
    }

    /// Names of the genetic data types.
    pub fn data_types(&self) -> Vec<&str> {
        self.experiments.iter().map(|e| e.data_type()).collect()
    }

    /// Gather from one experiment, genetic or response, by data type.
    pub fn gather_assay(&self, data_type: &str, query: &AssayQuery) -> Result<Table> {
        let experiment = self
            .experiment(data_type)
            .or_else(|| self.response(data_type))
            .ok_or_else(|| TidyError::UnknownDataType(data_type.to_string()))?;
        experiment.melt(query, self.samples.as_ref())
    }
}

impl TallSource for MultiAssaySource {
    fn gather(&self, request: &GatherRequest) -> Result<Table> {
        combined::gather_combined(self, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::AssayMatrix;
    use crate::source::Selector;

    fn experiment(data_type: &str) -> Experiment {
        let matrix = AssayMatrix::from_rows(
            vec![vec![1.0, 2.0]],
            vec!["g1".into()],
            vec!["S1".into(), "S2".into()],
        )
        .unwrap();
        Experiment::new(data_type, matrix)
    }

    #[test]
    fn test_duplicate_data_type() {
        let source = MultiAssaySource::new()
            .with_experiment(experiment("rna"))
            .unwrap();
        assert!(source.clone().with_experiment(experiment("rna")).is_err());
        assert!(source.with_response(experiment("rna")).is_err());
    }

    #[test]
    fn test_lookup() {
        let source = MultiAssaySource::new()
            .with_experiment(experiment("rna"))
            .unwrap()
            .with_experiment(experiment("cnv"))
            .unwrap()
            .with_response(experiment("ic50"))
            .unwrap();
        assert_eq!(source.data_types(), vec!["rna", "cnv"]);
        assert!(source.response("ic50").is_some());
        assert!(source.experiment("ic50").is_none());
    }

    #[test]
    fn test_gather_assay_uses_shared_samples() {
        let samples = Annotation::new("sample", vec!["S1".into(), "S2".into()])
            .with_alias("cellid", ["A375", "MCF7"])
            .unwrap();
        let source = MultiAssaySource::new()
            .with_experiment(experiment("rna"))
            .unwrap()
            .with_sample_annotation(samples);

        let query = AssayQuery::new()
            .samples(Selector::only(["MCF7"]))
            .sample_col("cellid");
        let rows = source.gather_assay("rna", &query).unwrap().tall_rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sample_id, "MCF7");
        assert_eq!(rows[0].value, Some(2.0));

        assert!(matches!(
            source.gather_assay("mutation", &query),
            Err(TidyError::UnknownDataType(_))
        ));
    }
}
