//! Combined extraction over several data types and response data.

use super::experiment::Misses;
use super::{Experiment, GatherRequest, MultiAssaySource, Selector, UnresolvedPolicy};
use crate::data::{Annotation, Table};
use crate::error::{Result, TidyError};
use std::collections::HashSet;

/// Gather every requested data type, plus response data when requested, as one tall table.
///
/// Per-type tables are unioned by row; no pairing happens here. All arguments
/// are validated before any data is gathered. A requested id counts as
/// unresolved only when none of the selected types carries it.
pub fn gather_combined(source: &MultiAssaySource, request: &GatherRequest) -> Result<Table> {
    gather_from(
        source.experiments(),
        source.responses(),
        source.sample_annotation(),
        request,
    )
}

/// Gather only response data: `request.responses` selects response ids
/// (all when unset), `resp_col` names their alias column.
pub fn gather_response(source: &MultiAssaySource, request: &GatherRequest) -> Result<Table> {
    let selected = select_responses(source.responses(), &request.response_types)?;
    let query = request.response_query();
    let mut parts = Vec::with_capacity(selected.len());
    let mut misses = Vec::with_capacity(selected.len());
    for experiment in &selected {
        let (table, missed) = experiment.melt_partial(&query, source.sample_annotation())?;
        parts.push(table);
        misses.push(missed);
    }
    report_unresolved(&misses, request.unresolved)?;
    Ok(union(parts))
}

pub(crate) fn gather_from(
    experiments: &[Experiment],
    responses: &[Experiment],
    fallback_samples: Option<&Annotation>,
    request: &GatherRequest,
) -> Result<Table> {
    reject_repeated_types(&request.data_types)?;
    let selected = select_types(experiments, &request.data_types)?;
    if !request.feature_cols.is_empty() && request.feature_cols.len() != selected.len() {
        return Err(TidyError::ConfigurationMismatch {
            what: "feature_cols".to_string(),
            expected: selected.len(),
            actual: request.feature_cols.len(),
        });
    }
    let selected_responses = match request.responses {
        Some(_) => select_responses(responses, &request.response_types)?,
        None => Vec::new(),
    };

    let mut parts = Vec::with_capacity(selected.len() + selected_responses.len());
    let mut genetic_misses = Vec::with_capacity(selected.len());
    let mut response_misses = Vec::with_capacity(selected_responses.len());
    for (i, experiment) in selected.iter().enumerate() {
        let query = request.assay_query(request.feature_cols.get(i).map(String::as_str));
        let (table, missed) = experiment.melt_partial(&query, fallback_samples)?;
        parts.push(table);
        genetic_misses.push(missed);
    }
    let response_query = request.response_query();
    for experiment in &selected_responses {
        let (table, missed) = experiment.melt_partial(&response_query, fallback_samples)?;
        parts.push(table);
        response_misses.push(missed);
    }

    // Features and responses are separate id spaces; samples are shared by all.
    let policy = request.unresolved;
    for (id, column) in missed_by_all(genetic_misses.iter().map(|m| &m.features)) {
        policy.unresolved("feature", &id, &column)?;
    }
    for (id, column) in missed_by_all(response_misses.iter().map(|m| &m.features)) {
        policy.unresolved("response", &id, &column)?;
    }
    let all_misses = genetic_misses.iter().chain(&response_misses);
    for (id, column) in missed_by_all(all_misses.map(|m| &m.samples)) {
        policy.unresolved("sample", &id, &column)?;
    }

    let table = union(parts);
    log::debug!(
        "Combined gather: {} data types, {} response types, {} rows",
        selected.len(),
        selected_responses.len(),
        table.n_rows()
    );
    Ok(table)
}

fn report_unresolved(misses: &[Misses], policy: UnresolvedPolicy) -> Result<()> {
    for (id, column) in missed_by_all(misses.iter().map(|m| &m.features)) {
        policy.unresolved("response", &id, &column)?;
    }
    for (id, column) in missed_by_all(misses.iter().map(|m| &m.samples)) {
        policy.unresolved("sample", &id, &column)?;
    }
    Ok(())
}

/// Ids missed by every experiment, in the first experiment's order.
fn missed_by_all<'a, I>(lists: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = &'a Vec<(String, String)>>,
{
    let lists: Vec<&Vec<(String, String)>> = lists.into_iter().collect();
    let Some((first, rest)) = lists.split_first() else {
        return Vec::new();
    };
    first
        .iter()
        .filter(|(id, _)| rest.iter().all(|l| l.iter().any(|(other, _)| other == id)))
        .cloned()
        .collect()
}

/// `feature_cols` pairs with data types by position, so each type may appear once.
fn reject_repeated_types(selector: &Selector) -> Result<()> {
    if let Selector::Only(types) = selector {
        let mut seen = HashSet::new();
        if let Some(repeated) = types.iter().find(|t| !seen.insert(t.as_str())) {
            return Err(TidyError::InvalidParameter(format!(
                "Data type '{}' requested more than once",
                repeated
            )));
        }
    }
    Ok(())
}

fn select_types<'a>(available: &'a [Experiment], selector: &Selector) -> Result<Vec<&'a Experiment>> {
    match selector.ids() {
        None => Ok(available.iter().collect()),
        Some(names) => names
            .into_iter()
            .map(|name| {
                available
                    .iter()
                    .find(|e| e.data_type() == name)
                    .ok_or_else(|| TidyError::UnknownDataType(name.to_string()))
            })
            .collect(),
    }
}

fn select_responses<'a>(
    available: &'a [Experiment],
    selector: &Selector,
) -> Result<Vec<&'a Experiment>> {
    if available.is_empty() {
        return Err(TidyError::EmptyData(
            "Source carries no response data".to_string(),
        ));
    }
    select_types(available, selector)
}

fn union(parts: Vec<Table>) -> Table {
    if parts.is_empty() {
        Table::empty_tall()
    } else {
        Table::concat(&parts)
    }
}
