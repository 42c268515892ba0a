//! Sample-keyed joins between tall tables.
//!
//! Both paired formats come from the same inner join on `sample_id`: each side
//! is filtered by assayed id and data type, then every left row meets every
//! right row of the same sample. Samples present on one side only vanish.

use crate::data::{Table, Value};
use crate::error::Result;
use crate::schema::{check_df_format, col, TableKind};
use crate::source::Selector;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Row filter for one side of a pairing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PairFilter {
    /// Assayed ids to keep.
    #[serde(default)]
    pub ids: Selector,
    /// Data types to keep.
    #[serde(default)]
    pub data_types: Selector,
}

impl PairFilter {
    /// Keep every row.
    pub fn all() -> Self {
        Self::default()
    }

    /// Keep rows whose `assayed_id` is selected.
    pub fn ids(ids: Selector) -> Self {
        Self {
            ids,
            data_types: Selector::All,
        }
    }

    /// Additionally restrict by `data_type`.
    pub fn data_types(mut self, data_types: Selector) -> Self {
        self.data_types = data_types;
        self
    }
}

/// One filtered input of a join.
struct Side<'a> {
    table: &'a Table,
    sample: usize,
    assayed: usize,
    data_type: usize,
    value: usize,
    extras: Vec<usize>,
    rows: Vec<usize>,
}

impl<'a> Side<'a> {
    fn new(table: &'a Table, filter: &PairFilter) -> Result<Self> {
        check_df_format(table, TableKind::Tall)?;
        let sample = table.require_column(col::SAMPLE_ID)?;
        let assayed = table.require_column(col::ASSAYED_ID)?;
        let data_type = table.require_column(col::DATA_TYPE)?;
        let value = table.require_column(col::VALUE)?;

        let canonical = TableKind::Tall.columns();
        let extras = table
            .columns()
            .iter()
            .enumerate()
            .filter(|(_, name)| !canonical.contains(&name.as_str()))
            .map(|(i, _)| i)
            .collect();

        let rows = table
            .rows()
            .iter()
            .enumerate()
            .filter(|(_, r)| {
                key_in(&r[assayed], &filter.ids) && key_in(&r[data_type], &filter.data_types)
            })
            .map(|(i, _)| i)
            .collect();

        Ok(Self {
            table,
            sample,
            assayed,
            data_type,
            value,
            extras,
            rows,
        })
    }

    fn row(&self, idx: usize) -> &[Value] {
        &self.table.rows()[idx]
    }

    fn sample_key(&self, idx: usize) -> String {
        self.row(idx)[self.sample].key().unwrap_or_default()
    }

    /// The canonical values of a row: assayed id, `{assayed_id}_{data_type}`, data type, value.
    fn measurement(&self, idx: usize) -> [Value; 4] {
        let row = self.row(idx);
        let assayed = row[self.assayed].key().unwrap_or_default();
        let data_type = row[self.data_type].key().unwrap_or_default();
        [
            Value::Text(assayed.clone()),
            Value::Text(format!("{}_{}", assayed, data_type)),
            Value::Text(data_type),
            row[self.value].clone(),
        ]
    }
}

fn key_in(value: &Value, selector: &Selector) -> bool {
    match selector {
        Selector::All => true,
        Selector::Only(_) => value.key().map(|k| selector.contains(&k)).unwrap_or(false),
    }
}

/// Inner join on sample: `(left_row, right_row)` pairs, left order first.
fn join(left: &Side, right: &Side) -> Vec<(usize, usize)> {
    let mut by_sample: HashMap<String, Vec<usize>> = HashMap::new();
    for &r in &right.rows {
        by_sample.entry(right.sample_key(r)).or_default().push(r);
    }

    let mut pairs = Vec::new();
    for &l in &left.rows {
        if let Some(matches) = by_sample.get(&left.sample_key(l)) {
            pairs.extend(matches.iter().map(|&r| (l, r)));
        }
    }
    pairs
}

/// Build the paired table: `kind`'s columns, then extra input columns.
///
/// Extras come left side first. An extra whose name is already taken, by a
/// canonical output column or by the other side, is not carried.
fn assemble(left: &Side, right: &Side, kind: TableKind) -> Result<Table> {
    let mut columns: Vec<String> = kind.columns().iter().map(|c| c.to_string()).collect();
    let left_extras = carried_extras(left, &mut columns);
    let right_extras = carried_extras(right, &mut columns);

    let pairs = join(left, right);
    let mut out = Table::new(columns)?;
    for (l, r) in pairs {
        let [l_id, l_name, l_type, l_value] = left.measurement(l);
        let [r_id, r_name, r_type, r_value] = right.measurement(r);
        let mut row = vec![
            left.row(l)[left.sample].clone(),
            l_id,
            r_id,
            l_name,
            r_name,
            l_type,
            r_type,
            l_value,
            r_value,
        ];
        row.extend(left_extras.iter().map(|&i| left.row(l)[i].clone()));
        row.extend(right_extras.iter().map(|&i| right.row(r)[i].clone()));
        out.push_row(row)?;
    }

    log::debug!("Paired {} rows into {} table", out.n_rows(), kind);
    Ok(out)
}

/// Append the side's extra column names not yet in `columns`; returns their positions.
fn carried_extras(side: &Side, columns: &mut Vec<String>) -> Vec<usize> {
    let mut carried = Vec::new();
    for &i in &side.extras {
        let name = &side.table.columns()[i];
        if columns.contains(name) {
            log::debug!("Not carrying extra column '{}': name already in output", name);
            continue;
        }
        columns.push(name.clone());
        carried.push(i);
    }
    carried
}

/// Pair genetic measurements of the same sample.
///
/// `table_a` is filtered by `gene1`, `table_b` (defaults to `table_a`) by
/// `gene2`, and every surviving pair sharing a `sample_id` becomes one row.
/// Requesting N and M features yields up to N × M rows per sample; when both
/// sides select the same feature, its self-pairing is included (see
/// [`drop_self_pairs`]).
pub fn make_genetic_vs_genetic(
    table_a: &Table,
    gene1: &PairFilter,
    gene2: &PairFilter,
    table_b: Option<&Table>,
) -> Result<Table> {
    let left = Side::new(table_a, gene1)?;
    let right = Side::new(table_b.unwrap_or(table_a), gene2)?;
    assemble(&left, &right, TableKind::GeneticVsGenetic)
}

/// Pair response measurements from `table_a` with genetic measurements from `table_b`.
pub fn make_response_vs_genetic(
    table_a: &Table,
    table_b: &Table,
    resp: &PairFilter,
    genes: &PairFilter,
) -> Result<Table> {
    let left = Side::new(table_a, resp)?;
    let right = Side::new(table_b, genes)?;
    assemble(&left, &right, TableKind::ResponseVsGenetic)
}

/// Remove rows pairing a feature with itself (same gene, same data type).
pub fn drop_self_pairs(gvg: &Table) -> Result<Table> {
    check_df_format(gvg, TableKind::GeneticVsGenetic)?;
    let g1 = gvg.require_column(col::GENE1)?;
    let g2 = gvg.require_column(col::GENE2)?;
    let t1 = gvg.require_column(col::FEATURE_TYPE1)?;
    let t2 = gvg.require_column(col::FEATURE_TYPE2)?;
    Ok(gvg.filter(|r| !(r[g1] == r[g2] && r[t1] == r[t2])))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TallRow;
    use crate::error::TidyError;
    use crate::schema::get_df_format;
    use approx::assert_relative_eq;

    /// 3 samples × 3 genes, one row each.
    fn create_test_tall() -> Table {
        let mut rows = Vec::new();
        for (s, sample) in ["S1", "S2", "S3"].iter().enumerate() {
            for (g, gene) in ["BRAF", "EGFR", "TP53"].iter().enumerate() {
                rows.push(TallRow::new(sample, gene, "rna", Some((s * 10 + g) as f64)));
            }
        }
        Table::from_tall_rows(rows)
    }

    #[test]
    fn test_single_pair_per_sample() {
        let tall = create_test_tall();
        let gvg = make_genetic_vs_genetic(
            &tall,
            &PairFilter::ids(Selector::only(["BRAF"])),
            &PairFilter::ids(Selector::only(["EGFR"])),
            None,
        )
        .unwrap();
        assert_eq!(gvg.n_rows(), 3);
        assert_eq!(get_df_format(&gvg).kind, Some(TableKind::GeneticVsGenetic));
        assert_eq!(gvg.get(1, "sample_id").unwrap().as_text(), Some("S2"));
        assert_eq!(gvg.get(1, "gene1").unwrap().as_text(), Some("BRAF"));
        assert_eq!(gvg.get(1, "feature_name2").unwrap().as_text(), Some("EGFR_rna"));
        assert_relative_eq!(gvg.get(1, "feature_value1").unwrap().as_number().unwrap(), 10.0);
        assert_relative_eq!(gvg.get(1, "feature_value2").unwrap().as_number().unwrap(), 11.0);
    }

    #[test]
    fn test_cross_product_cardinality() {
        let tall = create_test_tall();
        let gvg = make_genetic_vs_genetic(
            &tall,
            &PairFilter::ids(Selector::only(["BRAF", "EGFR"])),
            &PairFilter::ids(Selector::only(["EGFR", "TP53"])),
            None,
        )
        .unwrap();
        // 2 × 2 features × 3 samples
        assert_eq!(gvg.n_rows(), 12);
    }

    #[test]
    fn test_self_pairs_included_then_dropped() {
        let tall = create_test_tall();
        let gvg = make_genetic_vs_genetic(&tall, &PairFilter::all(), &PairFilter::all(), None)
            .unwrap();
        assert_eq!(gvg.n_rows(), 27);
        let cleaned = drop_self_pairs(&gvg).unwrap();
        assert_eq!(cleaned.n_rows(), 18);
    }

    #[test]
    fn test_two_tables_same_gene() {
        let a = Table::from_tall_rows(vec![TallRow::new("S1", "geneA", "rna", Some(5.0))]);
        let b = Table::from_tall_rows(vec![TallRow::new("S1", "geneA", "rna", Some(7.0))]);
        let gvg = make_genetic_vs_genetic(
            &a,
            &PairFilter::ids(Selector::only(["geneA"])),
            &PairFilter::ids(Selector::only(["geneA"])),
            Some(&b),
        )
        .unwrap();
        assert_eq!(gvg.n_rows(), 1);
        assert_eq!(gvg.get(0, "sample_id").unwrap().as_text(), Some("S1"));
        assert_relative_eq!(gvg.get(0, "feature_value1").unwrap().as_number().unwrap(), 5.0);
        assert_relative_eq!(gvg.get(0, "feature_value2").unwrap().as_number().unwrap(), 7.0);
    }

    #[test]
    fn test_inner_join_excludes_unshared_samples() {
        let a = Table::from_tall_rows(vec![
            TallRow::new("S1", "BRAF", "rna", Some(1.0)),
            TallRow::new("S2", "BRAF", "rna", Some(2.0)),
        ]);
        let b = Table::from_tall_rows(vec![
            TallRow::new("S2", "EGFR", "cnv", Some(3.0)),
            TallRow::new("S3", "EGFR", "cnv", Some(4.0)),
        ]);
        let gvg = make_genetic_vs_genetic(&a, &PairFilter::all(), &PairFilter::all(), Some(&b))
            .unwrap();
        assert_eq!(gvg.n_rows(), 1);
        assert_eq!(gvg.get(0, "sample_id").unwrap().as_text(), Some("S2"));
        assert_eq!(gvg.get(0, "feature_type2").unwrap().as_text(), Some("cnv"));
    }

    #[test]
    fn test_data_type_filter() {
        let tall = Table::concat(&[
            create_test_tall(),
            Table::from_tall_rows(vec![TallRow::new("S1", "BRAF", "mutation", Some(1.0))]),
        ]);
        let gvg = make_genetic_vs_genetic(
            &tall,
            &PairFilter::ids(Selector::only(["BRAF"])).data_types(Selector::only(["mutation"])),
            &PairFilter::ids(Selector::only(["EGFR"])),
            None,
        )
        .unwrap();
        assert_eq!(gvg.n_rows(), 1);
        assert_eq!(gvg.get(0, "feature_type1").unwrap().as_text(), Some("mutation"));
    }

    #[test]
    fn test_empty_result_is_valid() {
        let tall = create_test_tall();
        let gvg = make_genetic_vs_genetic(
            &tall,
            &PairFilter::ids(Selector::only(["KRAS"])),
            &PairFilter::all(),
            None,
        )
        .unwrap();
        assert!(gvg.is_empty());
        assert_eq!(gvg.columns(), TableKind::GeneticVsGenetic.columns());
    }

    #[test]
    fn test_response_vs_genetic() {
        let resp = Table::from_tall_rows(vec![
            TallRow::new("S1", "erlotinib", "ic50", Some(0.2)),
            TallRow::new("S2", "erlotinib", "ic50", None),
        ]);
        let tall = create_test_tall();
        let rvg = make_response_vs_genetic(
            &resp,
            &tall,
            &PairFilter::all(),
            &PairFilter::ids(Selector::only(["EGFR"])),
        )
        .unwrap();
        assert_eq!(get_df_format(&rvg).kind, Some(TableKind::ResponseVsGenetic));
        assert_eq!(rvg.n_rows(), 2);
        assert_eq!(rvg.get(0, "resp_id").unwrap().as_text(), Some("erlotinib"));
        assert_eq!(rvg.get(0, "resp_name").unwrap().as_text(), Some("erlotinib_ic50"));
        assert_eq!(rvg.get(0, "gene").unwrap().as_text(), Some("EGFR"));
        assert_relative_eq!(rvg.get(0, "resp_value").unwrap().as_number().unwrap(), 0.2);
        assert!(rvg.get(1, "resp_value").unwrap().is_missing());
    }

    #[test]
    fn test_schema_checked_before_join() {
        let bad = Table::new(["sample_id", "value"]).unwrap();
        let tall = create_test_tall();
        assert!(matches!(
            make_genetic_vs_genetic(&bad, &PairFilter::all(), &PairFilter::all(), Some(&tall)),
            Err(TidyError::SchemaMismatch { .. })
        ));
        assert!(matches!(
            make_response_vs_genetic(&tall, &bad, &PairFilter::all(), &PairFilter::all()),
            Err(TidyError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_extra_columns_carried() {
        let tall = create_test_tall()
            .with_column("tissue", vec!["skin".into(); 9])
            .unwrap();
        let gvg = make_genetic_vs_genetic(
            &tall,
            &PairFilter::ids(Selector::only(["BRAF"])),
            &PairFilter::ids(Selector::only(["TP53"])),
            None,
        )
        .unwrap();
        assert_eq!(gvg.n_cols(), 10);
        assert_eq!(gvg.get(0, "tissue").unwrap().as_text(), Some("skin"));
    }

    #[test]
    fn test_extra_column_named_like_output_is_skipped() {
        let resp = Table::from_tall_rows(vec![TallRow::new("S1", "erlotinib", "ic50", Some(0.2))])
            .with_column("gene", vec!["EGFR".into()])
            .unwrap();
        let tall = create_test_tall();
        let rvg = make_response_vs_genetic(
            &resp,
            &tall,
            &PairFilter::all(),
            &PairFilter::ids(Selector::only(["TP53"])),
        )
        .unwrap();

        assert_eq!(rvg.n_cols(), TableKind::ResponseVsGenetic.columns().len());
        assert_eq!(rvg.n_rows(), 1);
        assert_eq!(rvg.get(0, "gene").unwrap().as_text(), Some("TP53"));
    }
}
