//! Sample identifier harmonization.
//!
//! Rewrites the `sample_id` column of any tidy table through an identifier
//! map. Maps may hold several identifier schemes side by side, told apart by
//! an `id_type` column; filter them with [`filter_id_type`] first.

mod reference;

pub use reference::cell_line_ids;

use crate::data::{Table, Value};
use crate::error::{Result, TidyError};
use crate::schema::col;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Discriminator column for maps holding several identifier schemes.
pub const ID_TYPE: &str = "id_type";

/// Replace `sample_id` with the map's `to_col` value for the matching `from_col` value.
///
/// Rows whose sample has no match in `from_col` are dropped. `extra_cols`
/// are copied from the map onto every kept row. Fails with
/// `AmbiguousIdentifier` if one `from_col` value maps to several distinct
/// `to_col` values, and with `DuplicateColumn` if an extra column already
/// exists in the table.
pub fn convert_ids(
    table: &Table,
    id_map: &Table,
    from_col: &str,
    to_col: &str,
    extra_cols: &[&str],
) -> Result<Table> {
    let sample = table.require_column(col::SAMPLE_ID)?;
    let from = id_map.require_column(from_col)?;
    let to = id_map.require_column(to_col)?;
    let extras = extra_cols
        .iter()
        .map(|c| {
            if table.has_column(c) {
                Err(TidyError::DuplicateColumn(c.to_string()))
            } else {
                id_map.require_column(c)
            }
        })
        .collect::<Result<Vec<usize>>>()?;

    let mut lookup: HashMap<String, usize> = HashMap::new();
    for (i, row) in id_map.rows().iter().enumerate() {
        let (Some(key), Some(target)) = (row[from].key(), row[to].key()) else {
            continue;
        };
        match lookup.entry(key) {
            Entry::Vacant(e) => {
                e.insert(i);
            }
            Entry::Occupied(e) => {
                let previous = id_map.rows()[*e.get()][to].key();
                if previous.as_deref() != Some(target.as_str()) {
                    return Err(TidyError::AmbiguousIdentifier {
                        kind: "sample".to_string(),
                        id: e.key().clone(),
                        column: from_col.to_string(),
                    });
                }
            }
        }
    }

    let mut columns = table.columns().to_vec();
    columns.extend(extra_cols.iter().map(|c| c.to_string()));
    let mut out = Table::new(columns)?;
    let mut dropped = 0usize;

    for row in table.rows() {
        let map_row = match row[sample].key().and_then(|k| lookup.get(&k)) {
            Some(&m) => &id_map.rows()[m],
            None => {
                dropped += 1;
                continue;
            }
        };
        let mut new_row = row.clone();
        new_row[sample] = map_row[to].key().map(Value::Text).unwrap_or(Value::Missing);
        new_row.extend(extras.iter().map(|&c| map_row[c].clone()));
        out.push_row(new_row)?;
    }

    log::debug!(
        "convert_ids {} -> {}: kept {} rows, dropped {} unmapped",
        from_col,
        to_col,
        out.n_rows(),
        dropped
    );
    Ok(out)
}

/// Keep only map rows of one identifier scheme.
pub fn filter_id_type(id_map: &Table, id_type: &str) -> Result<Table> {
    let col = id_map.require_column(ID_TYPE)?;
    Ok(id_map.filter(|r| r[col].key().as_deref() == Some(id_type)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TallRow;

    fn create_test_table() -> Table {
        Table::from_tall_rows(vec![
            TallRow::new("A375_SKIN", "BRAF", "rna", Some(1.0)),
            TallRow::new("MCF7_BREAST", "BRAF", "rna", Some(2.0)),
            TallRow::new("UNKNOWN_LINE", "BRAF", "rna", Some(3.0)),
        ])
    }

    fn create_test_map() -> Table {
        Table::from_rows(
            ["from", "to", "tissue"],
            vec![
                vec!["A375_SKIN".into(), "A375".into(), "skin".into()],
                vec!["MCF7_BREAST".into(), "MCF7".into(), "breast".into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_convert_drops_unmapped() {
        let table = create_test_table();
        let converted = convert_ids(&table, &create_test_map(), "from", "to", &[]).unwrap();
        assert_eq!(converted.n_rows(), 2);
        assert!(converted.n_rows() <= table.n_rows());
        assert_eq!(converted.distinct_keys("sample_id").unwrap(), vec!["A375", "MCF7"]);
        assert_eq!(converted.columns(), table.columns());
    }

    #[test]
    fn test_convert_keeps_all_when_fully_mapped() {
        let table = create_test_table();
        let map = Table::concat(&[
            create_test_map(),
            Table::from_rows(
                ["from", "to", "tissue"],
                vec![vec!["UNKNOWN_LINE".into(), "X".into(), Value::Missing]],
            )
            .unwrap(),
        ]);
        let converted = convert_ids(&table, &map, "from", "to", &[]).unwrap();
        assert_eq!(converted.n_rows(), table.n_rows());
    }

    #[test]
    fn test_convert_extra_columns() {
        let converted =
            convert_ids(&create_test_table(), &create_test_map(), "from", "to", &["tissue"])
                .unwrap();
        assert_eq!(converted.get(0, "tissue").unwrap().as_text(), Some("skin"));
        assert_eq!(converted.get(1, "tissue").unwrap().as_text(), Some("breast"));
        assert_eq!(converted.get(0, "value").unwrap().as_number(), Some(1.0));
    }

    #[test]
    fn test_convert_missing_map_column() {
        let result = convert_ids(&create_test_table(), &create_test_map(), "from", "cosmic", &[]);
        assert!(matches!(result, Err(TidyError::MissingColumn(c)) if c == "cosmic"));
    }

    #[test]
    fn test_extra_column_cannot_replace_existing() {
        let result = convert_ids(&create_test_table(), &create_test_map(), "from", "to", &["value"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_ambiguous_map() {
        let map = Table::from_rows(
            ["from", "to"],
            vec![
                vec!["A375_SKIN".into(), "A375".into()],
                vec!["A375_SKIN".into(), "ACH-000219".into()],
            ],
        )
        .unwrap();
        assert!(matches!(
            convert_ids(&create_test_table(), &map, "from", "to", &[]),
            Err(TidyError::AmbiguousIdentifier { .. })
        ));
    }

    #[test]
    fn test_duplicate_identical_mapping_tolerated() {
        let map = Table::from_rows(
            ["from", "to"],
            vec![
                vec!["A375_SKIN".into(), "A375".into()],
                vec!["A375_SKIN".into(), "A375".into()],
            ],
        )
        .unwrap();
        let converted = convert_ids(&create_test_table(), &map, "from", "to", &[]).unwrap();
        assert_eq!(converted.n_rows(), 1);
    }

    #[test]
    fn test_filter_id_type() {
        let map = cell_line_ids().unwrap();
        let depmap = filter_id_type(map, "depmap").unwrap();
        assert_eq!(depmap.n_rows(), 5);
        assert!(filter_id_type(&create_test_map(), "depmap").is_err());
    }
}
