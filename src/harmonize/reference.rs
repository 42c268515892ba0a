//! Bundled cell line identifier crosswalk.

use crate::data::Table;
use crate::error::{Result, TidyError};
use std::sync::OnceLock;

const CELL_LINE_IDS_TSV: &str = include_str!("../../data/cell_line_ids.tsv");

static CELL_LINE_IDS: OnceLock<std::result::Result<Table, String>> = OnceLock::new();

/// Crosswalk of common cell line identifiers, parsed on first use.
///
/// Columns: `cell_line` (common name), `id_type` (`ccle`, `depmap` or
/// `cosmic`), `id` (identifier under that scheme) and `tissue`. Filter on
/// `id_type` before converting from `cell_line`, since each cell line has one
/// row per scheme.
pub fn cell_line_ids() -> Result<&'static Table> {
    CELL_LINE_IDS
        .get_or_init(|| {
            Table::from_tsv_reader(CELL_LINE_IDS_TSV.as_bytes()).map_err(|e| e.to_string())
        })
        .as_ref()
        .map_err(|e| TidyError::InvalidParameter(format!("Bundled cell line table: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TallRow;
    use crate::harmonize::{convert_ids, filter_id_type};

    #[test]
    fn test_crosswalk_loads() {
        let table = cell_line_ids().unwrap();
        assert_eq!(table.columns(), &["cell_line", "id_type", "id", "tissue"]);
        assert_eq!(table.n_rows(), 15);
        assert_eq!(
            table.distinct_keys("id_type").unwrap(),
            vec!["ccle", "depmap", "cosmic"]
        );
    }

    #[test]
    fn test_same_instance() {
        let a = cell_line_ids().unwrap() as *const Table;
        let b = cell_line_ids().unwrap() as *const Table;
        assert_eq!(a, b);
    }

    #[test]
    fn test_ccle_to_common_name() {
        let table = Table::from_tall_rows(vec![
            TallRow::new("A375_SKIN", "BRAF", "rna", Some(1.0)),
            TallRow::new("K562_HAEMATOPOIETIC_AND_LYMPHOID_TISSUE", "BRAF", "rna", Some(2.0)),
        ]);
        let ccle = filter_id_type(cell_line_ids().unwrap(), "ccle").unwrap();
        let converted = convert_ids(&table, &ccle, "id", "cell_line", &["tissue"]).unwrap();
        assert_eq!(converted.distinct_keys("sample_id").unwrap(), vec!["A375", "K562"]);
        assert_eq!(converted.get(0, "tissue").unwrap().as_text(), Some("skin"));
    }

    #[test]
    fn test_common_name_needs_scheme_filter() {
        let table = Table::from_tall_rows(vec![TallRow::new("A375", "BRAF", "rna", Some(1.0))]);
        let all = cell_line_ids().unwrap();
        assert!(convert_ids(&table, all, "cell_line", "id", &[]).is_err());

        let depmap = filter_id_type(all, "depmap").unwrap();
        let converted = convert_ids(&table, &depmap, "cell_line", "id", &[]).unwrap();
        assert_eq!(converted.get(0, "sample_id").unwrap().as_text(), Some("ACH-000219"));
    }
}
