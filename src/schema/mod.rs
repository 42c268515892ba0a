//! Registry of the canonical tidy table formats.
//!
//! Formats are matched structurally: a table satisfies a format when it carries
//! every canonical column of that format, whatever produced it. Extra columns
//! are allowed and never replace canonical ones.

use crate::data::Table;
use crate::error::{Result, TidyError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical column names.
pub mod col {
    pub const SAMPLE_ID: &str = "sample_id";
    pub const ASSAYED_ID: &str = "assayed_id";
    pub const DATA_TYPE: &str = "data_type";
    pub const ORIGINAL: &str = "original";
    pub const VALUE: &str = "value";

    pub const GENE1: &str = "gene1";
    pub const GENE2: &str = "gene2";
    pub const FEATURE_NAME1: &str = "feature_name1";
    pub const FEATURE_NAME2: &str = "feature_name2";
    pub const FEATURE_TYPE1: &str = "feature_type1";
    pub const FEATURE_TYPE2: &str = "feature_type2";
    pub const FEATURE_VALUE1: &str = "feature_value1";
    pub const FEATURE_VALUE2: &str = "feature_value2";

    pub const RESP_ID: &str = "resp_id";
    pub const GENE: &str = "gene";
    pub const RESP_NAME: &str = "resp_name";
    pub const FEATURE_NAME: &str = "feature_name";
    pub const RESP_TYPE: &str = "resp_type";
    pub const FEATURE_TYPE: &str = "feature_type";
    pub const RESP_VALUE: &str = "resp_value";
    pub const FEATURE_VALUE: &str = "feature_value";
}

const TALL_COLUMNS: &[&str] = &[
    col::SAMPLE_ID,
    col::ASSAYED_ID,
    col::DATA_TYPE,
    col::ORIGINAL,
    col::VALUE,
];

const GVG_COLUMNS: &[&str] = &[
    col::SAMPLE_ID,
    col::GENE1,
    col::GENE2,
    col::FEATURE_NAME1,
    col::FEATURE_NAME2,
    col::FEATURE_TYPE1,
    col::FEATURE_TYPE2,
    col::FEATURE_VALUE1,
    col::FEATURE_VALUE2,
];

const RVG_COLUMNS: &[&str] = &[
    col::SAMPLE_ID,
    col::RESP_ID,
    col::GENE,
    col::RESP_NAME,
    col::FEATURE_NAME,
    col::RESP_TYPE,
    col::FEATURE_TYPE,
    col::RESP_VALUE,
    col::FEATURE_VALUE,
];

const NUMERIC_COLUMNS: &[&str] = &[
    col::VALUE,
    col::FEATURE_VALUE1,
    col::FEATURE_VALUE2,
    col::RESP_VALUE,
    col::FEATURE_VALUE,
];

/// The four canonical table formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    /// One measurement per row.
    Tall,
    /// Tall rows holding response/phenotype measurements.
    Response,
    /// Two genetic measurements of the same sample per row.
    GeneticVsGenetic,
    /// A response measurement paired with a genetic measurement per row.
    ResponseVsGenetic,
}

impl TableKind {
    /// Every kind, in detection priority order.
    pub const ALL: [TableKind; 4] = [
        TableKind::GeneticVsGenetic,
        TableKind::ResponseVsGenetic,
        TableKind::Tall,
        TableKind::Response,
    ];

    /// Canonical columns of this format.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            TableKind::Tall | TableKind::Response => TALL_COLUMNS,
            TableKind::GeneticVsGenetic => GVG_COLUMNS,
            TableKind::ResponseVsGenetic => RVG_COLUMNS,
        }
    }

    /// Short name.
    pub fn name(&self) -> &'static str {
        match self {
            TableKind::Tall => "tall",
            TableKind::Response => "response",
            TableKind::GeneticVsGenetic => "gvg",
            TableKind::ResponseVsGenetic => "rvg",
        }
    }

    /// Canonical columns of this format absent from `table`.
    pub fn missing_columns(&self, table: &Table) -> Vec<String> {
        self.columns()
            .iter()
            .filter(|c| !table.has_column(c))
            .map(|c| c.to_string())
            .collect()
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Outcome of format detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatMatch {
    /// Detected format, `None` when the table matches no format.
    pub kind: Option<TableKind>,
    /// True when the table has exactly the canonical columns and nothing else.
    pub exact: bool,
}

impl FormatMatch {
    /// Whether any format matched.
    pub fn matched(&self) -> bool {
        self.kind.is_some()
    }
}

/// Detect which canonical format a table satisfies.
///
/// Paired formats are tried before the tall format. Response tables share the
/// tall columns and are reported as [`TableKind::Tall`].
pub fn get_df_format(table: &Table) -> FormatMatch {
    for kind in TableKind::ALL {
        if kind.missing_columns(table).is_empty() {
            return FormatMatch {
                kind: Some(kind),
                exact: table.n_cols() == kind.columns().len(),
            };
        }
    }
    FormatMatch {
        kind: None,
        exact: false,
    }
}

/// Detect the format, failing with `UnrecognizedFormat` when nothing matches.
pub fn detect_format(table: &Table) -> Result<TableKind> {
    get_df_format(table)
        .kind
        .ok_or_else(|| TidyError::UnrecognizedFormat(table.columns().to_vec()))
}

/// Validate that `table` satisfies the `expected` format.
///
/// Fails with `SchemaMismatch` listing absent canonical columns, or with
/// `NullSampleId` when a row lacks its sample identifier.
pub fn check_df_format(table: &Table, expected: TableKind) -> Result<()> {
    let missing = expected.missing_columns(table);
    if !missing.is_empty() {
        return Err(TidyError::SchemaMismatch {
            expected: expected.name().to_string(),
            missing,
        });
    }

    let sample_col = table.require_column(col::SAMPLE_ID)?;
    if let Some(row) = table.rows().iter().position(|r| r[sample_col].is_missing()) {
        return Err(TidyError::NullSampleId { row });
    }
    Ok(())
}

/// Whether a column name is a canonical text column (identifiers and labels).
pub(crate) fn is_text_column(name: &str) -> bool {
    let canonical = TALL_COLUMNS
        .iter()
        .chain(GVG_COLUMNS)
        .chain(RVG_COLUMNS)
        .any(|c| *c == name);
    canonical && !NUMERIC_COLUMNS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Value;

    fn tall_table() -> Table {
        Table::from_rows(
            TALL_COLUMNS.to_vec(),
            vec![vec![
                "S1".into(),
                "BRAF".into(),
                "rna".into(),
                "1".into(),
                Value::Number(1.0),
            ]],
        )
        .unwrap()
    }

    #[test]
    fn test_detect_tall() {
        let m = get_df_format(&tall_table());
        assert_eq!(m.kind, Some(TableKind::Tall));
        assert!(m.exact);
        assert!(m.matched());
    }

    #[test]
    fn test_detect_superset() {
        let table = tall_table()
            .with_column("tissue", vec!["skin".into()])
            .unwrap();
        let m = get_df_format(&table);
        assert_eq!(m.kind, Some(TableKind::Tall));
        assert!(!m.exact);
    }

    #[test]
    fn test_detect_paired_formats() {
        let gvg = Table::new(GVG_COLUMNS.to_vec()).unwrap();
        assert_eq!(get_df_format(&gvg).kind, Some(TableKind::GeneticVsGenetic));

        let rvg = Table::new(RVG_COLUMNS.to_vec()).unwrap();
        assert_eq!(get_df_format(&rvg).kind, Some(TableKind::ResponseVsGenetic));
    }

    #[test]
    fn test_unrecognized() {
        let table = Table::new(["sample_id", "value"]).unwrap();
        let m = get_df_format(&table);
        assert!(!m.matched());
        assert!(matches!(
            detect_format(&table),
            Err(TidyError::UnrecognizedFormat(_))
        ));
    }

    #[test]
    fn test_check_reports_missing_columns() {
        let table = Table::new(["sample_id", "assayed_id", "value"]).unwrap();
        match check_df_format(&table, TableKind::Tall) {
            Err(TidyError::SchemaMismatch { expected, missing }) => {
                assert_eq!(expected, "tall");
                assert_eq!(missing, vec!["data_type", "original"]);
            }
            other => panic!("expected schema mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_check_response_uses_tall_contract() {
        assert!(check_df_format(&tall_table(), TableKind::Response).is_ok());
        assert!(check_df_format(&tall_table(), TableKind::GeneticVsGenetic).is_err());
    }

    #[test]
    fn test_check_rejects_null_sample() {
        let table = Table::from_rows(
            TALL_COLUMNS.to_vec(),
            vec![vec![
                Value::Missing,
                "BRAF".into(),
                "rna".into(),
                "1".into(),
                Value::Number(1.0),
            ]],
        )
        .unwrap();
        assert!(matches!(
            check_df_format(&table, TableKind::Tall),
            Err(TidyError::NullSampleId { row: 0 })
        ));
    }

    #[test]
    fn test_text_columns() {
        assert!(is_text_column("sample_id"));
        assert!(is_text_column("feature_name1"));
        assert!(!is_text_column("value"));
        assert!(!is_text_column("tissue"));
    }
}
