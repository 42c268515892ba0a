//! Feature and sample annotations with alias columns.

use crate::data::Table;
use crate::error::{Result, TidyError};
use std::collections::HashMap;

/// Lookup table mapping human-facing aliases to internal identifiers.
///
/// One key column holds the internal ids used by an [`AssayMatrix`]; any
/// number of alias columns (e.g. `Symbol`, `gene_name`) name the same
/// entries under other schemes. An alias may be absent for some entries.
///
/// [`AssayMatrix`]: crate::data::AssayMatrix
#[derive(Debug, Clone)]
pub struct Annotation {
    key_column: String,
    ids: Vec<String>,
    index: HashMap<String, usize>,
    columns: Vec<String>,
    aliases: Vec<Vec<Option<String>>>,
    lookup: Vec<HashMap<String, Vec<usize>>>,
}

impl Annotation {
    /// Create an annotation with only internal ids.
    ///
    /// When an id repeats, lookups by id see its first occurrence.
    pub fn new(key_column: &str, ids: Vec<String>) -> Self {
        let mut index = HashMap::with_capacity(ids.len());
        for (i, id) in ids.iter().enumerate() {
            index.entry(id.clone()).or_insert(i);
        }
        Self {
            key_column: key_column.to_string(),
            ids,
            index,
            columns: Vec::new(),
            aliases: Vec::new(),
            lookup: Vec::new(),
        }
    }

    /// Add an alias column. Empty strings and `NA` mark an absent alias.
    pub fn with_alias<I, S>(mut self, column: &str, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if column == self.key_column || self.columns.iter().any(|c| c == column) {
            return Err(TidyError::DuplicateColumn(column.to_string()));
        }
        let values: Vec<Option<String>> = values
            .into_iter()
            .map(Into::into)
            .map(|s: String| {
                if s.is_empty() || s == "NA" {
                    None
                } else {
                    Some(s)
                }
            })
            .collect();
        if values.len() != self.ids.len() {
            return Err(TidyError::DimensionMismatch {
                expected: self.ids.len(),
                actual: values.len(),
            });
        }

        let mut lookup: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, alias) in values.iter().enumerate() {
            if let Some(a) = alias {
                lookup.entry(a.clone()).or_default().push(i);
            }
        }

        self.columns.push(column.to_string());
        self.aliases.push(values);
        self.lookup.push(lookup);
        Ok(self)
    }

    /// Build from a table: `key_column` holds internal ids, every other column is an alias.
    pub fn from_table(table: &Table, key_column: &str) -> Result<Self> {
        let key = table.require_column(key_column)?;
        let mut ids = Vec::with_capacity(table.n_rows());
        for (row_idx, row) in table.rows().iter().enumerate() {
            let id = row[key].key().ok_or_else(|| {
                TidyError::InvalidParameter(format!(
                    "Missing '{}' at annotation row {}",
                    key_column, row_idx
                ))
            })?;
            ids.push(id);
        }

        let mut annotation = Self::new(key_column, ids);
        for (col_idx, name) in table.columns().iter().enumerate() {
            if col_idx == key {
                continue;
            }
            let values: Vec<String> = table
                .rows()
                .iter()
                .map(|r| r[col_idx].key().unwrap_or_default())
                .collect();
            annotation = annotation.with_alias(name, values)?;
        }
        Ok(annotation)
    }

    /// Name of the internal id column.
    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    /// Internal identifiers in annotation order.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Alias column names.
    pub fn alias_columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// True for the key column or any alias column.
    pub fn has_column(&self, column: &str) -> bool {
        column == self.key_column || self.columns.iter().any(|c| c == column)
    }

    fn alias_index(&self, column: &str) -> Result<Option<usize>> {
        if column == self.key_column {
            return Ok(None);
        }
        self.columns
            .iter()
            .position(|c| c == column)
            .map(Some)
            .ok_or_else(|| TidyError::MissingColumn(column.to_string()))
    }

    /// Internal ids carrying `alias` in `column`, in annotation order.
    ///
    /// The key column resolves to the id itself when present.
    pub fn resolve(&self, column: &str, alias: &str) -> Result<Vec<&str>> {
        match self.alias_index(column)? {
            None => Ok(self
                .ids
                .iter()
                .filter(|id| id.as_str() == alias)
                .map(String::as_str)
                .collect()),
            Some(col) => Ok(self.lookup[col]
                .get(alias)
                .map(|idx| idx.iter().map(|&i| self.ids[i].as_str()).collect())
                .unwrap_or_default()),
        }
    }

    /// Label of internal id `id` under `column`.
    ///
    /// `None` when the id is not annotated or its alias is absent.
    pub fn label(&self, column: &str, id: &str) -> Result<Option<&str>> {
        let col = self.alias_index(column)?;
        let Some(&i) = self.index.get(id) else {
            return Ok(None);
        };
        Ok(match col {
            None => Some(self.ids[i].as_str()),
            Some(c) => self.aliases[c][i].as_deref(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Value;

    fn create_test_annotation() -> Annotation {
        Annotation::new(
            "gene_id",
            vec!["ENSG01".to_string(), "ENSG02".to_string(), "ENSG03".to_string()],
        )
        .with_alias("Symbol", ["BRAF", "EGFR", "CDKN2A"])
        .unwrap()
        .with_alias("gene_name", ["braf", "", "CDKN2A"])
        .unwrap()
    }

    #[test]
    fn test_resolve_alias() {
        let ann = create_test_annotation();
        assert_eq!(ann.resolve("Symbol", "EGFR").unwrap(), vec!["ENSG02"]);
        assert!(ann.resolve("Symbol", "TP53").unwrap().is_empty());
        assert!(ann.resolve("gene_name", "EGFR").unwrap().is_empty());
    }

    #[test]
    fn test_resolve_key_column() {
        let ann = create_test_annotation();
        assert_eq!(ann.resolve("gene_id", "ENSG03").unwrap(), vec!["ENSG03"]);
    }

    #[test]
    fn test_unknown_column() {
        let ann = create_test_annotation();
        assert!(matches!(
            ann.resolve("Entrez", "1"),
            Err(TidyError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_ambiguous_alias() {
        let ann = Annotation::new("id", vec!["p1".to_string(), "p2".to_string()])
            .with_alias("Symbol", ["TP53", "TP53"])
            .unwrap();
        assert_eq!(ann.resolve("Symbol", "TP53").unwrap(), vec!["p1", "p2"]);
    }

    #[test]
    fn test_labels_with_gaps() {
        let ann = create_test_annotation();
        assert_eq!(ann.label("gene_name", "ENSG01").unwrap(), Some("braf"));
        assert_eq!(ann.label("gene_name", "ENSG02").unwrap(), None);
        assert_eq!(ann.label("gene_id", "ENSG02").unwrap(), Some("ENSG02"));
        assert_eq!(ann.label("Symbol", "ENSG99").unwrap(), None);
    }

    #[test]
    fn test_alias_length_checked() {
        let result = Annotation::new("id", vec!["a".to_string()]).with_alias("Symbol", ["x", "y"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_table() {
        let table = Table::from_rows(
            ["gene_id", "Symbol"],
            vec![
                vec!["ENSG01".into(), "BRAF".into()],
                vec!["ENSG02".into(), Value::Missing],
            ],
        )
        .unwrap();
        let ann = Annotation::from_table(&table, "gene_id").unwrap();
        assert_eq!(ann.len(), 2);
        assert_eq!(ann.alias_columns(), &["Symbol"]);
        assert_eq!(ann.resolve("Symbol", "BRAF").unwrap(), vec!["ENSG01"]);
        assert_eq!(ann.label("Symbol", "ENSG02").unwrap(), None);
    }
}
