//! Tidy Assay Tables
//!
//! This library flattens multi-omic assay matrices into tidy tables and pairs
//! them by sample for association analysis.
//!
//! # Overview
//!
//! The library is organized into composable modules:
//!
//! - **data**: Core data structures (Table, AssayMatrix, Annotation)
//! - **schema**: Canonical table formats and their detection
//! - **source**: Extraction from single experiments and multi-assay sources
//! - **harmonize**: Sample identifier conversion
//! - **reshape**: Genetic-vs-genetic and response-vs-genetic pairing
//! - **pipeline**: Pipeline composition and execution
//!
//! # Example
//!
//! ```no_run
//! use tidy_assay::prelude::*;
//!
//! # fn load() -> MultiAssaySource { MultiAssaySource::new() }
//! let source = load();
//!
//! let request = GatherRequest::new()
//!     .features(Selector::only(["BRAF", "EGFR"]))
//!     .data_types(Selector::only(["rna"]), vec!["Symbol".to_string()]);
//!
//! let pairs = Pipeline::new()
//!     .convert_ids_of_type("ccle", "id", "cell_line", &[])
//!     .pair_genetic(PairFilter::all(), PairFilter::all())
//!     .drop_self_pairs()
//!     .run(&source, &request)
//!     .unwrap();
//! ```

pub mod data;
pub mod error;
pub mod harmonize;
pub mod pipeline;
pub mod reshape;
pub mod schema;
pub mod source;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::data::{Annotation, AssayMatrix, TableSummary, Table, TallRow, Value};
    pub use crate::error::{Result, TidyError};
    pub use crate::harmonize::{cell_line_ids, convert_ids, filter_id_type};
    pub use crate::pipeline::{Pipeline, PipelineConfig, PipelineStep};
    pub use crate::reshape::{
        drop_self_pairs, make_genetic_vs_genetic, make_response_vs_genetic, PairFilter,
    };
    pub use crate::schema::{check_df_format, detect_format, get_df_format, FormatMatch, TableKind};
    pub use crate::source::{
        gather, gather_assay, gather_combined, gather_response, AssayQuery, Experiment,
        GatherRequest, MultiAssaySource, Selector, Source, TallSource, UnresolvedPolicy,
    };
}
