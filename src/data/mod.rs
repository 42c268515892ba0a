//! Data structures for tidy tables and their sources.

mod annotation;
mod matrix;
mod table;
mod tall;

pub use annotation::Annotation;
pub use matrix::AssayMatrix;
pub use table::{Table, Value};
pub use tall::{TableSummary, TallRow};
