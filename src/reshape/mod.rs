//! Pairing tall tables into genetic-vs-genetic and response-vs-genetic tables.

mod pair;

pub use pair::{drop_self_pairs, make_genetic_vs_genetic, make_response_vs_genetic, PairFilter};
