//! Analysis modules.
//!
//! The per-request pipeline that turns raw tables into a summary:
//! normalization, keyword filtering and aggregation.

pub mod aggregator;
pub mod filter;
pub mod normalizer;

pub use aggregator::*;
pub use filter::filter_by_keyword;
pub use normalizer::normalize_table;
