//! Grouping and series arithmetic.
//!
//! Everything here works on plain slices so the analysis layer can feed it
//! any column of any record type.

pub mod excess;
pub mod group;
pub mod series;

pub use excess::{count_exceeding, exceeds, normalized_excess};
pub use group::{GroupIndex, ReduceOp, group_key, reduce, split, sum_by_key};
pub use series::{cumulative_sum, lag_ratio, moving_sum, percent};
