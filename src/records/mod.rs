//! Typed rows of the four input tables.
//!
//! Each record type is built from a [`RawTable`](crate::parser::RawTable) by
//! coercing whole columns and zipping them back into rows.

mod age;
mod categories;
mod daily;
mod location;
mod weekly;

pub use age::AgeMortalityRecord;
pub use categories::{AgeGroup, Category, MortalityType, Outcome, Sex, State};
pub use daily::DailyCaseRecord;
pub use location::{DEFAULT_LOCATIONS, LocationRecord};
pub use weekly::WeeklyMortalityRecord;
