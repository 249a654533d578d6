//! Column coercions and row filtering.
//!
//! Each coercion reads one column of a [`RawTable`] and returns a new typed
//! vector in row order; the table itself is never modified.

use crate::error::SchemaError;
use crate::parser::RawTable;
use crate::records::Category;
use chrono::{NaiveDate, NaiveDateTime};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S", "%m/%d/%Y %I:%M:%S %p"];

/// Maps the string cells of `column` onto the closed enumeration `C`.
///
/// # Errors
///
/// Returns [`SchemaError::UnknownCategory`] on the first token outside the
/// enumeration, or [`SchemaError::MissingColumn`].
pub fn coerce_categories<C: Category>(table: &RawTable, column: &str) -> Result<Vec<C>, SchemaError> {
    table
        .column(column)?
        .into_iter()
        .enumerate()
        .map(|(row, raw)| {
            C::parse_token(raw).ok_or_else(|| SchemaError::UnknownCategory {
                column: column.to_string(),
                row,
                value: raw.to_string(),
            })
        })
        .collect()
}

/// Maps `column` to booleans: a cell is `true` iff it equals `true_token`
/// exactly (after the surrounding whitespace the parser already trimmed).
pub fn coerce_boolean(table: &RawTable, column: &str, true_token: &str) -> Result<Vec<bool>, SchemaError> {
    Ok(table
        .column(column)?
        .into_iter()
        .map(|raw| raw == true_token)
        .collect())
}

/// Reads a death or case count. Empty (suppressed) cells count as zero.
///
/// # Errors
///
/// Returns [`SchemaError::InvalidCount`] for non-numeric or negative cells.
pub fn coerce_counts(table: &RawTable, column: &str) -> Result<Vec<f64>, SchemaError> {
    table
        .column(column)?
        .into_iter()
        .enumerate()
        .map(|(row, raw)| {
            parse_count(raw).ok_or_else(|| SchemaError::InvalidCount {
                column: column.to_string(),
                row,
                value: raw.to_string(),
            })
        })
        .collect()
}

/// Reads day-over-day changes such as `new_case`, which go negative when a
/// jurisdiction revises earlier reports. Empty cells count as zero.
pub fn coerce_signed_counts(table: &RawTable, column: &str) -> Result<Vec<f64>, SchemaError> {
    table
        .column(column)?
        .into_iter()
        .enumerate()
        .map(|(row, raw)| {
            parse_signed(raw).ok_or_else(|| SchemaError::InvalidCount {
                column: column.to_string(),
                row,
                value: raw.to_string(),
            })
        })
        .collect()
}

/// Reads latitude or longitude values in decimal degrees.
pub fn coerce_coordinates(table: &RawTable, column: &str) -> Result<Vec<f64>, SchemaError> {
    table
        .column(column)?
        .into_iter()
        .enumerate()
        .map(|(row, raw)| {
            raw.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && v.abs() <= 180.0)
                .ok_or_else(|| SchemaError::InvalidCoordinate {
                    column: column.to_string(),
                    row,
                    value: raw.to_string(),
                })
        })
        .collect()
}

/// Reads calendar dates. Accepts ISO dates, Socrata floating timestamps and
/// US-style `MM/DD/YYYY`.
pub fn coerce_dates(table: &RawTable, column: &str) -> Result<Vec<NaiveDate>, SchemaError> {
    table
        .column(column)?
        .into_iter()
        .enumerate()
        .map(|(row, raw)| {
            parse_date(raw).ok_or_else(|| SchemaError::InvalidDate {
                column: column.to_string(),
                row,
                value: raw.to_string(),
            })
        })
        .collect()
}

/// Returns the rows satisfying `predicate`, in their original order.
pub fn filter_rows<R, F>(rows: &[R], predicate: F) -> Vec<R>
where
    R: Clone,
    F: Fn(&R) -> bool,
{
    rows.iter().filter(|r| predicate(r)).cloned().collect()
}

fn parse_count(raw: &str) -> Option<f64> {
    parse_signed(raw).filter(|v| *v >= 0.0)
}

fn parse_signed(raw: &str) -> Option<f64> {
    if raw.is_empty() {
        return Some(0.0);
    }
    let value: f64 = raw.replace(',', "").parse().ok()?;
    value.is_finite().then_some(value)
}

pub(crate) fn parse_date(raw: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
}
