use crate::error::SchemaError;
use crate::normalize::{coerce_boolean, coerce_categories, coerce_counts, coerce_dates};
use crate::parser::{RawTable, column_key};
use crate::records::{Category, MortalityType, Outcome, State};
use chrono::NaiveDate;
use std::collections::HashSet;

/// One week of observed versus expected all-cause deaths for a jurisdiction.
///
/// The source carries one row per (state, week, type, outcome).
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyMortalityRecord {
    pub state: State,
    pub week_ending_date: NaiveDate,
    pub mortality_type: MortalityType,
    pub outcome: Outcome,
    pub observed_number: f64,
    pub average_expected_count: f64,
    pub upper_bound_threshold: f64,
    pub exceeds_threshold: bool,
    pub excess_lower_estimate: f64,
    pub excess_higher_estimate: f64,
}

impl WeeklyMortalityRecord {
    /// Builds records from the weekly excess-deaths export.
    ///
    /// Newer exports publish a single `Excess Estimate` column instead of the
    /// lower/higher pair; it then fills both bounds.
    pub fn from_table(table: &RawTable) -> Result<Vec<Self>, SchemaError> {
        let states = coerce_categories::<State>(table, "State")?;
        let weeks = coerce_dates(table, "Week Ending Date")?;
        let types = coerce_categories::<MortalityType>(table, "Type")?;
        let outcomes = coerce_categories::<Outcome>(table, "Outcome")?;
        let observed = coerce_counts(table, "Observed Number")?;
        let expected = coerce_counts(table, "Average Expected Count")?;
        let upper = coerce_counts(table, "Upper Bound Threshold")?;
        let exceeds = coerce_boolean(table, "Exceeds Threshold", "true")?;

        let has = |name: &str| table.headers().iter().any(|h| column_key(h) == column_key(name));
        let (lower, higher) = if has("Excess Lower Estimate") || !has("Excess Estimate") {
            (
                coerce_counts(table, "Excess Lower Estimate")?,
                coerce_counts(table, "Excess Higher Estimate")?,
            )
        } else {
            let single = coerce_counts(table, "Excess Estimate")?;
            (single.clone(), single)
        };

        let mut seen = HashSet::with_capacity(table.len());
        for i in 0..table.len() {
            if !seen.insert((states[i], weeks[i], types[i], outcomes[i])) {
                return Err(SchemaError::DuplicateRow {
                    row: i,
                    key: format!("{} / {} / {} / {}", states[i], weeks[i], types[i].label(), outcomes[i].label()),
                });
            }
        }

        let records = (0..table.len())
            .map(|i| WeeklyMortalityRecord {
                state: states[i],
                week_ending_date: weeks[i],
                mortality_type: types[i],
                outcome: outcomes[i],
                observed_number: observed[i],
                average_expected_count: expected[i],
                upper_bound_threshold: upper[i],
                exceeds_threshold: exceeds[i],
                excess_lower_estimate: lower[i],
                excess_higher_estimate: higher[i],
            })
            .collect();

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_table;

    const HEADER: &str = "Week Ending Date,State,Observed Number,Upper Bound Threshold,Exceeds Threshold,Average Expected Count,Excess Lower Estimate,Excess Higher Estimate,Year,Type,Outcome,Suppress,Note";

    #[test]
    fn test_from_table() {
        let csv = format!(
            "{HEADER}\n2020-04-11,New Jersey,4500,1700,true,1550,2400,2950,2020,Predicted (weighted),All causes,,\n2020-04-11,Alaska,,90,false,80,0,0,2020,Unweighted,\"All causes, excluding COVID-19\",Suppressed (counts highly incomplete),\n"
        );
        let table = parse_table(csv.as_bytes()).unwrap();
        let records = WeeklyMortalityRecord::from_table(&table).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].state, State::NewJersey);
        assert_eq!(records[0].mortality_type, MortalityType::PredictedWeighted);
        assert_eq!(records[0].outcome, Outcome::AllCauses);
        assert_eq!(records[0].observed_number, 4500.0);
        assert!(records[0].exceeds_threshold);
        assert_eq!(records[0].excess_higher_estimate, 2950.0);

        assert_eq!(records[1].observed_number, 0.0);
        assert_eq!(records[1].outcome, Outcome::AllCausesExcludingCovid);
        assert!(!records[1].exceeds_threshold);
    }

    #[test]
    fn test_single_excess_estimate_column() {
        let csv = "week_ending_date,state,observed_number,upper_bound_threshold,exceeds_threshold,average_expected_count,excess_estimate,type,outcome\n2021-01-09,TX,6800,5300,true,4900,1900,Predicted (weighted),All causes\n";
        let table = parse_table(csv.as_bytes()).unwrap();
        let records = WeeklyMortalityRecord::from_table(&table).unwrap();

        assert_eq!(records[0].state, State::Texas);
        assert_eq!(records[0].excess_lower_estimate, 1900.0);
        assert_eq!(records[0].excess_higher_estimate, 1900.0);
    }

    #[test]
    fn test_duplicate_row_rejected() {
        let row = "2020-04-04,Ohio,100,120,false,90,0,10,2020,Predicted (weighted),All causes,,";
        let csv = format!("{HEADER}\n{row}\n{row}\n");
        let table = parse_table(csv.as_bytes()).unwrap();

        assert!(matches!(
            WeeklyMortalityRecord::from_table(&table),
            Err(SchemaError::DuplicateRow { row: 1, .. })
        ));
    }

    #[test]
    fn test_same_week_other_outcome_is_distinct() {
        let csv = format!(
            "{HEADER}\n2020-04-04,Ohio,100,120,false,90,0,10,2020,Predicted (weighted),All causes,,\n2020-04-04,Ohio,95,120,false,90,0,5,2020,Predicted (weighted),\"All causes, excluding COVID-19\",,\n"
        );
        let table = parse_table(csv.as_bytes()).unwrap();
        assert_eq!(WeeklyMortalityRecord::from_table(&table).unwrap().len(), 2);
    }

    #[test]
    fn test_missing_column_is_schema_error() {
        let table = parse_table(b"State,Type\nAlabama,Unweighted\n").unwrap();
        assert!(matches!(
            WeeklyMortalityRecord::from_table(&table),
            Err(SchemaError::MissingColumn { .. })
        ));
    }
}
