use crate::error::SchemaError;
use crate::normalize::{coerce_categories, coerce_dates, coerce_signed_counts};
use crate::parser::RawTable;
use crate::records::State;
use chrono::NaiveDate;

/// New cases and deaths reported by one jurisdiction on one day.
///
/// Counts may be negative when a jurisdiction revises earlier totals.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyCaseRecord {
    pub state: State,
    pub submission_date: NaiveDate,
    pub new_case: f64,
    pub new_death: f64,
}

impl DailyCaseRecord {
    pub fn from_table(table: &RawTable) -> Result<Vec<Self>, SchemaError> {
        table.require(&["state", "submission_date", "new_case", "new_death"])?;

        let states = coerce_categories::<State>(table, "state")?;
        let dates = coerce_dates(table, "submission_date")?;
        let cases = coerce_signed_counts(table, "new_case")?;
        let deaths = coerce_signed_counts(table, "new_death")?;

        let records = (0..table.len())
            .map(|i| DailyCaseRecord {
                state: states[i],
                submission_date: dates[i],
                new_case: cases[i],
                new_death: deaths[i],
            })
            .collect();

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_table;

    #[test]
    fn test_from_table() {
        let csv = "submission_date,state,tot_cases,new_case,tot_death,new_death\n\
                   03/10/2021,NYC,800000,2500,30000,60\n\
                   03/10/2021,FL,1950000,-120,31000,0\n";
        let table = parse_table(csv.as_bytes()).unwrap();
        let records = DailyCaseRecord::from_table(&table).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].state, State::NewYorkCity);
        assert_eq!(records[0].submission_date, NaiveDate::from_ymd_opt(2021, 3, 10).unwrap());
        assert_eq!(records[1].state, State::Florida);
        assert_eq!(records[1].new_case, -120.0);
    }
}
