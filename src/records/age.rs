use crate::error::SchemaError;
use crate::normalize::{coerce_categories, coerce_counts, coerce_dates};
use crate::parser::RawTable;
use crate::records::{AgeGroup, Category, Sex};
use chrono::NaiveDate;

/// Weekly COVID-19 deaths for one age band and sex.
#[derive(Debug, Clone, PartialEq)]
pub struct AgeMortalityRecord {
    pub end_week: NaiveDate,
    pub age_group: AgeGroup,
    pub sex: Sex,
    pub covid_19_deaths: f64,
}

impl AgeMortalityRecord {
    /// Builds records from the deaths-by-week-sex-and-age export, dropping the
    /// `All Ages` and `All Sexes` roll-up rows.
    pub fn from_table(table: &RawTable) -> Result<Vec<Self>, SchemaError> {
        table.require(&["End Week", "Age Group", "Sex", "COVID-19 Deaths"])?;

        let weeks = coerce_dates(table, "End Week")?;
        let groups = coerce_categories::<AgeGroup>(table, "Age Group")?;
        let sexes = coerce_categories::<Sex>(table, "Sex")?;
        let deaths = coerce_counts(table, "COVID-19 Deaths")?;

        let records = (0..table.len())
            .filter(|&i| !groups[i].is_aggregate() && !sexes[i].is_aggregate())
            .map(|i| AgeMortalityRecord {
                end_week: weeks[i],
                age_group: groups[i],
                sex: sexes[i],
                covid_19_deaths: deaths[i],
            })
            .collect();

        Ok(records)
    }
}
