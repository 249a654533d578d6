use crate::error::SchemaError;
use crate::normalize::{coerce_categories, coerce_coordinates};
use crate::parser::RawTable;
use crate::records::State;

/// Built-in state centroid table, used when no override path is configured.
pub const DEFAULT_LOCATIONS: &str = include_str!("../../data/state_locations.csv");

/// Map position used to place a jurisdiction's bubble.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationRecord {
    pub state: State,
    pub latitude: f64,
    pub longitude: f64,
}

impl LocationRecord {
    pub fn from_table(table: &RawTable) -> Result<Vec<Self>, SchemaError> {
        table.require(&["State", "Latitude", "Longitude"])?;

        let states = coerce_categories::<State>(table, "State")?;
        let lats = coerce_coordinates(table, "Latitude")?;
        let lons = coerce_coordinates(table, "Longitude")?;

        Ok((0..table.len())
            .map(|i| LocationRecord {
                state: states[i],
                latitude: lats[i],
                longitude: lons[i],
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_table;

    #[test]
    fn test_default_table_covers_every_state() {
        let table = parse_table(DEFAULT_LOCATIONS.as_bytes()).unwrap();
        let locations = LocationRecord::from_table(&table).unwrap();

        for state in [State::Alabama, State::Wyoming, State::DistrictOfColumbia, State::NewYorkCity, State::PuertoRico] {
            assert!(locations.iter().any(|l| l.state == state), "{state} missing");
        }
        assert!(locations.iter().all(|l| l.latitude > 15.0 && l.latitude < 72.0));
        assert!(locations.iter().all(|l| l.longitude < -64.0));
    }
}
