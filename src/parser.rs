//! CSV parser for downloaded datasets.
//!
//! The result is deliberately loose: every cell stays a string until the
//! normalizer coerces the columns an analysis actually needs.

use crate::error::{FetchError, SchemaError};
use csv::{ReaderBuilder, Trim};

/// A header row plus string cells, as delivered by the data portal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    headers: Vec<String>,
    keys: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let keys = headers.iter().map(|h| column_key(h)).collect();
        Self {
            headers,
            keys,
            rows,
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the cells of column `name`, in row order.
    ///
    /// Lookup ignores case and every non-alphanumeric character, so
    /// `Observed Number`, `observed_number` and `ObservedNumber` all resolve
    /// to the same column.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::MissingColumn`] if no header matches.
    pub fn column(&self, name: &str) -> Result<Vec<&str>, SchemaError> {
        let key = column_key(name);
        let idx = self
            .keys
            .iter()
            .position(|k| *k == key)
            .ok_or_else(|| SchemaError::MissingColumn {
                column: name.to_string(),
            })?;

        Ok(self
            .rows
            .iter()
            .map(|row| row.get(idx).map(String::as_str).unwrap_or(""))
            .collect())
    }

    /// Checks that every column in `names` is present.
    pub fn require(&self, names: &[&str]) -> Result<(), SchemaError> {
        for name in names {
            let key = column_key(name);
            if !self.keys.contains(&key) {
                return Err(SchemaError::MissingColumn {
                    column: name.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Canonical form of a column header used for lookups.
pub fn column_key(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Parses CSV bytes (with a header row) into a [`RawTable`].
///
/// # Errors
///
/// Returns [`FetchError::Malformed`] if the bytes are not valid CSV, including
/// rows whose field count differs from the header.
pub fn parse_table(bytes: &[u8]) -> Result<RawTable, FetchError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(bytes);

    let headers = rdr.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(RawTable::new(headers, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_bytes_returns_empty_table() {
        let table = parse_table(&[]).unwrap();
        assert!(table.is_empty());
        assert!(table.headers().is_empty());
    }

    #[test]
    fn test_parse_minimal_table() {
        let csv = b"State,Observed Number\nAlabama,1020\nAlaska, 98 \n";
        let table = parse_table(csv).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.headers(), ["State", "Observed Number"]);
        assert_eq!(table.column("observed_number").unwrap(), vec!["1020", "98"]);
    }

    #[test]
    fn test_parse_ragged_row_fails() {
        let csv = b"a,b\n1,2\n3\n";
        assert!(matches!(parse_table(csv), Err(FetchError::Malformed(_))));
    }

    #[test]
    fn test_missing_column() {
        let table = parse_table(b"state,new_case\nNY,5\n").unwrap();
        let err = table.column("new_death").unwrap_err();
        assert_eq!(
            err,
            SchemaError::MissingColumn {
                column: "new_death".to_string()
            }
        );
        assert!(table.require(&["state", "new_case"]).is_ok());
        assert!(table.require(&["state", "submission_date"]).is_err());
    }

    #[test]
    fn test_column_key_ignores_case_and_punctuation() {
        assert_eq!(column_key("Observed Number"), "observednumber");
        assert_eq!(column_key("observed_number"), "observednumber");
        assert_eq!(column_key("COVID-19 Deaths"), "covid19deaths");
        assert_eq!(column_key("\u{feff}Week Ending Date"), "weekendingdate");
    }
}
