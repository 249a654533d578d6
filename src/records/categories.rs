//! Closed enumerations for the categorical columns of the CDC datasets.
//!
//! Tokens are matched on their [`column_key`] form, so spelling variations in
//! case, spacing and punctuation between exports resolve to the same variant.

use crate::parser::column_key;
use serde::{Serialize, Serializer};
use std::fmt;

/// A categorical column value with a fixed set of variants.
pub trait Category: Sized + Copy + Eq + Ord {
    /// Parses a raw cell, returning `None` for tokens outside the enumeration.
    fn parse_token(raw: &str) -> Option<Self>;

    /// Display label used in charts and output files.
    fn label(&self) -> &'static str;

    /// Whether this value stands for a roll-up of other rows.
    fn is_aggregate(&self) -> bool {
        false
    }
}

macro_rules! states {
    ($(($variant:ident, $name:literal, $abbr:literal)),* $(,)?) => {
        /// A reporting jurisdiction.
        ///
        /// Besides the 50 states and DC this covers New York City (reported
        /// separately from the rest of New York State), the territories, and the
        /// national `United States` roll-up.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum State {
            $($variant),*
        }

        impl State {
            pub const ALL: &'static [State] = &[$(State::$variant),*];

            pub fn name(&self) -> &'static str {
                match self {
                    $(State::$variant => $name),*
                }
            }

            pub fn abbr(&self) -> &'static str {
                match self {
                    $(State::$variant => $abbr),*
                }
            }
        }
    };
}

states! {
    (Alabama, "Alabama", "AL"),
    (Alaska, "Alaska", "AK"),
    (Arizona, "Arizona", "AZ"),
    (Arkansas, "Arkansas", "AR"),
    (California, "California", "CA"),
    (Colorado, "Colorado", "CO"),
    (Connecticut, "Connecticut", "CT"),
    (Delaware, "Delaware", "DE"),
    (DistrictOfColumbia, "District of Columbia", "DC"),
    (Florida, "Florida", "FL"),
    (Georgia, "Georgia", "GA"),
    (Hawaii, "Hawaii", "HI"),
    (Idaho, "Idaho", "ID"),
    (Illinois, "Illinois", "IL"),
    (Indiana, "Indiana", "IN"),
    (Iowa, "Iowa", "IA"),
    (Kansas, "Kansas", "KS"),
    (Kentucky, "Kentucky", "KY"),
    (Louisiana, "Louisiana", "LA"),
    (Maine, "Maine", "ME"),
    (Maryland, "Maryland", "MD"),
    (Massachusetts, "Massachusetts", "MA"),
    (Michigan, "Michigan", "MI"),
    (Minnesota, "Minnesota", "MN"),
    (Mississippi, "Mississippi", "MS"),
    (Missouri, "Missouri", "MO"),
    (Montana, "Montana", "MT"),
    (Nebraska, "Nebraska", "NE"),
    (Nevada, "Nevada", "NV"),
    (NewHampshire, "New Hampshire", "NH"),
    (NewJersey, "New Jersey", "NJ"),
    (NewMexico, "New Mexico", "NM"),
    (NewYork, "New York", "NY"),
    (NewYorkCity, "New York City", "NYC"),
    (NorthCarolina, "North Carolina", "NC"),
    (NorthDakota, "North Dakota", "ND"),
    (Ohio, "Ohio", "OH"),
    (Oklahoma, "Oklahoma", "OK"),
    (Oregon, "Oregon", "OR"),
    (Pennsylvania, "Pennsylvania", "PA"),
    (RhodeIsland, "Rhode Island", "RI"),
    (SouthCarolina, "South Carolina", "SC"),
    (SouthDakota, "South Dakota", "SD"),
    (Tennessee, "Tennessee", "TN"),
    (Texas, "Texas", "TX"),
    (Utah, "Utah", "UT"),
    (Vermont, "Vermont", "VT"),
    (Virginia, "Virginia", "VA"),
    (Washington, "Washington", "WA"),
    (WestVirginia, "West Virginia", "WV"),
    (Wisconsin, "Wisconsin", "WI"),
    (Wyoming, "Wyoming", "WY"),
    (PuertoRico, "Puerto Rico", "PR"),
    (AmericanSamoa, "American Samoa", "AS"),
    (Guam, "Guam", "GU"),
    (NorthernMarianaIslands, "Northern Mariana Islands", "MP"),
    (VirginIslands, "U.S. Virgin Islands", "VI"),
    (Micronesia, "Federated States of Micronesia", "FSM"),
    (MarshallIslands, "Republic of Marshall Islands", "RMI"),
    (Palau, "Palau", "PW"),
    (UnitedStates, "United States", "US"),
}

macro_rules! serialize_by_label {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Serialize for $ty {
                fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    serializer.serialize_str(self.label())
                }
            }
        )*
    };
}

serialize_by_label!(State, MortalityType, Outcome, AgeGroup, Sex);

impl Category for State {
    fn parse_token(raw: &str) -> Option<Self> {
        let key = column_key(raw);
        if key.is_empty() {
            return None;
        }
        State::ALL
            .iter()
            .copied()
            .find(|s| column_key(s.name()) == key || column_key(s.abbr()) == key)
    }

    fn label(&self) -> &'static str {
        self.name()
    }

    fn is_aggregate(&self) -> bool {
        *self == State::UnitedStates
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which baseline model produced the expected counts of a weekly row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MortalityType {
    PredictedWeighted,
    Unweighted,
}

impl Category for MortalityType {
    fn parse_token(raw: &str) -> Option<Self> {
        match column_key(raw).as_str() {
            "predictedweighted" | "predicted" => Some(MortalityType::PredictedWeighted),
            "unweighted" => Some(MortalityType::Unweighted),
            _ => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            MortalityType::PredictedWeighted => "Predicted (weighted)",
            MortalityType::Unweighted => "Unweighted",
        }
    }
}

/// Cause-of-death category of a weekly row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Outcome {
    AllCauses,
    AllCausesExcludingCovid,
}

impl Category for Outcome {
    fn parse_token(raw: &str) -> Option<Self> {
        match column_key(raw).as_str() {
            "allcauses" => Some(Outcome::AllCauses),
            "allcausesexcludingcovid19" | "allcausesexcludingcovid" => {
                Some(Outcome::AllCausesExcludingCovid)
            }
            _ => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Outcome::AllCauses => "All causes",
            Outcome::AllCausesExcludingCovid => "All causes, excluding COVID-19",
        }
    }
}

/// Age band of the deaths-by-age dataset, ordered youngest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AgeGroup {
    Under1,
    From1To4,
    From5To14,
    From15To24,
    From25To34,
    From35To44,
    From45To54,
    From55To64,
    From65To74,
    From75To84,
    Over85,
    AllAges,
}

impl Category for AgeGroup {
    fn parse_token(raw: &str) -> Option<Self> {
        let group = match column_key(raw).as_str() {
            "under1year" | "under1years" => AgeGroup::Under1,
            "14years" => AgeGroup::From1To4,
            "514years" => AgeGroup::From5To14,
            "1524years" => AgeGroup::From15To24,
            "2534years" => AgeGroup::From25To34,
            "3544years" => AgeGroup::From35To44,
            "4554years" => AgeGroup::From45To54,
            "5564years" => AgeGroup::From55To64,
            "6574years" => AgeGroup::From65To74,
            "7584years" => AgeGroup::From75To84,
            "85yearsandover" | "85years" => AgeGroup::Over85,
            "allages" => AgeGroup::AllAges,
            _ => return None,
        };
        Some(group)
    }

    fn label(&self) -> &'static str {
        match self {
            AgeGroup::Under1 => "Under 1 year",
            AgeGroup::From1To4 => "1-4 years",
            AgeGroup::From5To14 => "5-14 years",
            AgeGroup::From15To24 => "15-24 years",
            AgeGroup::From25To34 => "25-34 years",
            AgeGroup::From35To44 => "35-44 years",
            AgeGroup::From45To54 => "45-54 years",
            AgeGroup::From55To64 => "55-64 years",
            AgeGroup::From65To74 => "65-74 years",
            AgeGroup::From75To84 => "75-84 years",
            AgeGroup::Over85 => "85 years and over",
            AgeGroup::AllAges => "All Ages",
        }
    }

    fn is_aggregate(&self) -> bool {
        *self == AgeGroup::AllAges
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Sex {
    Female,
    Male,
    Unknown,
    AllSexes,
}

impl Category for Sex {
    fn parse_token(raw: &str) -> Option<Self> {
        match column_key(raw).as_str() {
            "female" => Some(Sex::Female),
            "male" => Some(Sex::Male),
            "unknown" => Some(Sex::Unknown),
            "allsexes" | "allsex" => Some(Sex::AllSexes),
            _ => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Sex::Female => "Female",
            Sex::Male => "Male",
            Sex::Unknown => "Unknown",
            Sex::AllSexes => "All Sexes",
        }
    }

    fn is_aggregate(&self) -> bool {
        *self == Sex::AllSexes
    }
}
