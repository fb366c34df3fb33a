//! Denormalized location breakdown attached to every spot.

use serde::{Deserialize, Serialize};

pub const UNKNOWN_COUNTRY: &str = "Unknown Country";
pub const UNKNOWN_STATE: &str = "Unknown State/Province";
pub const UNKNOWN_CITY: &str = "Unknown City";

/// Country, state and city of a spot's start point.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct LocationData {
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}

impl LocationData {
    pub fn new(
        country: impl Into<String>,
        state: impl Into<String>,
        city: impl Into<String>,
    ) -> Self {
        Self {
            country: Some(country.into()),
            state: Some(state.into()),
            city: Some(city.into()),
        }
    }

    /// The placeholder triple used whenever geocoding fails.
    pub fn unknown() -> Self {
        Self::new(UNKNOWN_COUNTRY, UNKNOWN_STATE, UNKNOWN_CITY)
    }

    /// True when country, state and city are all present and non-empty.
    pub fn is_complete(&self) -> bool {
        [&self.country, &self.state, &self.city]
            .iter()
            .all(|part| part.as_deref().is_some_and(|s| !s.trim().is_empty()))
    }

    /// Fill absent or blank components from `other`, keeping what is already set.
    pub fn fill_missing(&mut self, other: LocationData) {
        fn fill(slot: &mut Option<String>, value: Option<String>) {
            if slot.as_deref().map_or(true, |s| s.trim().is_empty()) {
                *slot = value;
            }
        }
        fill(&mut self.country, other.country);
        fill(&mut self.state, other.state);
        fill(&mut self.city, other.city);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_missing_keeps_existing_parts() {
        let mut partial = LocationData {
            country: Some("Canada".to_string()),
            state: Some(" ".to_string()),
            city: None,
        };
        assert!(!partial.is_complete());

        partial.fill_missing(LocationData::unknown());
        assert_eq!(
            partial,
            LocationData::new("Canada", UNKNOWN_STATE, UNKNOWN_CITY)
        );
        assert!(partial.is_complete());
    }
}
