//! Country → state → city grouping of spots for the sidebar.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::Spot;

/// Key used when a spot lacks one of its location components.
///
/// Callers normalize spots before grouping, so this only shows up for raw input.
pub const UNDEFINED_KEY: &str = "undefined";

pub type CityMap = BTreeMap<String, Vec<Spot>>;
pub type StateMap = BTreeMap<String, CityMap>;

/// Three-level ordered tree of spots.
///
/// `BTreeMap` keys iterate in ordinal (case-sensitive) order; leaf lists keep
/// the order in which spots were inserted.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(transparent)]
pub struct LocationHierarchy {
    countries: BTreeMap<String, StateMap>,
}

fn key(part: Option<&String>) -> String {
    part.cloned().unwrap_or_else(|| UNDEFINED_KEY.to_string())
}

/// Group spots by their location breakdown. The input slice is left untouched.
pub fn build_hierarchy(spots: &[Spot]) -> LocationHierarchy {
    let mut hierarchy = LocationHierarchy::default();

    for spot in spots {
        let location = spot.location_data.as_ref();
        let country = key(location.and_then(|l| l.country.as_ref()));
        let state = key(location.and_then(|l| l.state.as_ref()));
        let city = key(location.and_then(|l| l.city.as_ref()));

        hierarchy
            .countries
            .entry(country)
            .or_default()
            .entry(state)
            .or_default()
            .entry(city)
            .or_default()
            .push(spot.clone());
    }

    hierarchy
}

impl LocationHierarchy {
    pub fn countries(&self) -> impl Iterator<Item = (&String, &StateMap)> {
        self.countries.iter()
    }

    pub fn city(&self, country: &str, state: &str, city: &str) -> Option<&[Spot]> {
        self.countries
            .get(country)?
            .get(state)?
            .get(city)
            .map(Vec::as_slice)
    }

    /// Total number of spots across every leaf.
    pub fn spot_count(&self) -> usize {
        self.countries
            .values()
            .flat_map(|states| states.values())
            .flat_map(|cities| cities.values())
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }
}
