//! Fixed catalogue of city places used as route endpoints.

use crate::seed::ExamplePlaceSeed;

/// Address, latitude and longitude for each seeded place.
pub const PLACES: &[(&str, f64, f64)] = &[
    ("1 Market St, San Francisco, CA", 37.7946, -122.3950),
    ("Union Square, San Francisco, CA", 37.7880, -122.4075),
    ("Stanford University, Stanford, CA", 37.4275, -122.1697),
    ("1 Hacker Way, Menlo Park, CA", 37.4848, -122.1484),
    ("Downtown Oakland, Oakland, CA", 37.8044, -122.2712),
    ("San Jose Diridon Station, San Jose, CA", 37.3297, -121.9023),
    ("Berkeley BART, Berkeley, CA", 37.8701, -122.2681),
    ("Mountain View Caltrain, Mountain View, CA", 37.3945, -122.0760),
    ("SFO International Terminal, San Francisco, CA", 37.6156, -122.3900),
    ("Fremont BART, Fremont, CA", 37.5574, -121.9766),
    ("Palo Alto Caltrain, Palo Alto, CA", 37.4433, -122.1650),
    ("Walnut Creek BART, Walnut Creek, CA", 37.9055, -122.0675),
];

/// Returns [`PLACES`] as seed records.
#[must_use]
pub fn place_catalogue() -> Vec<ExamplePlaceSeed> {
    PLACES
        .iter()
        .map(|&(address, lat, lng)| ExamplePlaceSeed {
            address: address.to_owned(),
            lat,
            lng,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn catalogue_addresses_are_unique() {
        let addresses: HashSet<_> = PLACES.iter().map(|(a, _, _)| *a).collect();
        assert_eq!(addresses.len(), PLACES.len());
    }

    #[test]
    fn catalogue_coordinates_are_in_range() {
        for place in place_catalogue() {
            assert!((-90.0..=90.0).contains(&place.lat), "{place:?}");
            assert!((-180.0..=180.0).contains(&place.lng), "{place:?}");
        }
    }
}
