//! Google Maps outbound adapter.
//!
//! Implements the `MapsSource` port over the Geocoding and Directions web
//! services.

mod dto;
mod google_source;

pub use google_source::GoogleMapsSource;
