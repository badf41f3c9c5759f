//! Maps service implementing the [`MapsService`] driving port.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::ports::{MapsService, MapsSource};
use crate::domain::service_support::{invalid_field, map_maps_source_error};
use crate::domain::{ADDRESS_MAX, DirectionsPlan, DirectionsRequest, Error, GeocodeResult};

/// Thin validation layer over a [`MapsSource`].
#[derive(Clone)]
pub struct MapsServiceImpl {
    source: Arc<dyn MapsSource>,
}

impl MapsServiceImpl {
    pub fn new(source: Arc<dyn MapsSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl MapsService for MapsServiceImpl {
    async fn geocode(&self, address: &str) -> Result<GeocodeResult, Error> {
        let address = address.trim();
        if address.is_empty() {
            return Err(invalid_field("address", "empty", "address must not be empty"));
        }
        if address.chars().count() > ADDRESS_MAX {
            return Err(invalid_field(
                "address",
                "too_long",
                format!("address must be at most {ADDRESS_MAX} characters"),
            ));
        }
        debug!(address, "geocoding address");
        self.source
            .geocode(address)
            .await
            .map_err(map_maps_source_error)
    }

    async fn directions(&self, request: &DirectionsRequest) -> Result<DirectionsPlan, Error> {
        self.source
            .directions(request)
            .await
            .map_err(map_maps_source_error)
    }
}
