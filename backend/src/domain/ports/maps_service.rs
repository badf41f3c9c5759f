//! Driving port for geocoding and directions.

use async_trait::async_trait;

use crate::domain::{DirectionsPlan, DirectionsRequest, Error, GeocodeResult};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MapsService: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<GeocodeResult, Error>;

    async fn directions(&self, request: &DirectionsRequest) -> Result<DirectionsPlan, Error>;
}
