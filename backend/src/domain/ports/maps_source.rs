//! Port for geocoding and directions providers.
use async_trait::async_trait;

use crate::domain::{DirectionsPlan, DirectionsRequest, GeocodeResult};

use super::define_port_error;

define_port_error! {
    /// Errors raised by maps provider adapters.
    pub enum MapsSourceError {
        /// The provider could not be reached.
        Transport { message: String } => "maps provider request failed: {message}",
        /// The provider answered with an unexpected HTTP status.
        Status { status: u16 } => "maps provider returned HTTP {status}",
        /// The provider quota is exhausted.
        Quota => "maps provider quota exceeded",
        /// The provider refused the credentials.
        Denied { message: String } => "maps provider denied the request: {message}",
        /// The provider rejected the request parameters.
        InvalidRequest { message: String } => "maps provider rejected the request: {message}",
        /// Nothing matched the query.
        NoResults => "no results for the requested location",
        /// The response body could not be decoded.
        Decode { message: String } => "maps provider response could not be decoded: {message}",
        /// No provider is configured.
        NotConfigured => "maps provider is not configured",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MapsSource: Send + Sync {
    /// Resolve a free-text address to its best match.
    async fn geocode(&self, address: &str) -> Result<GeocodeResult, MapsSourceError>;

    /// Compute a driving plan visiting the stops in order.
    async fn directions(
        &self,
        request: &DirectionsRequest,
    ) -> Result<DirectionsPlan, MapsSourceError>;
}

/// Maps source used when no provider key is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledMapsSource;

#[async_trait]
impl MapsSource for DisabledMapsSource {
    async fn geocode(&self, _address: &str) -> Result<GeocodeResult, MapsSourceError> {
        Err(MapsSourceError::not_configured())
    }

    async fn directions(
        &self,
        _request: &DirectionsRequest,
    ) -> Result<DirectionsPlan, MapsSourceError> {
        Err(MapsSourceError::not_configured())
    }
}
