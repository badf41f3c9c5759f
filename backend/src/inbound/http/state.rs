//! Shared HTTP adapter state.
//!
//! Handlers receive this through `web::Data` so they depend on driving ports
//! only and stay testable with mocks.

use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::domain::DEFAULT_MAX_UPLOAD_BYTES;
use crate::domain::ports::{
    AccountService, BookingService, MapsService, PaymentService, RatingService, RouteService,
    UploadService, VehicleService,
};

/// Parameter object bundling the driving ports.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub accounts: Arc<dyn AccountService>,
    pub vehicles: Arc<dyn VehicleService>,
    pub routes: Arc<dyn RouteService>,
    pub bookings: Arc<dyn BookingService>,
    pub payments: Arc<dyn PaymentService>,
    pub ratings: Arc<dyn RatingService>,
    pub uploads: Arc<dyn UploadService>,
    pub maps: Arc<dyn MapsService>,
}

/// Shared secret the gateway presents on the Google bridge endpoint.
///
/// Only the SHA-256 digest is kept; comparison happens on digests so the
/// check does not short-circuit on the first differing byte of the secret.
#[derive(Clone)]
pub struct GatewaySecret([u8; 32]);

impl GatewaySecret {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self(Sha256::digest(secret.as_ref()).into())
    }

    /// True when `presented` equals the configured secret.
    pub fn matches(&self, presented: impl AsRef<[u8]>) -> bool {
        let digest: [u8; 32] = Sha256::digest(presented.as_ref()).into();
        digest
            .iter()
            .zip(self.0.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub accounts: Arc<dyn AccountService>,
    pub vehicles: Arc<dyn VehicleService>,
    pub routes: Arc<dyn RouteService>,
    pub bookings: Arc<dyn BookingService>,
    pub payments: Arc<dyn PaymentService>,
    pub ratings: Arc<dyn RatingService>,
    pub uploads: Arc<dyn UploadService>,
    pub maps: Arc<dyn MapsService>,
    /// `None` disables `POST /auth/google`.
    pub gateway_secret: Option<GatewaySecret>,
    /// Multipart bodies larger than this are rejected while streaming.
    pub max_upload_bytes: u64,
}

impl HttpState {
    /// Construct state from the ports bundle with the bridge disabled.
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            accounts,
            vehicles,
            routes,
            bookings,
            payments,
            ratings,
            uploads,
            maps,
        } = ports;
        Self {
            accounts,
            vehicles,
            routes,
            bookings,
            payments,
            ratings,
            uploads,
            maps,
            gateway_secret: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    /// Enable the Google bridge endpoint.
    #[must_use]
    pub fn with_gateway_secret(mut self, secret: GatewaySecret) -> Self {
        self.gateway_secret = Some(secret);
        self
    }

    #[must_use]
    pub fn with_max_upload_bytes(mut self, max_upload_bytes: u64) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }
}
