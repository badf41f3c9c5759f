//! Adapter selection and service wiring for the HTTP state.
//!
//! With a database URL every repository is Diesel-backed and blobs go to the
//! upload directory. Without one, the whole process runs on a single
//! [`InMemoryStore`].

use std::sync::Arc;

use mockable::{Clock, DefaultClock};
use tracing::{info, warn};
use url::Url;

use backend::domain::ports::{
    BookingRepository, DisabledMapsSource, FileRepository, FileStore, MapsSource,
    PaymentRepository, ProfileRepository, RatingRepository, RouteRepository, UserRepository,
    VehicleRepository,
};
use backend::domain::{
    AccountServiceImpl, BookingServiceImpl, MapsServiceImpl, PaymentServiceImpl,
    RatingServiceImpl, RouteServiceImpl, UploadPolicy, UploadPorts, UploadServiceImpl,
    VehicleServiceImpl,
};
use backend::inbound::http::state::{GatewaySecret, HttpState, HttpStatePorts};
use backend::outbound::maps::GoogleMapsSource;
use backend::outbound::memory::InMemoryStore;
use backend::outbound::persistence::{
    DbPool, DieselBookingRepository, DieselFileRepository, DieselPaymentRepository,
    DieselProfileRepository, DieselRatingRepository, DieselRouteRepository,
    DieselUserRepository, DieselVehicleRepository,
};
use backend::outbound::storage::LocalFileStore;
use backend::settings::BackendSettings;

/// Driven adapters shared by the services.
#[derive(Clone)]
pub(crate) struct Adapters {
    pub(crate) users: Arc<dyn UserRepository>,
    pub(crate) profiles: Arc<dyn ProfileRepository>,
    pub(crate) vehicles: Arc<dyn VehicleRepository>,
    pub(crate) routes: Arc<dyn RouteRepository>,
    pub(crate) bookings: Arc<dyn BookingRepository>,
    pub(crate) payments: Arc<dyn PaymentRepository>,
    pub(crate) ratings: Arc<dyn RatingRepository>,
    pub(crate) files: Arc<dyn FileRepository>,
    pub(crate) store: Arc<dyn FileStore>,
    pub(crate) maps: Arc<dyn MapsSource>,
}

impl Adapters {
    pub(crate) fn in_memory(maps: Arc<dyn MapsSource>) -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self {
            users: store.clone(),
            profiles: store.clone(),
            vehicles: store.clone(),
            routes: store.clone(),
            bookings: store.clone(),
            payments: store.clone(),
            ratings: store.clone(),
            files: store.clone(),
            store,
            maps,
        }
    }

    pub(crate) fn postgres(
        pool: &DbPool,
        store: LocalFileStore,
        maps: Arc<dyn MapsSource>,
    ) -> Self {
        Self {
            users: Arc::new(DieselUserRepository::new(pool.clone())),
            profiles: Arc::new(DieselProfileRepository::new(pool.clone())),
            vehicles: Arc::new(DieselVehicleRepository::new(pool.clone())),
            routes: Arc::new(DieselRouteRepository::new(pool.clone())),
            bookings: Arc::new(DieselBookingRepository::new(pool.clone())),
            payments: Arc::new(DieselPaymentRepository::new(pool.clone())),
            ratings: Arc::new(DieselRatingRepository::new(pool.clone())),
            files: Arc::new(DieselFileRepository::new(pool.clone())),
            store: Arc::new(store),
            maps,
        }
    }
}

/// Google Maps when a key is configured, otherwise a source that reports
/// `not_configured` so maps endpoints answer 503.
pub(crate) fn build_maps_source(settings: &BackendSettings) -> std::io::Result<Arc<dyn MapsSource>> {
    let Some(api_key) = settings.maps_api_key() else {
        warn!("no maps API key configured; geocoding and directions are disabled");
        return Ok(Arc::new(DisabledMapsSource));
    };
    let base_url = Url::parse(settings.maps_base_url()).map_err(|err| {
        std::io::Error::other(format!(
            "invalid maps base URL '{}': {err}",
            settings.maps_base_url()
        ))
    })?;
    let source = GoogleMapsSource::new(base_url, api_key, settings.maps_timeout())
        .map_err(|err| std::io::Error::other(format!("maps client construction failed: {err}")))?;
    info!(base_url = settings.maps_base_url(), "Google Maps source enabled");
    Ok(Arc::new(source))
}

/// Knobs the HTTP state takes from settings.
pub(crate) struct StateOptions<'a> {
    pub(crate) max_upload_bytes: u64,
    pub(crate) gateway_secret: Option<&'a str>,
}

/// Wire services over `adapters` and bundle them for the handlers.
pub(crate) fn build_http_state(adapters: &Adapters, options: &StateOptions<'_>) -> HttpState {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let Adapters {
        users,
        profiles,
        vehicles,
        routes,
        bookings,
        payments,
        ratings,
        files,
        store,
        maps,
    } = adapters.clone();

    let ports = HttpStatePorts {
        accounts: Arc::new(AccountServiceImpl::new(
            users.clone(),
            profiles.clone(),
            ratings.clone(),
            clock.clone(),
        )),
        vehicles: Arc::new(VehicleServiceImpl::new(
            users.clone(),
            vehicles.clone(),
            routes.clone(),
        )),
        routes: Arc::new(RouteServiceImpl::new(
            users.clone(),
            vehicles,
            routes.clone(),
            bookings.clone(),
            maps.clone(),
            clock.clone(),
        )),
        bookings: Arc::new(BookingServiceImpl::new(
            routes.clone(),
            bookings.clone(),
            clock.clone(),
        )),
        payments: Arc::new(PaymentServiceImpl::new(
            routes.clone(),
            bookings.clone(),
            payments,
            clock.clone(),
        )),
        ratings: Arc::new(RatingServiceImpl::new(routes, bookings, ratings, clock.clone())),
        uploads: Arc::new(UploadServiceImpl::new(
            UploadPorts {
                users,
                profiles,
                files,
                store,
            },
            UploadPolicy::new(options.max_upload_bytes),
            clock,
        )),
        maps: Arc::new(MapsServiceImpl::new(maps)),
    };

    let state = HttpState::new(ports).with_max_upload_bytes(options.max_upload_bytes);
    match options.gateway_secret {
        Some(secret) => state.with_gateway_secret(GatewaySecret::new(secret)),
        None => {
            info!("no gateway secret configured; Google sign-in bridge disabled");
            state
        }
    }
}

#[cfg(test)]
mod tests {
    use backend::domain::ErrorCode;

    use super::*;

    fn memory_state(secret: Option<&str>) -> HttpState {
        let adapters = Adapters::in_memory(Arc::new(DisabledMapsSource));
        build_http_state(
            &adapters,
            &StateOptions {
                max_upload_bytes: 1024,
                gateway_secret: secret,
            },
        )
    }

    #[test]
    fn options_flow_into_state() {
        let state = memory_state(Some("bridge"));

        assert_eq!(state.max_upload_bytes, 1024);
        assert!(
            state
                .gateway_secret
                .as_ref()
                .is_some_and(|secret| secret.matches("bridge"))
        );
        assert!(memory_state(None).gateway_secret.is_none());
    }

    #[tokio::test]
    async fn disabled_maps_answer_unavailable() {
        let state = memory_state(None);

        let err = state
            .maps
            .geocode("1 Market St")
            .await
            .expect_err("maps disabled");

        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    }

    #[test]
    fn blank_maps_key_disables_google() {
        let settings = BackendSettings {
            bind_addr: None,
            database_url: None,
            upload_dir: None,
            max_upload_bytes: None,
            maps_api_key: Some("   ".into()),
            maps_base_url: None,
            maps_timeout_secs: None,
            gateway_secret: None,
        };

        assert!(build_maps_source(&settings).is_ok());
    }
}
