//! Domain ports defining the edges of the hexagon.
//!
//! Driven ports (repositories, blob storage, the maps provider) expose
//! strongly typed errors declared with [`define_port_error!`]; driving ports
//! are the use-case traits inbound adapters call.

mod macros;
pub(crate) use macros::define_port_error;

mod account_service;
mod booking_repository;
mod booking_service;
mod file_repository;
mod file_store;
mod maps_service;
mod maps_source;
mod payment_repository;
mod payment_service;
mod profile_repository;
mod rating_repository;
mod rating_service;
mod route_repository;
mod route_service;
mod upload_service;
mod user_repository;
mod vehicle_repository;
mod vehicle_service;

#[cfg(test)]
pub use account_service::MockAccountService;
pub use account_service::{AccountService, PublicProfile};
#[cfg(test)]
pub use booking_repository::MockBookingRepository;
pub use booking_repository::{BookingRepository, BookingRepositoryError, SeatChange};
#[cfg(test)]
pub use booking_service::MockBookingService;
pub use booking_service::{BookingRequest, BookingService};
#[cfg(test)]
pub use file_repository::MockFileRepository;
pub use file_repository::{FileRepository, FileRepositoryError};
#[cfg(test)]
pub use file_store::MockFileStore;
pub use file_store::{FileStore, FileStoreError};
#[cfg(test)]
pub use maps_service::MockMapsService;
pub use maps_service::MapsService;
#[cfg(test)]
pub use maps_source::MockMapsSource;
pub use maps_source::{DisabledMapsSource, MapsSource, MapsSourceError};
#[cfg(test)]
pub use payment_repository::MockPaymentRepository;
pub use payment_repository::{PaymentRepository, PaymentRepositoryError};
#[cfg(test)]
pub use payment_service::MockPaymentService;
pub use payment_service::{PaymentRequest, PaymentService};
#[cfg(test)]
pub use profile_repository::MockProfileRepository;
pub use profile_repository::{ProfileRepository, ProfileRepositoryError};
#[cfg(test)]
pub use rating_repository::MockRatingRepository;
pub use rating_repository::{RatingRepository, RatingRepositoryError};
#[cfg(test)]
pub use rating_service::MockRatingService;
pub use rating_service::{RatingRequest, RatingService, UserRatings};
#[cfg(test)]
pub use route_repository::MockRouteRepository;
pub use route_repository::{RouteRepository, RouteRepositoryError};
#[cfg(test)]
pub use route_service::MockRouteService;
pub use route_service::{RouteSearchRequest, RouteService, RouteUpdateRequest};
#[cfg(test)]
pub use upload_service::MockUploadService;
pub use upload_service::{FileDownload, UploadRequest, UploadService};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserRepository, UserRepositoryError};
#[cfg(test)]
pub use vehicle_repository::MockVehicleRepository;
pub use vehicle_repository::{VehicleRepository, VehicleRepositoryError};
#[cfg(test)]
pub use vehicle_service::MockVehicleService;
pub use vehicle_service::VehicleService;
