//! Domain primitives, aggregates and services.
//!
//! Purpose: Define strongly typed carpool entities used by the HTTP and
//! persistence adapters, and the services that enforce their business rules.
//! Types validate on construction; serialisation contracts (serde, camelCase)
//! are documented on each type.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic error payload and stable codes.
//! - Users, credentials and profiles: `User`, `Account`, `DriverProfile`,
//!   `PassengerProfile`.
//! - Trips: `Vehicle`, `CarpoolRoute`, `Booking`, `Payment`, `Rating`.
//! - Files and maps: `StoredFile`, `UploadPolicy`, `DirectionsPlan`.
//! - Services implementing the driving ports in [`ports`].

pub mod auth;
pub mod booking;
pub mod error;
pub mod maps;
pub mod payment;
pub mod place;
pub mod ports;
pub mod profiles;
pub mod rating;
pub mod route;
pub mod route_search;
pub mod trace_id;
pub mod upload;
pub mod user;
pub mod vehicle;

mod account_service;
mod booking_service;
mod maps_service;
mod payment_service;
mod rating_service;
mod route_service;
pub(crate) mod service_support;
mod upload_service;
mod vehicle_service;

#[cfg(test)]
pub(crate) mod fixtures;

pub use self::account_service::AccountServiceImpl;
pub use self::auth::{
    Account, GoogleIdentity, GoogleIdentityValidationError, LoginCredentials,
    LoginValidationError, PASSWORD_MAX, PASSWORD_MIN, PasswordHash, PasswordHashError,
    Registration, RegistrationParts, RegistrationValidationError,
};
pub use self::booking::{
    BOOKING_SEATS_MAX, Booking, BookingStateError, BookingStatus, BookingValidationError,
};
pub use self::booking_service::BookingServiceImpl;
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::maps::{
    DIRECTIONS_WAYPOINTS_MAX, DirectionsLeg, DirectionsPlan, DirectionsRequest, DirectionsStop,
    DirectionsValidationError, GeocodeResult, route_directions_request,
};
pub use self::maps_service::MapsServiceImpl;
pub use self::payment::{
    Currency, Payment, PaymentMethod, PaymentStateError, PaymentStatus, PaymentValidationError,
    payment_amount,
};
pub use self::payment_service::PaymentServiceImpl;
pub use self::place::{
    ADDRESS_MAX, Coordinates, Place, PlaceValidationError, haversine_km, normalize_address,
};
pub use self::profiles::{
    DriverProfile, LicenseNumber, PREFERENCES_MAX, PassengerProfile, ProfileValidationError,
};
pub use self::rating::{COMMENT_MAX, Rating, RatingSummary, RatingValidationError, Score};
pub use self::rating_service::RatingServiceImpl;
pub use self::route::{
    CarpoolRoute, NOTES_MAX, RouteDraft, RouteStateError, RouteStatus, RouteTransition,
    RouteUpdate, RouteValidationError, WAYPOINTS_MAX,
};
pub use self::route_search::{
    DEFAULT_LIMIT, MAX_LIMIT, MAX_RADIUS_KM, NearFilter, Pagination, RouteFilter, RoutePage,
    RouteSearchError, RouteSort, search,
};
pub use self::route_service::RouteServiceImpl;
pub use self::trace_id::TraceId;
pub use self::upload::{
    DEFAULT_MAX_UPLOAD_BYTES, StoredFile, UploadPolicy, UploadPurpose, UploadValidationError,
    sanitize_file_name,
};
pub use self::upload_service::{UploadPorts, UploadServiceImpl};
pub use self::user::{
    AVATAR_URL_MAX, AuthProvider, EMAIL_MAX, Email, FULL_NAME_MAX, FULL_NAME_MIN, FullName,
    PhoneNumber, User, UserId, UserProfileUpdate, UserRole, UserValidationError,
    validate_avatar_url,
};
pub use self::vehicle::{
    LicensePlate, VEHICLE_SEATS_MAX, VEHICLE_TEXT_MAX, VEHICLE_YEAR_MIN, Vehicle, VehicleDraft,
    VehicleParts, VehicleUpdate, VehicleUpdateParts, VehicleValidationError,
};
pub use self::vehicle_service::VehicleServiceImpl;

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
