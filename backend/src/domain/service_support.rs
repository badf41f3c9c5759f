//! Internal helpers shared by the domain services.
//!
//! Port errors are mapped here so every service reports repository failures
//! with the same codes: connection problems become `service_unavailable`,
//! query failures become `internal_error`.

use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::domain::ports::{
    BookingRepository, BookingRepositoryError, FileRepositoryError, FileStoreError,
    MapsSourceError, PaymentRepositoryError, ProfileRepositoryError, RatingRepositoryError,
    RouteRepository, RouteRepositoryError, UserRepository, UserRepositoryError,
    VehicleRepositoryError,
};
use crate::domain::{Account, Booking, CarpoolRoute, Error, UserId};

/// Build an `invalid_request` error carrying `{ field, code }` details.
pub(crate) fn invalid_field(field: &str, code: &str, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({ "field": field, "code": code }))
}

pub(crate) fn map_user_repository_error(error: UserRepositoryError) -> Error {
    match error {
        UserRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserRepositoryError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserRepositoryError::DuplicateEmail { email } => {
            Error::conflict(format!("an account already exists for {email}"))
                .with_details(json!({ "field": "email", "code": "duplicate_email" }))
        }
    }
}

pub(crate) fn map_profile_repository_error(error: ProfileRepositoryError) -> Error {
    match error {
        ProfileRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("profile repository unavailable: {message}"))
        }
        ProfileRepositoryError::Query { message } => {
            Error::internal(format!("profile repository error: {message}"))
        }
    }
}

pub(crate) fn map_vehicle_repository_error(error: VehicleRepositoryError) -> Error {
    match error {
        VehicleRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("vehicle repository unavailable: {message}"))
        }
        VehicleRepositoryError::Query { message } => {
            Error::internal(format!("vehicle repository error: {message}"))
        }
        VehicleRepositoryError::DuplicatePlate { plate } => {
            Error::conflict(format!("plate {plate} is already registered"))
                .with_details(json!({ "field": "plate", "code": "duplicate_plate" }))
        }
    }
}

pub(crate) fn map_route_repository_error(error: RouteRepositoryError) -> Error {
    match error {
        RouteRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("route repository unavailable: {message}"))
        }
        RouteRepositoryError::Query { message } => {
            Error::internal(format!("route repository error: {message}"))
        }
        RouteRepositoryError::Conflict { message } => Error::conflict(message),
    }
}

pub(crate) fn map_booking_repository_error(error: BookingRepositoryError) -> Error {
    match error {
        BookingRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("booking repository unavailable: {message}"))
        }
        BookingRepositoryError::Query { message } => {
            Error::internal(format!("booking repository error: {message}"))
        }
        BookingRepositoryError::DuplicateActive { route_id } => Error::conflict(format!(
            "you already have an active booking on route {route_id}"
        )),
        BookingRepositoryError::Conflict { message } => Error::conflict(message),
    }
}

pub(crate) fn map_payment_repository_error(error: PaymentRepositoryError) -> Error {
    match error {
        PaymentRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("payment repository unavailable: {message}"))
        }
        PaymentRepositoryError::Query { message } => {
            Error::internal(format!("payment repository error: {message}"))
        }
        PaymentRepositoryError::DuplicateActive { .. } => {
            Error::conflict("booking already has a payment")
        }
        PaymentRepositoryError::Conflict { message } => Error::conflict(message),
    }
}

pub(crate) fn map_rating_repository_error(error: RatingRepositoryError) -> Error {
    match error {
        RatingRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("rating repository unavailable: {message}"))
        }
        RatingRepositoryError::Query { message } => {
            Error::internal(format!("rating repository error: {message}"))
        }
        RatingRepositoryError::Duplicate => {
            Error::conflict("you already rated this participant for this route")
        }
    }
}

pub(crate) fn map_file_repository_error(error: FileRepositoryError) -> Error {
    match error {
        FileRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("file repository unavailable: {message}"))
        }
        FileRepositoryError::Query { message } => {
            Error::internal(format!("file repository error: {message}"))
        }
    }
}

pub(crate) fn map_file_store_error(error: FileStoreError) -> Error {
    match error {
        FileStoreError::NotFound { name } => {
            Error::not_found(format!("stored file {name} is missing"))
        }
        FileStoreError::Io { message } => Error::internal(format!("file storage error: {message}")),
        FileStoreError::InvalidName { name } => {
            Error::internal(format!("invalid stored file name: {name}"))
        }
    }
}

pub(crate) fn map_maps_source_error(error: MapsSourceError) -> Error {
    match error {
        MapsSourceError::NoResults => Error::not_found("no results for the requested location"),
        MapsSourceError::InvalidRequest { message } => Error::invalid_request(message),
        MapsSourceError::NotConfigured => {
            Error::service_unavailable("maps provider is not configured")
        }
        MapsSourceError::Quota => Error::service_unavailable("maps provider quota exceeded"),
        MapsSourceError::Transport { message } => {
            warn!(%message, "maps provider transport failure");
            Error::service_unavailable("maps provider unavailable")
        }
        other @ (MapsSourceError::Status { .. }
        | MapsSourceError::Denied { .. }
        | MapsSourceError::Decode { .. }) => Error::internal(other.to_string()),
    }
}

/// Load an account or fail with `not_found`.
pub(crate) async fn load_account(
    users: &dyn UserRepository,
    user_id: &UserId,
) -> Result<Account, Error> {
    users
        .find_by_id(user_id)
        .await
        .map_err(map_user_repository_error)?
        .ok_or_else(|| Error::not_found(format!("user {user_id} not found")))
}

/// Load a route or fail with `not_found`.
pub(crate) async fn load_route(
    routes: &dyn RouteRepository,
    route_id: &Uuid,
) -> Result<CarpoolRoute, Error> {
    routes
        .find_by_id(route_id)
        .await
        .map_err(map_route_repository_error)?
        .ok_or_else(|| Error::not_found(format!("route {route_id} not found")))
}

/// Load a booking or fail with `not_found`.
pub(crate) async fn load_booking(
    bookings: &dyn BookingRepository,
    booking_id: &Uuid,
) -> Result<Booking, Error> {
    bookings
        .find_by_id(booking_id)
        .await
        .map_err(map_booking_repository_error)?
        .ok_or_else(|| Error::not_found(format!("booking {booking_id} not found")))
}

/// Fail with `forbidden` unless `user` drives `route`.
pub(crate) fn ensure_driver(route: &CarpoolRoute, user: &UserId) -> Result<(), Error> {
    if &route.driver_id == user {
        Ok(())
    } else {
        Err(Error::forbidden("only the route's driver may do this"))
    }
}
