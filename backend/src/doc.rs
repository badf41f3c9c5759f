//! OpenAPI document for the carpool REST API.
//!
//! Every handler under `/api/v1` plus the health probes is registered here.
//! Swagger UI serves it in debug builds and `openapi-dump` prints it.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::ports::{PublicProfile, UserRatings};
use crate::domain::{
    Booking, BookingStatus, CarpoolRoute, Coordinates, DirectionsLeg, DirectionsPlan,
    DriverProfile, ErrorCode, GeocodeResult, PassengerProfile, Payment, PaymentMethod,
    PaymentStatus, Place, Rating, RatingSummary, RoutePage, RouteSort, RouteStatus, StoredFile,
    UploadPurpose, User, UserRole, Vehicle,
};
use crate::inbound::http::auth::{GoogleLoginRequest, LoginRequest, RegisterRequest};
use crate::inbound::http::bookings::BookingRequestBody;
use crate::inbound::http::maps::{DirectionsBody, StopInput};
use crate::inbound::http::payments::CreatePaymentRequest;
use crate::inbound::http::ratings::CreateRatingRequest;
use crate::inbound::http::routes::{CreateRouteRequest, PlaceInput, UpdateRouteRequest};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::users::{
    DriverProfileRequest, PassengerProfileRequest, UpdateProfileRequest,
};
use crate::inbound::http::vehicles::{VehicleRequest, VehicleUpdateRequest};

/// Adds the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/auth/login or /auth/register.",
            ))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Carpool backend API",
        description = "Accounts, vehicles, routes, bookings, payments, ratings, uploads and maps."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::auth::register,
        crate::inbound::http::auth::login,
        crate::inbound::http::auth::logout,
        crate::inbound::http::auth::google_login,
        crate::inbound::http::users::current_user,
        crate::inbound::http::users::update_current_user,
        crate::inbound::http::users::public_profile,
        crate::inbound::http::users::put_driver_profile,
        crate::inbound::http::users::get_driver_profile,
        crate::inbound::http::users::put_passenger_profile,
        crate::inbound::http::users::get_passenger_profile,
        crate::inbound::http::vehicles::register_vehicle,
        crate::inbound::http::vehicles::list_vehicles,
        crate::inbound::http::vehicles::get_vehicle,
        crate::inbound::http::vehicles::update_vehicle,
        crate::inbound::http::vehicles::delete_vehicle,
        crate::inbound::http::routes::create_route,
        crate::inbound::http::routes::search_routes,
        crate::inbound::http::routes::my_routes,
        crate::inbound::http::routes::get_route,
        crate::inbound::http::routes::update_route,
        crate::inbound::http::routes::start_route,
        crate::inbound::http::routes::complete_route,
        crate::inbound::http::routes::cancel_route,
        crate::inbound::http::routes::route_directions,
        crate::inbound::http::bookings::request_booking,
        crate::inbound::http::bookings::route_bookings,
        crate::inbound::http::bookings::my_bookings,
        crate::inbound::http::bookings::accept_booking,
        crate::inbound::http::bookings::reject_booking,
        crate::inbound::http::bookings::cancel_booking,
        crate::inbound::http::payments::create_payment,
        crate::inbound::http::payments::my_payments,
        crate::inbound::http::payments::confirm_payment,
        crate::inbound::http::payments::refund_payment,
        crate::inbound::http::ratings::create_rating,
        crate::inbound::http::ratings::user_ratings,
        crate::inbound::http::uploads::upload_file,
        crate::inbound::http::uploads::download_file,
        crate::inbound::http::uploads::delete_file,
        crate::inbound::http::maps::geocode,
        crate::inbound::http::maps::directions,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCode,
        User,
        UserRole,
        PublicProfile,
        DriverProfile,
        PassengerProfile,
        Vehicle,
        Place,
        Coordinates,
        CarpoolRoute,
        RouteStatus,
        RouteSort,
        RoutePage,
        Booking,
        BookingStatus,
        Payment,
        PaymentMethod,
        PaymentStatus,
        Rating,
        RatingSummary,
        UserRatings,
        StoredFile,
        UploadPurpose,
        GeocodeResult,
        DirectionsPlan,
        DirectionsLeg,
        RegisterRequest,
        LoginRequest,
        GoogleLoginRequest,
        UpdateProfileRequest,
        DriverProfileRequest,
        PassengerProfileRequest,
        VehicleRequest,
        VehicleUpdateRequest,
        PlaceInput,
        CreateRouteRequest,
        UpdateRouteRequest,
        BookingRequestBody,
        CreatePaymentRequest,
        CreateRatingRequest,
        DirectionsBody,
        StopInput,
    )),
    tags(
        (name = "auth", description = "Registration, sign-in and the Google bridge"),
        (name = "users", description = "Profiles"),
        (name = "vehicles", description = "Driver vehicles"),
        (name = "routes", description = "Publishing and searching rides"),
        (name = "bookings", description = "Seat requests"),
        (name = "payments", description = "Payments for accepted bookings"),
        (name = "ratings", description = "Post-trip ratings"),
        (name = "uploads", description = "Avatars, licence scans and vehicle photos"),
        (name = "maps", description = "Geocoding and directions"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use utoipa::OpenApi;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    use super::*;

    // utoipa replaces :: with . in schema names
    const ERROR_SCHEMA_NAME: &str = "crate.domain.Error";

    #[test]
    fn error_schema_has_envelope_fields() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let RefOr::T(Schema::Object(error)) = schemas.get(ERROR_SCHEMA_NAME).expect("Error schema")
        else {
            panic!("expected Object schema");
        };

        for field in ["code", "message", "traceId", "details"] {
            assert!(error.properties.contains_key(field), "missing {field}");
        }
    }

    #[rstest]
    #[case("/api/v1/auth/register")]
    #[case("/api/v1/routes")]
    #[case("/api/v1/routes/{id}/bookings")]
    #[case("/api/v1/payments/{id}/refund")]
    #[case("/api/v1/users/{id}/ratings")]
    #[case("/api/v1/uploads")]
    #[case("/api/v1/maps/directions")]
    #[case("/health/ready")]
    fn paths_are_registered(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing {path}");
    }

    #[test]
    fn licence_upload_without_profile_is_documented_as_conflict() {
        let doc = ApiDoc::openapi();
        let upload = doc
            .paths
            .paths
            .get("/api/v1/uploads")
            .and_then(|item| item.post.as_ref())
            .expect("upload operation");
        let statuses: Vec<&str> = upload.responses.responses.keys().map(String::as_str).collect();
        assert!(statuses.contains(&"409"), "statuses: {statuses:?}");
        assert!(!statuses.contains(&"403"), "statuses: {statuses:?}");
    }

    #[test]
    fn session_cookie_scheme_is_declared() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("SessionCookie"));
    }
}
