//! Seat request handlers.
//!
//! ```text
//! POST /api/v1/routes/{id}/bookings {"seats":2,"pickup":{"address":"Rockridge BART"}}
//! GET  /api/v1/routes/{id}/bookings
//! GET  /api/v1/bookings/mine
//! POST /api/v1/bookings/{id}/accept | /reject | /cancel
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::ports::BookingRequest;
use crate::domain::{Booking, Error, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::routes::{PlaceInput, parse_place};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_uuid, require};

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequestBody {
    #[schema(minimum = 1, maximum = 4)]
    pub seats: Option<u8>,
    /// Where the passenger wants to be picked up.
    pub pickup: Option<PlaceInput>,
}

fn path_id(path: web::Path<String>) -> Result<Uuid, Error> {
    parse_uuid(&path.into_inner(), FieldName::new("id"))
}

/// Request seats on a scheduled route.
#[utoipa::path(
    post,
    path = "/api/v1/routes/{id}/bookings",
    params(("id" = String, Path, description = "Route id")),
    request_body = BookingRequestBody,
    responses(
        (status = 201, description = "Booking requested", body = Booking),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 403, description = "Drivers cannot book their own route", body = ErrorSchema),
        (status = 404, description = "Unknown route", body = ErrorSchema),
        (status = 409, description = "Active booking exists or route not bookable", body = ErrorSchema)
    ),
    tags = ["bookings"],
    operation_id = "requestBooking"
)]
#[post("/routes/{id}/bookings")]
pub async fn request_booking(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<BookingRequestBody>,
) -> ApiResult<HttpResponse> {
    let passenger = session.require_user_id()?;
    let route_id = path_id(path)?;
    let body = payload.into_inner();
    let request = BookingRequest {
        route_id,
        seats: require(body.seats, FieldName::new("seats"))?,
        pickup: body
            .pickup
            .as_ref()
            .map(|pickup| parse_place(pickup, "pickup"))
            .transpose()?,
    };
    let booking = state.bookings.request(&passenger, request).await?;
    Ok(HttpResponse::Created().json(booking))
}

/// Bookings on a route; driver only.
#[utoipa::path(
    get,
    path = "/api/v1/routes/{id}/bookings",
    params(("id" = String, Path, description = "Route id")),
    responses(
        (status = 200, description = "Bookings", body = [Booking]),
        (status = 403, description = "Not the route's driver", body = ErrorSchema),
        (status = 404, description = "Unknown route", body = ErrorSchema)
    ),
    tags = ["bookings"],
    operation_id = "routeBookings"
)]
#[get("/routes/{id}/bookings")]
pub async fn route_bookings(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<Booking>>> {
    let driver = session.require_user_id()?;
    let route_id = path_id(path)?;
    Ok(web::Json(
        state.bookings.list_for_route(&driver, &route_id).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings/mine",
    responses(
        (status = 200, description = "Caller's bookings", body = [Booking]),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["bookings"],
    operation_id = "myBookings"
)]
#[get("/bookings/mine")]
pub async fn my_bookings(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<Booking>>> {
    let passenger = session.require_user_id()?;
    Ok(web::Json(state.bookings.list_mine(&passenger).await?))
}

#[derive(Debug, Clone, Copy)]
enum BookingAction {
    Accept,
    Reject,
    Cancel,
}

async fn apply_action(
    state: &HttpState,
    user: &UserId,
    booking_id: &Uuid,
    action: BookingAction,
) -> Result<Booking, Error> {
    match action {
        BookingAction::Accept => state.bookings.accept(user, booking_id).await,
        BookingAction::Reject => state.bookings.reject(user, booking_id).await,
        BookingAction::Cancel => state.bookings.cancel(user, booking_id).await,
    }
}

async fn booking_action(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    action: BookingAction,
) -> ApiResult<web::Json<Booking>> {
    let user = session.require_user_id()?;
    let booking_id = path_id(path)?;
    Ok(web::Json(
        apply_action(&state, &user, &booking_id, action).await?,
    ))
}

/// Driver accepts; seats are reserved on the route.
#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/accept",
    params(("id" = String, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking accepted", body = Booking),
        (status = 403, description = "Not the route's driver", body = ErrorSchema),
        (status = 409, description = "Not pending or not enough seats", body = ErrorSchema)
    ),
    tags = ["bookings"],
    operation_id = "acceptBooking"
)]
#[post("/bookings/{id}/accept")]
pub async fn accept_booking(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Booking>> {
    booking_action(state, session, path, BookingAction::Accept).await
}

#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/reject",
    params(("id" = String, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking rejected", body = Booking),
        (status = 403, description = "Not the route's driver", body = ErrorSchema),
        (status = 409, description = "Booking is not pending", body = ErrorSchema)
    ),
    tags = ["bookings"],
    operation_id = "rejectBooking"
)]
#[post("/bookings/{id}/reject")]
pub async fn reject_booking(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Booking>> {
    booking_action(state, session, path, BookingAction::Reject).await
}

/// Passenger withdraws the request.
#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/cancel",
    params(("id" = String, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking cancelled", body = Booking),
        (status = 403, description = "Not the booking's passenger", body = ErrorSchema),
        (status = 409, description = "Booking already finished", body = ErrorSchema)
    ),
    tags = ["bookings"],
    operation_id = "cancelBooking"
)]
#[post("/bookings/{id}/cancel")]
pub async fn cancel_booking(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Booking>> {
    booking_action(state, session, path, BookingAction::Cancel).await
}
