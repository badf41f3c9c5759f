//! Route publishing, search, and trip lifecycle handlers.
//!
//! ```text
//! POST  /api/v1/routes
//! GET   /api/v1/routes?origin=oakland&date=2026-11-01&sort=price
//! GET   /api/v1/routes/mine
//! GET   /api/v1/routes/{id}
//! PATCH /api/v1/routes/{id}
//! POST  /api/v1/routes/{id}/start | /complete | /cancel
//! GET   /api/v1/routes/{id}/directions
//! ```

use actix_web::{HttpResponse, get, patch, post, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::ports::{RouteSearchRequest, RouteUpdateRequest};
use crate::domain::{
    CarpoolRoute, Coordinates, DirectionsPlan, Error, NearFilter, Pagination, Place,
    PlaceValidationError, RouteDraft, RouteFilter, RoutePage, RouteSearchError, RouteSort,
    RouteTransition,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, field_error, parse_date, parse_optional_rfc3339_timestamp,
    parse_rfc3339_timestamp, parse_uuid, require,
};

/// Radius used when a search gives a centre point but no `radiusKm`.
pub const DEFAULT_SEARCH_RADIUS_KM: f64 = 25.0;

/// A place as typed by a client: an address plus optional coordinates.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaceInput {
    #[schema(example = "1 Market St, San Francisco, CA")]
    pub address: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// Route publishing body.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRouteRequest {
    pub vehicle_id: Option<String>,
    pub origin: Option<PlaceInput>,
    pub destination: Option<PlaceInput>,
    #[serde(default)]
    pub waypoints: Vec<PlaceInput>,
    /// RFC 3339 departure time.
    #[schema(example = "2026-11-01T08:30:00Z")]
    pub departure_at: Option<String>,
    /// Seats offered, at most the vehicle's passenger seats.
    pub seats: Option<u8>,
    pub price_per_seat_cents: Option<i64>,
    pub notes: Option<String>,
}

/// Partial route update; only scheduled routes accept changes.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRouteRequest {
    pub departure_at: Option<String>,
    pub price_per_seat_cents: Option<i64>,
    /// An empty string clears the notes.
    pub notes: Option<String>,
    pub waypoints: Option<Vec<PlaceInput>>,
}

/// Search query string.
#[derive(Debug, Default, Deserialize, Serialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct RouteSearchQuery {
    /// Substring of the origin address.
    pub origin: Option<String>,
    /// Substring of the destination address.
    pub destination: Option<String>,
    /// Departure day (UTC), `YYYY-MM-DD`.
    pub date: Option<String>,
    pub min_seats: Option<u8>,
    /// Highest acceptable price per seat, in cents.
    pub max_price: Option<i64>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius_km: Option<f64>,
    /// `departure`, `price`, `seats`, or `distance`.
    pub sort: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    /// Include departed and finished routes.
    pub include_past: Option<bool>,
}

pub(crate) fn place_error(field: &str, err: &PlaceValidationError) -> Error {
    let code = match err {
        PlaceValidationError::EmptyAddress => "empty_address",
        PlaceValidationError::AddressTooLong { .. } => "too_long",
        PlaceValidationError::LatitudeOutOfRange(_)
        | PlaceValidationError::LongitudeOutOfRange(_) => "invalid_coordinates",
    };
    field_error(field, code, err)
}

fn parse_coordinates(
    lat: Option<f64>,
    lng: Option<f64>,
    field: &str,
) -> Result<Option<Coordinates>, Error> {
    match (lat, lng) {
        (Some(lat), Some(lng)) => Coordinates::new(lat, lng)
            .map(Some)
            .map_err(|err| place_error(field, &err)),
        (None, None) => Ok(None),
        _ => Err(field_error(
            field,
            "invalid_coordinates",
            "lat and lng must be given together",
        )),
    }
}

pub(crate) fn parse_place(input: &PlaceInput, field: &str) -> Result<Place, Error> {
    let coordinates = parse_coordinates(input.lat, input.lng, field)?;
    Place::new(&input.address, coordinates).map_err(|err| place_error(field, &err))
}

fn parse_waypoints(inputs: &[PlaceInput]) -> Result<Vec<Place>, Error> {
    inputs
        .iter()
        .map(|input| parse_place(input, "waypoints"))
        .collect()
}

fn parse_create(body: CreateRouteRequest) -> Result<RouteDraft, Error> {
    let vehicle_id = require(body.vehicle_id, FieldName::new("vehicleId"))?;
    let origin = require(body.origin, FieldName::new("origin"))?;
    let destination = require(body.destination, FieldName::new("destination"))?;
    let departure_at = require(body.departure_at, FieldName::new("departureAt"))?;
    Ok(RouteDraft {
        vehicle_id: parse_uuid(&vehicle_id, FieldName::new("vehicleId"))?,
        origin: parse_place(&origin, "origin")?,
        destination: parse_place(&destination, "destination")?,
        waypoints: parse_waypoints(&body.waypoints)?,
        departure_at: parse_rfc3339_timestamp(&departure_at, FieldName::new("departureAt"))?,
        seats: require(body.seats, FieldName::new("seats"))?,
        price_per_seat_cents: require(
            body.price_per_seat_cents,
            FieldName::new("pricePerSeatCents"),
        )?,
        notes: body.notes,
    })
}

fn search_error(err: RouteSearchError) -> Error {
    let code = match err {
        RouteSearchError::LimitOutOfRange { .. } | RouteSearchError::RadiusOutOfRange { .. } => {
            "out_of_range"
        }
        RouteSearchError::DistanceSortWithoutLocation => "location_required",
        RouteSearchError::UnknownSort(_) => "invalid_sort",
    };
    field_error(err.field(), code, &err)
}

pub(crate) fn parse_search(query: RouteSearchQuery) -> Result<RouteSearchRequest, Error> {
    let mut filter = RouteFilter::default();
    if let Some(origin) = query.origin.as_deref() {
        filter = filter.with_origin(origin);
    }
    if let Some(destination) = query.destination.as_deref() {
        filter = filter.with_destination(destination);
    }
    filter.date = query
        .date
        .as_deref()
        .map(|raw| parse_date(raw, FieldName::new("date")))
        .transpose()?;
    filter.min_seats = query.min_seats;
    filter.max_price_cents = query.max_price;
    filter.include_past = query.include_past.unwrap_or(false);
    filter.near = parse_coordinates(query.lat, query.lng, "lat")?
        .map(|center| {
            NearFilter::new(
                center,
                query.radius_km.unwrap_or(DEFAULT_SEARCH_RADIUS_KM),
            )
        })
        .transpose()
        .map_err(search_error)?;

    let sort = query
        .sort
        .as_deref()
        .map(str::parse::<RouteSort>)
        .transpose()
        .map_err(search_error)?
        .unwrap_or_default();
    let pagination = Pagination::new(query.limit, query.offset).map_err(search_error)?;
    Ok(RouteSearchRequest {
        filter,
        sort,
        pagination,
    })
}

fn route_id(path: web::Path<String>) -> Result<Uuid, Error> {
    parse_uuid(&path.into_inner(), FieldName::new("id"))
}

/// Publish a route with one of the driver's vehicles.
#[utoipa::path(
    post,
    path = "/api/v1/routes",
    request_body = CreateRouteRequest,
    responses(
        (status = 201, description = "Route published", body = CarpoolRoute),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Only drivers publish routes", body = ErrorSchema),
        (status = 404, description = "Unknown vehicle", body = ErrorSchema)
    ),
    tags = ["routes"],
    operation_id = "createRoute"
)]
#[post("/routes")]
pub async fn create_route(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateRouteRequest>,
) -> ApiResult<HttpResponse> {
    let driver = session.require_user_id()?;
    let draft = parse_create(payload.into_inner())?;
    let route = state.routes.create(&driver, draft).await?;
    Ok(HttpResponse::Created().json(route))
}

/// Search bookable routes.
#[utoipa::path(
    get,
    path = "/api/v1/routes",
    params(RouteSearchQuery),
    responses(
        (status = 200, description = "Matching routes", body = RoutePage),
        (status = 400, description = "Invalid query", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["routes"],
    operation_id = "searchRoutes"
)]
#[get("/routes")]
pub async fn search_routes(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<RouteSearchQuery>,
) -> ApiResult<web::Json<RoutePage>> {
    session.require_user_id()?;
    let request = parse_search(query.into_inner())?;
    Ok(web::Json(state.routes.search(request).await?))
}

/// Routes the caller drives.
#[utoipa::path(
    get,
    path = "/api/v1/routes/mine",
    responses(
        (status = 200, description = "Driver's routes", body = [CarpoolRoute]),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["routes"],
    operation_id = "myRoutes"
)]
#[get("/routes/mine")]
pub async fn my_routes(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<CarpoolRoute>>> {
    let driver = session.require_user_id()?;
    Ok(web::Json(state.routes.list_mine(&driver).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/routes/{id}",
    params(("id" = String, Path, description = "Route id")),
    responses(
        (status = 200, description = "Route", body = CarpoolRoute),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Unknown route", body = ErrorSchema)
    ),
    tags = ["routes"],
    operation_id = "getRoute"
)]
#[get("/routes/{id}")]
pub async fn get_route(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<CarpoolRoute>> {
    session.require_user_id()?;
    let id = route_id(path)?;
    Ok(web::Json(state.routes.get(&id).await?))
}

#[utoipa::path(
    patch,
    path = "/api/v1/routes/{id}",
    params(("id" = String, Path, description = "Route id")),
    request_body = UpdateRouteRequest,
    responses(
        (status = 200, description = "Updated route", body = CarpoolRoute),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 403, description = "Not the route's driver", body = ErrorSchema),
        (status = 404, description = "Unknown route", body = ErrorSchema),
        (status = 409, description = "Route is no longer scheduled", body = ErrorSchema)
    ),
    tags = ["routes"],
    operation_id = "updateRoute"
)]
#[patch("/routes/{id}")]
pub async fn update_route(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<UpdateRouteRequest>,
) -> ApiResult<web::Json<CarpoolRoute>> {
    let driver = session.require_user_id()?;
    let id = route_id(path)?;
    let body = payload.into_inner();
    let request = RouteUpdateRequest {
        departure_at: parse_optional_rfc3339_timestamp(
            body.departure_at.as_deref(),
            FieldName::new("departureAt"),
        )?,
        price_per_seat_cents: body.price_per_seat_cents,
        notes: body.notes,
        waypoints: body
            .waypoints
            .as_deref()
            .map(parse_waypoints)
            .transpose()?,
    };
    Ok(web::Json(state.routes.update(&driver, &id, request).await?))
}

async fn transition_route(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    transition: RouteTransition,
) -> ApiResult<web::Json<CarpoolRoute>> {
    let driver = session.require_user_id()?;
    let id = route_id(path)?;
    Ok(web::Json(
        state.routes.transition(&driver, &id, transition).await?,
    ))
}

/// Mark a scheduled route as under way.
#[utoipa::path(
    post,
    path = "/api/v1/routes/{id}/start",
    params(("id" = String, Path, description = "Route id")),
    responses(
        (status = 200, description = "Route in progress", body = CarpoolRoute),
        (status = 403, description = "Not the route's driver", body = ErrorSchema),
        (status = 409, description = "Transition not allowed", body = ErrorSchema)
    ),
    tags = ["routes"],
    operation_id = "startRoute"
)]
#[post("/routes/{id}/start")]
pub async fn start_route(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<CarpoolRoute>> {
    transition_route(state, session, path, RouteTransition::Start).await
}

#[utoipa::path(
    post,
    path = "/api/v1/routes/{id}/complete",
    params(("id" = String, Path, description = "Route id")),
    responses(
        (status = 200, description = "Route completed", body = CarpoolRoute),
        (status = 403, description = "Not the route's driver", body = ErrorSchema),
        (status = 409, description = "Transition not allowed", body = ErrorSchema)
    ),
    tags = ["routes"],
    operation_id = "completeRoute"
)]
#[post("/routes/{id}/complete")]
pub async fn complete_route(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<CarpoolRoute>> {
    transition_route(state, session, path, RouteTransition::Complete).await
}

/// Cancel the route and its active bookings.
#[utoipa::path(
    post,
    path = "/api/v1/routes/{id}/cancel",
    params(("id" = String, Path, description = "Route id")),
    responses(
        (status = 200, description = "Route cancelled", body = CarpoolRoute),
        (status = 403, description = "Not the route's driver", body = ErrorSchema),
        (status = 409, description = "Transition not allowed", body = ErrorSchema)
    ),
    tags = ["routes"],
    operation_id = "cancelRoute"
)]
#[post("/routes/{id}/cancel")]
pub async fn cancel_route(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<CarpoolRoute>> {
    transition_route(state, session, path, RouteTransition::Cancel).await
}

/// Driving plan through waypoints and accepted pickups.
#[utoipa::path(
    get,
    path = "/api/v1/routes/{id}/directions",
    params(("id" = String, Path, description = "Route id")),
    responses(
        (status = 200, description = "Directions", body = DirectionsPlan),
        (status = 404, description = "Unknown route", body = ErrorSchema),
        (status = 503, description = "Maps provider unavailable", body = ErrorSchema)
    ),
    tags = ["routes"],
    operation_id = "routeDirections"
)]
#[get("/routes/{id}/directions")]
pub async fn route_directions(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<DirectionsPlan>> {
    session.require_user_id()?;
    let id = route_id(path)?;
    Ok(web::Json(state.routes.directions(&id).await?))
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
