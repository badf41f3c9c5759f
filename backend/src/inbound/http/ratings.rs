//! Post-trip rating handlers.

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{RatingRequest, UserRatings};
use crate::domain::{Error, RatingValidationError, Score};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, field_error, parse_user_id, parse_uuid, require,
};

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRatingRequest {
    pub route_id: Option<String>,
    pub ratee_id: Option<String>,
    #[schema(minimum = 1, maximum = 5)]
    pub score: Option<u8>,
    pub comment: Option<String>,
}

fn rating_error(err: RatingValidationError) -> Error {
    let code = match err {
        RatingValidationError::ScoreOutOfRange => "out_of_range",
        RatingValidationError::CommentTooLong { .. } => "too_long",
        RatingValidationError::SelfRating => "self_rating",
    };
    field_error(err.field(), code, &err)
}

fn parse_request(body: CreateRatingRequest) -> Result<RatingRequest, Error> {
    let route_id = require(body.route_id, FieldName::new("routeId"))?;
    let ratee_id = require(body.ratee_id, FieldName::new("rateeId"))?;
    let score = require(body.score, FieldName::new("score"))?;
    Ok(RatingRequest {
        route_id: parse_uuid(&route_id, FieldName::new("routeId"))?,
        ratee_id: parse_user_id(&ratee_id, FieldName::new("rateeId"))?,
        score: Score::new(score).map_err(rating_error)?,
        comment: body.comment,
    })
}

/// Rate another participant of a completed route.
#[utoipa::path(
    post,
    path = "/api/v1/ratings",
    request_body = CreateRatingRequest,
    responses(
        (status = 201, description = "Rating recorded", body = crate::domain::Rating),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 403, description = "Caller or ratee did not take part", body = ErrorSchema),
        (status = 409, description = "Route not completed or already rated", body = ErrorSchema)
    ),
    tags = ["ratings"],
    operation_id = "createRating"
)]
#[post("/ratings")]
pub async fn create_rating(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateRatingRequest>,
) -> ApiResult<HttpResponse> {
    let rater = session.require_user_id()?;
    let request = parse_request(payload.into_inner())?;
    let rating = state.ratings.rate(&rater, request).await?;
    Ok(HttpResponse::Created().json(rating))
}

/// Ratings received by a user with their summary.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/ratings",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Ratings", body = UserRatings),
        (status = 400, description = "Invalid user id", body = ErrorSchema),
        (status = 404, description = "Unknown user", body = ErrorSchema)
    ),
    tags = ["ratings"],
    operation_id = "userRatings"
)]
#[get("/users/{id}/ratings")]
pub async fn user_ratings(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<UserRatings>> {
    session.require_user_id()?;
    let user = parse_user_id(&path.into_inner(), FieldName::new("id"))?;
    Ok(web::Json(state.ratings.list_for_user(&user).await?))
}
