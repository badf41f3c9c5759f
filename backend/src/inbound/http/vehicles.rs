//! Vehicle handlers.
//!
//! ```text
//! POST   /api/v1/vehicles {"make":"Toyota","model":"Prius","year":2021,"color":"Silver","plate":"7ABC123","seats":4}
//! GET    /api/v1/vehicles
//! GET    /api/v1/vehicles/{id}
//! PATCH  /api/v1/vehicles/{id} {"color":"Blue"}
//! DELETE /api/v1/vehicles/{id}
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, web};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    Error, Vehicle, VehicleDraft, VehicleParts, VehicleUpdate, VehicleUpdateParts,
    VehicleValidationError,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, field_error, parse_uuid, require};

/// Vehicle registration body.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRequest {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub color: Option<String>,
    pub plate: Option<String>,
    /// Passenger seats, excluding the driver's.
    pub seats: Option<u8>,
}

/// Partial vehicle update; omitted fields are left untouched.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VehicleUpdateRequest {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub color: Option<String>,
    pub plate: Option<String>,
    pub seats: Option<u8>,
}

pub(crate) fn map_vehicle_error(err: VehicleValidationError) -> Error {
    let code = match err {
        VehicleValidationError::EmptyField { .. } => "empty",
        VehicleValidationError::FieldTooLong { .. } => "too_long",
        VehicleValidationError::InvalidPlate => "invalid_plate",
        VehicleValidationError::YearOutOfRange { .. }
        | VehicleValidationError::SeatsOutOfRange { .. } => "out_of_range",
    };
    field_error(err.field(), code, &err)
}

fn current_year() -> i32 {
    Utc::now().year()
}

fn parse_draft(body: VehicleRequest) -> Result<VehicleDraft, Error> {
    let make = require(body.make, FieldName::new("make"))?;
    let model = require(body.model, FieldName::new("model"))?;
    let year = require(body.year, FieldName::new("year"))?;
    let color = require(body.color, FieldName::new("color"))?;
    let plate = require(body.plate, FieldName::new("plate"))?;
    let seats = require(body.seats, FieldName::new("seats"))?;
    VehicleDraft::try_from_parts(
        VehicleParts {
            make: &make,
            model: &model,
            year,
            color: &color,
            plate: &plate,
            seats,
        },
        current_year(),
    )
    .map_err(map_vehicle_error)
}

/// Register a vehicle for the signed-in driver.
#[utoipa::path(
    post,
    path = "/api/v1/vehicles",
    request_body = VehicleRequest,
    responses(
        (status = 201, description = "Vehicle registered", body = Vehicle),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Only drivers register vehicles", body = ErrorSchema),
        (status = 409, description = "Plate already registered", body = ErrorSchema)
    ),
    tags = ["vehicles"],
    operation_id = "registerVehicle"
)]
#[post("/vehicles")]
pub async fn register_vehicle(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<VehicleRequest>,
) -> ApiResult<HttpResponse> {
    let owner = session.require_user_id()?;
    let draft = parse_draft(payload.into_inner())?;
    let vehicle = state.vehicles.register(&owner, draft).await?;
    Ok(HttpResponse::Created().json(vehicle))
}

#[utoipa::path(
    get,
    path = "/api/v1/vehicles",
    responses(
        (status = 200, description = "Vehicles owned by the caller", body = [Vehicle]),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["vehicles"],
    operation_id = "listVehicles"
)]
#[get("/vehicles")]
pub async fn list_vehicles(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<Vehicle>>> {
    let owner = session.require_user_id()?;
    Ok(web::Json(state.vehicles.list_mine(&owner).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/vehicles/{id}",
    params(("id" = String, Path, description = "Vehicle id")),
    responses(
        (status = 200, description = "Vehicle", body = Vehicle),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Unknown vehicle", body = ErrorSchema)
    ),
    tags = ["vehicles"],
    operation_id = "getVehicle"
)]
#[get("/vehicles/{id}")]
pub async fn get_vehicle(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vehicle>> {
    let owner = session.require_user_id()?;
    let vehicle_id = parse_uuid(&path.into_inner(), FieldName::new("id"))?;
    Ok(web::Json(state.vehicles.get(&owner, &vehicle_id).await?))
}

#[utoipa::path(
    patch,
    path = "/api/v1/vehicles/{id}",
    params(("id" = String, Path, description = "Vehicle id")),
    request_body = VehicleUpdateRequest,
    responses(
        (status = 200, description = "Updated vehicle", body = Vehicle),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Unknown vehicle", body = ErrorSchema),
        (status = 409, description = "Plate already registered", body = ErrorSchema)
    ),
    tags = ["vehicles"],
    operation_id = "updateVehicle"
)]
#[patch("/vehicles/{id}")]
pub async fn update_vehicle(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<VehicleUpdateRequest>,
) -> ApiResult<web::Json<Vehicle>> {
    let owner = session.require_user_id()?;
    let vehicle_id = parse_uuid(&path.into_inner(), FieldName::new("id"))?;
    let body = payload.into_inner();
    let update = VehicleUpdate::try_from_parts(
        VehicleUpdateParts {
            make: body.make.as_deref(),
            model: body.model.as_deref(),
            year: body.year,
            color: body.color.as_deref(),
            plate: body.plate.as_deref(),
            seats: body.seats,
        },
        current_year(),
    )
    .map_err(map_vehicle_error)?;
    Ok(web::Json(
        state.vehicles.update(&owner, &vehicle_id, update).await?,
    ))
}

/// Remove a vehicle that no active route uses.
#[utoipa::path(
    delete,
    path = "/api/v1/vehicles/{id}",
    params(("id" = String, Path, description = "Vehicle id")),
    responses(
        (status = 204, description = "Vehicle removed"),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Unknown vehicle", body = ErrorSchema),
        (status = 409, description = "Vehicle used by an active route", body = ErrorSchema)
    ),
    tags = ["vehicles"],
    operation_id = "deleteVehicle"
)]
#[delete("/vehicles/{id}")]
pub async fn delete_vehicle(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let owner = session.require_user_id()?;
    let vehicle_id = parse_uuid(&path.into_inner(), FieldName::new("id"))?;
    state.vehicles.delete(&owner, &vehicle_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use rstest::rstest;
    use serde_json::{Value, json};
    use uuid::Uuid;

    use super::*;
    use crate::domain::fixtures;
    use crate::domain::UserId;
    use crate::inbound::http::test_utils::{MockPorts, login_cookie, read_json, test_api_app};

    fn valid_body() -> Value {
        json!({
            "make": "Toyota",
            "model": "Prius",
            "year": 2021,
            "color": "Silver",
            "plate": "7abc-123",
            "seats": 4
        })
    }

    #[actix_web::test]
    async fn register_normalises_plate_and_returns_created() {
        let owner = UserId::random();
        let mut ports = MockPorts::default();
        ports
            .vehicles
            .expect_register()
            .withf(|_, draft| draft.plate.as_ref() == "7ABC123" && draft.seats == 4)
            .return_once(|owner, draft| Ok(draft.into_vehicle(Uuid::new_v4(), owner.clone())));
        let app = actix_test::init_service(test_api_app!(ports.into_state(), register_vehicle))
            .await;
        let cookie = login_cookie(&app, &owner).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/vehicles")
                .cookie(cookie)
                .set_json(valid_body())
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = read_json(response).await;
        assert_eq!(body["ownerId"], Value::from(owner.to_string()));
        assert_eq!(body["plate"], "7ABC123");
    }

    #[rstest]
    #[case::missing_plate("plate", Value::Null, "missing_field")]
    #[case::too_many_seats("seats", json!(9), "out_of_range")]
    #[case::vintage("year", json!(1950), "out_of_range")]
    #[case::blank_make("make", json!("  "), "empty")]
    #[actix_web::test]
    async fn register_reports_field_errors(
        #[case] field: &str,
        #[case] value: Value,
        #[case] code: &str,
    ) {
        let mut body = valid_body();
        match value {
            Value::Null => {
                body.as_object_mut().expect("object").remove(field);
            }
            other => body[field] = other,
        }
        let app = actix_test::init_service(test_api_app!(
            MockPorts::default().into_state(),
            register_vehicle
        ))
        .await;
        let cookie = login_cookie(&app, &UserId::random()).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/vehicles")
                .cookie(cookie)
                .set_json(body)
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let payload = read_json(response).await;
        assert_eq!(payload["details"]["field"], field);
        assert_eq!(payload["details"]["code"], code);
    }

    #[actix_web::test]
    async fn delete_maps_conflict() {
        let owner = UserId::random();
        let mut ports = MockPorts::default();
        ports
            .vehicles
            .expect_delete()
            .return_once(|_, _| Err(Error::conflict("vehicle is used by an active route")));
        let app =
            actix_test::init_service(test_api_app!(ports.into_state(), delete_vehicle)).await;
        let cookie = login_cookie(&app, &owner).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::delete()
                .uri(&format!("/api/v1/vehicles/{}", Uuid::new_v4()))
                .cookie(cookie)
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn list_returns_owned_vehicles() {
        let owner = UserId::random();
        let vehicles = vec![fixtures::vehicle(&owner, 4), fixtures::vehicle(&owner, 2)];
        let mut ports = MockPorts::default();
        ports
            .vehicles
            .expect_list_mine()
            .return_once(move |_| Ok(vehicles));
        let app =
            actix_test::init_service(test_api_app!(ports.into_state(), list_vehicles)).await;
        let cookie = login_cookie(&app, &owner).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/vehicles")
                .cookie(cookie)
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body.as_array().map(Vec::len), Some(2));
    }
}
