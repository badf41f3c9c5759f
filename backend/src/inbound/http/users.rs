//! Account and profile handlers.
//!
//! ```text
//! GET   /api/v1/users/me
//! PATCH /api/v1/users/me {"fullName":"Ada King"}
//! GET   /api/v1/users/{id}
//! PUT   /api/v1/users/me/driver-profile {"licenseNumber":"D1234567"}
//! PUT   /api/v1/users/me/passenger-profile {"emergencyContact":"+15550100","preferences":"No smoking"}
//! ```

use actix_web::{get, patch, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::PublicProfile;
use crate::domain::{
    DriverProfile, Error, LicenseNumber, PassengerProfile, ProfileValidationError, User,
    UserProfileUpdate,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, field_error, parse_user_id, require, user_validation_error,
};

/// Partial profile update body; omitted fields are left untouched.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DriverProfileRequest {
    #[schema(example = "D1234567")]
    pub license_number: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PassengerProfileRequest {
    pub emergency_contact: Option<String>,
    pub preferences: Option<String>,
}

fn map_profile_error(err: ProfileValidationError) -> Error {
    match err {
        ProfileValidationError::InvalidLicenseNumber => {
            field_error("licenseNumber", "invalid_license_number", &err)
        }
        ProfileValidationError::PreferencesTooLong { .. } => {
            field_error("preferences", "too_long", &err)
        }
        ProfileValidationError::EmergencyContact(_) => {
            field_error("emergencyContact", "invalid_phone", &err)
        }
    }
}

/// The signed-in user's account.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "currentUser"
)]
#[get("/users/me")]
pub async fn current_user(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<User>> {
    let user_id = session.require_user_id()?;
    Ok(web::Json(state.accounts.me(&user_id).await?))
}

/// Update name, phone, role, or avatar.
#[utoipa::path(
    patch,
    path = "/api/v1/users/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated user", body = User),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "updateCurrentUser"
)]
#[patch("/users/me")]
pub async fn update_current_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<UpdateProfileRequest>,
) -> ApiResult<web::Json<User>> {
    let user_id = session.require_user_id()?;
    let update = UserProfileUpdate::try_from_parts(
        payload.full_name.as_deref(),
        payload.phone.as_deref(),
        payload.role.as_deref(),
        payload.avatar_url.as_deref(),
    )
    .map_err(user_validation_error)?;
    Ok(web::Json(
        state.accounts.update_profile(&user_id, update).await?,
    ))
}

/// Another user's public profile and rating summary.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Public profile", body = PublicProfile),
        (status = 400, description = "Invalid id", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Unknown user", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "publicProfile"
)]
#[get("/users/{id}")]
pub async fn public_profile(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<PublicProfile>> {
    session.require_user_id()?;
    let user_id = parse_user_id(&path.into_inner(), FieldName::new("id"))?;
    Ok(web::Json(state.accounts.public_profile(&user_id).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/me/driver-profile",
    request_body = DriverProfileRequest,
    responses(
        (status = 200, description = "Driver profile", body = DriverProfile),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Caller is not a driver", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "putDriverProfile"
)]
#[put("/users/me/driver-profile")]
pub async fn put_driver_profile(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<DriverProfileRequest>,
) -> ApiResult<web::Json<DriverProfile>> {
    let user_id = session.require_user_id()?;
    let raw = require(
        payload.into_inner().license_number,
        FieldName::new("licenseNumber"),
    )?;
    let license = LicenseNumber::new(raw).map_err(map_profile_error)?;
    Ok(web::Json(
        state.accounts.upsert_driver_profile(&user_id, license).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/me/driver-profile",
    responses(
        (status = 200, description = "Driver profile", body = DriverProfile),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "No driver profile yet", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "getDriverProfile"
)]
#[get("/users/me/driver-profile")]
pub async fn get_driver_profile(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<DriverProfile>> {
    let user_id = session.require_user_id()?;
    Ok(web::Json(state.accounts.get_driver_profile(&user_id).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/me/passenger-profile",
    request_body = PassengerProfileRequest,
    responses(
        (status = 200, description = "Passenger profile", body = PassengerProfile),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "putPassengerProfile"
)]
#[put("/users/me/passenger-profile")]
pub async fn put_passenger_profile(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<PassengerProfileRequest>,
) -> ApiResult<web::Json<PassengerProfile>> {
    let user_id = session.require_user_id()?;
    let profile = PassengerProfile::try_new(
        user_id,
        payload.emergency_contact.as_deref(),
        payload.preferences.as_deref(),
    )
    .map_err(map_profile_error)?;
    Ok(web::Json(
        state.accounts.upsert_passenger_profile(profile).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/me/passenger-profile",
    responses(
        (status = 200, description = "Passenger profile", body = PassengerProfile),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "No passenger profile yet", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "getPassengerProfile"
)]
#[get("/users/me/passenger-profile")]
pub async fn get_passenger_profile(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<PassengerProfile>> {
    let user_id = session.require_user_id()?;
    Ok(web::Json(
        state.accounts.get_passenger_profile(&user_id).await?,
    ))
}

#[cfg(test)]
mod tests;
