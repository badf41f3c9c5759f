//! Authentication handlers.
//!
//! ```text
//! POST /api/v1/auth/register {"email":"ada@example.com","fullName":"Ada Lovelace","password":"correct horse","role":"driver"}
//! POST /api/v1/auth/login    {"email":"ada@example.com","password":"correct horse"}
//! POST /api/v1/auth/logout
//! POST /api/v1/auth/google   (x-gateway-secret header; called by the gateway)
//! ```

use actix_web::{HttpRequest, HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::domain::{
    Error, GoogleIdentity, GoogleIdentityValidationError, LoginCredentials, LoginValidationError,
    Registration, RegistrationParts, RegistrationValidationError, User,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{field_error, user_validation_error};

/// Header carrying the shared secret on the Google bridge endpoint.
pub const GATEWAY_SECRET_HEADER: &str = "x-gateway-secret";

/// Sign-up request body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "Ada Lovelace")]
    pub full_name: String,
    #[schema(example = "correct horse battery")]
    pub password: String,
    #[schema(example = "driver")]
    pub role: String,
    pub phone: Option<String>,
}

/// Login request body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[schema(example = "ada@example.com")]
    pub email: String,
    pub password: String,
}

/// Identity forwarded by the gateway after the OAuth code exchange.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GoogleLoginRequest {
    /// Google account subject (`sub`).
    pub subject: String,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

fn map_registration_error(err: RegistrationValidationError) -> Error {
    match err {
        RegistrationValidationError::User(inner) => user_validation_error(inner),
        RegistrationValidationError::PasswordLength { .. } => {
            field_error("password", "invalid_length", &err)
        }
    }
}

fn map_login_error(err: LoginValidationError) -> Error {
    match err {
        LoginValidationError::InvalidEmail(inner) => user_validation_error(inner),
        LoginValidationError::EmptyPassword => field_error("password", "empty_password", &err),
    }
}

fn map_google_identity_error(err: GoogleIdentityValidationError) -> Error {
    match err {
        GoogleIdentityValidationError::EmptySubject => {
            field_error("subject", "empty_subject", &err)
        }
        GoogleIdentityValidationError::User(inner) => user_validation_error(inner),
    }
}

/// Create a password account and sign it in.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = User,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 409, description = "Email already registered", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "register",
    security([])
)]
#[post("/auth/register")]
pub async fn register(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let body = payload.into_inner();
    let registration = Registration::try_from_parts(RegistrationParts {
        email: &body.email,
        full_name: &body.full_name,
        password: &body.password,
        role: &body.role,
        phone: body.phone.as_deref(),
    })
    .map_err(map_registration_error)?;
    let user = state.accounts.register(registration).await?;
    session.persist_user(&user.id)?;
    info!(user_id = %user.id, "account registered");
    Ok(HttpResponse::Created().json(user))
}

/// Authenticate with email and password and establish a session.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = User,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Invalid credentials", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/auth/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<User>> {
    let credentials = LoginCredentials::try_from_parts(&payload.email, &payload.password)
        .map_err(map_login_error)?;
    let user = state.accounts.login(&credentials).await?;
    session.persist_user(&user.id)?;
    Ok(web::Json(user))
}

/// End the session.
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses((status = 204, description = "Session cleared")),
    tags = ["auth"],
    operation_id = "logout",
    security([])
)]
#[post("/auth/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.purge();
    HttpResponse::NoContent().finish()
}

/// Sign in a Google identity relayed by the gateway.
///
/// The endpoint is only enabled when a gateway secret is configured and the
/// request presents it in `x-gateway-secret`.
#[utoipa::path(
    post,
    path = "/api/v1/auth/google",
    request_body = GoogleLoginRequest,
    params(("x-gateway-secret" = String, Header, description = "Secret shared with the gateway")),
    responses(
        (status = 200, description = "Login success", body = User,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 403, description = "Missing or wrong gateway secret", body = ErrorSchema),
        (status = 404, description = "Google sign-in is not enabled", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "googleLogin",
    security([])
)]
#[post("/auth/google")]
pub async fn google_login(
    request: HttpRequest,
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<GoogleLoginRequest>,
) -> ApiResult<web::Json<User>> {
    let Some(secret) = state.gateway_secret.as_ref() else {
        return Err(Error::not_found("google sign-in is not enabled"));
    };
    let presented = request
        .headers()
        .get(GATEWAY_SECRET_HEADER)
        .map(|value| value.as_bytes())
        .unwrap_or_default();
    if !secret.matches(presented) {
        warn!("google bridge called without a valid gateway secret");
        return Err(Error::forbidden("invalid gateway secret"));
    }

    let body = payload.into_inner();
    let identity = GoogleIdentity::try_from_parts(
        &body.subject,
        &body.email,
        body.name.as_deref(),
        body.picture.as_deref(),
    )
    .map_err(map_google_identity_error)?;
    let user = state.accounts.login_with_google(identity).await?;
    session.persist_user(&user.id)?;
    Ok(web::Json(user))
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
