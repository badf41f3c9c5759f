//! Payment handlers.
//!
//! ```text
//! POST /api/v1/payments {"bookingId":"…","method":"card","currency":"USD"}
//! GET  /api/v1/payments/mine
//! POST /api/v1/payments/{id}/confirm
//! POST /api/v1/payments/{id}/refund
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::ports::PaymentRequest;
use crate::domain::{Currency, Error, Payment, PaymentMethod, PaymentValidationError};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, field_error, parse_uuid, require};

/// Payment creation body; `currency` defaults to USD.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub booking_id: Option<String>,
    #[schema(example = "card")]
    pub method: Option<String>,
    #[schema(example = "USD")]
    pub currency: Option<String>,
}

fn payment_error(field: &str, err: PaymentValidationError) -> Error {
    let code = match err {
        PaymentValidationError::InvalidCurrency => "invalid_currency",
        PaymentValidationError::InvalidMethod => "invalid_method",
        PaymentValidationError::AmountOverflow => "out_of_range",
    };
    field_error(field, code, err)
}

fn parse_request(body: CreatePaymentRequest) -> Result<PaymentRequest, Error> {
    let booking_id = require(body.booking_id, FieldName::new("bookingId"))?;
    let method = require(body.method, FieldName::new("method"))?;
    let currency = body
        .currency
        .map(Currency::new)
        .transpose()
        .map_err(|err| payment_error("currency", err))?
        .unwrap_or_default();
    Ok(PaymentRequest {
        booking_id: parse_uuid(&booking_id, FieldName::new("bookingId"))?,
        method: method
            .parse::<PaymentMethod>()
            .map_err(|err| payment_error("method", err))?,
        currency,
    })
}

/// Pay for an accepted booking. The amount is seats times the route's price.
#[utoipa::path(
    post,
    path = "/api/v1/payments",
    request_body = CreatePaymentRequest,
    responses(
        (status = 201, description = "Payment recorded", body = Payment),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 403, description = "Not the booking's passenger", body = ErrorSchema),
        (status = 409, description = "Booking not accepted or already paid", body = ErrorSchema)
    ),
    tags = ["payments"],
    operation_id = "createPayment"
)]
#[post("/payments")]
pub async fn create_payment(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreatePaymentRequest>,
) -> ApiResult<HttpResponse> {
    let payer = session.require_user_id()?;
    let request = parse_request(payload.into_inner())?;
    let payment = state.payments.create(&payer, request).await?;
    Ok(HttpResponse::Created().json(payment))
}

/// Payments the caller made or received.
#[utoipa::path(
    get,
    path = "/api/v1/payments/mine",
    responses(
        (status = 200, description = "Payments", body = [Payment]),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["payments"],
    operation_id = "myPayments"
)]
#[get("/payments/mine")]
pub async fn my_payments(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<Payment>>> {
    let user = session.require_user_id()?;
    Ok(web::Json(state.payments.list_mine(&user).await?))
}

fn payment_id(path: web::Path<String>) -> Result<Uuid, Error> {
    parse_uuid(&path.into_inner(), FieldName::new("id"))
}

/// Driver confirms receipt.
#[utoipa::path(
    post,
    path = "/api/v1/payments/{id}/confirm",
    params(("id" = String, Path, description = "Payment id")),
    responses(
        (status = 200, description = "Payment completed", body = Payment),
        (status = 403, description = "Not the payee", body = ErrorSchema),
        (status = 409, description = "Payment is not pending", body = ErrorSchema)
    ),
    tags = ["payments"],
    operation_id = "confirmPayment"
)]
#[post("/payments/{id}/confirm")]
pub async fn confirm_payment(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Payment>> {
    let payee = session.require_user_id()?;
    let id = payment_id(path)?;
    Ok(web::Json(state.payments.confirm(&payee, &id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/payments/{id}/refund",
    params(("id" = String, Path, description = "Payment id")),
    responses(
        (status = 200, description = "Payment refunded", body = Payment),
        (status = 403, description = "Not the payee", body = ErrorSchema),
        (status = 409, description = "Payment is not completed", body = ErrorSchema)
    ),
    tags = ["payments"],
    operation_id = "refundPayment"
)]
#[post("/payments/{id}/refund")]
pub async fn refund_payment(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Payment>> {
    let payee = session.require_user_id()?;
    let id = payment_id(path)?;
    Ok(web::Json(state.payments.refund(&payee, &id).await?))
}
