//! OpenAPI schema for the error payload.
//!
//! `Error` serialises through a private DTO, so the document describes it
//! with this mirror type instead of deriving `ToSchema` on the domain type.

use utoipa::ToSchema;

use crate::domain::ErrorCode;

/// API error response payload.
#[derive(ToSchema)]
#[schema(as = crate::domain::Error)]
#[schema(rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorSchema {
    /// Stable machine-readable error code.
    #[schema(example = "invalid_request")]
    code: ErrorCode,
    /// Human-readable message.
    #[schema(example = "seats must be between 1 and 4")]
    message: String,
    /// Correlates the failure with server logs.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
    /// Field-level context such as `{ "field": "seats", "code": "out_of_range" }`.
    details: Option<serde_json::Value>,
}
