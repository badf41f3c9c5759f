//! Multipart upload handlers.
//!
//! The `file` part is read chunk by chunk and rejected as soon as it passes
//! the configured ceiling, so oversized bodies are never buffered whole.

use actix_multipart::{Field, Multipart};
use actix_web::http::header;
use actix_web::{HttpResponse, delete, get, post, web};
use futures_util::TryStreamExt;
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::domain::ports::UploadRequest;
use crate::domain::{Error, StoredFile, UploadPurpose, UploadValidationError};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, field_error, parse_uuid, require};

const FILE_FIELD: &str = "file";
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Default, Deserialize, Serialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UploadQuery {
    /// `avatar`, `license`, or `vehicle`.
    pub purpose: Option<String>,
}

fn upload_error(field: &str, err: UploadValidationError) -> Error {
    let code = match err {
        UploadValidationError::Empty => "empty",
        UploadValidationError::TooLarge { .. } => "too_large",
        UploadValidationError::UnsupportedContentType(_) => "unsupported_type",
        UploadValidationError::UnknownPurpose(_) => "unknown_purpose",
    };
    field_error(field, code, err)
}

fn multipart_error(err: actix_multipart::MultipartError) -> Error {
    debug!(error = %err, "malformed multipart body");
    field_error(FILE_FIELD, "malformed", format!("malformed multipart body: {err}"))
}

async fn read_capped(mut field: Field, max_bytes: u64) -> Result<Vec<u8>, Error> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.try_next().await.map_err(multipart_error)? {
        let total = bytes.len().saturating_add(chunk.len());
        if u64::try_from(total).unwrap_or(u64::MAX) > max_bytes {
            return Err(upload_error(
                FILE_FIELD,
                UploadValidationError::TooLarge { max_bytes },
            ));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

/// Pull the `file` part out of the body, skipping any other parts.
async fn read_file_part(
    mut payload: Multipart,
    purpose: UploadPurpose,
    max_bytes: u64,
) -> Result<UploadRequest, Error> {
    while let Some(field) = payload.try_next().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field
            .content_disposition()
            .and_then(|disposition| disposition.get_filename())
            .unwrap_or(FILE_FIELD)
            .to_owned();
        let content_type = field
            .content_type()
            .map_or_else(|| FALLBACK_CONTENT_TYPE.to_owned(), |mime| mime.essence_str().to_owned());
        let bytes = read_capped(field, max_bytes).await?;
        return Ok(UploadRequest {
            purpose,
            file_name,
            content_type,
            bytes,
        });
    }
    Err(field_error(
        FILE_FIELD,
        "missing_field",
        "missing required multipart field: file",
    ))
}

/// Upload an avatar, licence scan, or vehicle photo.
#[utoipa::path(
    post,
    path = "/api/v1/uploads",
    params(UploadQuery),
    request_body(content = String, content_type = "multipart/form-data", description = "Multipart body with a `file` part"),
    responses(
        (status = 201, description = "File stored", body = StoredFile),
        (status = 400, description = "Missing, empty, oversized, or unsupported file", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 409, description = "Licence upload without a driver profile", body = ErrorSchema)
    ),
    tags = ["uploads"],
    operation_id = "uploadFile"
)]
#[post("/uploads")]
pub async fn upload_file(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<UploadQuery>,
    payload: Multipart,
) -> ApiResult<HttpResponse> {
    let owner = session.require_user_id()?;
    let purpose = require(query.into_inner().purpose, FieldName::new("purpose"))?
        .parse::<UploadPurpose>()
        .map_err(|err| upload_error("purpose", err))?;
    let request = read_file_part(payload, purpose, state.max_upload_bytes).await?;
    let stored = state.uploads.store(&owner, request).await?;
    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, stored.url()))
        .json(stored))
}

/// Serve stored bytes with their recorded content type.
#[utoipa::path(
    get,
    path = "/api/v1/uploads/{id}",
    params(("id" = String, Path, description = "File id")),
    responses(
        (status = 200, description = "File bytes"),
        (status = 403, description = "Not visible to the caller", body = ErrorSchema),
        (status = 404, description = "Unknown file", body = ErrorSchema)
    ),
    tags = ["uploads"],
    operation_id = "downloadFile"
)]
#[get("/uploads/{id}")]
pub async fn download_file(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let requester = session.require_user_id()?;
    let id: Uuid = parse_uuid(&path.into_inner(), FieldName::new("id"))?;
    let download = state.uploads.fetch(&requester, &id).await?;
    Ok(HttpResponse::Ok()
        .content_type(download.file.content_type.as_str())
        .insert_header((header::CACHE_CONTROL, "private, max-age=3600"))
        .body(download.bytes))
}

#[utoipa::path(
    delete,
    path = "/api/v1/uploads/{id}",
    params(("id" = String, Path, description = "File id")),
    responses(
        (status = 204, description = "File deleted"),
        (status = 403, description = "Not the owner", body = ErrorSchema),
        (status = 404, description = "Unknown file", body = ErrorSchema)
    ),
    tags = ["uploads"],
    operation_id = "deleteFile"
)]
#[delete("/uploads/{id}")]
pub async fn delete_file(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let owner = session.require_user_id()?;
    let id = parse_uuid(&path.into_inner(), FieldName::new("id"))?;
    state.uploads.delete(&owner, &id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use rstest::rstest;

    use super::*;
    use crate::domain::ports::FileDownload;
    use crate::domain::{UserId, fixtures};
    use crate::inbound::http::test_utils::{MockPorts, login_cookie, read_json, test_api_app};

    const BOUNDARY: &str = "carpool-test-boundary";

    fn multipart_body(field: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Vec<u8> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload_request(uri: &str, body: Vec<u8>) -> actix_test::TestRequest {
        actix_test::TestRequest::post()
            .uri(uri)
            .insert_header((
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            ))
            .set_payload(body)
    }

    fn stored(owner: &UserId, purpose: UploadPurpose, size: u64) -> StoredFile {
        let id = Uuid::new_v4();
        StoredFile {
            id,
            owner_id: owner.clone(),
            purpose,
            original_name: "face.png".into(),
            stored_name: format!("{id}.png"),
            content_type: "image/png".into(),
            size_bytes: size,
            created_at: fixtures::now(),
        }
    }

    #[actix_web::test]
    async fn upload_forwards_file_part() {
        let owner = UserId::random();
        let file = stored(&owner, UploadPurpose::Avatar, 4);
        let mut ports = MockPorts::default();
        ports
            .uploads
            .expect_store()
            .withf(|_, request| {
                request.purpose == UploadPurpose::Avatar
                    && request.file_name == "face.png"
                    && request.content_type == "image/png"
                    && request.bytes == b"\x89PNG"
            })
            .return_once(move |_, _| Ok(file));
        let app = actix_test::init_service(test_api_app!(ports.into_state(), upload_file)).await;
        let cookie = login_cookie(&app, &owner).await;

        let response = actix_test::call_service(
            &app,
            upload_request(
                "/api/v1/uploads?purpose=avatar",
                multipart_body("file", "face.png", "image/png", b"\x89PNG"),
            )
            .cookie(cookie)
            .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
            .expect("location header");
        let body = read_json(response).await;
        assert_eq!(body["purpose"], "avatar");
        let id = body["id"].as_str().expect("id");
        assert_eq!(location, format!("/api/v1/uploads/{id}"));
    }

    #[rstest]
    #[case::unknown_purpose("/api/v1/uploads?purpose=selfie", "file", 4, "purpose", "unknown_purpose")]
    #[case::missing_purpose("/api/v1/uploads", "file", 4, "purpose", "missing_field")]
    #[case::wrong_part("/api/v1/uploads?purpose=avatar", "photo", 4, "file", "missing_field")]
    #[case::too_large("/api/v1/uploads?purpose=avatar", "file", 64, "file", "too_large")]
    #[actix_web::test]
    async fn upload_rejects_bad_requests(
        #[case] uri: &str,
        #[case] part: &str,
        #[case] size: usize,
        #[case] field: &str,
        #[case] code: &str,
    ) {
        let state = MockPorts::default().into_state().with_max_upload_bytes(16);
        let app = actix_test::init_service(test_api_app!(state, upload_file)).await;
        let cookie = login_cookie(&app, &UserId::random()).await;

        let response = actix_test::call_service(
            &app,
            upload_request(uri, multipart_body(part, "face.png", "image/png", &vec![7; size]))
                .cookie(cookie)
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_json(response).await;
        assert_eq!(body["details"]["field"], field);
        assert_eq!(body["details"]["code"], code);
    }

    #[actix_web::test]
    async fn download_serves_bytes_with_content_type() {
        let owner = UserId::random();
        let file = stored(&owner, UploadPurpose::Avatar, 4);
        let id = file.id;
        let mut ports = MockPorts::default();
        ports.uploads.expect_fetch().return_once(move |_, _| {
            Ok(FileDownload {
                file,
                bytes: b"\x89PNG".to_vec(),
            })
        });
        let app = actix_test::init_service(test_api_app!(ports.into_state(), download_file)).await;
        let cookie = login_cookie(&app, &owner).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri(&format!("/api/v1/uploads/{id}"))
                .cookie(cookie)
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).map(|v| v.as_bytes()),
            Some(&b"image/png"[..])
        );
        let body = actix_test::read_body(response).await;
        assert_eq!(&body[..], b"\x89PNG");
    }

    #[actix_web::test]
    async fn delete_by_stranger_is_forbidden() {
        let mut ports = MockPorts::default();
        ports
            .uploads
            .expect_delete()
            .return_once(|_, _| Err(Error::forbidden("only the owner can delete a file")));
        let app = actix_test::init_service(test_api_app!(ports.into_state(), delete_file)).await;
        let cookie = login_cookie(&app, &UserId::random()).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::delete()
                .uri(&format!("/api/v1/uploads/{}", Uuid::new_v4()))
                .cookie(cookie)
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
