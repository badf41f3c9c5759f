//! Tests for the account and profile handlers.

use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use rstest::rstest;
use serde_json::{Value, json};

use super::*;
use crate::domain::fixtures;
use crate::domain::{RatingSummary, UserId, UserRole};
use crate::inbound::http::test_utils::{MockPorts, login_cookie, read_json, test_api_app};

#[actix_web::test]
async fn current_user_requires_session() {
    let app = actix_test::init_service(test_api_app!(
        MockPorts::default().into_state(),
        current_user
    ))
    .await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get().uri("/api/v1/users/me").to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = read_json(response).await;
    assert_eq!(body["code"], "unauthorized");
}

#[actix_web::test]
async fn current_user_returns_session_account() {
    let user = fixtures::user(UserRole::Passenger, "lin@example.com");
    let user_id = user.id.clone();
    let expected_id = user_id.clone();
    let mut ports = MockPorts::default();
    ports
        .accounts
        .expect_me()
        .withf(move |id| *id == expected_id)
        .return_once(move |_| Ok(user));
    let app = actix_test::init_service(test_api_app!(ports.into_state(), current_user)).await;
    let cookie = login_cookie(&app, &user_id).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/users/me")
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["email"], "lin@example.com");
    assert_eq!(body["role"], "passenger");
}

#[rstest]
#[case::bad_phone(json!({"phone": "12"}), "phone", "invalid_phone")]
#[case::bad_avatar(json!({"avatarUrl": "javascript:alert(1)"}), "avatarUrl", "invalid_url")]
#[actix_web::test]
async fn update_rejects_invalid_fields(
    #[case] payload: Value,
    #[case] field: &str,
    #[case] code: &str,
) {
    let app = actix_test::init_service(test_api_app!(
        MockPorts::default().into_state(),
        update_current_user
    ))
    .await;
    let cookie = login_cookie(&app, &UserId::random()).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::patch()
            .uri("/api/v1/users/me")
            .cookie(cookie)
            .set_json(payload)
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["details"]["field"], field);
    assert_eq!(body["details"]["code"], code);
}

#[actix_web::test]
async fn public_profile_hides_contact_details() {
    let other = UserId::random();
    let profile = PublicProfile {
        id: other.clone(),
        full_name: "Sam Driver".into(),
        role: UserRole::Driver,
        avatar_url: None,
        rating: RatingSummary {
            user_id: other.clone(),
            average: Some(4.5),
            count: 2,
        },
    };
    let mut ports = MockPorts::default();
    ports
        .accounts
        .expect_public_profile()
        .return_once(move |_| Ok(profile));
    let app = actix_test::init_service(test_api_app!(ports.into_state(), public_profile)).await;
    let cookie = login_cookie(&app, &UserId::random()).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri(&format!("/api/v1/users/{other}"))
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["fullName"], "Sam Driver");
    assert_eq!(body["rating"]["count"], 2);
    assert!(body.get("email").is_none());
    assert!(body.get("phone").is_none());
}

#[actix_web::test]
async fn public_profile_rejects_malformed_id() {
    let app = actix_test::init_service(test_api_app!(
        MockPorts::default().into_state(),
        public_profile
    ))
    .await;
    let cookie = login_cookie(&app, &UserId::random()).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/users/not-a-uuid")
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["details"]["code"], "invalid_uuid");
}

#[rstest]
#[case::missing(json!({}), "missing_field")]
#[case::malformed(json!({"licenseNumber": "x"}), "invalid_license_number")]
#[actix_web::test]
async fn driver_profile_validates_license(#[case] payload: Value, #[case] code: &str) {
    let app = actix_test::init_service(test_api_app!(
        MockPorts::default().into_state(),
        put_driver_profile
    ))
    .await;
    let cookie = login_cookie(&app, &UserId::random()).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::put()
            .uri("/api/v1/users/me/driver-profile")
            .cookie(cookie)
            .set_json(payload)
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["details"]["field"], "licenseNumber");
    assert_eq!(body["details"]["code"], code);
}

#[actix_web::test]
async fn driver_profile_upsert_normalises_license() {
    let user_id = UserId::random();
    let mut ports = MockPorts::default();
    ports
        .accounts
        .expect_upsert_driver_profile()
        .withf(|_, license| license.as_ref() == "D123-4567")
        .return_once(|user_id, license| Ok(DriverProfile::new(user_id.clone(), license)));
    let app =
        actix_test::init_service(test_api_app!(ports.into_state(), put_driver_profile)).await;
    let cookie = login_cookie(&app, &user_id).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::put()
            .uri("/api/v1/users/me/driver-profile")
            .cookie(cookie)
            .set_json(json!({"licenseNumber": " d123-4567 "}))
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["licenseNumber"], "D123-4567");
    assert_eq!(body["verified"], false);
}

#[actix_web::test]
async fn passenger_profile_round_trips_through_service() {
    let user_id = UserId::random();
    let mut ports = MockPorts::default();
    ports
        .accounts
        .expect_upsert_passenger_profile()
        .return_once(Ok);
    let app =
        actix_test::init_service(test_api_app!(ports.into_state(), put_passenger_profile)).await;
    let cookie = login_cookie(&app, &user_id).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::put()
            .uri("/api/v1/users/me/passenger-profile")
            .cookie(cookie)
            .set_json(json!({"emergencyContact": "+1 555 010 0999", "preferences": "Quiet ride"}))
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["userId"], Value::from(user_id.to_string()));
    assert_eq!(body["preferences"], "Quiet ride");
}
