//! Shared harness for end-to-end HTTP tests over the in-memory store.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{App, test, web};
use mockable::{Clock, DefaultClock};
use serde_json::Value;

use backend::domain::ports::DisabledMapsSource;
use backend::domain::{
    AccountServiceImpl, BookingServiceImpl, MapsServiceImpl, PaymentServiceImpl,
    RatingServiceImpl, RouteServiceImpl, UploadPolicy, UploadPorts, UploadServiceImpl,
    VehicleServiceImpl,
};
use backend::inbound::http::state::{GatewaySecret, HttpState, HttpStatePorts};
use backend::inbound::http::{
    auth, bookings, maps, payments, ratings, routes, uploads, users, validation, vehicles,
};
use backend::outbound::memory::InMemoryStore;

pub const GATEWAY_SECRET: &str = "integration-secret";
pub const MAX_UPLOAD_BYTES: u64 = 64 * 1024;

/// Services over one shared in-memory store.
pub fn memory_state() -> HttpState {
    let store = Arc::new(InMemoryStore::new());
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let ports = HttpStatePorts {
        accounts: Arc::new(AccountServiceImpl::new(
            store.clone(),
            store.clone(),
            store.clone(),
            clock.clone(),
        )),
        vehicles: Arc::new(VehicleServiceImpl::new(
            store.clone(),
            store.clone(),
            store.clone(),
        )),
        routes: Arc::new(RouteServiceImpl::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            Arc::new(DisabledMapsSource),
            clock.clone(),
        )),
        bookings: Arc::new(BookingServiceImpl::new(
            store.clone(),
            store.clone(),
            clock.clone(),
        )),
        payments: Arc::new(PaymentServiceImpl::new(
            store.clone(),
            store.clone(),
            store.clone(),
            clock.clone(),
        )),
        ratings: Arc::new(RatingServiceImpl::new(
            store.clone(),
            store.clone(),
            store.clone(),
            clock.clone(),
        )),
        uploads: Arc::new(UploadServiceImpl::new(
            UploadPorts {
                users: store.clone(),
                profiles: store.clone(),
                files: store.clone(),
                store: store.clone(),
            },
            UploadPolicy::new(MAX_UPLOAD_BYTES),
            clock,
        )),
        maps: Arc::new(MapsServiceImpl::new(Arc::new(DisabledMapsSource))),
    };
    HttpState::new(ports)
        .with_max_upload_bytes(MAX_UPLOAD_BYTES)
        .with_gateway_secret(GatewaySecret::new(GATEWAY_SECRET))
}

/// The full `/api/v1` surface with an insecure cookie session.
pub fn carpool_app(
    state: HttpState,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let session = SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build();
    App::new().app_data(web::Data::new(state)).service(
        web::scope("/api/v1")
            .wrap(session)
            .app_data(validation::json_config())
            .app_data(validation::query_config())
            .app_data(validation::path_config())
            .service(auth::register)
            .service(auth::login)
            .service(auth::logout)
            .service(auth::google_login)
            .service(users::current_user)
            .service(users::update_current_user)
            .service(users::put_driver_profile)
            .service(users::get_driver_profile)
            .service(ratings::user_ratings)
            .service(users::public_profile)
            .service(vehicles::register_vehicle)
            .service(vehicles::list_vehicles)
            .service(vehicles::delete_vehicle)
            .service(routes::create_route)
            .service(routes::search_routes)
            .service(routes::my_routes)
            .service(routes::get_route)
            .service(routes::start_route)
            .service(routes::complete_route)
            .service(routes::cancel_route)
            .service(bookings::request_booking)
            .service(bookings::route_bookings)
            .service(bookings::my_bookings)
            .service(bookings::accept_booking)
            .service(payments::create_payment)
            .service(payments::confirm_payment)
            .service(ratings::create_rating)
            .service(uploads::upload_file)
            .service(uploads::download_file)
            .service(maps::geocode),
    )
}

pub fn session_cookie(response: &ServiceResponse) -> Cookie<'static> {
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned)
        .expect("session cookie")
}

pub async fn read_json(response: ServiceResponse) -> Value {
    let body = test::read_body(response).await;
    serde_json::from_slice(&body).expect("JSON body")
}

/// Register a user and return the session cookie and the new user's id.
pub async fn register<S>(app: &S, email: &str, role: &str) -> (Cookie<'static>, String)
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let response = test::call_service(
        app,
        test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(serde_json::json!({
                "email": email,
                "fullName": "Test Rider",
                "password": "correct horse battery",
                "role": role,
            }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), actix_web::http::StatusCode::CREATED);
    let cookie = session_cookie(&response);
    let body = read_json(response).await;
    let id = body["id"].as_str().expect("user id").to_owned();
    (cookie, id)
}
