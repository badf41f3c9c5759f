//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{HttpResponse, test, web};
use serde_json::Value;

use crate::domain::ports::{
    MockAccountService, MockBookingService, MockMapsService, MockPaymentService,
    MockRatingService, MockRouteService, MockUploadService, MockVehicleService,
};
use crate::domain::{Error, UserId};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::{HttpState, HttpStatePorts};

/// Path of the helper route that signs a user in without credentials.
pub const TEST_LOGIN_PATH: &str = "/test-login/{id}";

/// Session middleware with a fresh key, cookie `session`, and no `Secure` flag.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Handler mounted at [`TEST_LOGIN_PATH`].
pub async fn test_login(
    session: SessionContext,
    path: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let user_id = UserId::new(path.into_inner())
        .map_err(|err| Error::invalid_request(err.to_string()))?;
    session.persist_user(&user_id)?;
    Ok(HttpResponse::NoContent().finish())
}

/// Sign `user_id` in through the helper route and return the session cookie.
pub async fn login_cookie<S>(app: &S, user_id: &UserId) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let request = test::TestRequest::post()
        .uri(&format!("/test-login/{user_id}"))
        .to_request();
    let response = test::call_service(app, request).await;
    assert!(response.status().is_success(), "test login failed");
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned)
        .expect("session cookie")
}

/// Decode a JSON response body.
pub async fn read_json(response: ServiceResponse) -> Value {
    let body = test::read_body(response).await;
    serde_json::from_slice(&body).expect("JSON body")
}

/// Mocks for every driving port; set expectations on the ones a test uses.
#[derive(Default)]
pub struct MockPorts {
    pub accounts: MockAccountService,
    pub vehicles: MockVehicleService,
    pub routes: MockRouteService,
    pub bookings: MockBookingService,
    pub payments: MockPaymentService,
    pub ratings: MockRatingService,
    pub uploads: MockUploadService,
    pub maps: MockMapsService,
}

impl MockPorts {
    pub fn into_state(self) -> HttpState {
        HttpState::new(HttpStatePorts {
            accounts: Arc::new(self.accounts),
            vehicles: Arc::new(self.vehicles),
            routes: Arc::new(self.routes),
            bookings: Arc::new(self.bookings),
            payments: Arc::new(self.payments),
            ratings: Arc::new(self.ratings),
            uploads: Arc::new(self.uploads),
            maps: Arc::new(self.maps),
        })
    }
}

/// Build an app with the session middleware, the login helper, and `services`
/// mounted under `/api/v1`.
macro_rules! test_api_app {
    ($state:expr, $($service:expr),+ $(,)?) => {
        actix_web::App::new()
            .app_data(actix_web::web::Data::new($state))
            .wrap($crate::inbound::http::test_utils::test_session_middleware())
            .route(
                $crate::inbound::http::test_utils::TEST_LOGIN_PATH,
                actix_web::web::post().to($crate::inbound::http::test_utils::test_login),
            )
            .service(
                actix_web::web::scope("/api/v1")
                    .app_data($crate::inbound::http::validation::json_config())
                    .app_data($crate::inbound::http::validation::query_config())
                    .app_data($crate::inbound::http::validation::path_config())
                    $(.service($service))+
            )
    };
}
pub(crate) use test_api_app;
