//! Server construction and middleware wiring.

use std::net::SocketAddr;

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::cookie::{Key, SameSite, time::Duration};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use crate::health::{HealthState, live, ready};
use crate::oauth::{OAUTH_COOKIE_NAME, google_callback, google_start};
use crate::proxy::forward;
use crate::state::GatewayState;
use crate::trace::Trace;

const OAUTH_COOKIE_PATH: &str = "/api/auth/google";
const OAUTH_TTL_MINUTES: i64 = 10;

/// Inputs for [`build_app`], cloned into every worker.
#[derive(Clone)]
pub struct AppDependencies {
    pub health_state: web::Data<HealthState>,
    pub gateway_state: web::Data<GatewayState>,
    pub session_key: Key,
    pub cookie_secure: bool,
    pub max_body_bytes: usize,
}

/// Everything [`create_server`] needs besides the health flags.
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub session_key: Key,
    pub cookie_secure: bool,
    pub max_body_bytes: usize,
    pub state: GatewayState,
}

/// The gateway application: probes, Google sign-in, then the `/api` proxy.
pub fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        gateway_state,
        session_key,
        cookie_secure,
        max_body_bytes,
    } = deps;

    let oauth_session = SessionMiddleware::builder(CookieSessionStore::default(), session_key)
        .cookie_name(OAUTH_COOKIE_NAME.to_owned())
        .cookie_path(OAUTH_COOKIE_PATH.to_owned())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        // Lax so the cookie survives the top-level redirect back from Google.
        .cookie_same_site(SameSite::Lax)
        .session_lifecycle(
            PersistentSession::default().session_ttl(Duration::minutes(OAUTH_TTL_MINUTES)),
        )
        .build();

    App::new()
        .app_data(health_state)
        .app_data(gateway_state)
        .app_data(web::PayloadConfig::new(max_body_bytes))
        .wrap(Trace)
        .service(ready)
        .service(live)
        .service(
            web::scope(OAUTH_COOKIE_PATH)
                .wrap(oauth_session)
                .route("", web::get().to(google_start))
                .route("/callback", web::get().to(google_callback)),
        )
        .route("/api/{tail:.*}", web::to(forward))
}

/// Bind the listener and start serving.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let ServerConfig {
        bind_addr,
        session_key,
        cookie_secure,
        max_body_bytes,
        state,
    } = config;
    let deps = AppDependencies {
        health_state: health_state.clone(),
        gateway_state: web::Data::new(state),
        session_key,
        cookie_secure,
        max_body_bytes,
    };

    let server = HttpServer::new(move || build_app(deps.clone()))
        .bind(bind_addr)?
        .run();
    health_state.mark_ready();
    Ok(server)
}
