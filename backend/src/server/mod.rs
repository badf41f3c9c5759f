//! Server construction and middleware wiring.

mod config;
#[cfg(feature = "metrics")]
mod metrics;
mod state_builders;

pub use config::ServerConfig;
pub(crate) use state_builders::{Adapters, StateOptions, build_http_state, build_maps_source};

#[cfg(feature = "metrics")]
pub(crate) use metrics::prometheus_metrics;
#[cfg(feature = "metrics")]
use metrics::MetricsLayer;

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use backend::Trace;
#[cfg(debug_assertions)]
use backend::doc::ApiDoc;
use backend::inbound::http::auth::{google_login, login, logout, register};
use backend::inbound::http::bookings::{
    accept_booking, cancel_booking, my_bookings, reject_booking, request_booking, route_bookings,
};
use backend::inbound::http::health::{HealthState, live, ready};
use backend::inbound::http::maps::{directions, geocode};
use backend::inbound::http::payments::{
    confirm_payment, create_payment, my_payments, refund_payment,
};
use backend::inbound::http::ratings::{create_rating, user_ratings};
use backend::inbound::http::routes::{
    cancel_route, complete_route, create_route, get_route, my_routes, route_directions,
    search_routes, start_route, update_route,
};
use backend::inbound::http::state::HttpState;
use backend::inbound::http::uploads::{delete_file, download_file, upload_file};
use backend::inbound::http::validation::{json_config, path_config, query_config};
use backend::inbound::http::users::{
    current_user, get_driver_profile, get_passenger_profile, public_profile, put_driver_profile,
    put_passenger_profile, update_current_user,
};
use backend::inbound::http::vehicles::{
    delete_vehicle, get_vehicle, list_vehicles, register_vehicle, update_vehicle,
};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

const SESSION_TTL_HOURS: i64 = 2;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    key: Key,
    cookie_secure: bool,
    same_site: SameSite,
}

/// Register every `/api/v1` handler. Literal segments (`/routes/mine`,
/// `/users/me`) go before their `{id}` siblings.
fn api_scope() -> actix_web::Scope {
    web::scope("/api/v1")
        .app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .service(register)
        .service(login)
        .service(logout)
        .service(google_login)
        .service(current_user)
        .service(update_current_user)
        .service(put_driver_profile)
        .service(get_driver_profile)
        .service(put_passenger_profile)
        .service(get_passenger_profile)
        .service(user_ratings)
        .service(public_profile)
        .service(register_vehicle)
        .service(list_vehicles)
        .service(get_vehicle)
        .service(update_vehicle)
        .service(delete_vehicle)
        .service(create_route)
        .service(search_routes)
        .service(my_routes)
        .service(get_route)
        .service(update_route)
        .service(start_route)
        .service(complete_route)
        .service(cancel_route)
        .service(route_directions)
        .service(request_booking)
        .service(route_bookings)
        .service(my_bookings)
        .service(accept_booking)
        .service(reject_booking)
        .service(cancel_booking)
        .service(create_payment)
        .service(my_payments)
        .service(confirm_payment)
        .service(refund_payment)
        .service(create_rating)
        .service(upload_file)
        .service(download_file)
        .service(delete_file)
        .service(geocode)
        .service(directions)
}

fn build_app(
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
        http_state,
        key,
        cookie_secure,
        same_site,
    } = deps;

    let session = SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".into())
        .cookie_path("/".into())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(same_site)
        .session_lifecycle(
            PersistentSession::default()
                .session_ttl(actix_web::cookie::time::Duration::hours(SESSION_TTL_HOURS)),
        )
        .build();

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(Trace)
        .service(api_scope().wrap(session))
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Bind the listener and start serving.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let ServerConfig {
        key,
        cookie_secure,
        same_site,
        bind_addr,
        http_state,
        #[cfg(feature = "metrics")]
        prometheus,
    } = config;
    let http_state = web::Data::new(http_state);

    #[cfg(feature = "metrics")]
    let metrics_layer = MetricsLayer::from_option(prometheus);

    let server = HttpServer::new(move || {
        let app = build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            key: key.clone(),
            cookie_secure,
            same_site,
        });

        #[cfg(feature = "metrics")]
        let app = app.wrap(metrics_layer.clone());

        app
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
