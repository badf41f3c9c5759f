//! Carpool gateway entry-point.

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use gateway::config::GatewaySettings;
use gateway::cookie_relay::CookiePolicy;
use gateway::health::HealthState;
use gateway::oauth::{GoogleBridge, GoogleOAuth};
use gateway::proxy::ProxyClient;
use gateway::server::{ServerConfig, create_server};
use gateway::GatewayState;

fn io_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(format!("{context}: {err}"))
}

fn build_state(settings: &GatewaySettings) -> std::io::Result<GatewayState> {
    let backend_url = settings
        .backend_url()
        .map_err(|err| io_error("gateway settings", err))?;
    let proxy = ProxyClient::new(&backend_url, settings.upstream_timeout())
        .map_err(|err| io_error("proxy client", err))?;
    let policy = CookiePolicy {
        secure: settings.cookie_secure(),
    };
    let mut state = GatewayState::new(proxy, policy)
        .with_post_login_redirect(settings.post_login_redirect());

    match settings
        .google()
        .map_err(|err| io_error("gateway settings", err))?
    {
        Some(config) => {
            let oauth = GoogleOAuth::new(config).map_err(|err| io_error("google client", err))?;
            let gateway_secret = settings.gateway_secret().unwrap_or_default().to_owned();
            state = state.with_google(GoogleBridge {
                oauth,
                gateway_secret,
            });
            info!("google sign-in enabled");
        }
        None => warn!("google sign-in is not configured"),
    }
    info!(backend = %backend_url, "proxying /api to backend");
    Ok(state)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = GatewaySettings::load_from_iter(std::env::args_os())
        .map_err(|err| io_error("gateway settings", err))?;
    let bind_addr = settings
        .bind_addr()
        .map_err(|err| io_error("gateway settings", err))?;
    let session_key = settings
        .session_key()
        .map_err(|err| io_error("gateway session key", err))?;
    let state = build_state(&settings)?;

    let health_state = web::Data::new(HealthState::new());
    info!(%bind_addr, "carpool gateway listening");
    create_server(
        health_state,
        ServerConfig {
            bind_addr,
            session_key,
            cookie_secure: settings.cookie_secure(),
            max_body_bytes: settings.max_body_bytes(),
            state,
        },
    )?
    .await
}
