//! Shared handler state.

use crate::cookie_relay::CookiePolicy;
use crate::oauth::{GoogleBridge, OAUTH_COOKIE_NAME};
use crate::proxy::ProxyClient;

/// Everything the gateway handlers need, built once at startup.
#[derive(Clone)]
pub struct GatewayState {
    pub proxy: ProxyClient,
    /// Present when Google sign-in is configured.
    pub google: Option<GoogleBridge>,
    pub cookie_policy: CookiePolicy,
    /// Where the browser lands after a successful Google sign-in.
    pub post_login_redirect: String,
}

impl GatewayState {
    pub fn new(proxy: ProxyClient, cookie_policy: CookiePolicy) -> Self {
        Self {
            proxy,
            google: None,
            cookie_policy,
            post_login_redirect: "/".to_owned(),
        }
    }

    #[must_use]
    pub fn with_google(mut self, bridge: GoogleBridge) -> Self {
        self.google = Some(bridge);
        self
    }

    #[must_use]
    pub fn with_post_login_redirect(mut self, target: impl Into<String>) -> Self {
        self.post_login_redirect = target.into();
        self
    }

    /// Cookies the gateway sets for itself and never forwards upstream.
    pub fn own_cookie_names(&self) -> [&'static str; 1] {
        [OAUTH_COOKIE_NAME]
    }
}
