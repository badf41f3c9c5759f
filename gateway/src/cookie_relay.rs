//! Cookie relay between the browser and the backend.
//!
//! The backend issues its session cookie for its own host. The gateway
//! re-issues each upstream `Set-Cookie` for the browser-facing origin and
//! forwards the browser's cookies upstream, minus the ones it owns.

use actix_web::cookie::{Cookie, ParseError};

/// How relayed cookies are re-issued to the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookiePolicy {
    /// Force `Secure` on every relayed cookie.
    pub secure: bool,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RelayError {
    #[error("malformed Set-Cookie header: {0}")]
    Malformed(String),
}

impl From<ParseError> for RelayError {
    fn from(value: ParseError) -> Self {
        Self::Malformed(value.to_string())
    }
}

/// A parsed upstream `Set-Cookie`.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayedCookie {
    cookie: Cookie<'static>,
}

impl RelayedCookie {
    pub fn name(&self) -> &str {
        self.cookie.name()
    }

    pub fn value(&self) -> &str {
        self.cookie.value()
    }

    /// Upstream attributes as received, before re-issuing.
    pub fn upstream(&self) -> &Cookie<'static> {
        &self.cookie
    }

    /// Re-issue the cookie for the browser.
    ///
    /// The upstream `Domain` is dropped so the cookie binds to the gateway's
    /// host, a missing `Path` becomes `/`, and expiry attributes are kept.
    pub fn into_browser_cookie(self, policy: CookiePolicy) -> Cookie<'static> {
        let mut cookie = self.cookie;
        cookie.unset_domain();
        if cookie.path().is_none() {
            cookie.set_path("/");
        }
        if policy.secure {
            cookie.set_secure(true);
        }
        cookie
    }
}

/// Split one `Set-Cookie` header value into name, value and attributes.
///
/// # Examples
/// ```
/// use gateway::cookie_relay::parse_set_cookie;
///
/// let cookie = parse_set_cookie("session=abc; Path=/; HttpOnly").expect("valid");
/// assert_eq!(cookie.name(), "session");
/// assert_eq!(cookie.value(), "abc");
/// ```
pub fn parse_set_cookie(raw: &str) -> Result<RelayedCookie, RelayError> {
    let cookie = Cookie::parse(raw.trim().to_owned())?;
    Ok(RelayedCookie { cookie })
}

/// Build the `Cookie` header sent upstream, skipping `own_cookie_names`.
///
/// Returns `None` when nothing is left to forward.
pub fn upstream_cookie_header(
    request_cookies: &[Cookie<'_>],
    own_cookie_names: &[&str],
) -> Option<String> {
    let pairs: Vec<String> = request_cookies
        .iter()
        .filter(|cookie| !own_cookie_names.contains(&cookie.name()))
        .map(|cookie| format!("{}={}", cookie.name(), cookie.value()))
        .collect();
    (!pairs.is_empty()).then(|| pairs.join("; "))
}
