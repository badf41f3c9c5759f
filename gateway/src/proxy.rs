//! Same-origin `/api/*` forwarding to the backend.
//!
//! `/api/{tail}` maps to `{backend}/api/v1/{tail}` with method, query, body
//! and the browser's cookies preserved. Upstream status, body and selected
//! headers come back unchanged apart from `Set-Cookie`, which is re-issued
//! through [`crate::cookie_relay`].

use std::time::Duration;

use actix_web::cookie::Cookie;
use actix_web::http::StatusCode;
use actix_web::http::header::{self, HeaderMap};
use actix_web::{HttpRequest, HttpResponse, HttpResponseBuilder, web};
use reqwest::header::{HeaderName as UpstreamHeaderName, HeaderValue as UpstreamHeaderValue};
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::cookie_relay::{CookiePolicy, parse_set_cookie, upstream_cookie_header};
use crate::error::GatewayError;
use crate::state::GatewayState;
use crate::trace::{TRACE_ID_HEADER, TraceId};

const UPSTREAM_PREFIX: &str = "api/v1/";
const BROWSER_PREFIX: &str = "/api/";

/// Request headers copied upstream as-is.
const FORWARDED_REQUEST_HEADERS: [&str; 3] = ["content-type", "accept", "accept-language"];
/// Response headers copied back to the browser as-is.
const FORWARDED_RESPONSE_HEADERS: [&str; 3] = ["content-type", "cache-control", "content-disposition"];

/// HTTP client bound to one backend.
#[derive(Debug, Clone)]
pub struct ProxyClient {
    http: reqwest::Client,
    api_base: Url,
}

/// Backend answer ready to be relayed.
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: u16,
    pub headers: reqwest::header::HeaderMap,
    pub body: web::Bytes,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Raw `Set-Cookie` values.
    pub fn set_cookies(&self) -> impl Iterator<Item = &str> {
        self.headers
            .get_all(reqwest::header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
    }
}

/// Reject tails that could climb out of the `/api/v1/` prefix.
fn validate_tail(tail: &str) -> Result<&str, GatewayError> {
    let tail = tail.trim_start_matches('/');
    let escapes = tail
        .split('/')
        .any(|segment| segment == ".." || segment == "." || segment.contains('\\'));
    if escapes || tail.contains("%2e") || tail.contains("%2E") {
        return Err(GatewayError::bad_request("invalid API path"));
    }
    Ok(tail)
}

/// Rewrite a backend `Location` into the browser-facing namespace.
pub fn browser_location(location: &str) -> String {
    location
        .strip_prefix("/api/v1/")
        .map_or_else(|| location.to_owned(), |rest| format!("{BROWSER_PREFIX}{rest}"))
}

impl ProxyClient {
    /// Client for `backend_url` with a per-request `timeout`.
    pub fn new(backend_url: &Url, timeout: Duration) -> Result<Self, GatewayError> {
        let mut base = backend_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let api_base = base
            .join(UPSTREAM_PREFIX)
            .map_err(|err| GatewayError::Config(format!("invalid backend URL: {err}")))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { http, api_base })
    }

    /// Upstream URL for a browser `/api/{tail}` request.
    pub fn upstream_url(&self, tail: &str, query: &str) -> Result<Url, GatewayError> {
        let tail = validate_tail(tail)?;
        let mut url = self
            .api_base
            .join(tail)
            .map_err(|_| GatewayError::bad_request("invalid API path"))?;
        if !url.path().starts_with(self.api_base.path()) {
            return Err(GatewayError::bad_request("invalid API path"));
        }
        url.set_query((!query.is_empty()).then_some(query));
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, url);
        match TraceId::current() {
            Some(trace_id) => builder.header(TRACE_ID_HEADER, trace_id.to_string()),
            None => builder,
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<UpstreamResponse, GatewayError> {
        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }

    /// Forward a browser request upstream.
    pub async fn forward(
        &self,
        req: &HttpRequest,
        tail: &str,
        body: web::Bytes,
        own_cookie_names: &[&str],
    ) -> Result<UpstreamResponse, GatewayError> {
        let url = self.upstream_url(tail, req.query_string())?;
        let method = reqwest::Method::from_bytes(req.method().as_str().as_bytes())
            .map_err(|_| GatewayError::bad_request("unsupported method"))?;
        debug!(%method, upstream = %url, "forwarding request");

        let mut builder = self.request(method, url);
        builder = copy_request_headers(builder, req.headers());
        let cookies: Vec<Cookie<'static>> = req
            .cookies()
            .map(|cookies| cookies.to_vec())
            .unwrap_or_default();
        if let Some(cookie_header) = upstream_cookie_header(&cookies, own_cookie_names) {
            builder = builder.header(reqwest::header::COOKIE, cookie_header);
        }
        if !body.is_empty() {
            builder = builder.body(body);
        }
        self.send(builder).await
    }

    /// POST a JSON body to `{backend}/api/v1/{path}` with extra headers.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
        headers: &[(&'static str, &str)],
    ) -> Result<UpstreamResponse, GatewayError> {
        let url = self.upstream_url(path, "")?;
        let mut builder = self.request(reqwest::Method::POST, url).json(body);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        self.send(builder).await
    }
}

fn copy_request_headers(
    mut builder: reqwest::RequestBuilder,
    headers: &HeaderMap,
) -> reqwest::RequestBuilder {
    for name in FORWARDED_REQUEST_HEADERS {
        let Some(value) = headers.get(name) else { continue };
        let Ok(value) = UpstreamHeaderValue::from_bytes(value.as_bytes()) else {
            continue;
        };
        builder = builder.header(UpstreamHeaderName::from_static(name), value);
    }
    builder
}

/// Attach every upstream `Set-Cookie` to `builder`, re-issued for the browser.
pub fn relay_set_cookies(
    builder: &mut HttpResponseBuilder,
    upstream: &UpstreamResponse,
    policy: CookiePolicy,
) {
    for raw in upstream.set_cookies() {
        match parse_set_cookie(raw) {
            Ok(cookie) => {
                builder.cookie(cookie.into_browser_cookie(policy));
            }
            Err(error) => warn!(%error, "dropping upstream cookie"),
        }
    }
}

/// Turn an upstream answer into the browser response.
pub fn into_browser_response(upstream: UpstreamResponse, policy: CookiePolicy) -> HttpResponse {
    let status = StatusCode::from_u16(upstream.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut builder = HttpResponse::build(status);
    for name in FORWARDED_RESPONSE_HEADERS {
        if let Some(value) = upstream.headers.get(name).and_then(|v| v.to_str().ok()) {
            builder.insert_header((name, value.to_owned()));
        }
    }
    if let Some(location) = upstream
        .headers
        .get(reqwest::header::LOCATION)
        .and_then(|value| value.to_str().ok())
    {
        builder.insert_header((header::LOCATION, browser_location(location)));
    }
    relay_set_cookies(&mut builder, &upstream, policy);
    builder.body(upstream.body)
}

/// Catch-all `/api/{tail}` handler.
pub async fn forward(
    req: HttpRequest,
    tail: web::Path<String>,
    body: web::Bytes,
    state: web::Data<GatewayState>,
) -> Result<HttpResponse, GatewayError> {
    let upstream = state
        .proxy
        .forward(&req, &tail, body, &state.own_cookie_names())
        .await?;
    Ok(into_browser_response(upstream, state.cookie_policy))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn client(base: &str) -> ProxyClient {
        ProxyClient::new(&Url::parse(base).expect("url"), Duration::from_secs(5)).expect("client")
    }

    #[rstest]
    #[case::plain("http://backend:8080", "routes", "", "http://backend:8080/api/v1/routes")]
    #[case::query("http://backend:8080", "routes", "minSeats=2", "http://backend:8080/api/v1/routes?minSeats=2")]
    #[case::nested("http://backend:8080/", "bookings/42/accept", "", "http://backend:8080/api/v1/bookings/42/accept")]
    #[case::base_path("http://internal/carpool", "users/me", "", "http://internal/carpool/api/v1/users/me")]
    fn upstream_urls_live_under_api_v1(
        #[case] base: &str,
        #[case] tail: &str,
        #[case] query: &str,
        #[case] expected: &str,
    ) {
        let url = client(base).upstream_url(tail, query).expect("url");
        assert_eq!(url.as_str(), expected);
    }

    #[rstest]
    #[case::parent("../admin")]
    #[case::nested_parent("routes/../../health")]
    #[case::encoded("%2e%2e/admin")]
    #[case::backslash("routes\\..\\x")]
    fn escaping_tails_are_rejected(#[case] tail: &str) {
        assert!(matches!(
            client("http://backend:8080").upstream_url(tail, ""),
            Err(GatewayError::BadRequest(_))
        ));
    }

    #[rstest]
    #[case::backend("/api/v1/uploads/7", "/api/uploads/7")]
    #[case::foreign("https://cdn.example.com/a.png", "https://cdn.example.com/a.png")]
    fn locations_are_rewritten(#[case] location: &str, #[case] expected: &str) {
        assert_eq!(browser_location(location), expected);
    }

    #[rstest]
    fn browser_response_relays_status_body_and_cookies() {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            UpstreamHeaderValue::from_static("application/json"),
        );
        headers.append(
            reqwest::header::SET_COOKIE,
            UpstreamHeaderValue::from_static("session=abc; Domain=backend; Path=/; HttpOnly"),
        );
        headers.append(
            reqwest::header::SET_COOKIE,
            UpstreamHeaderValue::from_static("=broken"),
        );
        let upstream = UpstreamResponse {
            status: 201,
            headers,
            body: web::Bytes::from_static(br#"{"id":"1"}"#),
        };

        let response = into_browser_response(upstream, CookiePolicy { secure: true });

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()),
            Some("application/json")
        );
        let cookies: Vec<_> = response.cookies().collect();
        assert_eq!(cookies.len(), 1);
        let session = cookies.first().expect("session cookie");
        assert_eq!(session.name(), "session");
        assert_eq!(session.domain(), None);
        assert_eq!(session.secure(), Some(true));
    }
}
