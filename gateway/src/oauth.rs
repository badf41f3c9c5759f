//! Google sign-in bridged into the backend's cookie session.
//!
//! `GET /api/auth/google` starts an authorisation-code flow with PKCE and
//! parks the CSRF state and verifier in the gateway's private
//! `gateway_oauth` cookie. The callback checks the state, exchanges the
//! code, reads the Google profile, and hands the identity to the backend's
//! bridge endpoint with the shared gateway secret. The backend's session
//! cookie is relayed to the browser.

use actix_session::Session;
use actix_web::http::header;
use actix_web::{HttpResponse, web};
use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

use crate::error::GatewayError;
use crate::proxy::relay_set_cookies;
use crate::state::GatewayState;

/// Cookie holding the pending authorisation.
pub const OAUTH_COOKIE_NAME: &str = "gateway_oauth";
/// Header the backend checks on its Google bridge.
pub const GATEWAY_SECRET_HEADER: &str = "x-gateway-secret";

const PENDING_KEY: &str = "google";
const BRIDGE_PATH: &str = "auth/google";
const SCOPES: [&str; 3] = ["openid", "email", "profile"];

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

type ConfiguredClient = oauth2::Client<
    oauth2::basic::BasicErrorResponse,
    oauth2::basic::BasicTokenResponse,
    oauth2::basic::BasicTokenIntrospectionResponse,
    oauth2::StandardRevocableToken,
    oauth2::basic::BasicRevocationErrorResponse,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

/// Google client registration and endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: Url,
    pub auth_url: Url,
    pub token_url: Url,
    pub userinfo_url: Url,
}

/// Profile returned by the userinfo endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GoogleIdentity {
    pub id: String,
    pub email: String,
    pub verified_email: Option<bool>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Body of the backend's `POST /api/v1/auth/google`.
#[derive(Debug, Serialize)]
struct BridgeRequest<'a> {
    subject: &'a str,
    email: &'a str,
    name: Option<&'a str>,
    picture: Option<&'a str>,
}

impl<'a> From<&'a GoogleIdentity> for BridgeRequest<'a> {
    fn from(identity: &'a GoogleIdentity) -> Self {
        Self {
            subject: &identity.id,
            email: &identity.email,
            name: identity.name.as_deref(),
            picture: identity.picture.as_deref(),
        }
    }
}

/// A started authorisation: where to send the browser and what to remember.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAuthorization {
    pub csrf_state: String,
    pub pkce_verifier: String,
}

/// Google OAuth client plus the HTTP client used for token and profile calls.
#[derive(Clone)]
pub struct GoogleOAuth {
    client: ConfiguredClient,
    http: reqwest::Client,
    userinfo_url: Url,
}

impl GoogleOAuth {
    pub fn new(config: GoogleOAuthConfig) -> Result<Self, GatewayError> {
        let client = BasicClient::new(ClientId::new(config.client_id))
            .set_client_secret(ClientSecret::new(config.client_secret))
            .set_auth_uri(AuthUrl::from_url(config.auth_url))
            .set_token_uri(TokenUrl::from_url(config.token_url))
            .set_redirect_uri(RedirectUrl::from_url(config.redirect_url));
        // Token endpoints must not be followed through redirects.
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self {
            client,
            http,
            userinfo_url: config.userinfo_url,
        })
    }

    /// Authorisation URL with `openid email profile` scopes and an S256 challenge.
    pub fn authorize(&self) -> (Url, PendingAuthorization) {
        let (challenge, verifier) = PkceCodeChallenge::new_random_sha256();
        let (url, csrf) = self
            .client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(SCOPES.iter().map(|scope| Scope::new((*scope).to_owned())))
            .set_pkce_challenge(challenge)
            .url();
        let pending = PendingAuthorization {
            csrf_state: csrf.secret().clone(),
            pkce_verifier: verifier.secret().clone(),
        };
        (url, pending)
    }

    /// Trade `code` for an access token and fetch the profile.
    pub async fn exchange(&self, code: &str, verifier: String) -> Result<GoogleIdentity, GatewayError> {
        let token = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_owned()))
            .set_pkce_verifier(PkceCodeVerifier::new(verifier))
            .request_async(&self.http)
            .await
            .map_err(|err| GatewayError::OAuth(format!("token exchange: {err}")))?;

        let identity: GoogleIdentity = self
            .http
            .get(self.userinfo_url.clone())
            .bearer_auth(token.access_token().secret())
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| GatewayError::OAuth(format!("userinfo: {err}")))?
            .json()
            .await
            .map_err(|err| GatewayError::OAuth(format!("userinfo body: {err}")))?;
        if identity.verified_email == Some(false) {
            return Err(GatewayError::OAuth(format!(
                "email {} is not verified",
                identity.email
            )));
        }
        Ok(identity)
    }
}

/// Google client paired with the secret the backend expects.
#[derive(Clone)]
pub struct GoogleBridge {
    pub oauth: GoogleOAuth,
    pub gateway_secret: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

fn bridge(state: &GatewayState) -> Result<&GoogleBridge, GatewayError> {
    state
        .google
        .as_ref()
        .ok_or_else(|| GatewayError::Config("google sign-in is not configured".to_owned()))
}

fn session_error(err: impl std::fmt::Display) -> GatewayError {
    GatewayError::Session(err.to_string())
}

/// `GET /api/auth/google`: redirect to Google.
pub async fn google_start(
    session: Session,
    state: web::Data<GatewayState>,
) -> Result<HttpResponse, GatewayError> {
    let bridge = bridge(&state)?;
    let (url, pending) = bridge.oauth.authorize();
    session.insert(PENDING_KEY, &pending).map_err(session_error)?;
    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, url.to_string()))
        .finish())
}

/// `GET /api/auth/google/callback`: finish sign-in and relay the session.
pub async fn google_callback(
    query: web::Query<CallbackQuery>,
    session: Session,
    state: web::Data<GatewayState>,
) -> Result<HttpResponse, GatewayError> {
    let bridge = bridge(&state)?;
    let CallbackQuery {
        code,
        state: returned_state,
        error,
    } = query.into_inner();

    // The pending authorisation is single-use whatever happens next.
    let pending = session
        .remove_as::<PendingAuthorization>(PENDING_KEY)
        .and_then(Result::ok);
    if let Some(error) = error {
        warn!(%error, "google denied authorisation");
        return Err(GatewayError::bad_request(format!("google sign-in was not completed: {error}")));
    }
    let pending = pending.ok_or_else(|| GatewayError::bad_request("no sign-in in progress"))?;
    if returned_state.as_deref() != Some(pending.csrf_state.as_str()) {
        return Err(GatewayError::bad_request("oauth state mismatch"));
    }
    let code = code.ok_or_else(|| GatewayError::bad_request("missing authorisation code"))?;

    let identity = bridge.oauth.exchange(&code, pending.pkce_verifier).await?;
    let upstream = state
        .proxy
        .post_json(
            BRIDGE_PATH,
            &BridgeRequest::from(&identity),
            &[(GATEWAY_SECRET_HEADER, bridge.gateway_secret.as_str())],
        )
        .await?;
    if !upstream.is_success() {
        return Err(GatewayError::UpstreamStatus {
            status: upstream.status,
            body: String::from_utf8_lossy(&upstream.body).into_owned(),
        });
    }
    info!(email = %identity.email, "google sign-in bridged");

    session.purge();
    let mut response = HttpResponse::Found();
    response.insert_header((header::LOCATION, state.post_login_redirect.clone()));
    relay_set_cookies(&mut response, &upstream, state.cookie_policy);
    Ok(response.finish())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rstest::rstest;

    use super::*;

    fn config() -> GoogleOAuthConfig {
        GoogleOAuthConfig {
            client_id: "client-123".to_owned(),
            client_secret: "shh".to_owned(),
            redirect_url: Url::parse("https://carpool.example.com/api/auth/google/callback")
                .expect("url"),
            auth_url: Url::parse(GOOGLE_AUTH_URL).expect("url"),
            token_url: Url::parse(GOOGLE_TOKEN_URL).expect("url"),
            userinfo_url: Url::parse(GOOGLE_USERINFO_URL).expect("url"),
        }
    }

    #[rstest]
    fn authorisation_url_requests_pkce_and_profile_scopes() {
        let oauth = GoogleOAuth::new(config()).expect("client");

        let (url, pending) = oauth.authorize();

        let params: HashMap<String, String> = url.query_pairs().into_owned().collect();
        assert_eq!(url.host_str(), Some("accounts.google.com"));
        assert_eq!(params.get("response_type").map(String::as_str), Some("code"));
        assert_eq!(params.get("client_id").map(String::as_str), Some("client-123"));
        assert_eq!(params.get("scope").map(String::as_str), Some("openid email profile"));
        assert_eq!(params.get("code_challenge_method").map(String::as_str), Some("S256"));
        assert_eq!(params.get("state"), Some(&pending.csrf_state));
        assert!(!pending.pkce_verifier.is_empty());
    }

    #[rstest]
    fn each_authorisation_gets_fresh_state() {
        let oauth = GoogleOAuth::new(config()).expect("client");

        let (_, first) = oauth.authorize();
        let (_, second) = oauth.authorize();

        assert_ne!(first.csrf_state, second.csrf_state);
        assert_ne!(first.pkce_verifier, second.pkce_verifier);
    }

    #[rstest]
    fn bridge_request_carries_the_google_subject() {
        let identity = GoogleIdentity {
            id: "1090".to_owned(),
            email: "gail@example.com".to_owned(),
            verified_email: Some(true),
            name: Some("Gail".to_owned()),
            picture: None,
        };

        let body = serde_json::to_value(BridgeRequest::from(&identity)).expect("json");

        assert_eq!(
            body,
            serde_json::json!({
                "subject": "1090",
                "email": "gail@example.com",
                "name": "Gail",
                "picture": null,
            })
        );
    }
}
