//! Gateway configuration loaded via OrthoConfig.
//!
//! Values layer as defaults, then a config file, then `GATEWAY_*`
//! environment variables, then CLI flags.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use actix_web::cookie::Key;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use tracing::warn;
use url::Url;
use zeroize::Zeroize;

use crate::oauth::{GOOGLE_AUTH_URL, GOOGLE_TOKEN_URL, GOOGLE_USERINFO_URL, GoogleOAuthConfig};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_POST_LOGIN_REDIRECT: &str = "/";
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;
const SESSION_KEY_MIN_LEN: usize = 64;

/// Runtime settings for the browser-facing gateway.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "GATEWAY")]
pub struct GatewaySettings {
    pub bind_addr: Option<String>,
    /// Base URL of the carpool backend, e.g. `http://backend:8080`.
    pub backend_url: Option<String>,
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    /// Public callback URL registered with Google.
    pub google_redirect_url: Option<String>,
    pub google_auth_url: Option<String>,
    pub google_token_url: Option<String>,
    pub google_userinfo_url: Option<String>,
    /// Shared secret presented to the backend's Google bridge.
    pub gateway_secret: Option<String>,
    pub post_login_redirect: Option<String>,
    pub upstream_timeout_secs: Option<u64>,
    /// Largest request body forwarded upstream.
    pub max_body_bytes: Option<usize>,
    /// Mark relayed and gateway cookies `Secure`. Defaults to true.
    pub cookie_secure: Option<bool>,
    /// Key material for the `gateway_oauth` cookie.
    pub session_key_file: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("invalid bind address '{value}': {message}")]
    BindAddr { value: String, message: String },
    #[error("backend_url is required")]
    MissingBackendUrl,
    #[error("invalid {field} '{value}': {message}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        message: String,
    },
    #[error("google sign-in needs {missing} as well")]
    IncompleteGoogle { missing: &'static str },
    #[error("session key {path} is {length} bytes; at least {min_len} are required")]
    KeyTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
    #[error("failed to read session key {path}: {message}")]
    KeyRead { path: PathBuf, message: String },
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|raw| raw.trim()).filter(|raw| !raw.is_empty())
}

fn parse_url(field: &'static str, value: &str) -> Result<Url, SettingsError> {
    Url::parse(value).map_err(|err| SettingsError::InvalidUrl {
        field,
        value: value.to_owned(),
        message: err.to_string(),
    })
}

impl GatewaySettings {
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        value.parse().map_err(|err: std::net::AddrParseError| SettingsError::BindAddr {
            value: value.to_owned(),
            message: err.to_string(),
        })
    }

    pub fn backend_url(&self) -> Result<Url, SettingsError> {
        let raw = non_blank(self.backend_url.as_ref()).ok_or(SettingsError::MissingBackendUrl)?;
        parse_url("backend_url", raw)
    }

    pub fn gateway_secret(&self) -> Option<&str> {
        non_blank(self.gateway_secret.as_ref())
    }

    pub fn post_login_redirect(&self) -> &str {
        non_blank(self.post_login_redirect.as_ref()).unwrap_or(DEFAULT_POST_LOGIN_REDIRECT)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(
            self.upstream_timeout_secs
                .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT_SECS),
        )
    }

    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes.unwrap_or(DEFAULT_MAX_BODY_BYTES)
    }

    pub fn cookie_secure(&self) -> bool {
        self.cookie_secure.unwrap_or(true)
    }

    /// Google client settings, or `None` when sign-in is not configured.
    ///
    /// A client id without its secret, redirect URL, or gateway secret is
    /// rejected rather than silently disabled.
    pub fn google(&self) -> Result<Option<GoogleOAuthConfig>, SettingsError> {
        let Some(client_id) = non_blank(self.google_client_id.as_ref()) else {
            return Ok(None);
        };
        let client_secret = non_blank(self.google_client_secret.as_ref()).ok_or(
            SettingsError::IncompleteGoogle {
                missing: "google_client_secret",
            },
        )?;
        let redirect = non_blank(self.google_redirect_url.as_ref()).ok_or(
            SettingsError::IncompleteGoogle {
                missing: "google_redirect_url",
            },
        )?;
        if self.gateway_secret().is_none() {
            return Err(SettingsError::IncompleteGoogle {
                missing: "gateway_secret",
            });
        }
        let endpoint = |field, value: Option<&String>, default| {
            parse_url(field, non_blank(value).unwrap_or(default))
        };
        Ok(Some(GoogleOAuthConfig {
            client_id: client_id.to_owned(),
            client_secret: client_secret.to_owned(),
            redirect_url: parse_url("google_redirect_url", redirect)?,
            auth_url: endpoint("google_auth_url", self.google_auth_url.as_ref(), GOOGLE_AUTH_URL)?,
            token_url: endpoint(
                "google_token_url",
                self.google_token_url.as_ref(),
                GOOGLE_TOKEN_URL,
            )?,
            userinfo_url: endpoint(
                "google_userinfo_url",
                self.google_userinfo_url.as_ref(),
                GOOGLE_USERINFO_URL,
            )?,
        }))
    }

    /// Key for the private OAuth cookie.
    ///
    /// Without a key file a random key is generated; pending sign-ins then
    /// do not survive a restart or span replicas.
    pub fn session_key(&self) -> Result<Key, SettingsError> {
        let Some(path) = self.session_key_file.clone() else {
            warn!("no gateway session key file configured; using a temporary key");
            return Ok(Key::generate());
        };
        let mut bytes = std::fs::read(&path).map_err(|err| SettingsError::KeyRead {
            path: path.clone(),
            message: err.to_string(),
        })?;
        let length = bytes.len();
        if length < SESSION_KEY_MIN_LEN {
            bytes.zeroize();
            return Err(SettingsError::KeyTooShort {
                path,
                length,
                min_len: SESSION_KEY_MIN_LEN,
            });
        }
        let key = Key::derive_from(&bytes);
        bytes.zeroize();
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;
    use std::io::Write;

    use env_lock::lock_env;
    use rstest::rstest;

    use super::*;

    const VARS: [&str; 14] = [
        "GATEWAY_BIND_ADDR",
        "GATEWAY_BACKEND_URL",
        "GATEWAY_GOOGLE_CLIENT_ID",
        "GATEWAY_GOOGLE_CLIENT_SECRET",
        "GATEWAY_GOOGLE_REDIRECT_URL",
        "GATEWAY_GOOGLE_AUTH_URL",
        "GATEWAY_GOOGLE_TOKEN_URL",
        "GATEWAY_GOOGLE_USERINFO_URL",
        "GATEWAY_GATEWAY_SECRET",
        "GATEWAY_POST_LOGIN_REDIRECT",
        "GATEWAY_UPSTREAM_TIMEOUT_SECS",
        "GATEWAY_MAX_BODY_BYTES",
        "GATEWAY_COOKIE_SECURE",
        "GATEWAY_SESSION_KEY_FILE",
    ];

    fn with_env(vars: &[(&'static str, &str)]) -> Vec<(&'static str, Option<String>)> {
        VARS.iter()
            .map(|name| {
                let value = vars
                    .iter()
                    .find(|(key, _)| key == name)
                    .map(|(_, value)| (*value).to_owned());
                (*name, value)
            })
            .collect()
    }

    fn load() -> GatewaySettings {
        GatewaySettings::load_from_iter([OsString::from("carpool-gateway")]).expect("settings load")
    }

    #[rstest]
    fn defaults_apply() {
        let _guard = lock_env(with_env(&[("GATEWAY_BACKEND_URL", "http://backend:8080")]));

        let settings = load();

        assert_eq!(settings.bind_addr(), Ok("0.0.0.0:3000".parse().expect("addr")));
        assert_eq!(
            settings.backend_url().map(String::from),
            Ok("http://backend:8080/".to_owned())
        );
        assert_eq!(settings.post_login_redirect(), "/");
        assert_eq!(settings.upstream_timeout(), Duration::from_secs(30));
        assert!(settings.cookie_secure());
        assert_eq!(settings.google(), Ok(None));
    }

    #[rstest]
    fn backend_url_is_required() {
        let _guard = lock_env(with_env(&[]));

        assert_eq!(load().backend_url(), Err(SettingsError::MissingBackendUrl));
    }

    #[rstest]
    #[case::no_secret(&[("GATEWAY_GOOGLE_REDIRECT_URL", "https://app/cb"), ("GATEWAY_GATEWAY_SECRET", "s")], "google_client_secret")]
    #[case::no_redirect(&[("GATEWAY_GOOGLE_CLIENT_SECRET", "x"), ("GATEWAY_GATEWAY_SECRET", "s")], "google_redirect_url")]
    #[case::no_gateway_secret(&[("GATEWAY_GOOGLE_CLIENT_SECRET", "x"), ("GATEWAY_GOOGLE_REDIRECT_URL", "https://app/cb")], "gateway_secret")]
    fn partial_google_settings_are_rejected(
        #[case] vars: &[(&'static str, &str)],
        #[case] missing: &'static str,
    ) {
        let mut all = vec![("GATEWAY_GOOGLE_CLIENT_ID", "client")];
        all.extend_from_slice(vars);
        let _guard = lock_env(with_env(&all));

        assert_eq!(
            load().google().map(|config| config.is_some()),
            Err(SettingsError::IncompleteGoogle { missing })
        );
    }

    #[rstest]
    fn complete_google_settings_use_default_endpoints() {
        let _guard = lock_env(with_env(&[
            ("GATEWAY_GOOGLE_CLIENT_ID", "client"),
            ("GATEWAY_GOOGLE_CLIENT_SECRET", "secret"),
            ("GATEWAY_GOOGLE_REDIRECT_URL", "https://app.example.com/api/auth/google/callback"),
            ("GATEWAY_GATEWAY_SECRET", "bridge"),
        ]));

        let config = load().google().expect("valid").expect("configured");

        assert_eq!(config.client_id, "client");
        assert_eq!(config.token_url.as_str(), GOOGLE_TOKEN_URL);
        assert_eq!(config.userinfo_url.as_str(), GOOGLE_USERINFO_URL);
    }

    #[rstest]
    fn short_session_keys_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(&[7_u8; 16]).expect("write key");
        let path = file.path().to_string_lossy().into_owned();
        let _guard = lock_env(with_env(&[("GATEWAY_SESSION_KEY_FILE", path.as_str())]));

        assert!(matches!(
            load().session_key(),
            Err(SettingsError::KeyTooShort { length: 16, .. })
        ));
    }

    #[rstest]
    fn session_key_file_is_used() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(&[9_u8; 64]).expect("write key");
        let path = file.path().to_string_lossy().into_owned();
        let _guard = lock_env(with_env(&[("GATEWAY_SESSION_KEY_FILE", path.as_str())]));

        let key = load().session_key().expect("key");

        assert_eq!(key.master(), Key::derive_from(&[9_u8; 64]).master());
    }
}
