//! Backend configuration loaded via OrthoConfig.
//!
//! Values layer as defaults, then a config file, then `CARPOOL_*`
//! environment variables, then CLI flags.

use std::net::SocketAddr;
use std::path::PathBuf;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::DEFAULT_MAX_UPLOAD_BYTES;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_UPLOAD_DIR: &str = "./uploads";
const DEFAULT_MAPS_BASE_URL: &str = "https://maps.googleapis.com";
const DEFAULT_MAPS_TIMEOUT_SECS: u64 = 10;

/// Runtime settings for the carpool API server.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CARPOOL")]
pub struct BackendSettings {
    /// Listen address, e.g. `0.0.0.0:8080`.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL. Without it the in-memory store is used.
    pub database_url: Option<String>,
    /// Directory uploaded files are written to.
    pub upload_dir: Option<PathBuf>,
    /// Upload size ceiling in bytes.
    pub max_upload_bytes: Option<u64>,
    /// Google Maps web services key. Maps endpoints answer 503 without it.
    pub maps_api_key: Option<String>,
    pub maps_base_url: Option<String>,
    pub maps_timeout_secs: Option<u64>,
    /// Shared secret the gateway presents on the Google sign-in bridge.
    pub gateway_secret: Option<String>,
}

/// Errors raised while interpreting loaded settings.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("invalid bind address '{value}': {message}")]
    BindAddr { value: String, message: String },
    #[error("max_upload_bytes must be greater than zero")]
    ZeroUploadLimit,
}

impl BackendSettings {
    /// Parsed listen address.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        value.parse().map_err(|err: std::net::AddrParseError| SettingsError::BindAddr {
            value: value.to_owned(),
            message: err.to_string(),
        })
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.upload_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR))
    }

    pub fn max_upload_bytes(&self) -> Result<u64, SettingsError> {
        match self.max_upload_bytes {
            Some(0) => Err(SettingsError::ZeroUploadLimit),
            Some(limit) => Ok(limit),
            None => Ok(DEFAULT_MAX_UPLOAD_BYTES),
        }
    }

    pub fn maps_base_url(&self) -> &str {
        self.maps_base_url.as_deref().unwrap_or(DEFAULT_MAPS_BASE_URL)
    }

    pub fn maps_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.maps_timeout_secs.unwrap_or(DEFAULT_MAPS_TIMEOUT_SECS))
    }

    /// Non-blank database URL, if any.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Non-blank maps key, if any.
    pub fn maps_api_key(&self) -> Option<&str> {
        self.maps_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn gateway_secret(&self) -> Option<&str> {
        self.gateway_secret
            .as_deref()
            .filter(|secret| !secret.is_empty())
    }
}
