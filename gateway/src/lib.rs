//! Browser-facing gateway for the carpool API.
//!
//! Serves the same-origin `/api/*` surface: requests are forwarded to the
//! backend's `/api/v1/*` with cookies relayed both ways, and Google sign-in
//! is completed here and bridged into the backend's session cookie.

pub mod config;
pub mod cookie_relay;
pub mod error;
pub mod health;
pub mod oauth;
pub mod proxy;
pub mod server;
pub mod state;
pub mod trace;

pub use error::GatewayError;
pub use state::GatewayState;
pub use trace::{Trace, TraceId};
