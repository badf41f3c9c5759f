//! HTTP inbound adapter exposing the REST API under `/api/v1`.

pub mod auth;
pub mod bookings;
pub mod error;
pub mod health;
pub mod maps;
pub mod payments;
pub mod ratings;
pub mod routes;
pub mod schemas;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod uploads;
pub mod users;
pub mod validation;
pub mod vehicles;

pub use error::ApiResult;
