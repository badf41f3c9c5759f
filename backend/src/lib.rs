//! Carpool backend library modules.
//!
//! The crate follows a hexagonal layout: [`domain`] owns entities, services
//! and ports; [`inbound`] adapts HTTP requests onto the driving ports; and
//! [`outbound`] implements the driven ports for PostgreSQL, the in-memory
//! store, local file storage and the Google Maps web services.

pub mod doc;
pub mod domain;
#[cfg(feature = "example-data")]
pub mod example_data;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
