//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **memory**: process-local repositories for development and tests
//! - **storage**: uploaded file blobs on the local filesystem
//! - **maps**: Google Geocoding and Directions web services
//!
//! Adapters are thin translators between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod maps;
pub mod memory;
pub mod persistence;
pub mod storage;
