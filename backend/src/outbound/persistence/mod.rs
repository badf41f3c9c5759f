//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Repository implementations only translate between Diesel rows and domain
//! types. Rows (`models.rs`) and table definitions (`schema.rs`) stay private
//! to this module; connections come from a `bb8` pool via `diesel-async`.
//!
//! # Example
//!
//! ```ignore
//! use backend::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/carpool")).await?;
//! let users = DieselUserRepository::new(pool);
//! ```

mod diesel_booking_repository;
mod diesel_error_mapping;
mod diesel_file_repository;
mod diesel_payment_repository;
mod diesel_rating_repository;
mod diesel_route_repository;
mod diesel_user_repository;
mod diesel_vehicle_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_booking_repository::DieselBookingRepository;
pub use diesel_file_repository::DieselFileRepository;
pub use diesel_payment_repository::DieselPaymentRepository;
pub use diesel_rating_repository::DieselRatingRepository;
pub use diesel_route_repository::DieselRouteRepository;
pub use diesel_user_repository::{DieselProfileRepository, DieselUserRepository};
pub use diesel_vehicle_repository::DieselVehicleRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
