//! Deterministic carpool demo data generation.
//!
//! This crate generates believable, reproducible drivers, passengers,
//! vehicles, and scheduled routes from a JSON seed registry. It is kept
//! independent of backend domain types to avoid circular dependencies; the
//! backend converts the seed records into validated domain values when it
//! seeds a store.
//!
//! # Example
//!
//! ```
//! use example_data::{SeedRegistry, generate_example_data};
//!
//! let json = r#"{
//!     "version": 1,
//!     "seeds": [{
//!         "name": "test-seed",
//!         "seed": 42,
//!         "driverCount": 2,
//!         "passengerCount": 3,
//!         "routesPerDriver": 2
//!     }]
//! }"#;
//!
//! let registry = SeedRegistry::from_json(json).expect("valid registry");
//! let seed_def = registry.find_seed("test-seed").expect("seed exists");
//! let data = generate_example_data(seed_def).expect("generation succeeds");
//!
//! assert_eq!(data.users.len(), 5);
//! assert_eq!(data.vehicles.len(), 2);
//! assert_eq!(data.routes.len(), 4);
//! ```

mod error;
mod generator;
mod places;
mod registry;
mod seed;
mod validation;

pub use error::{GenerationError, RegistryError};
pub use generator::generate_example_data;
pub use places::{PLACES, place_catalogue};
pub use registry::{SeedDefinition, SeedRegistry};
pub use seed::{
    ExampleData, ExamplePlaceSeed, ExampleRouteSeed, ExampleUserSeed, ExampleVehicleSeed,
    UserRoleSeed,
};
pub use validation::{FULL_NAME_MAX, FULL_NAME_MIN, is_valid_full_name, sanitize_full_name};
