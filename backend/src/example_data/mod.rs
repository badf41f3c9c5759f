//! Startup wiring for demo data seeding.

mod config;
mod startup;

pub use config::ExampleDataSettings;
pub use startup::{
    DEMO_PASSWORD, SeedOutcome, SeedTargets, StartupSeedingError, apply_example_data,
    seed_example_data_on_startup,
};
