//! Startup seeding orchestration.
//!
//! Seeds are converted into validated domain values and written straight
//! through the repository ports, so the same path fills the in-memory store
//! and PostgreSQL. A seed counts as applied when its first user exists.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use cap_std::{ambient_authority, fs::Dir};
use chrono::{DateTime, Duration, Utc};
use example_data::{
    ExampleData, ExamplePlaceSeed, ExampleRouteSeed, ExampleUserSeed, ExampleVehicleSeed,
    GenerationError, RegistryError, SeedRegistry, UserRoleSeed, generate_example_data,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::ports::{RouteRepository, UserRepository, VehicleRepository};
use crate::domain::{
    Account, AuthProvider, CarpoolRoute, Coordinates, Email, FullName, LicensePlate,
    PasswordHash, PhoneNumber, Place, RouteStatus, User, UserId, UserRole, Vehicle,
};
use crate::example_data::config::ExampleDataSettings;

/// Password every seeded account signs in with.
pub const DEMO_PASSWORD: &str = "carpool-demo";

/// Errors returned while executing startup seeding.
#[derive(Debug, Error)]
pub enum StartupSeedingError {
    #[error("failed to read registry at {path}: {source}")]
    RegistryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("registry parse error: {0}")]
    Registry(#[from] RegistryError),
    #[error("example data generation failed: {0}")]
    Generation(#[from] GenerationError),
    #[error("seed name must not be empty")]
    EmptySeedName,
    #[error("generated record is invalid: {0}")]
    InvalidRecord(String),
    #[error("failed to store example data: {0}")]
    Store(String),
}

/// Repositories the seed is written to.
#[derive(Clone)]
pub struct SeedTargets {
    pub users: Arc<dyn UserRepository>,
    pub vehicles: Arc<dyn VehicleRepository>,
    pub routes: Arc<dyn RouteRepository>,
}

/// What a seeding run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedOutcome {
    Applied {
        users: usize,
        vehicles: usize,
        routes: usize,
    },
    AlreadySeeded,
}

fn invalid(record: &str, err: impl std::fmt::Display) -> StartupSeedingError {
    StartupSeedingError::InvalidRecord(format!("{record}: {err}"))
}

fn store_failed(err: impl std::fmt::Display) -> StartupSeedingError {
    StartupSeedingError::Store(err.to_string())
}

fn to_account(
    seed: &ExampleUserSeed,
    password_hash: &PasswordHash,
    now: DateTime<Utc>,
) -> Result<Account, StartupSeedingError> {
    let user = User {
        id: UserId::from_uuid(seed.id),
        email: Email::new(&seed.email).map_err(|err| invalid("user email", err))?,
        full_name: FullName::new(&seed.full_name).map_err(|err| invalid("user name", err))?,
        phone: Some(PhoneNumber::new(&seed.phone).map_err(|err| invalid("user phone", err))?),
        role: match seed.role {
            UserRoleSeed::Driver => UserRole::Driver,
            UserRoleSeed::Passenger => UserRole::Passenger,
        },
        avatar_url: None,
        provider: AuthProvider::Password,
        created_at: now,
    };
    Ok(Account {
        user,
        password_hash: Some(password_hash.clone()),
        google_subject: None,
    })
}

fn to_vehicle(seed: &ExampleVehicleSeed) -> Result<Vehicle, StartupSeedingError> {
    Ok(Vehicle {
        id: seed.id,
        owner_id: UserId::from_uuid(seed.owner_id),
        make: seed.make.clone(),
        model: seed.model.clone(),
        year: seed.year,
        color: seed.color.clone(),
        plate: LicensePlate::new(&seed.plate).map_err(|err| invalid("vehicle plate", err))?,
        seats: seed.seats,
    })
}

fn to_place(seed: &ExamplePlaceSeed) -> Result<Place, StartupSeedingError> {
    let coordinates =
        Coordinates::new(seed.lat, seed.lng).map_err(|err| invalid("place coordinates", err))?;
    Place::new(&seed.address, Some(coordinates)).map_err(|err| invalid("place address", err))
}

fn to_route(seed: &ExampleRouteSeed, now: DateTime<Utc>) -> Result<CarpoolRoute, StartupSeedingError> {
    Ok(CarpoolRoute {
        id: seed.id,
        driver_id: UserId::from_uuid(seed.driver_id),
        vehicle_id: seed.vehicle_id,
        origin: to_place(&seed.origin)?,
        destination: to_place(&seed.destination)?,
        waypoints: Vec::new(),
        departure_at: now + Duration::hours(i64::from(seed.departure_offset_hours)),
        seats_total: seed.seats_total,
        seats_available: seed.seats_total,
        price_per_seat_cents: seed.price_per_seat_cents,
        status: RouteStatus::Scheduled,
        notes: None,
        created_at: now,
    })
}

/// Write `data` through `targets` unless its first user is already stored.
pub async fn apply_example_data(
    data: &ExampleData,
    targets: &SeedTargets,
    now: DateTime<Utc>,
) -> Result<SeedOutcome, StartupSeedingError> {
    if let Some(first) = data.users.first() {
        let existing = targets
            .users
            .find_by_id(&UserId::from_uuid(first.id))
            .await
            .map_err(store_failed)?;
        if existing.is_some() {
            return Ok(SeedOutcome::AlreadySeeded);
        }
    }

    let password_hash = PasswordHash::hash(DEMO_PASSWORD).map_err(store_failed)?;
    for seed in &data.users {
        let account = to_account(seed, &password_hash, now)?;
        targets.users.create(&account).await.map_err(store_failed)?;
    }
    for seed in &data.vehicles {
        let vehicle = to_vehicle(seed)?;
        targets.vehicles.create(&vehicle).await.map_err(store_failed)?;
    }
    for seed in &data.routes {
        let route = to_route(seed, now)?;
        targets.routes.create(&route).await.map_err(store_failed)?;
    }

    Ok(SeedOutcome::Applied {
        users: data.users.len(),
        vehicles: data.vehicles.len(),
        routes: data.routes.len(),
    })
}

/// Seed the configured store when enabled.
pub async fn seed_example_data_on_startup(
    settings: &ExampleDataSettings,
    targets: &SeedTargets,
) -> Result<Option<SeedOutcome>, StartupSeedingError> {
    if !settings.enabled {
        info!(reason = "disabled", "example data seeding skipped");
        return Ok(None);
    }

    let seed_name = settings.seed_name().trim();
    if seed_name.is_empty() {
        return Err(StartupSeedingError::EmptySeedName);
    }

    let registry = load_registry(&settings.registry_path())?;
    let seed = registry.find_seed(seed_name)?;
    let data = generate_example_data(seed)?;
    let outcome = apply_example_data(&data, targets, Utc::now()).await?;

    match &outcome {
        SeedOutcome::Applied {
            users,
            vehicles,
            routes,
        } => info!(
            seed_key = seed_name,
            users, vehicles, routes, "example data seeding applied"
        ),
        SeedOutcome::AlreadySeeded => {
            warn!(seed_key = seed_name, "example data seed already applied; skipping");
        }
    }
    Ok(Some(outcome))
}

fn load_registry(path: &Path) -> Result<SeedRegistry, StartupSeedingError> {
    let read_error = |source| StartupSeedingError::RegistryRead {
        path: path.to_path_buf(),
        source,
    };
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path.file_name().ok_or_else(|| {
        read_error(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "registry path must be a file",
        ))
    })?;
    let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(read_error)?;
    let contents = dir.read_to_string(Path::new(file_name)).map_err(read_error)?;
    Ok(SeedRegistry::from_json(&contents)?)
}
