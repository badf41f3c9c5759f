//! Deterministic carpool data generation from seed definitions.
//!
//! The same seed definition always produces identical output.

use fake::Fake;
use fake::faker::name::raw::{FirstName, LastName};
use fake::locales::EN;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use uuid::Uuid;

use crate::error::GenerationError;
use crate::places::place_catalogue;
use crate::registry::SeedDefinition;
use crate::seed::{
    ExampleData, ExamplePlaceSeed, ExampleRouteSeed, ExampleUserSeed, ExampleVehicleSeed,
    UserRoleSeed,
};
use crate::validation::{FULL_NAME_MAX, is_valid_full_name, sanitize_full_name};

/// Maximum number of attempts to generate a valid full name.
const MAX_NAME_ATTEMPTS: usize = 100;

const VEHICLE_MODELS: &[(&str, &str)] = &[
    ("Toyota", "Prius"),
    ("Toyota", "Corolla"),
    ("Honda", "Civic"),
    ("Honda", "Odyssey"),
    ("Tesla", "Model 3"),
    ("Tesla", "Model Y"),
    ("Ford", "Escape"),
    ("Subaru", "Outback"),
    ("Hyundai", "Ioniq 5"),
    ("Kia", "Niro"),
];

const VEHICLE_COLORS: &[&str] = &["White", "Black", "Silver", "Blue", "Red", "Grey", "Green"];

const MIN_VEHICLE_YEAR: i32 = 2010;
const MAX_VEHICLE_YEAR: i32 = 2025;
const MIN_VEHICLE_SEATS: u8 = 3;
const MAX_VEHICLE_SEATS: u8 = 6;

/// Departures are spread over the coming week.
const MIN_DEPARTURE_OFFSET_HOURS: u32 = 2;
const MAX_DEPARTURE_OFFSET_HOURS: u32 = 7 * 24;

/// Prices are whole quarters of a dollar between $3 and $25.
const MIN_PRICE_QUARTERS: i64 = 12;
const MAX_PRICE_QUARTERS: i64 = 100;

/// Generates drivers, passengers, vehicles, and routes for a seed definition.
///
/// Drivers come first in `users`, followed by passengers. Each driver owns
/// exactly one vehicle and publishes `routes_per_driver` routes between two
/// distinct catalogue places.
///
/// # Errors
///
/// Returns [`GenerationError`] if a valid full name cannot be produced or the
/// place catalogue is too small to build routes.
///
/// # Example
///
/// ```
/// use example_data::{SeedRegistry, generate_example_data};
///
/// let json = r#"{"version": 1, "seeds": [{"name": "t", "seed": 9,
///     "driverCount": 1, "passengerCount": 1, "routesPerDriver": 1}]}"#;
/// let registry = SeedRegistry::from_json(json).expect("valid");
/// let seed_def = registry.find_seed("t").expect("found");
///
/// let first = generate_example_data(seed_def).expect("generated");
/// let second = generate_example_data(seed_def).expect("generated");
/// assert_eq!(first, second);
/// ```
pub fn generate_example_data(seed_def: &SeedDefinition) -> Result<ExampleData, GenerationError> {
    let places = place_catalogue();
    if seed_def.routes_per_driver() > 0 && places.len() < 2 {
        return Err(GenerationError::NotEnoughPlaces {
            available: places.len(),
        });
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed_def.seed());
    let mut data = ExampleData::default();

    for index in 0..seed_def.driver_count() {
        let driver = generate_user(&mut rng, index, UserRoleSeed::Driver)?;
        let vehicle = generate_vehicle(&mut rng, driver.id);
        for _ in 0..seed_def.routes_per_driver() {
            data.routes
                .push(generate_route(&mut rng, &driver, &vehicle, &places));
        }
        data.vehicles.push(vehicle);
        data.users.push(driver);
    }

    for offset in 0..seed_def.passenger_count() {
        let index = seed_def.driver_count() + offset;
        data.users
            .push(generate_user(&mut rng, index, UserRoleSeed::Passenger)?);
    }

    Ok(data)
}

fn generate_user(
    rng: &mut ChaCha8Rng,
    index: usize,
    role: UserRoleSeed,
) -> Result<ExampleUserSeed, GenerationError> {
    let id = Uuid::from_u128(rng.random());
    let full_name = generate_full_name(rng)?;
    let email = email_for(&full_name, index);
    let phone = format!("+1555{:07}", rng.random_range(0..10_000_000_u32));

    Ok(ExampleUserSeed {
        id,
        email,
        full_name,
        phone,
        role,
    })
}

/// Builds a unique, ASCII-only address from the name and its position.
fn email_for(full_name: &str, index: usize) -> String {
    let local: String = full_name
        .split_whitespace()
        .map(|part| {
            part.chars()
                .filter(char::is_ascii_alphanumeric)
                .collect::<String>()
                .to_ascii_lowercase()
        })
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(".");
    if local.is_empty() {
        format!("user.{index}@example.com")
    } else {
        format!("{local}.{index}@example.com")
    }
}

fn generate_full_name(rng: &mut ChaCha8Rng) -> Result<String, GenerationError> {
    for _ in 0..MAX_NAME_ATTEMPTS {
        let first: String = FirstName(EN).fake_with_rng(rng);
        let last: String = LastName(EN).fake_with_rng(rng);

        let sanitized = sanitize_full_name(&format!("{first} {last}"));
        let truncated: String = sanitized.chars().take(FULL_NAME_MAX).collect();

        if is_valid_full_name(&truncated) {
            return Ok(truncated.trim().to_owned());
        }
    }

    Err(GenerationError::FullNameGenerationFailed {
        max_attempts: MAX_NAME_ATTEMPTS,
    })
}

fn generate_vehicle(rng: &mut ChaCha8Rng, owner_id: Uuid) -> ExampleVehicleSeed {
    let id = Uuid::from_u128(rng.random());
    let (make, model) = VEHICLE_MODELS
        .choose(rng)
        .copied()
        .unwrap_or(("Toyota", "Prius"));
    let color = VEHICLE_COLORS.choose(rng).copied().unwrap_or("White");
    let plate = generate_plate(rng);

    ExampleVehicleSeed {
        id,
        owner_id,
        make: make.to_owned(),
        model: model.to_owned(),
        year: rng.random_range(MIN_VEHICLE_YEAR..=MAX_VEHICLE_YEAR),
        color: color.to_owned(),
        plate,
        seats: rng.random_range(MIN_VEHICLE_SEATS..=MAX_VEHICLE_SEATS),
    }
}

/// Plates follow a `1ABC234` shape, matching California plates.
fn generate_plate(rng: &mut ChaCha8Rng) -> String {
    let mut plate = String::with_capacity(7);
    plate.push(char::from(b'1' + rng.random_range(0..9_u8)));
    for _ in 0..3 {
        plate.push(char::from(b'A' + rng.random_range(0..26_u8)));
    }
    for _ in 0..3 {
        plate.push(char::from(b'0' + rng.random_range(0..10_u8)));
    }
    plate
}

fn generate_route(
    rng: &mut ChaCha8Rng,
    driver: &ExampleUserSeed,
    vehicle: &ExampleVehicleSeed,
    places: &[ExamplePlaceSeed],
) -> ExampleRouteSeed {
    let origin_index = rng.random_range(0..places.len());
    // Shift by a non-zero amount so the destination always differs.
    let destination_index = (origin_index + rng.random_range(1..places.len())) % places.len();

    ExampleRouteSeed {
        id: Uuid::from_u128(rng.random()),
        driver_id: driver.id,
        vehicle_id: vehicle.id,
        origin: places.get(origin_index).cloned().unwrap_or_default(),
        destination: places.get(destination_index).cloned().unwrap_or_default(),
        departure_offset_hours: rng
            .random_range(MIN_DEPARTURE_OFFSET_HOURS..=MAX_DEPARTURE_OFFSET_HOURS),
        seats_total: rng.random_range(1..=vehicle.seats),
        price_per_seat_cents: rng.random_range(MIN_PRICE_QUARTERS..=MAX_PRICE_QUARTERS) * 25,
    }
}
