//! Generated seed record types.
//!
//! These are plain serialisable records, converted into backend domain types
//! at the point of use.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role assigned to a generated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRoleSeed {
    /// Publishes routes and owns a vehicle.
    Driver,
    /// Books seats on routes.
    Passenger,
}

/// A generated user record.
///
/// # Example
///
/// ```
/// use example_data::{ExampleUserSeed, UserRoleSeed};
/// use uuid::Uuid;
///
/// let user = ExampleUserSeed {
///     id: Uuid::nil(),
///     email: "ada.lovelace.0@example.com".to_owned(),
///     full_name: "Ada Lovelace".to_owned(),
///     phone: "+15550000000".to_owned(),
///     role: UserRoleSeed::Driver,
/// };
///
/// assert_eq!(user.role, UserRoleSeed::Driver);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleUserSeed {
    /// Unique identifier for the user.
    pub id: Uuid,
    /// Login email, unique per generated data set.
    pub email: String,
    /// Human-readable full name.
    pub full_name: String,
    /// Contact phone number in E.164 form.
    pub phone: String,
    /// Role of the user.
    pub role: UserRoleSeed,
}

/// A generated vehicle owned by a driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleVehicleSeed {
    /// Unique identifier for the vehicle.
    pub id: Uuid,
    /// Owning driver.
    pub owner_id: Uuid,
    /// Manufacturer.
    pub make: String,
    /// Model name.
    pub model: String,
    /// Model year.
    pub year: i32,
    /// Paint colour.
    pub color: String,
    /// Licence plate, normalised (uppercase, no separators).
    pub plate: String,
    /// Passenger seats available (driver excluded).
    pub seats: u8,
}

/// A place with fixed coordinates.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamplePlaceSeed {
    /// Street address as shown to users.
    pub address: String,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

/// A generated scheduled route.
///
/// Departure is expressed as an offset so that generation stays deterministic
/// regardless of when the data is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleRouteSeed {
    /// Unique identifier for the route.
    pub id: Uuid,
    /// Publishing driver.
    pub driver_id: Uuid,
    /// Vehicle used for the trip.
    pub vehicle_id: Uuid,
    /// Start of the trip.
    pub origin: ExamplePlaceSeed,
    /// End of the trip.
    pub destination: ExamplePlaceSeed,
    /// Hours after load time at which the route departs.
    pub departure_offset_hours: u32,
    /// Seats offered.
    pub seats_total: u8,
    /// Price per seat in cents.
    pub price_per_seat_cents: i64,
}

/// A complete generated data set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleData {
    /// Drivers followed by passengers.
    pub users: Vec<ExampleUserSeed>,
    /// One vehicle per driver.
    pub vehicles: Vec<ExampleVehicleSeed>,
    /// Scheduled routes.
    pub routes: Vec<ExampleRouteSeed>,
}
