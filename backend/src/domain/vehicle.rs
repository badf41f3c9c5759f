//! Vehicles registered by drivers.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::user::UserId;

/// Earliest accepted model year.
pub const VEHICLE_YEAR_MIN: i32 = 1980;
/// Maximum length of make, model and colour.
pub const VEHICLE_TEXT_MAX: usize = 50;
/// Largest accepted passenger seat count.
pub const VEHICLE_SEATS_MAX: u8 = 8;

/// Validation errors for vehicle fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VehicleValidationError {
    EmptyField { field: &'static str },
    FieldTooLong { field: &'static str, max: usize },
    InvalidPlate,
    YearOutOfRange { min: i32, max: i32 },
    SeatsOutOfRange { max: u8 },
}

impl fmt::Display for VehicleValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyField { field } => write!(f, "{field} must not be empty"),
            Self::FieldTooLong { field, max } => {
                write!(f, "{field} must be at most {max} characters")
            }
            Self::InvalidPlate => write!(f, "plate must contain 2 to 10 letters or digits"),
            Self::YearOutOfRange { min, max } => {
                write!(f, "year must be between {min} and {max}")
            }
            Self::SeatsOutOfRange { max } => write!(f, "seats must be between 1 and {max}"),
        }
    }
}

impl std::error::Error for VehicleValidationError {}

impl VehicleValidationError {
    /// JSON field name the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyField { field } | Self::FieldTooLong { field, .. } => field,
            Self::InvalidPlate => "plate",
            Self::YearOutOfRange { .. } => "year",
            Self::SeatsOutOfRange { .. } => "seats",
        }
    }
}

/// Licence plate with spaces and dashes removed, upper-cased.
///
/// ```
/// use backend::domain::LicensePlate;
///
/// assert_eq!(LicensePlate::new("7abc-123").unwrap().as_ref(), "7ABC123");
/// assert!(LicensePlate::new("X").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LicensePlate(String);

impl LicensePlate {
    /// Validate and normalise a plate.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, VehicleValidationError> {
        let compact: String = raw
            .as_ref()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-'))
            .map(|c| c.to_ascii_uppercase())
            .collect();
        let valid = (2..=10).contains(&compact.len()) && compact.chars().all(|c| c.is_ascii_alphanumeric());
        if !valid {
            return Err(VehicleValidationError::InvalidPlate);
        }
        Ok(Self(compact))
    }
}

impl AsRef<str> for LicensePlate {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<LicensePlate> for String {
    fn from(value: LicensePlate) -> Self {
        value.0
    }
}

impl TryFrom<String> for LicensePlate {
    type Error = VehicleValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

fn validate_text(field: &'static str, raw: &str) -> Result<String, VehicleValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(VehicleValidationError::EmptyField { field });
    }
    if trimmed.chars().count() > VEHICLE_TEXT_MAX {
        return Err(VehicleValidationError::FieldTooLong {
            field,
            max: VEHICLE_TEXT_MAX,
        });
    }
    Ok(trimmed.to_owned())
}

fn validate_year(year: i32, current_year: i32) -> Result<i32, VehicleValidationError> {
    let max = current_year + 1;
    if !(VEHICLE_YEAR_MIN..=max).contains(&year) {
        return Err(VehicleValidationError::YearOutOfRange {
            min: VEHICLE_YEAR_MIN,
            max,
        });
    }
    Ok(year)
}

fn validate_seats(seats: u8) -> Result<u8, VehicleValidationError> {
    if !(1..=VEHICLE_SEATS_MAX).contains(&seats) {
        return Err(VehicleValidationError::SeatsOutOfRange {
            max: VEHICLE_SEATS_MAX,
        });
    }
    Ok(seats)
}

/// A driver's vehicle.
///
/// `seats` counts passenger seats; the driver's seat is excluded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: Uuid,
    #[schema(value_type = String)]
    pub owner_id: UserId,
    #[schema(example = "Toyota")]
    pub make: String,
    #[schema(example = "Prius")]
    pub model: String,
    #[schema(example = 2021)]
    pub year: i32,
    #[schema(example = "Silver")]
    pub color: String,
    #[schema(value_type = String, example = "7ABC123")]
    pub plate: LicensePlate,
    #[schema(example = 4)]
    pub seats: u8,
}

/// Raw vehicle fields as received from an inbound adapter.
#[derive(Debug, Clone, Copy)]
pub struct VehicleParts<'a> {
    pub make: &'a str,
    pub model: &'a str,
    pub year: i32,
    pub color: &'a str,
    pub plate: &'a str,
    pub seats: u8,
}

/// Validated input for a new vehicle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleDraft {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub color: String,
    pub plate: LicensePlate,
    pub seats: u8,
}

impl VehicleDraft {
    /// Validate every field; `current_year` bounds the model year.
    pub fn try_from_parts(
        parts: VehicleParts<'_>,
        current_year: i32,
    ) -> Result<Self, VehicleValidationError> {
        Ok(Self {
            make: validate_text("make", parts.make)?,
            model: validate_text("model", parts.model)?,
            year: validate_year(parts.year, current_year)?,
            color: validate_text("color", parts.color)?,
            plate: LicensePlate::new(parts.plate)?,
            seats: validate_seats(parts.seats)?,
        })
    }

    /// Materialise the vehicle for an owner.
    pub fn into_vehicle(self, id: Uuid, owner_id: UserId) -> Vehicle {
        Vehicle {
            id,
            owner_id,
            make: self.make,
            model: self.model,
            year: self.year,
            color: self.color,
            plate: self.plate,
            seats: self.seats,
        }
    }
}

/// Partial vehicle update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VehicleUpdate {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub color: Option<String>,
    pub plate: Option<LicensePlate>,
    pub seats: Option<u8>,
}

/// Raw optional vehicle fields for partial updates.
#[derive(Debug, Clone, Copy, Default)]
pub struct VehicleUpdateParts<'a> {
    pub make: Option<&'a str>,
    pub model: Option<&'a str>,
    pub year: Option<i32>,
    pub color: Option<&'a str>,
    pub plate: Option<&'a str>,
    pub seats: Option<u8>,
}

impl VehicleUpdate {
    /// Validate the supplied fields only.
    pub fn try_from_parts(
        parts: VehicleUpdateParts<'_>,
        current_year: i32,
    ) -> Result<Self, VehicleValidationError> {
        Ok(Self {
            make: parts.make.map(|v| validate_text("make", v)).transpose()?,
            model: parts.model.map(|v| validate_text("model", v)).transpose()?,
            year: parts.year.map(|v| validate_year(v, current_year)).transpose()?,
            color: parts.color.map(|v| validate_text("color", v)).transpose()?,
            plate: parts.plate.map(LicensePlate::new).transpose()?,
            seats: parts.seats.map(validate_seats).transpose()?,
        })
    }
}

impl Vehicle {
    /// Apply a validated update in place.
    pub fn apply(&mut self, update: VehicleUpdate) {
        if let Some(make) = update.make {
            self.make = make;
        }
        if let Some(model) = update.model {
            self.model = model;
        }
        if let Some(year) = update.year {
            self.year = year;
        }
        if let Some(color) = update.color {
            self.color = color;
        }
        if let Some(plate) = update.plate {
            self.plate = plate;
        }
        if let Some(seats) = update.seats {
            self.seats = seats;
        }
    }
}
