//! Internal Diesel row structs and their conversions to domain types.
//!
//! Rows are implementation details of the persistence layer and never leave
//! it. Reading a row re-validates every value object; a row that no longer
//! validates surfaces as a [`RowError`], which repositories report as a query
//! failure.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::{
    Account, AuthProvider, Booking, BookingStatus, CarpoolRoute, Currency, DriverProfile, Email,
    FullName, LicenseNumber, LicensePlate, PassengerProfile, PasswordHash, Payment, PaymentMethod,
    PaymentStatus, PhoneNumber, Place, Rating, RouteStatus, Score, StoredFile, UploadPurpose, User,
    UserId, UserRole, Vehicle,
};

use super::schema::{
    bookings, driver_profiles, passenger_profiles, payments, ratings, routes, stored_files, users,
    vehicles,
};

/// A stored row that no longer satisfies domain validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {table} row: {message}")]
pub(crate) struct RowError {
    table: &'static str,
    message: String,
}

impl RowError {
    fn new(table: &'static str, message: impl ToString) -> Self {
        Self {
            table,
            message: message.to_string(),
        }
    }
}

fn small(table: &'static str, value: i16) -> Result<u8, RowError> {
    u8::try_from(value).map_err(|err| RowError::new(table, err))
}

fn place_from_json(table: &'static str, value: Value) -> Result<Place, RowError> {
    serde_json::from_value(value).map_err(|err| RowError::new(table, err))
}

fn place_to_json(place: &Place) -> Value {
    serde_json::to_value(place).unwrap_or(Value::Null)
}

// ---------------------------------------------------------------------------
// Users and profiles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: String,
    pub avatar_url: Option<String>,
    pub provider: String,
    pub password_hash: Option<String>,
    pub google_subject: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Account> for UserRow {
    fn from(account: &Account) -> Self {
        let user = &account.user;
        Self {
            id: *user.id.as_uuid(),
            email: user.email.as_ref().to_owned(),
            full_name: user.full_name.as_ref().to_owned(),
            phone: user.phone.as_ref().map(|phone| phone.as_ref().to_owned()),
            role: user.role.as_str().to_owned(),
            avatar_url: user.avatar_url.clone(),
            provider: user.provider.as_str().to_owned(),
            password_hash: account
                .password_hash
                .as_ref()
                .map(|hash| hash.as_phc().to_owned()),
            google_subject: account.google_subject.clone(),
            created_at: user.created_at,
        }
    }
}

impl TryFrom<UserRow> for Account {
    type Error = RowError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let invalid = |err: &dyn std::fmt::Display| RowError::new("users", err);
        let user = User {
            id: UserId::from_uuid(row.id),
            email: Email::new(&row.email).map_err(|err| invalid(&err))?,
            full_name: FullName::new(&row.full_name).map_err(|err| invalid(&err))?,
            phone: row
                .phone
                .map(PhoneNumber::new)
                .transpose()
                .map_err(|err| invalid(&err))?,
            role: row.role.parse::<UserRole>().map_err(|err| invalid(&err))?,
            avatar_url: row.avatar_url,
            provider: row
                .provider
                .parse::<AuthProvider>()
                .map_err(|err| invalid(&err))?,
            created_at: row.created_at,
        };
        let password_hash = row
            .password_hash
            .map(PasswordHash::from_phc)
            .transpose()
            .map_err(|err| invalid(&err))?;
        Ok(Self {
            user,
            password_hash,
            google_subject: row.google_subject,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = driver_profiles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct DriverProfileRow {
    pub user_id: Uuid,
    pub license_number: String,
    pub license_document: Option<String>,
    pub verified: bool,
}

impl From<&DriverProfile> for DriverProfileRow {
    fn from(profile: &DriverProfile) -> Self {
        Self {
            user_id: *profile.user_id.as_uuid(),
            license_number: profile.license_number.as_ref().to_owned(),
            license_document: profile.license_document.clone(),
            verified: profile.verified,
        }
    }
}

impl TryFrom<DriverProfileRow> for DriverProfile {
    type Error = RowError;

    fn try_from(row: DriverProfileRow) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: UserId::from_uuid(row.user_id),
            license_number: LicenseNumber::new(&row.license_number)
                .map_err(|err| RowError::new("driver_profiles", err))?,
            license_document: row.license_document,
            verified: row.verified,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = passenger_profiles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct PassengerProfileRow {
    pub user_id: Uuid,
    pub emergency_contact: Option<String>,
    pub preferences: Option<String>,
}

impl From<&PassengerProfile> for PassengerProfileRow {
    fn from(profile: &PassengerProfile) -> Self {
        Self {
            user_id: *profile.user_id.as_uuid(),
            emergency_contact: profile
                .emergency_contact
                .as_ref()
                .map(|phone| phone.as_ref().to_owned()),
            preferences: profile.preferences.clone(),
        }
    }
}

impl TryFrom<PassengerProfileRow> for PassengerProfile {
    type Error = RowError;

    fn try_from(row: PassengerProfileRow) -> Result<Self, Self::Error> {
        Self::try_new(
            UserId::from_uuid(row.user_id),
            row.emergency_contact.as_deref(),
            row.preferences.as_deref(),
        )
        .map_err(|err| RowError::new("passenger_profiles", err))
    }
}

// ---------------------------------------------------------------------------
// Vehicles and routes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = vehicles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct VehicleRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub color: String,
    pub plate: String,
    pub seats: i16,
}

impl From<&Vehicle> for VehicleRow {
    fn from(vehicle: &Vehicle) -> Self {
        Self {
            id: vehicle.id,
            owner_id: *vehicle.owner_id.as_uuid(),
            make: vehicle.make.clone(),
            model: vehicle.model.clone(),
            year: vehicle.year,
            color: vehicle.color.clone(),
            plate: vehicle.plate.as_ref().to_owned(),
            seats: i16::from(vehicle.seats),
        }
    }
}

impl TryFrom<VehicleRow> for Vehicle {
    type Error = RowError;

    fn try_from(row: VehicleRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            owner_id: UserId::from_uuid(row.owner_id),
            make: row.make,
            model: row.model,
            year: row.year,
            color: row.color,
            plate: LicensePlate::new(&row.plate).map_err(|err| RowError::new("vehicles", err))?,
            seats: small("vehicles", row.seats)?,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = routes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RouteRow {
    pub id: Uuid,
    pub driver_id: Uuid,
    pub vehicle_id: Uuid,
    pub origin: Value,
    pub destination: Value,
    pub waypoints: Value,
    pub departure_at: DateTime<Utc>,
    pub seats_total: i16,
    pub seats_available: i16,
    pub price_per_seat_cents: i64,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&CarpoolRoute> for RouteRow {
    fn from(route: &CarpoolRoute) -> Self {
        Self {
            id: route.id,
            driver_id: *route.driver_id.as_uuid(),
            vehicle_id: route.vehicle_id,
            origin: place_to_json(&route.origin),
            destination: place_to_json(&route.destination),
            waypoints: Value::Array(route.waypoints.iter().map(place_to_json).collect()),
            departure_at: route.departure_at,
            seats_total: i16::from(route.seats_total),
            seats_available: i16::from(route.seats_available),
            price_per_seat_cents: route.price_per_seat_cents,
            status: route.status.as_str().to_owned(),
            notes: route.notes.clone(),
            created_at: route.created_at,
        }
    }
}

/// Route columns a driver edit or status change writes. Seat counts are
/// left to booking transitions.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = routes)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct RouteChangeset {
    pub waypoints: Value,
    pub departure_at: DateTime<Utc>,
    pub price_per_seat_cents: i64,
    pub status: String,
    pub notes: Option<String>,
}

impl From<&CarpoolRoute> for RouteChangeset {
    fn from(route: &CarpoolRoute) -> Self {
        Self {
            waypoints: Value::Array(route.waypoints.iter().map(place_to_json).collect()),
            departure_at: route.departure_at,
            price_per_seat_cents: route.price_per_seat_cents,
            status: route.status.as_str().to_owned(),
            notes: route.notes.clone(),
        }
    }
}

impl TryFrom<RouteRow> for CarpoolRoute {
    type Error = RowError;

    fn try_from(row: RouteRow) -> Result<Self, Self::Error> {
        let waypoints: Vec<Place> =
            serde_json::from_value(row.waypoints).map_err(|err| RowError::new("routes", err))?;
        Ok(Self {
            id: row.id,
            driver_id: UserId::from_uuid(row.driver_id),
            vehicle_id: row.vehicle_id,
            origin: place_from_json("routes", row.origin)?,
            destination: place_from_json("routes", row.destination)?,
            waypoints,
            departure_at: row.departure_at,
            seats_total: small("routes", row.seats_total)?,
            seats_available: small("routes", row.seats_available)?,
            price_per_seat_cents: row.price_per_seat_cents,
            status: row
                .status
                .parse::<RouteStatus>()
                .map_err(|err| RowError::new("routes", err))?,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Bookings, payments and ratings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = bookings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct BookingRow {
    pub id: Uuid,
    pub route_id: Uuid,
    pub passenger_id: Uuid,
    pub seats: i16,
    pub pickup: Option<Value>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Booking> for BookingRow {
    fn from(booking: &Booking) -> Self {
        Self {
            id: booking.id,
            route_id: booking.route_id,
            passenger_id: *booking.passenger_id.as_uuid(),
            seats: i16::from(booking.seats),
            pickup: booking.pickup.as_ref().map(place_to_json),
            status: booking.status.as_str().to_owned(),
            created_at: booking.created_at,
        }
    }
}

impl TryFrom<BookingRow> for Booking {
    type Error = RowError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            route_id: row.route_id,
            passenger_id: UserId::from_uuid(row.passenger_id),
            seats: small("bookings", row.seats)?,
            pickup: row
                .pickup
                .map(|value| place_from_json("bookings", value))
                .transpose()?,
            status: row
                .status
                .parse::<BookingStatus>()
                .map_err(|err| RowError::new("bookings", err))?,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = payments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PaymentRow {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub payer_id: Uuid,
    pub payee_id: Uuid,
    pub amount_cents: i64,
    pub currency: String,
    pub method: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Payment> for PaymentRow {
    fn from(payment: &Payment) -> Self {
        Self {
            id: payment.id,
            booking_id: payment.booking_id,
            payer_id: *payment.payer_id.as_uuid(),
            payee_id: *payment.payee_id.as_uuid(),
            amount_cents: payment.amount_cents,
            currency: payment.currency.as_ref().to_owned(),
            method: payment.method.as_str().to_owned(),
            status: payment.status.as_str().to_owned(),
            created_at: payment.created_at,
        }
    }
}

impl TryFrom<PaymentRow> for Payment {
    type Error = RowError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let invalid = |err: &dyn std::fmt::Display| RowError::new("payments", err);
        Ok(Self {
            id: row.id,
            booking_id: row.booking_id,
            payer_id: UserId::from_uuid(row.payer_id),
            payee_id: UserId::from_uuid(row.payee_id),
            amount_cents: row.amount_cents,
            currency: Currency::new(row.currency.trim()).map_err(|err| invalid(&err))?,
            method: row
                .method
                .parse::<PaymentMethod>()
                .map_err(|err| invalid(&err))?,
            status: row
                .status
                .parse::<PaymentStatus>()
                .map_err(|err| invalid(&err))?,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = ratings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RatingRow {
    pub id: Uuid,
    pub route_id: Uuid,
    pub rater_id: Uuid,
    pub ratee_id: Uuid,
    pub score: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Rating> for RatingRow {
    fn from(rating: &Rating) -> Self {
        Self {
            id: rating.id,
            route_id: rating.route_id,
            rater_id: *rating.rater_id.as_uuid(),
            ratee_id: *rating.ratee_id.as_uuid(),
            score: i16::from(rating.score.get()),
            comment: rating.comment.clone(),
            created_at: rating.created_at,
        }
    }
}

impl TryFrom<RatingRow> for Rating {
    type Error = RowError;

    fn try_from(row: RatingRow) -> Result<Self, Self::Error> {
        let score = Score::new(small("ratings", row.score)?)
            .map_err(|err| RowError::new("ratings", err))?;
        Ok(Self {
            id: row.id,
            route_id: row.route_id,
            rater_id: UserId::from_uuid(row.rater_id),
            ratee_id: UserId::from_uuid(row.ratee_id),
            score,
            comment: row.comment,
            created_at: row.created_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Uploaded files
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = stored_files)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct StoredFileRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub purpose: String,
    pub original_name: String,
    pub stored_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<&StoredFile> for StoredFileRow {
    type Error = RowError;

    fn try_from(file: &StoredFile) -> Result<Self, Self::Error> {
        Ok(Self {
            id: file.id,
            owner_id: *file.owner_id.as_uuid(),
            purpose: file.purpose.as_str().to_owned(),
            original_name: file.original_name.clone(),
            stored_name: file.stored_name.clone(),
            content_type: file.content_type.clone(),
            size_bytes: i64::try_from(file.size_bytes)
                .map_err(|err| RowError::new("stored_files", err))?,
            created_at: file.created_at,
        })
    }
}

impl TryFrom<StoredFileRow> for StoredFile {
    type Error = RowError;

    fn try_from(row: StoredFileRow) -> Result<Self, Self::Error> {
        let invalid = |err: &dyn std::fmt::Display| RowError::new("stored_files", err);
        Ok(Self {
            id: row.id,
            owner_id: UserId::from_uuid(row.owner_id),
            purpose: row
                .purpose
                .parse::<UploadPurpose>()
                .map_err(|err| invalid(&err))?,
            original_name: row.original_name,
            stored_name: row.stored_name,
            content_type: row.content_type,
            size_bytes: u64::try_from(row.size_bytes).map_err(|err| invalid(&err))?,
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    use crate::domain::Coordinates;

    fn route_row() -> RouteRow {
        let origin = Place::new(
            "1 Market St, San Francisco",
            Some(Coordinates::new(37.79, -122.39).expect("coordinates")),
        )
        .expect("origin");
        let destination = Place::new("Oakland", None).expect("destination");
        RouteRow {
            id: Uuid::new_v4(),
            driver_id: Uuid::new_v4(),
            vehicle_id: Uuid::new_v4(),
            origin: place_to_json(&origin),
            destination: place_to_json(&destination),
            waypoints: Value::Array(Vec::new()),
            departure_at: Utc::now(),
            seats_total: 3,
            seats_available: 2,
            price_per_seat_cents: 650,
            status: "scheduled".into(),
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[rstest]
    fn route_row_keeps_place_coordinates() {
        let route = CarpoolRoute::try_from(route_row()).expect("valid row");
        assert_eq!(route.status, RouteStatus::Scheduled);
        assert_eq!(
            route.origin.coordinates.map(|c| c.lat()),
            Some(37.79),
        );
        assert_eq!(RouteRow::from(&route).origin, route_row().origin);
    }

    #[rstest]
    #[case(RouteRow { status: "teleporting".into(), ..route_row() })]
    #[case(RouteRow { seats_available: -1, ..route_row() })]
    #[case(RouteRow { origin: Value::String("nowhere".into()), ..route_row() })]
    fn corrupt_route_rows_are_rejected(#[case] row: RouteRow) {
        let err = CarpoolRoute::try_from(row).expect_err("corrupt row");
        assert!(err.to_string().starts_with("invalid routes row"));
    }

    #[rstest]
    fn payment_currency_is_trimmed_from_char_column() {
        let row = PaymentRow {
            id: Uuid::new_v4(),
            booking_id: Uuid::new_v4(),
            payer_id: Uuid::new_v4(),
            payee_id: Uuid::new_v4(),
            amount_cents: 1300,
            currency: "EUR".into(),
            method: "card".into(),
            status: "pending".into(),
            created_at: Utc::now(),
        };
        let payment = Payment::try_from(row).expect("valid row");
        assert_eq!(payment.currency.as_ref(), "EUR");
        assert_eq!(payment.method, PaymentMethod::Card);
    }

    #[rstest]
    #[case(0)]
    #[case(6)]
    fn out_of_range_scores_are_rejected(#[case] score: i16) {
        let row = RatingRow {
            id: Uuid::new_v4(),
            route_id: Uuid::new_v4(),
            rater_id: Uuid::new_v4(),
            ratee_id: Uuid::new_v4(),
            score,
            comment: None,
            created_at: Utc::now(),
        };
        assert!(Rating::try_from(row).is_err());
    }
}
