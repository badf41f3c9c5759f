//! Shared builders for domain unit tests.

use std::sync::Arc;

use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use mockable::Clock;
use uuid::Uuid;

use super::{
    Account, AuthProvider, Booking, BookingStatus, CarpoolRoute, Email, FullName, LicensePlate,
    Place, RouteStatus, User, UserId, UserRole, Vehicle,
};

/// Fixed "now" used across tests.
pub(crate) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

struct FixtureClock;

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        now().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        now()
    }
}

/// Clock pinned to [`now`].
pub(crate) fn clock() -> Arc<dyn Clock> {
    Arc::new(FixtureClock)
}

pub(crate) fn user(role: UserRole, email: &str) -> User {
    User {
        id: UserId::random(),
        email: Email::new(email).expect("fixture email"),
        full_name: FullName::new("Test Person").expect("fixture name"),
        phone: None,
        role,
        avatar_url: None,
        provider: AuthProvider::Password,
        created_at: now(),
    }
}

/// Account without credentials wrapping [`user`].
pub(crate) fn account(role: UserRole, email: &str) -> Account {
    Account {
        user: user(role, email),
        password_hash: None,
        google_subject: None,
    }
}

pub(crate) fn vehicle(owner_id: &UserId, seats: u8) -> Vehicle {
    Vehicle {
        id: Uuid::new_v4(),
        owner_id: owner_id.clone(),
        make: "Toyota".into(),
        model: "Prius".into(),
        year: 2020,
        color: "Silver".into(),
        plate: LicensePlate::new(format!("T{}", &Uuid::new_v4().simple().to_string()[..6]))
            .expect("fixture plate"),
        seats,
    }
}

pub(crate) fn place(address: &str) -> Place {
    Place::new(address, None).expect("fixture place")
}

pub(crate) fn route(driver_id: &UserId, vehicle: &Vehicle, seats: u8) -> CarpoolRoute {
    CarpoolRoute {
        id: Uuid::new_v4(),
        driver_id: driver_id.clone(),
        vehicle_id: vehicle.id,
        origin: place("1 Market St, San Francisco"),
        destination: place("Stanford University, Stanford"),
        waypoints: Vec::new(),
        departure_at: now() + Duration::hours(24),
        seats_total: seats,
        seats_available: seats,
        price_per_seat_cents: 1500,
        status: RouteStatus::Scheduled,
        notes: None,
        created_at: now(),
    }
}

pub(crate) fn booking(route: &CarpoolRoute, passenger_id: &UserId, seats: u8) -> Booking {
    Booking {
        id: Uuid::new_v4(),
        route_id: route.id,
        passenger_id: passenger_id.clone(),
        seats,
        pickup: None,
        status: BookingStatus::Pending,
        created_at: now(),
    }
}
