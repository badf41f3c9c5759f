//! In-memory adapters for every repository port and the blob store.
//!
//! Used when no database is configured (local development) and by the HTTP
//! integration tests. All tables sit behind one lock so guarded writes such
//! as [`BookingRepository::transition`] check and apply in one step, and the
//! uniqueness rules mirror the database constraints.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::ports::{
    BookingRepository, BookingRepositoryError, FileRepository, FileRepositoryError, FileStore,
    FileStoreError, PaymentRepository, PaymentRepositoryError, ProfileRepository,
    ProfileRepositoryError, RatingRepository, RatingRepositoryError, RouteRepository,
    RouteRepositoryError, SeatChange, UserRepository, UserRepositoryError, VehicleRepository,
    VehicleRepositoryError,
};
use crate::domain::{
    Account, Booking, BookingStatus, CarpoolRoute, DriverProfile, Email, PassengerProfile,
    Payment, PaymentStatus, Rating, RouteStatus, StoredFile, UserId, Vehicle,
};

#[derive(Default)]
struct Tables {
    accounts: Vec<Account>,
    drivers: HashMap<UserId, DriverProfile>,
    passengers: HashMap<UserId, PassengerProfile>,
    vehicles: Vec<Vehicle>,
    routes: Vec<CarpoolRoute>,
    bookings: Vec<Booking>,
    payments: Vec<Payment>,
    ratings: Vec<Rating>,
    files: Vec<StoredFile>,
    blobs: HashMap<String, Vec<u8>>,
}

/// Process-local store implementing every driven storage port.
///
/// Clones share the same tables.
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use backend::domain::ports::UserRepository;
/// use backend::outbound::memory::InMemoryStore;
///
/// let store = InMemoryStore::new();
/// let users: Arc<dyn UserRepository> = Arc::new(store.clone());
/// # let _ = users;
/// ```
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn replace<T>(rows: &mut [T], row: &T, same: impl Fn(&T) -> bool) -> bool
where
    T: Clone,
{
    match rows.iter_mut().find(|existing| same(existing)) {
        Some(slot) => {
            *slot = row.clone();
            true
        }
        None => false,
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, account: &Account) -> Result<(), UserRepositoryError> {
        let mut tables = self.tables.write().await;
        if tables
            .accounts
            .iter()
            .any(|existing| existing.user.email == account.user.email)
        {
            return Err(UserRepositoryError::duplicate_email(
                account.user.email.as_ref(),
            ));
        }
        tables.accounts.push(account.clone());
        Ok(())
    }

    async fn update(&self, account: &Account) -> Result<(), UserRepositoryError> {
        let mut tables = self.tables.write().await;
        let clash = tables.accounts.iter().any(|existing| {
            existing.user.email == account.user.email && existing.user.id != account.user.id
        });
        if clash {
            return Err(UserRepositoryError::duplicate_email(
                account.user.email.as_ref(),
            ));
        }
        if replace(&mut tables.accounts, account, |existing| {
            existing.user.id == account.user.id
        }) {
            Ok(())
        } else {
            Err(UserRepositoryError::query(format!(
                "account {} does not exist",
                account.user.id
            )))
        }
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<Account>, UserRepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .accounts
            .iter()
            .find(|account| &account.user.id == id)
            .cloned())
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, UserRepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .accounts
            .iter()
            .find(|account| &account.user.email == email)
            .cloned())
    }
}

#[async_trait]
impl ProfileRepository for InMemoryStore {
    async fn save_driver(&self, profile: &DriverProfile) -> Result<(), ProfileRepositoryError> {
        self.tables
            .write()
            .await
            .drivers
            .insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }

    async fn find_driver(
        &self,
        user_id: &UserId,
    ) -> Result<Option<DriverProfile>, ProfileRepositoryError> {
        Ok(self.tables.read().await.drivers.get(user_id).cloned())
    }

    async fn save_passenger(
        &self,
        profile: &PassengerProfile,
    ) -> Result<(), ProfileRepositoryError> {
        self.tables
            .write()
            .await
            .passengers
            .insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }

    async fn find_passenger(
        &self,
        user_id: &UserId,
    ) -> Result<Option<PassengerProfile>, ProfileRepositoryError> {
        Ok(self.tables.read().await.passengers.get(user_id).cloned())
    }
}

#[async_trait]
impl VehicleRepository for InMemoryStore {
    async fn create(&self, vehicle: &Vehicle) -> Result<(), VehicleRepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.vehicles.iter().any(|v| v.plate == vehicle.plate) {
            return Err(VehicleRepositoryError::duplicate_plate(
                vehicle.plate.as_ref(),
            ));
        }
        tables.vehicles.push(vehicle.clone());
        Ok(())
    }

    async fn update(&self, vehicle: &Vehicle) -> Result<(), VehicleRepositoryError> {
        let mut tables = self.tables.write().await;
        if tables
            .vehicles
            .iter()
            .any(|v| v.plate == vehicle.plate && v.id != vehicle.id)
        {
            return Err(VehicleRepositoryError::duplicate_plate(
                vehicle.plate.as_ref(),
            ));
        }
        if replace(&mut tables.vehicles, vehicle, |v| v.id == vehicle.id) {
            Ok(())
        } else {
            Err(VehicleRepositoryError::query(format!(
                "vehicle {} does not exist",
                vehicle.id
            )))
        }
    }

    async fn delete(&self, id: &Uuid) -> Result<bool, VehicleRepositoryError> {
        let mut tables = self.tables.write().await;
        let before = tables.vehicles.len();
        tables.vehicles.retain(|v| &v.id != id);
        Ok(tables.vehicles.len() != before)
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Vehicle>, VehicleRepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.vehicles.iter().find(|v| &v.id == id).cloned())
    }

    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Vehicle>, VehicleRepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .vehicles
            .iter()
            .filter(|v| &v.owner_id == owner)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RouteRepository for InMemoryStore {
    async fn create(&self, route: &CarpoolRoute) -> Result<(), RouteRepositoryError> {
        self.tables.write().await.routes.push(route.clone());
        Ok(())
    }

    async fn update(
        &self,
        route: &CarpoolRoute,
        expected: RouteStatus,
    ) -> Result<(), RouteRepositoryError> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .routes
            .iter_mut()
            .find(|r| r.id == route.id)
            .ok_or_else(|| {
                RouteRepositoryError::query(format!("route {} does not exist", route.id))
            })?;
        if stored.status != expected {
            return Err(RouteRepositoryError::conflict(format!(
                "route is now {}",
                stored.status
            )));
        }
        *stored = CarpoolRoute {
            seats_total: stored.seats_total,
            seats_available: stored.seats_available,
            ..route.clone()
        };
        Ok(())
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<CarpoolRoute>, RouteRepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.routes.iter().find(|r| &r.id == id).cloned())
    }

    async fn list_searchable(
        &self,
        include_past: bool,
    ) -> Result<Vec<CarpoolRoute>, RouteRepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .routes
            .iter()
            .filter(|r| {
                if include_past {
                    r.status != RouteStatus::Cancelled
                } else {
                    r.status == RouteStatus::Scheduled
                }
            })
            .cloned()
            .collect())
    }

    async fn list_by_driver(
        &self,
        driver: &UserId,
    ) -> Result<Vec<CarpoolRoute>, RouteRepositoryError> {
        let tables = self.tables.read().await;
        let mut routes: Vec<CarpoolRoute> = tables
            .routes
            .iter()
            .filter(|r| &r.driver_id == driver)
            .cloned()
            .collect();
        routes.sort_by_key(|r| r.departure_at);
        Ok(routes)
    }

    async fn has_active_for_vehicle(
        &self,
        vehicle_id: &Uuid,
    ) -> Result<bool, RouteRepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .routes
            .iter()
            .any(|r| &r.vehicle_id == vehicle_id && !r.status.is_finished()))
    }
}

fn active_duplicate(bookings: &[Booking], booking: &Booking) -> bool {
    booking.status.is_active()
        && bookings.iter().any(|existing| {
            existing.id != booking.id
                && existing.route_id == booking.route_id
                && existing.passenger_id == booking.passenger_id
                && existing.status.is_active()
        })
}

#[async_trait]
impl BookingRepository for InMemoryStore {
    async fn create(&self, booking: &Booking) -> Result<(), BookingRepositoryError> {
        let mut tables = self.tables.write().await;
        if active_duplicate(&tables.bookings, booking) {
            return Err(BookingRepositoryError::duplicate_active(booking.route_id));
        }
        tables.bookings.push(booking.clone());
        Ok(())
    }

    async fn transition(
        &self,
        booking: &Booking,
        from: BookingStatus,
        seats: SeatChange,
    ) -> Result<(), BookingRepositoryError> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;
        let stored = tables
            .bookings
            .iter_mut()
            .find(|b| b.id == booking.id)
            .ok_or_else(|| {
                BookingRepositoryError::query(format!("booking {} does not exist", booking.id))
            })?;
        if stored.status != from {
            return Err(BookingRepositoryError::conflict(format!(
                "booking is now {}",
                stored.status
            )));
        }
        if seats != SeatChange::None {
            let route = tables
                .routes
                .iter_mut()
                .find(|r| r.id == booking.route_id && r.status == RouteStatus::Scheduled)
                .ok_or_else(|| BookingRepositoryError::conflict("route is no longer scheduled"))?;
            match seats {
                SeatChange::Reserve(n) => route.reserve_seats(n).map_err(|err| {
                    BookingRepositoryError::conflict(err.to_string())
                })?,
                SeatChange::Release(n) => route.release_seats(n),
                SeatChange::None => {}
            }
        }
        stored.status = booking.status;
        Ok(())
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Booking>, BookingRepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.bookings.iter().find(|b| &b.id == id).cloned())
    }

    async fn list_by_route(&self, route_id: &Uuid) -> Result<Vec<Booking>, BookingRepositoryError> {
        let tables = self.tables.read().await;
        let mut bookings: Vec<Booking> = tables
            .bookings
            .iter()
            .filter(|b| &b.route_id == route_id)
            .cloned()
            .collect();
        bookings.sort_by_key(|b| b.created_at);
        Ok(bookings)
    }

    async fn list_by_passenger(
        &self,
        passenger: &UserId,
    ) -> Result<Vec<Booking>, BookingRepositoryError> {
        let tables = self.tables.read().await;
        let mut bookings: Vec<Booking> = tables
            .bookings
            .iter()
            .filter(|b| &b.passenger_id == passenger)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }
}

#[async_trait]
impl PaymentRepository for InMemoryStore {
    async fn create(&self, payment: &Payment) -> Result<(), PaymentRepositoryError> {
        let mut tables = self.tables.write().await;
        let active = |p: &Payment| p.status != PaymentStatus::Refunded;
        let duplicate = active(payment)
            && tables
                .payments
                .iter()
                .any(|p| p.booking_id == payment.booking_id && active(p));
        if duplicate {
            return Err(PaymentRepositoryError::duplicate_active(payment.booking_id));
        }
        tables.payments.push(payment.clone());
        Ok(())
    }

    async fn update(
        &self,
        payment: &Payment,
        from: PaymentStatus,
    ) -> Result<(), PaymentRepositoryError> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .payments
            .iter_mut()
            .find(|p| p.id == payment.id)
            .ok_or_else(|| {
                PaymentRepositoryError::query(format!("payment {} does not exist", payment.id))
            })?;
        if stored.status != from {
            return Err(PaymentRepositoryError::conflict(format!(
                "payment is now {}",
                stored.status
            )));
        }
        stored.status = payment.status;
        Ok(())
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Payment>, PaymentRepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.payments.iter().find(|p| &p.id == id).cloned())
    }

    async fn find_active_for_booking(
        &self,
        booking_id: &Uuid,
    ) -> Result<Option<Payment>, PaymentRepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .payments
            .iter()
            .find(|p| &p.booking_id == booking_id && p.status != PaymentStatus::Refunded)
            .cloned())
    }

    async fn list_for_user(&self, user: &UserId) -> Result<Vec<Payment>, PaymentRepositoryError> {
        let tables = self.tables.read().await;
        let mut payments: Vec<Payment> = tables
            .payments
            .iter()
            .filter(|p| &p.payer_id == user || &p.payee_id == user)
            .cloned()
            .collect();
        payments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(payments)
    }
}

#[async_trait]
impl RatingRepository for InMemoryStore {
    async fn create(&self, rating: &Rating) -> Result<(), RatingRepositoryError> {
        let mut tables = self.tables.write().await;
        let duplicate = tables.ratings.iter().any(|r| {
            r.route_id == rating.route_id
                && r.rater_id == rating.rater_id
                && r.ratee_id == rating.ratee_id
        });
        if duplicate {
            return Err(RatingRepositoryError::duplicate());
        }
        tables.ratings.push(rating.clone());
        Ok(())
    }

    async fn list_for_ratee(&self, ratee: &UserId) -> Result<Vec<Rating>, RatingRepositoryError> {
        let tables = self.tables.read().await;
        let mut ratings: Vec<Rating> = tables
            .ratings
            .iter()
            .filter(|r| &r.ratee_id == ratee)
            .cloned()
            .collect();
        ratings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(ratings)
    }

    async fn list_for_route(&self, route_id: &Uuid) -> Result<Vec<Rating>, RatingRepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .ratings
            .iter()
            .filter(|r| &r.route_id == route_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl FileRepository for InMemoryStore {
    async fn create(&self, file: &StoredFile) -> Result<(), FileRepositoryError> {
        self.tables.write().await.files.push(file.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<StoredFile>, FileRepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.files.iter().find(|f| &f.id == id).cloned())
    }

    async fn delete(&self, id: &Uuid) -> Result<bool, FileRepositoryError> {
        let mut tables = self.tables.write().await;
        let before = tables.files.len();
        tables.files.retain(|f| &f.id != id);
        Ok(tables.files.len() != before)
    }
}

#[async_trait]
impl FileStore for InMemoryStore {
    async fn put(&self, name: &str, bytes: Vec<u8>) -> Result<(), FileStoreError> {
        self.tables
            .write()
            .await
            .blobs
            .insert(name.to_owned(), bytes);
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Vec<u8>, FileStoreError> {
        self.tables
            .read()
            .await
            .blobs
            .get(name)
            .cloned()
            .ok_or_else(|| FileStoreError::not_found(name))
    }

    async fn delete(&self, name: &str) -> Result<(), FileStoreError> {
        self.tables.write().await.blobs.remove(name);
        Ok(())
    }
}
