//! PostgreSQL-backed `BookingRepository`.
//!
//! The "one active booking per passenger and route" rule is enforced by the
//! partial unique index `bookings_active_passenger_idx`. Status changes are
//! compare-and-set updates that share a transaction with the route's seat
//! adjustment.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{BookingRepository, BookingRepositoryError, SeatChange};
use crate::domain::{Booking, BookingStatus, RouteStatus, UserId};

use super::diesel_error_mapping::{
    map_diesel_error, map_pool_error, map_row_error, unique_violation,
};
use super::models::BookingRow;
use super::pool::{DbPool, PoolError};
use super::schema::{bookings, routes};

#[derive(Clone)]
pub struct DieselBookingRepository {
    pool: DbPool,
}

impl DieselBookingRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> BookingRepositoryError {
    map_pool_error(error, BookingRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error, booking: &Booking) -> BookingRepositoryError {
    if unique_violation(&error).is_some() {
        return BookingRepositoryError::duplicate_active(booking.route_id);
    }
    read_error(error)
}

fn read_error(error: diesel::result::Error) -> BookingRepositoryError {
    map_diesel_error(
        error,
        BookingRepositoryError::query,
        BookingRepositoryError::connection,
    )
}

/// Why a guarded booking transition rolled back.
enum TransitionFailure {
    Stale(String),
    Database(diesel::result::Error),
}

impl From<diesel::result::Error> for TransitionFailure {
    fn from(error: diesel::result::Error) -> Self {
        Self::Database(error)
    }
}

fn into_bookings(rows: Vec<BookingRow>) -> Result<Vec<Booking>, BookingRepositoryError> {
    rows.into_iter()
        .map(Booking::try_from)
        .collect::<Result<_, _>>()
        .map_err(|err| map_row_error(err, BookingRepositoryError::query))
}

#[async_trait]
impl BookingRepository for DieselBookingRepository {
    async fn create(&self, booking: &Booking) -> Result<(), BookingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(bookings::table)
            .values(BookingRow::from(booking))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| diesel_error(err, booking))
    }

    async fn transition(
        &self,
        booking: &Booking,
        from: BookingStatus,
        seats: SeatChange,
    ) -> Result<(), BookingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let (booking_id, route_id, to) = (booking.id, booking.route_id, booking.status);
        let written = conn
            .transaction::<_, TransitionFailure, _>(|conn| {
                async move {
                    let moved = diesel::update(
                        bookings::table
                            .find(booking_id)
                            .filter(bookings::status.eq(from.as_str())),
                    )
                    .set(bookings::status.eq(to.as_str()))
                    .execute(conn)
                    .await?;
                    if moved == 0 {
                        return Err(TransitionFailure::Stale(format!(
                            "booking is no longer {from}"
                        )));
                    }
                    let scheduled = routes::table
                        .find(route_id)
                        .filter(routes::status.eq(RouteStatus::Scheduled.as_str()));
                    let seats_written = match seats {
                        SeatChange::None => return Ok(()),
                        SeatChange::Reserve(n) => {
                            let n = i16::from(n);
                            diesel::update(scheduled.filter(routes::seats_available.ge(n)))
                                .set(routes::seats_available.eq(routes::seats_available - n))
                                .execute(conn)
                                .await?
                        }
                        SeatChange::Release(n) => {
                            let n = i16::from(n);
                            let room = routes::seats_available.le(routes::seats_total - n);
                            diesel::update(scheduled.filter(room))
                            .set(routes::seats_available.eq(routes::seats_available + n))
                            .execute(conn)
                            .await?
                        }
                    };
                    if seats_written == 0 {
                        return Err(TransitionFailure::Stale(
                            "route is no longer scheduled or lacks the seats".to_owned(),
                        ));
                    }
                    Ok(())
                }
                .scope_boxed()
            })
            .await;
        match written {
            Ok(()) => Ok(()),
            Err(TransitionFailure::Stale(message)) => Err(BookingRepositoryError::conflict(message)),
            Err(TransitionFailure::Database(err)) => Err(diesel_error(err, booking)),
        }
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Booking>, BookingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = bookings::table
            .find(id)
            .select(BookingRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(read_error)?;
        Ok(into_bookings(row.into_iter().collect())?.pop())
    }

    async fn list_by_route(&self, route_id: &Uuid) -> Result<Vec<Booking>, BookingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows = bookings::table
            .filter(bookings::route_id.eq(route_id))
            .order(bookings::created_at.asc())
            .select(BookingRow::as_select())
            .load(&mut conn)
            .await
            .map_err(read_error)?;
        into_bookings(rows)
    }

    async fn list_by_passenger(
        &self,
        passenger: &UserId,
    ) -> Result<Vec<Booking>, BookingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows = bookings::table
            .filter(bookings::passenger_id.eq(passenger.as_uuid()))
            .order(bookings::created_at.desc())
            .select(BookingRow::as_select())
            .load(&mut conn)
            .await
            .map_err(read_error)?;
        into_bookings(rows)
    }
}
