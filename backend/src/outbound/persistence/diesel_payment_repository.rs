//! PostgreSQL-backed `PaymentRepository`.
//!
//! `payments_live_booking_idx` allows one non-refunded payment per booking.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{PaymentRepository, PaymentRepositoryError};
use crate::domain::{Payment, PaymentStatus, UserId};

use super::diesel_error_mapping::{
    map_diesel_error, map_pool_error, map_row_error, unique_violation,
};
use super::models::PaymentRow;
use super::pool::{DbPool, PoolError};
use super::schema::payments;

#[derive(Clone)]
pub struct DieselPaymentRepository {
    pool: DbPool,
}

impl DieselPaymentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> PaymentRepositoryError {
    map_pool_error(error, PaymentRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> PaymentRepositoryError {
    map_diesel_error(
        error,
        PaymentRepositoryError::query,
        PaymentRepositoryError::connection,
    )
}

fn write_error(error: diesel::result::Error, payment: &Payment) -> PaymentRepositoryError {
    if unique_violation(&error).is_some() {
        return PaymentRepositoryError::duplicate_active(payment.booking_id);
    }
    diesel_error(error)
}

fn into_payments(rows: Vec<PaymentRow>) -> Result<Vec<Payment>, PaymentRepositoryError> {
    rows.into_iter()
        .map(Payment::try_from)
        .collect::<Result<_, _>>()
        .map_err(|err| map_row_error(err, PaymentRepositoryError::query))
}

#[async_trait]
impl PaymentRepository for DieselPaymentRepository {
    async fn create(&self, payment: &Payment) -> Result<(), PaymentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(payments::table)
            .values(PaymentRow::from(payment))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| write_error(err, payment))
    }

    async fn update(
        &self,
        payment: &Payment,
        from: PaymentStatus,
    ) -> Result<(), PaymentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let updated = diesel::update(
            payments::table
                .find(payment.id)
                .filter(payments::status.eq(from.as_str())),
        )
        .set(payments::status.eq(payment.status.as_str()))
        .execute(&mut conn)
        .await
        .map_err(|err| write_error(err, payment))?;
        if updated == 0 {
            return Err(PaymentRepositoryError::conflict(format!(
                "payment {} is no longer {from}",
                payment.id
            )));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Payment>, PaymentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = payments::table
            .find(id)
            .select(PaymentRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        Ok(into_payments(row.into_iter().collect())?.pop())
    }

    async fn find_active_for_booking(
        &self,
        booking_id: &Uuid,
    ) -> Result<Option<Payment>, PaymentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = payments::table
            .filter(payments::booking_id.eq(booking_id))
            .filter(payments::status.ne(PaymentStatus::Refunded.as_str()))
            .order(payments::created_at.desc())
            .select(PaymentRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        Ok(into_payments(row.into_iter().collect())?.pop())
    }

    async fn list_for_user(&self, user: &UserId) -> Result<Vec<Payment>, PaymentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows = payments::table
            .filter(
                payments::payer_id
                    .eq(user.as_uuid())
                    .or(payments::payee_id.eq(user.as_uuid())),
            )
            .order(payments::created_at.desc())
            .select(PaymentRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        into_payments(rows)
    }
}
