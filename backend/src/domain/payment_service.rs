//! Payment service implementing the [`PaymentService`] driving port.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;
use uuid::Uuid;

use crate::domain::ports::{
    BookingRepository, PaymentRepository, PaymentRequest, PaymentService, RouteRepository,
};
use crate::domain::service_support::{load_booking, load_route, map_payment_repository_error};
use crate::domain::{
    BookingStatus, Error, Payment, PaymentStateError, PaymentStatus, UserId, payment_amount,
};

/// Payments between a booking's passenger (payer) and the route's driver (payee).
#[derive(Clone)]
pub struct PaymentServiceImpl {
    routes: Arc<dyn RouteRepository>,
    bookings: Arc<dyn BookingRepository>,
    payments: Arc<dyn PaymentRepository>,
    clock: Arc<dyn Clock>,
}

impl PaymentServiceImpl {
    pub fn new(
        routes: Arc<dyn RouteRepository>,
        bookings: Arc<dyn BookingRepository>,
        payments: Arc<dyn PaymentRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            routes,
            bookings,
            payments,
            clock,
        }
    }

    async fn payee_payment(&self, payee: &UserId, payment_id: &Uuid) -> Result<Payment, Error> {
        let payment = self
            .payments
            .find_by_id(payment_id)
            .await
            .map_err(map_payment_repository_error)?
            .ok_or_else(|| Error::not_found(format!("payment {payment_id} not found")))?;
        if &payment.payee_id != payee {
            return Err(Error::forbidden("only the payee may update a payment"));
        }
        Ok(payment)
    }

    async fn transition(
        &self,
        payee: &UserId,
        payment_id: &Uuid,
        apply: fn(&mut Payment) -> Result<(), PaymentStateError>,
    ) -> Result<Payment, Error> {
        let mut payment = self.payee_payment(payee, payment_id).await?;
        let from = payment.status;
        apply(&mut payment).map_err(|err| Error::conflict(err.to_string()))?;
        self.payments
            .update(&payment, from)
            .await
            .map_err(map_payment_repository_error)?;
        info!(payment_id = %payment.id, status = %payment.status, "payment updated");
        Ok(payment)
    }
}

#[async_trait]
impl PaymentService for PaymentServiceImpl {
    async fn create(&self, payer: &UserId, request: PaymentRequest) -> Result<Payment, Error> {
        let PaymentRequest {
            booking_id,
            method,
            currency,
        } = request;
        let booking = load_booking(self.bookings.as_ref(), &booking_id).await?;
        if &booking.passenger_id != payer {
            return Err(Error::forbidden("only the booking's passenger may pay"));
        }
        if booking.status != BookingStatus::Accepted {
            return Err(Error::conflict(format!(
                "booking is {}; only accepted bookings can be paid",
                booking.status
            )));
        }
        let existing = self
            .payments
            .find_active_for_booking(&booking_id)
            .await
            .map_err(map_payment_repository_error)?;
        if existing.is_some() {
            return Err(Error::conflict("booking already has a payment"));
        }
        let route = load_route(self.routes.as_ref(), &booking.route_id).await?;
        let amount_cents = payment_amount(booking.seats, route.price_per_seat_cents)
            .map_err(|err| Error::invalid_request(err.to_string()))?;

        let payment = Payment {
            id: Uuid::new_v4(),
            booking_id,
            payer_id: payer.clone(),
            payee_id: route.driver_id,
            amount_cents,
            currency,
            method,
            status: PaymentStatus::Pending,
            created_at: self.clock.utc(),
        };
        self.payments
            .create(&payment)
            .await
            .map_err(map_payment_repository_error)?;
        info!(payment_id = %payment.id, amount_cents, "payment created");
        Ok(payment)
    }

    async fn confirm(&self, payee: &UserId, payment_id: &Uuid) -> Result<Payment, Error> {
        self.transition(payee, payment_id, Payment::confirm).await
    }

    async fn refund(&self, payee: &UserId, payment_id: &Uuid) -> Result<Payment, Error> {
        self.transition(payee, payment_id, Payment::refund).await
    }

    async fn list_mine(&self, user: &UserId) -> Result<Vec<Payment>, Error> {
        self.payments
            .list_for_user(user)
            .await
            .map_err(map_payment_repository_error)
    }
}
