//! Driving port for booking payments.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Currency, Error, Payment, PaymentMethod, UserId};

/// A passenger's payment for an accepted booking.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    pub booking_id: Uuid,
    pub method: PaymentMethod,
    pub currency: Currency,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentService: Send + Sync {
    async fn create(&self, payer: &UserId, request: PaymentRequest) -> Result<Payment, Error>;

    /// Payee marks the payment as received.
    async fn confirm(&self, payee: &UserId, payment_id: &Uuid) -> Result<Payment, Error>;

    async fn refund(&self, payee: &UserId, payment_id: &Uuid) -> Result<Payment, Error>;

    /// Payments the user made or received.
    async fn list_mine(&self, user: &UserId) -> Result<Vec<Payment>, Error>;
}
