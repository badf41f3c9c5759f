//! Port for payment persistence.
use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Payment, PaymentStatus, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by payment repository adapters.
    pub enum PaymentRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "payment repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "payment repository query failed: {message}",
        /// The booking already has a pending or completed payment.
        DuplicateActive { booking_id: Uuid } => "booking {booking_id} already has a payment",
        /// The stored payment left the status the caller read.
        Conflict { message: String } => "{message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Insert a payment. At most one non-refunded payment may exist per
    /// booking.
    async fn create(&self, payment: &Payment) -> Result<(), PaymentRepositoryError>;

    /// Store `payment.status` while the stored status is still `from`.
    async fn update(
        &self,
        payment: &Payment,
        from: PaymentStatus,
    ) -> Result<(), PaymentRepositoryError>;

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Payment>, PaymentRepositoryError>;

    /// The pending or completed payment for a booking, if any.
    async fn find_active_for_booking(
        &self,
        booking_id: &Uuid,
    ) -> Result<Option<Payment>, PaymentRepositoryError>;

    /// Payments where the user is payer or payee, newest first.
    async fn list_for_user(&self, user: &UserId) -> Result<Vec<Payment>, PaymentRepositoryError>;
}
