//! Payments for accepted bookings.
//!
//! Amounts are integer minor units (cents) to avoid floating point rounding.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::user::UserId;

/// Validation errors for payment input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentValidationError {
    InvalidCurrency,
    InvalidMethod,
    AmountOverflow,
}

impl fmt::Display for PaymentValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCurrency => write!(f, "currency must be three uppercase letters"),
            Self::InvalidMethod => write!(f, "method must be cash, card, or transfer"),
            Self::AmountOverflow => write!(f, "payment amount is too large"),
        }
    }
}

impl std::error::Error for PaymentValidationError {}

/// ISO 4217-shaped currency code.
///
/// ```
/// use backend::domain::Currency;
///
/// assert_eq!(Currency::default().as_ref(), "USD");
/// assert!(Currency::new("usd").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// Validate a three-letter uppercase code.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, PaymentValidationError> {
        let raw = raw.as_ref();
        if raw.len() != 3 || !raw.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(PaymentValidationError::InvalidCurrency);
        }
        Ok(Self(raw.to_owned()))
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self("USD".to_owned())
    }
}

impl AsRef<str> for Currency {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.0
    }
}

impl TryFrom<String> for Currency {
    type Error = PaymentValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// How the passenger pays the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
}

impl PaymentMethod {
    /// Stable storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Card => "card",
            Self::Transfer => "transfer",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = PaymentValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(Self::Cash),
            "card" => Ok(Self::Card),
            "transfer" => Ok(Self::Transfer),
            _ => Err(PaymentValidationError::InvalidMethod),
        }
    }
}

/// Settlement state of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Refunded,
}

impl PaymentStatus {
    /// Stable storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Refunded => "refunded",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = PaymentStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "refunded" => Ok(Self::Refunded),
            other => Err(PaymentStateError::UnknownStatus(other.to_owned())),
        }
    }
}

/// Errors raised when a payment transition is not allowed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaymentStateError {
    #[error("payment is {from}; cannot move to {to}")]
    InvalidTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },
    #[error("unknown payment status: {0}")]
    UnknownStatus(String),
}

/// A passenger's payment to a driver for one booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub booking_id: Uuid,
    #[schema(value_type = String)]
    pub payer_id: UserId,
    #[schema(value_type = String)]
    pub payee_id: UserId,
    pub amount_cents: i64,
    #[schema(value_type = String, example = "USD")]
    pub currency: Currency,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

/// Amount owed for `seats` at `price_per_seat_cents`.
///
/// ```
/// use backend::domain::payment_amount;
///
/// assert_eq!(payment_amount(3, 1250), Ok(3750));
/// ```
pub fn payment_amount(seats: u8, price_per_seat_cents: i64) -> Result<i64, PaymentValidationError> {
    price_per_seat_cents
        .checked_mul(i64::from(seats))
        .ok_or(PaymentValidationError::AmountOverflow)
}

impl Payment {
    fn move_to(&mut self, from: PaymentStatus, to: PaymentStatus) -> Result<(), PaymentStateError> {
        if self.status != from {
            return Err(PaymentStateError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    /// Driver confirms receipt: `pending -> completed`.
    pub fn confirm(&mut self) -> Result<(), PaymentStateError> {
        self.move_to(PaymentStatus::Pending, PaymentStatus::Completed)
    }

    /// Driver refunds: `completed -> refunded`.
    pub fn refund(&mut self) -> Result<(), PaymentStateError> {
        self.move_to(PaymentStatus::Completed, PaymentStatus::Refunded)
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;
    use crate::domain::fixtures;

    #[fixture]
    fn payment() -> Payment {
        Payment {
            id: Uuid::new_v4(),
            booking_id: Uuid::new_v4(),
            payer_id: UserId::random(),
            payee_id: UserId::random(),
            amount_cents: 3000,
            currency: Currency::default(),
            method: PaymentMethod::Cash,
            status: PaymentStatus::Pending,
            created_at: fixtures::now(),
        }
    }

    #[rstest]
    #[case("US")]
    #[case("USDT")]
    #[case("eur")]
    #[case("E1R")]
    fn currency_rejects_invalid(#[case] raw: &str) {
        assert_eq!(Currency::new(raw), Err(PaymentValidationError::InvalidCurrency));
    }

    #[rstest]
    fn amount_detects_overflow() {
        assert_eq!(
            payment_amount(2, i64::MAX),
            Err(PaymentValidationError::AmountOverflow)
        );
    }

    #[rstest]
    fn confirm_then_refund(mut payment: Payment) {
        assert!(payment.refund().is_err());
        payment.confirm().expect("confirm pending");
        payment.refund().expect("refund completed");
        assert_eq!(payment.status, PaymentStatus::Refunded);
        assert_eq!(
            payment.confirm(),
            Err(PaymentStateError::InvalidTransition {
                from: PaymentStatus::Refunded,
                to: PaymentStatus::Completed,
            })
        );
    }

    #[rstest]
    #[case("cash", PaymentMethod::Cash)]
    #[case("transfer", PaymentMethod::Transfer)]
    fn method_parses(#[case] raw: &str, #[case] method: PaymentMethod) {
        assert_eq!(raw.parse::<PaymentMethod>(), Ok(method));
        assert_eq!(method.as_str(), raw);
    }
}
