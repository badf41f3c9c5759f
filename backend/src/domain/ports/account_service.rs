//! Driving port for account, session identity, and profile use-cases.
//!
//! Inbound adapters call this port to register, authenticate, and manage
//! profiles without importing persistence adapters.

use async_trait::async_trait;
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{
    DriverProfile, Error, GoogleIdentity, LicenseNumber, LoginCredentials, PassengerProfile,
    RatingSummary, Registration, User, UserId, UserProfileUpdate, UserRole,
};

/// What other users may see about an account.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    #[schema(value_type = String)]
    pub id: UserId,
    pub full_name: String,
    pub role: UserRole,
    pub avatar_url: Option<String>,
    pub rating: RatingSummary,
}

/// Domain use-case port for accounts and profiles.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Create a password account and return the new user.
    async fn register(&self, registration: Registration) -> Result<User, Error>;

    /// Validate credentials and return the authenticated user.
    async fn login(&self, credentials: &LoginCredentials) -> Result<User, Error>;

    /// Find or create the account matching a verified Google identity.
    async fn login_with_google(&self, identity: GoogleIdentity) -> Result<User, Error>;

    /// Return the caller's own account.
    async fn me(&self, user_id: &UserId) -> Result<User, Error>;

    async fn update_profile(
        &self,
        user_id: &UserId,
        update: UserProfileUpdate,
    ) -> Result<User, Error>;

    /// Public view of any user, with their rating summary.
    async fn public_profile(&self, user_id: &UserId) -> Result<PublicProfile, Error>;

    /// Create or replace the caller's driver profile.
    async fn upsert_driver_profile(
        &self,
        user_id: &UserId,
        license_number: LicenseNumber,
    ) -> Result<DriverProfile, Error>;

    async fn get_driver_profile(&self, user_id: &UserId) -> Result<DriverProfile, Error>;

    /// Create or replace the caller's passenger profile.
    async fn upsert_passenger_profile(
        &self,
        profile: PassengerProfile,
    ) -> Result<PassengerProfile, Error>;

    async fn get_passenger_profile(&self, user_id: &UserId) -> Result<PassengerProfile, Error>;
}
