//! Account service implementing the [`AccountService`] driving port.
//!
//! Password hashing and verification run on the blocking pool.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::domain::ports::{
    AccountService, ProfileRepository, PublicProfile, RatingRepository, UserRepository,
};
use crate::domain::service_support::{
    load_account, map_profile_repository_error, map_rating_repository_error,
    map_user_repository_error,
};
use crate::domain::{
    Account, AuthProvider, DriverProfile, Error, GoogleIdentity, LicenseNumber, LoginCredentials,
    PassengerProfile, PasswordHash, RatingSummary, Registration, User, UserId, UserProfileUpdate,
    UserRole,
};

const INVALID_CREDENTIALS: &str = "invalid email or password";

/// Account and profile use-cases backed by the user, profile and rating
/// repositories.
#[derive(Clone)]
pub struct AccountServiceImpl {
    users: Arc<dyn UserRepository>,
    profiles: Arc<dyn ProfileRepository>,
    ratings: Arc<dyn RatingRepository>,
    clock: Arc<dyn Clock>,
}

impl AccountServiceImpl {
    /// Create the service from its driven ports.
    pub fn new(
        users: Arc<dyn UserRepository>,
        profiles: Arc<dyn ProfileRepository>,
        ratings: Arc<dyn RatingRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            profiles,
            ratings,
            clock,
        }
    }

    async fn hash_password(password: Zeroizing<String>) -> Result<PasswordHash, Error> {
        tokio::task::spawn_blocking(move || PasswordHash::hash(password.as_str()))
            .await
            .map_err(|err| Error::internal(format!("password hashing task failed: {err}")))?
            .map_err(|err| Error::internal(err.to_string()))
    }

    async fn verify_password(hash: PasswordHash, password: Zeroizing<String>) -> bool {
        tokio::task::spawn_blocking(move || hash.verify(password.as_str()))
            .await
            .unwrap_or(false)
    }

    async fn load_user(&self, user_id: &UserId) -> Result<User, Error> {
        Ok(load_account(self.users.as_ref(), user_id).await?.user)
    }
}

#[async_trait]
impl AccountService for AccountServiceImpl {
    async fn register(&self, registration: Registration) -> Result<User, Error> {
        let Registration {
            email,
            full_name,
            password,
            role,
            phone,
        } = registration;

        let existing = self
            .users
            .find_by_email(&email)
            .await
            .map_err(map_user_repository_error)?;
        if existing.is_some() {
            return Err(Error::conflict(format!("an account already exists for {email}")));
        }

        let password_hash = Self::hash_password(password).await?;
        let user = User {
            id: UserId::random(),
            email,
            full_name,
            phone,
            role,
            avatar_url: None,
            provider: AuthProvider::Password,
            created_at: self.clock.utc(),
        };
        let account = Account {
            user,
            password_hash: Some(password_hash),
            google_subject: None,
        };
        self.users
            .create(&account)
            .await
            .map_err(map_user_repository_error)?;
        info!(user_id = %account.user.id, role = account.user.role.as_str(), "registered user");
        Ok(account.user)
    }

    async fn login(&self, credentials: &LoginCredentials) -> Result<User, Error> {
        let account = self
            .users
            .find_by_email(credentials.email())
            .await
            .map_err(map_user_repository_error)?
            .ok_or_else(|| Error::unauthorized(INVALID_CREDENTIALS))?;
        let Some(hash) = account.password_hash.clone() else {
            debug!(user_id = %account.user.id, "password login for account without password");
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        };
        let password = Zeroizing::new(credentials.password().to_owned());
        if !Self::verify_password(hash, password).await {
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        }
        Ok(account.user)
    }

    async fn login_with_google(&self, identity: GoogleIdentity) -> Result<User, Error> {
        let GoogleIdentity {
            subject,
            email,
            full_name,
            picture,
        } = identity;

        let existing = self
            .users
            .find_by_email(&email)
            .await
            .map_err(map_user_repository_error)?;

        if let Some(mut account) = existing {
            if account
                .google_subject
                .as_deref()
                .is_some_and(|known| known != subject)
            {
                return Err(Error::unauthorized(
                    "google account does not match the linked identity",
                ));
            }
            account.google_subject = Some(subject);
            if account.user.avatar_url.is_none() {
                account.user.avatar_url = picture;
            }
            self.users
                .update(&account)
                .await
                .map_err(map_user_repository_error)?;
            return Ok(account.user);
        }

        let account = Account {
            user: User {
                id: UserId::random(),
                email,
                full_name,
                phone: None,
                role: UserRole::Passenger,
                avatar_url: picture,
                provider: AuthProvider::Google,
                created_at: self.clock.utc(),
            },
            password_hash: None,
            google_subject: Some(subject),
        };
        self.users
            .create(&account)
            .await
            .map_err(map_user_repository_error)?;
        info!(user_id = %account.user.id, "registered user via google");
        Ok(account.user)
    }

    async fn me(&self, user_id: &UserId) -> Result<User, Error> {
        self.load_user(user_id).await
    }

    async fn update_profile(
        &self,
        user_id: &UserId,
        update: UserProfileUpdate,
    ) -> Result<User, Error> {
        if update.is_empty() {
            return Err(Error::invalid_request("no profile fields to update"));
        }
        let mut account = load_account(self.users.as_ref(), user_id).await?;
        account.user.apply(update);
        self.users
            .update(&account)
            .await
            .map_err(map_user_repository_error)?;
        Ok(account.user)
    }

    async fn public_profile(&self, user_id: &UserId) -> Result<PublicProfile, Error> {
        let user = self.load_user(user_id).await?;
        let ratings = self
            .ratings
            .list_for_ratee(user_id)
            .await
            .map_err(map_rating_repository_error)?;
        Ok(PublicProfile {
            rating: RatingSummary::from_ratings(user.id.clone(), &ratings),
            id: user.id,
            full_name: user.full_name.into(),
            role: user.role,
            avatar_url: user.avatar_url,
        })
    }

    async fn upsert_driver_profile(
        &self,
        user_id: &UserId,
        license_number: LicenseNumber,
    ) -> Result<DriverProfile, Error> {
        let user = self.load_user(user_id).await?;
        if user.role != UserRole::Driver {
            return Err(Error::forbidden("only drivers can have a driver profile"));
        }
        let existing = self
            .profiles
            .find_driver(user_id)
            .await
            .map_err(map_profile_repository_error)?;
        let profile = match existing {
            Some(mut profile) => {
                if profile.license_number != license_number {
                    profile.license_number = license_number;
                    profile.verified = false;
                }
                profile
            }
            None => DriverProfile::new(user_id.clone(), license_number),
        };
        self.profiles
            .save_driver(&profile)
            .await
            .map_err(map_profile_repository_error)?;
        Ok(profile)
    }

    async fn get_driver_profile(&self, user_id: &UserId) -> Result<DriverProfile, Error> {
        self.profiles
            .find_driver(user_id)
            .await
            .map_err(map_profile_repository_error)?
            .ok_or_else(|| Error::not_found("driver profile not found"))
    }

    async fn upsert_passenger_profile(
        &self,
        profile: PassengerProfile,
    ) -> Result<PassengerProfile, Error> {
        self.load_user(&profile.user_id).await?;
        self.profiles
            .save_passenger(&profile)
            .await
            .map_err(map_profile_repository_error)?;
        Ok(profile)
    }

    async fn get_passenger_profile(&self, user_id: &UserId) -> Result<PassengerProfile, Error> {
        self.profiles
            .find_passenger(user_id)
            .await
            .map_err(map_profile_repository_error)?
            .ok_or_else(|| Error::not_found("passenger profile not found"))
    }
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;
