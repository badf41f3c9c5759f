//! Port abstraction for user account persistence and its errors.
use async_trait::async_trait;

use crate::domain::{Account, Email, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// Another account already uses the email address.
        DuplicateEmail { email: String } => "an account already exists for {email}",
    }
}

/// Storage for user accounts, including credentials.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account. Fails with `DuplicateEmail` when the email is taken.
    async fn create(&self, account: &Account) -> Result<(), UserRepositoryError>;

    /// Replace an existing account.
    async fn update(&self, account: &Account) -> Result<(), UserRepositoryError>;

    /// Fetch an account by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<Account>, UserRepositoryError>;

    /// Fetch an account by normalised email.
    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, UserRepositoryError>;
}
