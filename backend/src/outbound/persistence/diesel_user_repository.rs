//! PostgreSQL-backed `UserRepository` and `ProfileRepository`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{
    ProfileRepository, ProfileRepositoryError, UserRepository, UserRepositoryError,
};
use crate::domain::{Account, DriverProfile, Email, PassengerProfile, UserId};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error, map_row_error, unique_violation};
use super::models::{DriverProfileRow, PassengerProfileRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::{driver_profiles, passenger_profiles, users};

/// Diesel-backed account storage.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> UserRepositoryError {
    map_pool_error(error, UserRepositoryError::connection)
}

fn write_error(error: diesel::result::Error, email: &Email) -> UserRepositoryError {
    if unique_violation(&error).is_some() {
        return UserRepositoryError::duplicate_email(email.as_ref());
    }
    map_diesel_error(
        error,
        UserRepositoryError::query,
        UserRepositoryError::connection,
    )
}

fn read_error(error: diesel::result::Error) -> UserRepositoryError {
    map_diesel_error(
        error,
        UserRepositoryError::query,
        UserRepositoryError::connection,
    )
}

fn into_account(row: Option<UserRow>) -> Result<Option<Account>, UserRepositoryError> {
    row.map(Account::try_from)
        .transpose()
        .map_err(|err| map_row_error(err, UserRepositoryError::query))
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn create(&self, account: &Account) -> Result<(), UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(users::table)
            .values(UserRow::from(account))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| write_error(err, &account.user.email))
    }

    async fn update(&self, account: &Account) -> Result<(), UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let updated = diesel::update(users::table.find(account.user.id.as_uuid()))
            .set(UserRow::from(account))
            .execute(&mut conn)
            .await
            .map_err(|err| write_error(err, &account.user.email))?;
        if updated == 0 {
            return Err(UserRepositoryError::query(format!(
                "account {} does not exist",
                account.user.id
            )));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<Account>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = users::table
            .find(id.as_uuid())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(read_error)?;
        into_account(row)
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = users::table
            .filter(users::email.eq(email.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(read_error)?;
        into_account(row)
    }
}

/// Diesel-backed driver and passenger profile storage.
#[derive(Clone)]
pub struct DieselProfileRepository {
    pool: DbPool,
}

impl DieselProfileRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn profile_pool_error(error: PoolError) -> ProfileRepositoryError {
    map_pool_error(error, ProfileRepositoryError::connection)
}

fn profile_error(error: diesel::result::Error) -> ProfileRepositoryError {
    map_diesel_error(
        error,
        ProfileRepositoryError::query,
        ProfileRepositoryError::connection,
    )
}

#[async_trait]
impl ProfileRepository for DieselProfileRepository {
    async fn save_driver(&self, profile: &DriverProfile) -> Result<(), ProfileRepositoryError> {
        let mut conn = self.pool.get().await.map_err(profile_pool_error)?;
        diesel::insert_into(driver_profiles::table)
            .values(DriverProfileRow::from(profile))
            .on_conflict(driver_profiles::user_id)
            .do_update()
            .set((
                driver_profiles::license_number.eq(excluded(driver_profiles::license_number)),
                driver_profiles::license_document.eq(excluded(driver_profiles::license_document)),
                driver_profiles::verified.eq(excluded(driver_profiles::verified)),
            ))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(profile_error)
    }

    async fn find_driver(
        &self,
        user_id: &UserId,
    ) -> Result<Option<DriverProfile>, ProfileRepositoryError> {
        let mut conn = self.pool.get().await.map_err(profile_pool_error)?;
        let row = driver_profiles::table
            .find(user_id.as_uuid())
            .select(DriverProfileRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(profile_error)?;
        row.map(DriverProfile::try_from)
            .transpose()
            .map_err(|err| map_row_error(err, ProfileRepositoryError::query))
    }

    async fn save_passenger(
        &self,
        profile: &PassengerProfile,
    ) -> Result<(), ProfileRepositoryError> {
        let mut conn = self.pool.get().await.map_err(profile_pool_error)?;
        diesel::insert_into(passenger_profiles::table)
            .values(PassengerProfileRow::from(profile))
            .on_conflict(passenger_profiles::user_id)
            .do_update()
            .set((
                passenger_profiles::emergency_contact
                    .eq(excluded(passenger_profiles::emergency_contact)),
                passenger_profiles::preferences.eq(excluded(passenger_profiles::preferences)),
            ))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(profile_error)
    }

    async fn find_passenger(
        &self,
        user_id: &UserId,
    ) -> Result<Option<PassengerProfile>, ProfileRepositoryError> {
        let mut conn = self.pool.get().await.map_err(profile_pool_error)?;
        let row = passenger_profiles::table
            .find(user_id.as_uuid())
            .select(PassengerProfileRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(profile_error)?;
        row.map(PassengerProfile::try_from)
            .transpose()
            .map_err(|err| map_row_error(err, ProfileRepositoryError::query))
    }
}
