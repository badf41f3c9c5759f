//! Vehicle service implementing the [`VehicleService`] driving port.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::domain::ports::{RouteRepository, UserRepository, VehicleRepository, VehicleService};
use crate::domain::service_support::{
    load_account, map_route_repository_error, map_vehicle_repository_error,
};
use crate::domain::{Error, UserId, UserRole, Vehicle, VehicleDraft, VehicleUpdate};

/// Vehicle management restricted to each vehicle's owner.
#[derive(Clone)]
pub struct VehicleServiceImpl {
    users: Arc<dyn UserRepository>,
    vehicles: Arc<dyn VehicleRepository>,
    routes: Arc<dyn RouteRepository>,
}

impl VehicleServiceImpl {
    pub fn new(
        users: Arc<dyn UserRepository>,
        vehicles: Arc<dyn VehicleRepository>,
        routes: Arc<dyn RouteRepository>,
    ) -> Self {
        Self {
            users,
            vehicles,
            routes,
        }
    }

    async fn owned_vehicle(&self, owner: &UserId, vehicle_id: &Uuid) -> Result<Vehicle, Error> {
        let vehicle = self
            .vehicles
            .find_by_id(vehicle_id)
            .await
            .map_err(map_vehicle_repository_error)?
            .ok_or_else(|| Error::not_found(format!("vehicle {vehicle_id} not found")))?;
        if &vehicle.owner_id != owner {
            return Err(Error::forbidden("vehicle belongs to another user"));
        }
        Ok(vehicle)
    }

    async fn ensure_unused(&self, vehicle_id: &Uuid, action: &str) -> Result<(), Error> {
        let in_use = self
            .routes
            .has_active_for_vehicle(vehicle_id)
            .await
            .map_err(map_route_repository_error)?;
        if in_use {
            return Err(Error::conflict(format!(
                "cannot {action} a vehicle used by a scheduled or running route"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl VehicleService for VehicleServiceImpl {
    async fn register(&self, owner: &UserId, draft: VehicleDraft) -> Result<Vehicle, Error> {
        let account = load_account(self.users.as_ref(), owner).await?;
        if account.user.role != UserRole::Driver {
            return Err(Error::forbidden("only drivers can register vehicles"));
        }
        let vehicle = draft.into_vehicle(Uuid::new_v4(), owner.clone());
        self.vehicles
            .create(&vehicle)
            .await
            .map_err(map_vehicle_repository_error)?;
        info!(vehicle_id = %vehicle.id, owner = %owner, "registered vehicle");
        Ok(vehicle)
    }

    async fn list_mine(&self, owner: &UserId) -> Result<Vec<Vehicle>, Error> {
        self.vehicles
            .list_by_owner(owner)
            .await
            .map_err(map_vehicle_repository_error)
    }

    async fn get(&self, owner: &UserId, vehicle_id: &Uuid) -> Result<Vehicle, Error> {
        self.owned_vehicle(owner, vehicle_id).await
    }

    async fn update(
        &self,
        owner: &UserId,
        vehicle_id: &Uuid,
        update: VehicleUpdate,
    ) -> Result<Vehicle, Error> {
        let mut vehicle = self.owned_vehicle(owner, vehicle_id).await?;
        if update.seats.is_some_and(|seats| seats < vehicle.seats) {
            self.ensure_unused(vehicle_id, "remove seats from").await?;
        }
        vehicle.apply(update);
        self.vehicles
            .update(&vehicle)
            .await
            .map_err(map_vehicle_repository_error)?;
        Ok(vehicle)
    }

    async fn delete(&self, owner: &UserId, vehicle_id: &Uuid) -> Result<(), Error> {
        self.owned_vehicle(owner, vehicle_id).await?;
        self.ensure_unused(vehicle_id, "delete").await?;
        self.vehicles
            .delete(vehicle_id)
            .await
            .map_err(map_vehicle_repository_error)?;
        info!(vehicle_id = %vehicle_id, "deleted vehicle");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rstest::rstest;

    use super::*;
    use crate::domain::ports::{
        MockRouteRepository, MockUserRepository, MockVehicleRepository, VehicleRepositoryError,
    };
    use crate::domain::{ErrorCode, VehicleParts, fixtures};

    fn make_service(
        users: MockUserRepository,
        vehicles: MockVehicleRepository,
        routes: MockRouteRepository,
    ) -> VehicleServiceImpl {
        VehicleServiceImpl::new(Arc::new(users), Arc::new(vehicles), Arc::new(routes))
    }

    fn draft() -> VehicleDraft {
        VehicleDraft::try_from_parts(
            VehicleParts {
                make: "Honda",
                model: "Civic",
                year: 2021,
                color: "Blue",
                plate: "7abc-123",
                seats: 4,
            },
            2026,
        )
        .expect("valid draft")
    }

    fn users_returning(role: UserRole) -> (MockUserRepository, UserId) {
        let account = fixtures::account(role, "owner@example.com");
        let id = account.user.id.clone();
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(account)));
        (users, id)
    }

    #[rstest]
    #[tokio::test]
    async fn drivers_register_vehicles() {
        let (users, owner) = users_returning(UserRole::Driver);
        let mut vehicles = MockVehicleRepository::new();
        vehicles.expect_create().times(1).return_once(|_| Ok(()));

        let vehicle = make_service(users, vehicles, MockRouteRepository::new())
            .register(&owner, draft())
            .await
            .expect("registered");
        assert_eq!(vehicle.owner_id, owner);
        assert_eq!(vehicle.plate.as_ref(), "7ABC123");
    }

    #[rstest]
    #[tokio::test]
    async fn passengers_cannot_register_vehicles() {
        let (users, owner) = users_returning(UserRole::Passenger);
        let mut vehicles = MockVehicleRepository::new();
        vehicles.expect_create().never();

        let err = make_service(users, vehicles, MockRouteRepository::new())
            .register(&owner, draft())
            .await
            .expect_err("passenger");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[rstest]
    #[tokio::test]
    async fn duplicate_plate_is_a_conflict() {
        let (users, owner) = users_returning(UserRole::Driver);
        let mut vehicles = MockVehicleRepository::new();
        vehicles
            .expect_create()
            .return_once(|_| Err(VehicleRepositoryError::duplicate_plate("7ABC123")));

        let err = make_service(users, vehicles, MockRouteRepository::new())
            .register(&owner, draft())
            .await
            .expect_err("duplicate");
        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[rstest]
    #[tokio::test]
    async fn other_owners_vehicle_is_forbidden() {
        let vehicle = fixtures::vehicle(&UserId::random(), 4);
        let id = vehicle.id;
        let mut vehicles = MockVehicleRepository::new();
        vehicles
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(vehicle)));

        let err = make_service(MockUserRepository::new(), vehicles, MockRouteRepository::new())
            .get(&UserId::random(), &id)
            .await
            .expect_err("not owner");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[rstest]
    #[case(true, Some(ErrorCode::Conflict))]
    #[case(false, None)]
    #[tokio::test]
    async fn delete_checks_active_routes(
        #[case] in_use: bool,
        #[case] expected: Option<ErrorCode>,
    ) {
        let owner = UserId::random();
        let vehicle = fixtures::vehicle(&owner, 4);
        let id = vehicle.id;
        let mut vehicles = MockVehicleRepository::new();
        vehicles
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(vehicle)));
        vehicles
            .expect_delete()
            .times(usize::from(!in_use))
            .returning(|_| Ok(true));
        let mut routes = MockRouteRepository::new();
        routes
            .expect_has_active_for_vehicle()
            .return_once(move |_| Ok(in_use));

        let result = make_service(MockUserRepository::new(), vehicles, routes)
            .delete(&owner, &id)
            .await;
        assert_eq!(result.err().map(|err| err.code()), expected);
    }
}
