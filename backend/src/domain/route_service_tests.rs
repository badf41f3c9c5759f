//! Tests for the route service.

use std::sync::{Arc, Mutex};

use chrono::Duration;
use rstest::rstest;

use super::*;
use crate::domain::ports::{
    DisabledMapsSource, MockBookingRepository, MockMapsSource, MockRouteRepository,
    MockUserRepository, MockVehicleRepository, RouteRepositoryError,
};
use crate::domain::{
    BookingStatus, Coordinates, DirectionsLeg, ErrorCode, GeocodeResult, Pagination, RouteFilter,
    RouteSort, RouteStatus, Vehicle, fixtures,
};

struct Mocks {
    users: MockUserRepository,
    vehicles: MockVehicleRepository,
    routes: MockRouteRepository,
    bookings: MockBookingRepository,
    maps: Arc<dyn MapsSource>,
}

impl Mocks {
    fn new() -> Self {
        Self {
            users: MockUserRepository::new(),
            vehicles: MockVehicleRepository::new(),
            routes: MockRouteRepository::new(),
            bookings: MockBookingRepository::new(),
            maps: Arc::new(DisabledMapsSource),
        }
    }

    fn build(self) -> RouteServiceImpl {
        RouteServiceImpl::new(
            Arc::new(self.users),
            Arc::new(self.vehicles),
            Arc::new(self.routes),
            Arc::new(self.bookings),
            self.maps,
            fixtures::clock(),
        )
    }

    fn with_user(mut self, role: UserRole) -> (Self, UserId) {
        let account = fixtures::account(role, "driver@example.com");
        let id = account.user.id.clone();
        self.users
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(account)));
        (self, id)
    }

    fn with_vehicle(mut self, vehicle: Vehicle) -> Self {
        self.vehicles
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(vehicle)));
        self
    }

    fn with_route(mut self, route: CarpoolRoute) -> Self {
        self.routes
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(route)));
        self
    }
}

fn draft(vehicle: &Vehicle) -> RouteDraft {
    RouteDraft {
        vehicle_id: vehicle.id,
        origin: fixtures::place("Ferry Building, San Francisco"),
        destination: fixtures::place("Palo Alto Caltrain"),
        waypoints: Vec::new(),
        departure_at: fixtures::now() + Duration::hours(3),
        seats: 3,
        price_per_seat_cents: 1200,
        notes: None,
    }
}

#[rstest]
#[tokio::test]
async fn create_publishes_scheduled_route() {
    let (mut mocks, driver) = Mocks::new().with_user(UserRole::Driver);
    let vehicle = fixtures::vehicle(&driver, 4);
    let draft = draft(&vehicle);
    mocks = mocks.with_vehicle(vehicle);
    mocks.routes.expect_create().times(1).return_once(|_| Ok(()));

    let route = mocks
        .build()
        .create(&driver, draft)
        .await
        .expect("route created");
    assert_eq!(route.status, RouteStatus::Scheduled);
    assert_eq!(route.seats_available, 3);
    assert_eq!(route.created_at, fixtures::now());
    assert!(route.origin.coordinates.is_none());
}

#[rstest]
#[tokio::test]
async fn create_geocodes_places_without_coordinates() {
    let (mut mocks, driver) = Mocks::new().with_user(UserRole::Driver);
    let vehicle = fixtures::vehicle(&driver, 4);
    let draft = draft(&vehicle);
    mocks = mocks.with_vehicle(vehicle);
    let mut maps = MockMapsSource::new();
    maps.expect_geocode().times(2).returning(|address| {
        Ok(GeocodeResult {
            formatted_address: address.to_owned(),
            coordinates: Coordinates::new(37.7, -122.4).expect("coords"),
        })
    });
    mocks.maps = Arc::new(maps);
    mocks.routes.expect_create().return_once(|_| Ok(()));

    let route = mocks.build().create(&driver, draft).await.expect("created");
    assert!(route.origin.coordinates.is_some());
    assert!(route.destination.coordinates.is_some());
}

#[rstest]
#[tokio::test]
async fn create_keeps_going_when_geocoding_fails() {
    let (mut mocks, driver) = Mocks::new().with_user(UserRole::Driver);
    let vehicle = fixtures::vehicle(&driver, 4);
    let draft = draft(&vehicle);
    mocks = mocks.with_vehicle(vehicle);
    let mut maps = MockMapsSource::new();
    maps.expect_geocode()
        .returning(|_| Err(MapsSourceError::quota()));
    mocks.maps = Arc::new(maps);
    mocks.routes.expect_create().return_once(|_| Ok(()));

    let route = mocks.build().create(&driver, draft).await.expect("created");
    assert!(route.origin.coordinates.is_none());
}

#[rstest]
#[tokio::test]
async fn create_rejects_passengers() {
    let (mut mocks, passenger) = Mocks::new().with_user(UserRole::Passenger);
    let vehicle = fixtures::vehicle(&passenger, 4);
    mocks.routes.expect_create().never();

    let err = mocks
        .build()
        .create(&passenger, draft(&vehicle))
        .await
        .expect_err("passenger");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn create_rejects_more_seats_than_vehicle_has() {
    let (mocks, driver) = Mocks::new().with_user(UserRole::Driver);
    let vehicle = fixtures::vehicle(&driver, 2);
    let draft = draft(&vehicle);
    let mocks = mocks.with_vehicle(vehicle);

    let err = mocks
        .build()
        .create(&driver, draft)
        .await
        .expect_err("too many seats");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(
        err.details()
            .and_then(|details| details.get("field"))
            .and_then(|field| field.as_str()),
        Some("seats")
    );
}

#[rstest]
#[tokio::test]
async fn search_paginates_and_reports_total() {
    let driver = UserId::random();
    let vehicle = fixtures::vehicle(&driver, 4);
    let routes: Vec<CarpoolRoute> = (1..=3)
        .map(|hours| {
            let mut route = fixtures::route(&driver, &vehicle, 4);
            route.departure_at = fixtures::now() + Duration::hours(hours);
            route
        })
        .collect();
    let second = routes.get(1).map(|route| route.id);
    let mut mocks = Mocks::new();
    mocks
        .routes
        .expect_list_searchable()
        .withf(|include_past| !include_past)
        .return_once(move |_| Ok(routes));

    let page = mocks
        .build()
        .search(RouteSearchRequest {
            filter: RouteFilter::default(),
            sort: RouteSort::Departure,
            pagination: Pagination::new(Some(1), Some(1)).expect("pagination"),
        })
        .await
        .expect("search");
    assert_eq!(page.total, 3);
    assert_eq!(page.routes.iter().map(|r| r.id).collect::<Vec<_>>(), vec![
        second.expect("second route")
    ]);
}

#[rstest]
#[tokio::test]
async fn search_reports_repository_outage() {
    let mut mocks = Mocks::new();
    mocks
        .routes
        .expect_list_searchable()
        .return_once(|_| Err(RouteRepositoryError::connection("down")));

    let err = mocks
        .build()
        .search(RouteSearchRequest::default())
        .await
        .expect_err("outage");
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}

#[rstest]
#[tokio::test]
async fn only_driver_may_update() {
    let route = fixtures::route(&UserId::random(), &fixtures::vehicle(&UserId::random(), 4), 4);
    let id = route.id;
    let mut mocks = Mocks::new().with_route(route);
    mocks.routes.expect_update().never();

    let err = mocks
        .build()
        .update(&UserId::random(), &id, RouteUpdateRequest::default())
        .await
        .expect_err("not driver");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn update_rejects_finished_routes() {
    let driver = UserId::random();
    let mut route = fixtures::route(&driver, &fixtures::vehicle(&driver, 4), 4);
    route.status = RouteStatus::Completed;
    let id = route.id;
    let mocks = Mocks::new().with_route(route);

    let err = mocks
        .build()
        .update(
            &driver,
            &id,
            RouteUpdateRequest {
                price_per_seat_cents: Some(900),
                ..RouteUpdateRequest::default()
            },
        )
        .await
        .expect_err("completed route");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn cancelling_route_cancels_active_bookings() {
    let driver = UserId::random();
    let route = fixtures::route(&driver, &fixtures::vehicle(&driver, 4), 4);
    let id = route.id;
    let mut accepted = fixtures::booking(&route, &UserId::random(), 2);
    accepted.status = BookingStatus::Accepted;
    let pending = fixtures::booking(&route, &UserId::random(), 1);
    let mut rejected = fixtures::booking(&route, &UserId::random(), 1);
    rejected.status = BookingStatus::Rejected;

    let mut mocks = Mocks::new().with_route(route);
    mocks
        .routes
        .expect_update()
        .withf(|route, expected| {
            route.status == RouteStatus::Cancelled && *expected == RouteStatus::Scheduled
        })
        .times(1)
        .return_once(|_, _| Ok(()));
    mocks
        .bookings
        .expect_list_by_route()
        .return_once(move |_| Ok(vec![accepted, pending, rejected]));
    let updated = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&updated);
    mocks
        .bookings
        .expect_transition()
        .times(2)
        .returning(move |booking, from, seats| {
            assert_eq!(seats, SeatChange::None);
            sink.lock().expect("lock").push((from, booking.status));
            Ok(())
        });

    let route = mocks
        .build()
        .transition(&driver, &id, RouteTransition::Cancel)
        .await
        .expect("cancelled");
    assert_eq!(route.status, RouteStatus::Cancelled);
    assert_eq!(
        *updated.lock().expect("lock"),
        vec![
            (BookingStatus::Accepted, BookingStatus::Cancelled),
            (BookingStatus::Pending, BookingStatus::Cancelled),
        ]
    );
}

#[rstest]
#[tokio::test]
async fn invalid_transition_is_a_conflict() {
    let driver = UserId::random();
    let route = fixtures::route(&driver, &fixtures::vehicle(&driver, 4), 4);
    let id = route.id;
    let mut mocks = Mocks::new().with_route(route);
    mocks.routes.expect_update().never();

    let err = mocks
        .build()
        .transition(&driver, &id, RouteTransition::Complete)
        .await
        .expect_err("scheduled routes cannot complete");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn directions_include_accepted_pickups() {
    let driver = UserId::random();
    let route = fixtures::route(&driver, &fixtures::vehicle(&driver, 4), 4);
    let id = route.id;
    let mut booking = fixtures::booking(&route, &UserId::random(), 1);
    booking.status = BookingStatus::Accepted;
    booking.pickup = Some(fixtures::place("Millbrae Station"));

    let mut mocks = Mocks::new().with_route(route);
    mocks
        .bookings
        .expect_list_by_route()
        .return_once(move |_| Ok(vec![booking]));
    let mut maps = MockMapsSource::new();
    maps.expect_directions()
        .withf(|request| request.waypoints().len() == 1)
        .return_once(|_| {
            Ok(DirectionsPlan::from_legs(
                "poly".into(),
                vec![DirectionsLeg {
                    start_address: "a".into(),
                    end_address: "b".into(),
                    distance_meters: 1000,
                    duration_seconds: 60,
                }],
            ))
        });
    mocks.maps = Arc::new(maps);

    let plan = mocks.build().directions(&id).await.expect("plan");
    assert_eq!(plan.distance_meters, 1000);
}

#[rstest]
#[tokio::test]
async fn directions_without_provider_are_unavailable() {
    let driver = UserId::random();
    let route = fixtures::route(&driver, &fixtures::vehicle(&driver, 4), 4);
    let id = route.id;
    let mut mocks = Mocks::new().with_route(route);
    mocks
        .bookings
        .expect_list_by_route()
        .return_once(|_| Ok(Vec::new()));

    let err = mocks.build().directions(&id).await.expect_err("disabled");
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}

#[rstest]
#[tokio::test]
async fn status_change_after_concurrent_cancel_is_a_conflict() {
    let driver = UserId::random();
    let route = fixtures::route(&driver, &fixtures::vehicle(&driver, 4), 4);
    let id = route.id;
    let mut mocks = Mocks::new().with_route(route);
    mocks.routes.expect_update().times(1).return_once(|_, _| {
        Err(RouteRepositoryError::conflict("route changed status"))
    });
    mocks.bookings.expect_list_by_route().never();

    let err = mocks
        .build()
        .transition(&driver, &id, RouteTransition::Start)
        .await
        .expect_err("stale status");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn cascade_skips_bookings_cancelled_meanwhile() {
    let driver = UserId::random();
    let route = fixtures::route(&driver, &fixtures::vehicle(&driver, 4), 4);
    let id = route.id;
    let pending = fixtures::booking(&route, &UserId::random(), 1);
    let mut mocks = Mocks::new().with_route(route);
    mocks.routes.expect_update().return_once(|_, _| Ok(()));
    mocks
        .bookings
        .expect_list_by_route()
        .return_once(move |_| Ok(vec![pending]));
    mocks.bookings.expect_transition().times(1).return_once(|_, _, _| {
        Err(BookingRepositoryError::conflict("booking already cancelled"))
    });

    let route = mocks
        .build()
        .transition(&driver, &id, RouteTransition::Cancel)
        .await
        .expect("cancelled");
    assert_eq!(route.status, RouteStatus::Cancelled);
}
