//! Tests for the booking service.

use std::sync::Arc;

use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{
    BookingRepositoryError, MockBookingRepository, MockRouteRepository, RouteRepositoryError,
};
use crate::outbound::memory::InMemoryStore;
use crate::domain::{BookingStatus, CarpoolRoute, ErrorCode, RouteStatus, fixtures};

struct World {
    driver: UserId,
    passenger: UserId,
    route: CarpoolRoute,
}

#[fixture]
fn world() -> World {
    let driver = UserId::random();
    let vehicle = fixtures::vehicle(&driver, 4);
    World {
        route: fixtures::route(&driver, &vehicle, 3),
        driver,
        passenger: UserId::random(),
    }
}

fn make_service(routes: MockRouteRepository, bookings: MockBookingRepository) -> BookingServiceImpl {
    BookingServiceImpl::new(Arc::new(routes), Arc::new(bookings), fixtures::clock())
}

fn routes_returning(route: CarpoolRoute) -> MockRouteRepository {
    let mut routes = MockRouteRepository::new();
    routes
        .expect_find_by_id()
        .returning(move |_| Ok(Some(route.clone())));
    routes
}

fn bookings_returning(booking: Booking) -> MockBookingRepository {
    let mut bookings = MockBookingRepository::new();
    bookings
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(booking)));
    bookings
}

fn request(route: &CarpoolRoute, seats: u8) -> BookingRequest {
    BookingRequest {
        route_id: route.id,
        seats,
        pickup: None,
    }
}

#[rstest]
#[tokio::test]
async fn passenger_requests_pending_booking(world: World) {
    let mut bookings = MockBookingRepository::new();
    bookings
        .expect_list_by_route()
        .return_once(|_| Ok(Vec::new()));
    bookings.expect_create().times(1).return_once(|_| Ok(()));
    let req = request(&world.route, 2);

    let booking = make_service(routes_returning(world.route), bookings)
        .request(&world.passenger, req)
        .await
        .expect("booked");
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.seats, 2);
}

#[rstest]
#[tokio::test]
async fn driver_cannot_book_own_route(world: World) {
    let req = request(&world.route, 1);
    let err = make_service(routes_returning(world.route), MockBookingRepository::new())
        .request(&world.driver, req)
        .await
        .expect_err("own route");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn second_active_booking_is_a_conflict(world: World) {
    let existing = fixtures::booking(&world.route, &world.passenger, 1);
    let mut bookings = MockBookingRepository::new();
    bookings
        .expect_list_by_route()
        .return_once(move |_| Ok(vec![existing]));
    bookings.expect_create().never();
    let req = request(&world.route, 1);

    let err = make_service(routes_returning(world.route), bookings)
        .request(&world.passenger, req)
        .await
        .expect_err("duplicate");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[case(RouteStatus::InProgress)]
#[case(RouteStatus::Cancelled)]
#[tokio::test]
async fn booking_requires_scheduled_route(mut world: World, #[case] status: RouteStatus) {
    world.route.status = status;
    let req = request(&world.route, 1);
    let err = make_service(routes_returning(world.route), MockBookingRepository::new())
        .request(&world.passenger, req)
        .await
        .expect_err("not scheduled");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn requesting_more_seats_than_free_is_a_conflict(mut world: World) {
    world.route.seats_available = 1;
    let req = request(&world.route, 2);
    let err = make_service(routes_returning(world.route), MockBookingRepository::new())
        .request(&world.passenger, req)
        .await
        .expect_err("not enough seats");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn accept_reserves_seats_atomically(world: World) {
    let booking = fixtures::booking(&world.route, &world.passenger, 2);
    let id = booking.id;
    let mut bookings = bookings_returning(booking);
    bookings
        .expect_transition()
        .withf(|booking, from, seats| {
            booking.status == BookingStatus::Accepted
                && *from == BookingStatus::Pending
                && *seats == SeatChange::Reserve(2)
        })
        .times(1)
        .return_once(|_, _, _| Ok(()));

    let accepted = make_service(routes_returning(world.route), bookings)
        .accept(&world.driver, &id)
        .await
        .expect("accepted");
    assert_eq!(accepted.status, BookingStatus::Accepted);
}

#[rstest]
#[tokio::test]
async fn accept_fails_when_seats_run_out(mut world: World) {
    world.route.seats_available = 1;
    let booking = fixtures::booking(&world.route, &world.passenger, 2);
    let id = booking.id;
    let mut bookings = bookings_returning(booking);
    bookings.expect_transition().never();

    let err = make_service(routes_returning(world.route), bookings)
        .accept(&world.driver, &id)
        .await
        .expect_err("insufficient seats");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn only_driver_accepts(world: World) {
    let booking = fixtures::booking(&world.route, &world.passenger, 1);
    let id = booking.id;
    let err = make_service(routes_returning(world.route), bookings_returning(booking))
        .accept(&world.passenger, &id)
        .await
        .expect_err("passenger cannot accept");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn cancelling_accepted_booking_releases_seats(mut world: World) {
    world.route.seats_available = 1;
    let mut booking = fixtures::booking(&world.route, &world.passenger, 2);
    booking.status = BookingStatus::Accepted;
    let id = booking.id;
    let mut bookings = bookings_returning(booking);
    bookings
        .expect_transition()
        .withf(|booking, from, seats| {
            booking.status == BookingStatus::Cancelled
                && *from == BookingStatus::Accepted
                && *seats == SeatChange::Release(2)
        })
        .times(1)
        .return_once(|_, _, _| Ok(()));

    let cancelled = make_service(routes_returning(world.route), bookings)
        .cancel(&world.passenger, &id)
        .await
        .expect("cancelled");
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
}

#[rstest]
#[tokio::test]
async fn cancelling_pending_booking_leaves_seats(world: World) {
    let booking = fixtures::booking(&world.route, &world.passenger, 2);
    let id = booking.id;
    let mut bookings = bookings_returning(booking);
    bookings
        .expect_transition()
        .withf(|_, from, seats| *from == BookingStatus::Pending && *seats == SeatChange::None)
        .times(1)
        .return_once(|_, _, _| Ok(()));

    make_service(routes_returning(world.route), bookings)
        .cancel(&world.passenger, &id)
        .await
        .expect("cancelled");
}

#[rstest]
#[tokio::test]
async fn only_passenger_cancels(world: World) {
    let booking = fixtures::booking(&world.route, &world.passenger, 1);
    let id = booking.id;
    let err = make_service(routes_returning(world.route), bookings_returning(booking))
        .cancel(&world.driver, &id)
        .await
        .expect_err("driver cannot cancel");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn rejecting_accepted_booking_is_a_conflict(world: World) {
    let mut booking = fixtures::booking(&world.route, &world.passenger, 1);
    booking.status = BookingStatus::Accepted;
    let id = booking.id;
    let err = make_service(routes_returning(world.route), bookings_returning(booking))
        .reject(&world.driver, &id)
        .await
        .expect_err("already accepted");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn accept_losing_a_seat_race_is_a_conflict(world: World) {
    let booking = fixtures::booking(&world.route, &world.passenger, 2);
    let id = booking.id;
    let mut bookings = bookings_returning(booking);
    bookings.expect_transition().times(1).return_once(|_, _, _| {
        Err(BookingRepositoryError::conflict("route has too few seats left"))
    });

    let err = make_service(routes_returning(world.route), bookings)
        .accept(&world.driver, &id)
        .await
        .expect_err("lost race");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

/// Route reads that hand control back to the scheduler, so concurrent
/// accepts interleave between their read and their write.
struct YieldingRoutes(InMemoryStore);

#[async_trait]
impl RouteRepository for YieldingRoutes {
    async fn create(&self, route: &CarpoolRoute) -> Result<(), RouteRepositoryError> {
        RouteRepository::create(&self.0, route).await
    }

    async fn update(
        &self,
        route: &CarpoolRoute,
        expected: RouteStatus,
    ) -> Result<(), RouteRepositoryError> {
        RouteRepository::update(&self.0, route, expected).await
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<CarpoolRoute>, RouteRepositoryError> {
        let found = RouteRepository::find_by_id(&self.0, id).await;
        tokio::task::yield_now().await;
        found
    }

    async fn list_searchable(
        &self,
        include_past: bool,
    ) -> Result<Vec<CarpoolRoute>, RouteRepositoryError> {
        self.0.list_searchable(include_past).await
    }

    async fn list_by_driver(
        &self,
        driver: &UserId,
    ) -> Result<Vec<CarpoolRoute>, RouteRepositoryError> {
        self.0.list_by_driver(driver).await
    }

    async fn has_active_for_vehicle(
        &self,
        vehicle_id: &Uuid,
    ) -> Result<bool, RouteRepositoryError> {
        self.0.has_active_for_vehicle(vehicle_id).await
    }
}

#[rstest]
#[tokio::test]
async fn concurrent_accepts_never_overbook(world: World) {
    let store = InMemoryStore::new();
    RouteRepository::create(&store, &world.route)
        .await
        .expect("route");
    let first = fixtures::booking(&world.route, &UserId::random(), 2);
    let second = fixtures::booking(&world.route, &UserId::random(), 2);
    for booking in [&first, &second] {
        BookingRepository::create(&store, booking)
            .await
            .expect("booking");
    }
    let service = BookingServiceImpl::new(
        Arc::new(YieldingRoutes(store.clone())),
        Arc::new(store.clone()),
        fixtures::clock(),
    );

    let (a, b) = tokio::join!(
        service.accept(&world.driver, &first.id),
        service.accept(&world.driver, &second.id)
    );

    let outcomes = [a, b];
    assert_eq!(outcomes.iter().filter(|outcome| outcome.is_ok()).count(), 1);
    let err = outcomes
        .into_iter()
        .find_map(Result::err)
        .expect("one accept loses");
    assert_eq!(err.code(), ErrorCode::Conflict);
    let route = RouteRepository::find_by_id(&store, &world.route.id)
        .await
        .expect("lookup")
        .expect("route exists");
    assert_eq!(route.seats_available, 1);
}
