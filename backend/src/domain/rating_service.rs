//! Rating service implementing the [`RatingService`] driving port.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use crate::domain::ports::{
    BookingRepository, RatingRepository, RatingRequest, RatingService, RouteRepository,
    UserRatings,
};
use crate::domain::service_support::{
    invalid_field, load_route, map_booking_repository_error, map_rating_repository_error,
};
use crate::domain::{
    BookingStatus, CarpoolRoute, Error, Rating, RatingSummary, RouteStatus, UserId,
};

/// Ratings between participants of completed routes.
#[derive(Clone)]
pub struct RatingServiceImpl {
    routes: Arc<dyn RouteRepository>,
    bookings: Arc<dyn BookingRepository>,
    ratings: Arc<dyn RatingRepository>,
    clock: Arc<dyn Clock>,
}

impl RatingServiceImpl {
    pub fn new(
        routes: Arc<dyn RouteRepository>,
        bookings: Arc<dyn BookingRepository>,
        ratings: Arc<dyn RatingRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            routes,
            bookings,
            ratings,
            clock,
        }
    }

    /// The driver plus every passenger whose booking was accepted.
    async fn participants(&self, route: &CarpoolRoute) -> Result<HashSet<UserId>, Error> {
        let bookings = self
            .bookings
            .list_by_route(&route.id)
            .await
            .map_err(map_booking_repository_error)?;
        let mut participants: HashSet<UserId> = bookings
            .into_iter()
            .filter(|booking| booking.status == BookingStatus::Accepted)
            .map(|booking| booking.passenger_id)
            .collect();
        participants.insert(route.driver_id.clone());
        Ok(participants)
    }

    async fn received(&self, user: &UserId) -> Result<Vec<Rating>, Error> {
        self.ratings
            .list_for_ratee(user)
            .await
            .map_err(map_rating_repository_error)
    }
}

#[async_trait]
impl RatingService for RatingServiceImpl {
    async fn rate(&self, rater: &UserId, request: RatingRequest) -> Result<Rating, Error> {
        let RatingRequest {
            route_id,
            ratee_id,
            score,
            comment,
        } = request;
        let route = load_route(self.routes.as_ref(), &route_id).await?;
        if route.status != RouteStatus::Completed {
            return Err(Error::conflict("ratings are only accepted for completed routes"));
        }
        let participants = self.participants(&route).await?;
        if !participants.contains(rater) {
            return Err(Error::forbidden("only trip participants may rate"));
        }
        if !participants.contains(&ratee_id) {
            return Err(invalid_field(
                "rateeId",
                "not_participant",
                "the rated user did not take part in this trip",
            ));
        }
        let rating = Rating::try_new(
            route_id,
            rater.clone(),
            ratee_id,
            score,
            comment.as_deref(),
            self.clock.utc(),
        )
        .map_err(|err| invalid_field(err.field(), "invalid_rating", err.to_string()))?;
        self.ratings
            .create(&rating)
            .await
            .map_err(map_rating_repository_error)?;
        info!(rating_id = %rating.id, route_id = %route_id, "rating recorded");
        Ok(rating)
    }

    async fn list_for_user(&self, user: &UserId) -> Result<UserRatings, Error> {
        let ratings = self.received(user).await?;
        Ok(UserRatings {
            summary: RatingSummary::from_ratings(user.clone(), &ratings),
            ratings,
        })
    }

    async fn summary(&self, user: &UserId) -> Result<RatingSummary, Error> {
        let ratings = self.received(user).await?;
        Ok(RatingSummary::from_ratings(user.clone(), &ratings))
    }
}
