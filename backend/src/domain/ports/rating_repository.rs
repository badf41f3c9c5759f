//! Port for rating persistence.
use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Rating, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by rating repository adapters.
    pub enum RatingRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "rating repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "rating repository query failed: {message}",
        /// The rater already rated this participant for the route.
        Duplicate => "rating already submitted for this participant on this route",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RatingRepository: Send + Sync {
    /// Insert a rating; unique per route, rater and ratee.
    async fn create(&self, rating: &Rating) -> Result<(), RatingRepositoryError>;

    /// Ratings received by a user, newest first.
    async fn list_for_ratee(&self, ratee: &UserId) -> Result<Vec<Rating>, RatingRepositoryError>;

    async fn list_for_route(&self, route_id: &Uuid) -> Result<Vec<Rating>, RatingRepositoryError>;
}
