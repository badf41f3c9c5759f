//! Driving port for post-trip ratings.

use async_trait::async_trait;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{Error, Rating, RatingSummary, Score, UserId};

/// A participant's rating of another participant.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingRequest {
    pub route_id: Uuid,
    pub ratee_id: UserId,
    pub score: Score,
    pub comment: Option<String>,
}

/// Ratings a user received and their summary.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserRatings {
    pub summary: RatingSummary,
    pub ratings: Vec<Rating>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RatingService: Send + Sync {
    async fn rate(&self, rater: &UserId, request: RatingRequest) -> Result<Rating, Error>;

    async fn list_for_user(&self, user: &UserId) -> Result<UserRatings, Error>;

    async fn summary(&self, user: &UserId) -> Result<RatingSummary, Error>;
}
