//! Post-trip ratings between participants.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::user::UserId;

/// Maximum comment length.
pub const COMMENT_MAX: usize = 500;

/// Validation errors for rating input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RatingValidationError {
    ScoreOutOfRange,
    CommentTooLong { max: usize },
    SelfRating,
}

impl fmt::Display for RatingValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ScoreOutOfRange => write!(f, "score must be between 1 and 5"),
            Self::CommentTooLong { max } => write!(f, "comment must be at most {max} characters"),
            Self::SelfRating => write!(f, "users cannot rate themselves"),
        }
    }
}

impl std::error::Error for RatingValidationError {}

impl RatingValidationError {
    /// JSON field name the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::ScoreOutOfRange => "score",
            Self::CommentTooLong { .. } => "comment",
            Self::SelfRating => "rateeId",
        }
    }
}

/// Star score from 1 to 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Score(u8);

impl Score {
    /// Validate a score.
    pub fn new(value: u8) -> Result<Self, RatingValidationError> {
        if !(1..=5).contains(&value) {
            return Err(RatingValidationError::ScoreOutOfRange);
        }
        Ok(Self(value))
    }

    /// Raw score value.
    pub fn get(self) -> u8 {
        self.0
    }
}

impl From<Score> for u8 {
    fn from(value: Score) -> Self {
        value.0
    }
}

impl TryFrom<u8> for Score {
    type Error = RatingValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// One participant's rating of another for a completed route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub id: Uuid,
    pub route_id: Uuid,
    #[schema(value_type = String)]
    pub rater_id: UserId,
    #[schema(value_type = String)]
    pub ratee_id: UserId,
    #[schema(value_type = u8, minimum = 1, maximum = 5)]
    pub score: Score,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Rating {
    /// Validate rater/ratee and comment and build the rating.
    pub fn try_new(
        route_id: Uuid,
        rater_id: UserId,
        ratee_id: UserId,
        score: Score,
        comment: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Self, RatingValidationError> {
        if rater_id == ratee_id {
            return Err(RatingValidationError::SelfRating);
        }
        let comment = comment.map(str::trim).filter(|text| !text.is_empty());
        if comment.is_some_and(|text| text.chars().count() > COMMENT_MAX) {
            return Err(RatingValidationError::CommentTooLong { max: COMMENT_MAX });
        }
        Ok(Self {
            id: Uuid::new_v4(),
            route_id,
            rater_id,
            ratee_id,
            score,
            comment: comment.map(str::to_owned),
            created_at: now,
        })
    }
}

/// Average score and count for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    #[schema(value_type = String)]
    pub user_id: UserId,
    /// Mean score rounded to two decimals; `None` without ratings.
    pub average: Option<f64>,
    pub count: u32,
}

impl RatingSummary {
    /// Summarise `ratings` received by `user_id`.
    pub fn from_ratings(user_id: UserId, ratings: &[Rating]) -> Self {
        let scores: Vec<u32> = ratings
            .iter()
            .filter(|rating| rating.ratee_id == user_id)
            .map(|rating| u32::from(rating.score.get()))
            .collect();
        let count = u32::try_from(scores.len()).unwrap_or(u32::MAX);
        let average = (count > 0).then(|| {
            let mean = f64::from(scores.iter().sum::<u32>()) / f64::from(count);
            (mean * 100.0).round() / 100.0
        });
        Self {
            user_id,
            average,
            count,
        }
    }
}
