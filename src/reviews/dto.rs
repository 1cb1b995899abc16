use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::reviews::model::{Review, Reviewer};

/// Request body for pulling reviews; location falls back to configuration.
#[derive(Debug, Deserialize)]
pub struct PullRequest {
    pub location: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PullMetadata {
    pub selected_location: String,
    #[serde(with = "time::serde::rfc3339")]
    pub pulled_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct PullResponse {
    pub total_count: usize,
    pub saved_count: usize,
    pub skipped_count: usize,
    pub metadata: PullMetadata,
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Client-facing review projection with a nested reviewer.
#[derive(Debug, Serialize)]
pub struct ReviewOut {
    pub external_id: String,
    pub reviewer: Reviewer,
    pub rating: i32,
    pub content: String,
    pub platform: String,
    #[serde(with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl From<Review> for ReviewOut {
    fn from(review: Review) -> Self {
        let reviewer = review.reviewer();
        Self {
            external_id: review.external_id,
            reviewer,
            rating: review.rating,
            content: review.content,
            platform: review.platform,
            created_at: review.created_at,
            updated_at: review.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReviewPageResponse {
    pub reviews: Vec<ReviewOut>,
    pub total_count: i64,
    pub total_pages: i64,
    pub current_page: i64,
    pub limit: i64,
}
