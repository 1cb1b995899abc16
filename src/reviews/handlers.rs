use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::instrument;

use crate::{
    error::ApiResult,
    reviews::{
        dto::{PageParams, PullMetadata, PullRequest, PullResponse, ReviewPageResponse},
        service,
    },
    state::AppState,
};

pub fn review_routes() -> Router<AppState> {
    Router::new()
        .route("/api/reviews/pull", post(pull_reviews))
        .route("/api/reviews", get(get_reviews))
}

#[instrument(skip(state, payload))]
pub async fn pull_reviews(
    State(state): State<AppState>,
    payload: Option<Json<PullRequest>>,
) -> ApiResult<Json<PullResponse>> {
    let location = payload
        .and_then(|Json(p)| p.location)
        .unwrap_or_else(|| state.config.reviews.location.clone());

    let summary = service::pull(&state, &location).await?;
    Ok(Json(PullResponse {
        total_count: summary.total_count,
        saved_count: summary.saved_count,
        skipped_count: summary.skipped_count,
        metadata: PullMetadata {
            selected_location: location,
            pulled_at: OffsetDateTime::now_utc(),
        },
    }))
}

#[instrument(skip(state))]
pub async fn get_reviews(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<ReviewPageResponse>> {
    let page = service::find_page(&state, params.page, params.limit).await?;
    Ok(Json(page))
}
