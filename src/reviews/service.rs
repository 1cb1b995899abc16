use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::reviews::dto::{ReviewOut, ReviewPageResponse};
use crate::reviews::model::Review;
use crate::state::AppState;

pub const DEFAULT_PAGE_LIMIT: i64 = 24;
pub const MAX_PAGE_LIMIT: i64 = 100;
// Upper bound on page keeps `(page - 1) * limit` inside i64 for any
// permitted limit.
pub const MAX_PAGE: i64 = i64::MAX / MAX_PAGE_LIMIT;

pub struct PullSummary {
    pub total_count: usize,
    pub saved_count: usize,
    pub skipped_count: usize,
}

/// Fetch raw reviews from the provider, normalize, and store with dedupe.
/// Individual records that fail normalization are skipped, not fatal.
pub async fn pull(state: &AppState, location: &str) -> ApiResult<PullSummary> {
    let raw = state.reviews.fetch(location).await.map_err(|e| {
        warn!(error = %e, location = %location, "review provider fetch failed");
        ApiError::Internal(e)
    })?;

    let total_count = raw.len();
    let mut reviews = Vec::with_capacity(total_count);
    for record in &raw {
        match Review::from_google(record) {
            Ok(review) => reviews.push(review),
            Err(e) => {
                warn!(error = %e, "skipping unparseable review record");
            }
        }
    }

    let mut saved_count = 0;
    let mut skipped_count = 0;
    for review in &reviews {
        if review.insert(&state.db).await? {
            saved_count += 1;
        } else {
            skipped_count += 1;
        }
    }

    info!(total = total_count, saved = saved_count, skipped = skipped_count, "reviews pulled");
    Ok(PullSummary {
        total_count,
        saved_count,
        skipped_count,
    })
}

/// Clamp user-supplied paging to sane bounds: 1 <= page <= MAX_PAGE,
/// 1 <= limit <= 100.
pub fn clamp_paging(page: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    let page = page.unwrap_or(1).clamp(1, MAX_PAGE);
    let limit = limit
        .unwrap_or(DEFAULT_PAGE_LIMIT)
        .clamp(1, MAX_PAGE_LIMIT);
    (page, limit)
}

pub async fn find_page(
    state: &AppState,
    page: Option<i64>,
    limit: Option<i64>,
) -> ApiResult<ReviewPageResponse> {
    let (page, limit) = clamp_paging(page, limit);
    let offset = (page - 1) * limit;

    let total_count = Review::count(&state.db).await?;
    let total_pages = (total_count + limit - 1) / limit;
    let reviews = Review::page(&state.db, limit, offset).await?;

    Ok(ReviewPageResponse {
        reviews: reviews.into_iter().map(ReviewOut::from).collect(),
        total_count,
        total_pages,
        current_page: page,
        limit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paging_defaults() {
        assert_eq!(clamp_paging(None, None), (1, 24));
    }

    #[test]
    fn paging_clamps_out_of_range_values() {
        assert_eq!(clamp_paging(Some(0), Some(0)), (1, 1));
        assert_eq!(clamp_paging(Some(-3), Some(1000)), (1, 100));
        assert_eq!(clamp_paging(Some(5), Some(50)), (5, 50));
    }

    #[test]
    fn paging_offset_never_overflows() {
        // Extreme page values must not push the offset multiply past i64.
        let (page, limit) = clamp_paging(Some(i64::MAX), Some(24));
        assert!((page - 1).checked_mul(limit).is_some());

        let (page, limit) = clamp_paging(Some(i64::MAX), Some(i64::MAX));
        assert!((page - 1).checked_mul(limit).is_some());
    }
}
