use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reviewer {
    pub name: String,
    pub profile_photo: Option<String>,
}

/// Normalized review record. `original_data` keeps the raw provider
/// payload so re-normalization stays possible.
#[derive(Debug, Clone, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub external_id: String,
    pub reviewer_name: String,
    pub reviewer_photo: Option<String>,
    pub rating: i32,
    pub content: String,
    pub platform: String,
    pub created_at: Option<OffsetDateTime>,
    pub updated_at: Option<OffsetDateTime>,
    pub original_data: Value,
}

impl Review {
    /// Normalize a raw Google review payload. Records without a review id
    /// are rejected; the caller skips them.
    pub fn from_google(data: &Value) -> anyhow::Result<Review> {
        let external_id = data
            .get("reviewId")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .context("review payload missing reviewId")?
            .to_string();

        let reviewer = data.get("reviewer").cloned().unwrap_or(Value::Null);
        let reviewer_name = reviewer
            .get("displayName")
            .and_then(Value::as_str)
            .unwrap_or("Anonymous")
            .to_string();
        let reviewer_photo = reviewer
            .get("profilePhotoUrl")
            .and_then(Value::as_str)
            .map(str::to_string);

        let content = data
            .get("comment")
            .or_else(|| data.get("text"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Ok(Review {
            id: Uuid::new_v4(),
            external_id,
            reviewer_name,
            reviewer_photo,
            rating: normalize_rating(data.get("starRating")),
            content,
            platform: "google".to_string(),
            created_at: data
                .get("createTime")
                .and_then(Value::as_str)
                .and_then(parse_timestamp),
            updated_at: data
                .get("updateTime")
                .and_then(Value::as_str)
                .and_then(parse_timestamp),
            original_data: data.clone(),
        })
    }

    pub fn reviewer(&self) -> Reviewer {
        Reviewer {
            name: self.reviewer_name.clone(),
            profile_photo: self.reviewer_photo.clone(),
        }
    }
}

/// Google sends ratings either numerically or as the words ONE..FIVE.
/// Anything unrecognized becomes 0 rather than failing the record.
pub fn normalize_rating(star_rating: Option<&Value>) -> i32 {
    match star_rating {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0) as i32,
        Some(Value::String(s)) => match s.as_str() {
            "ONE" => 1,
            "TWO" => 2,
            "THREE" => 3,
            "FOUR" => 4,
            "FIVE" => 5,
            _ => 0,
        },
        _ => 0,
    }
}

pub fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(raw, &Rfc3339).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_word_ratings() {
        assert_eq!(normalize_rating(Some(&json!("ONE"))), 1);
        assert_eq!(normalize_rating(Some(&json!("FIVE"))), 5);
        assert_eq!(normalize_rating(Some(&json!("SIX"))), 0);
        assert_eq!(normalize_rating(Some(&json!(4))), 4);
        assert_eq!(normalize_rating(None), 0);
    }

    #[test]
    fn parses_rfc3339_with_trailing_z() {
        let parsed = parse_timestamp("2024-05-01T10:30:00Z").unwrap();
        assert_eq!(parsed.year(), 2024);
        assert!(parse_timestamp("not-a-date").is_none());
    }

    #[test]
    fn from_google_normalizes_a_full_payload() {
        let payload = json!({
            "reviewId": "abc-123",
            "reviewer": {
                "displayName": "Jane Doe",
                "profilePhotoUrl": "https://example.com/p.jpg"
            },
            "starRating": "FOUR",
            "comment": "Great service",
            "createTime": "2024-05-01T10:30:00Z",
            "updateTime": "2024-05-02T11:00:00Z"
        });
        let review = Review::from_google(&payload).unwrap();
        assert_eq!(review.external_id, "abc-123");
        assert_eq!(review.reviewer_name, "Jane Doe");
        assert_eq!(review.rating, 4);
        assert_eq!(review.content, "Great service");
        assert_eq!(review.platform, "google");
        assert!(review.created_at.is_some());
        assert_eq!(review.original_data, payload);
    }

    #[test]
    fn from_google_defaults_missing_reviewer() {
        let payload = json!({ "reviewId": "xyz", "text": "ok" });
        let review = Review::from_google(&payload).unwrap();
        assert_eq!(review.reviewer_name, "Anonymous");
        assert_eq!(review.reviewer_photo, None);
        assert_eq!(review.content, "ok");
        assert_eq!(review.rating, 0);
    }

    #[test]
    fn from_google_rejects_missing_review_id() {
        assert!(Review::from_google(&json!({ "comment": "no id" })).is_err());
        assert!(Review::from_google(&json!({ "reviewId": "" })).is_err());
    }
}
