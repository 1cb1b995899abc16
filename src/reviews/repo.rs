use sqlx::PgPool;

use crate::reviews::model::Review;

impl Review {
    /// Insert with dedupe on `external_id`. Returns `true` when the row was
    /// saved, `false` when an existing review already claimed the id.
    pub async fn insert(&self, db: &PgPool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO reviews (id, external_id, reviewer_name, reviewer_photo, rating,
                                 content, platform, created_at, updated_at, original_data)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (external_id) DO NOTHING
            "#,
        )
        .bind(self.id)
        .bind(&self.external_id)
        .bind(&self.reviewer_name)
        .bind(&self.reviewer_photo)
        .bind(self.rating)
        .bind(&self.content)
        .bind(&self.platform)
        .bind(self.created_at)
        .bind(self.updated_at)
        .bind(&self.original_data)
        .execute(db)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count(db: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(r#"SELECT COUNT(*) FROM reviews"#)
            .fetch_one(db)
            .await?;
        Ok(count)
    }

    /// Newest-first page of reviews.
    pub async fn page(db: &PgPool, limit: i64, offset: i64) -> Result<Vec<Review>, sqlx::Error> {
        sqlx::query_as::<_, Review>(
            r#"
            SELECT id, external_id, reviewer_name, reviewer_photo, rating,
                   content, platform, created_at, updated_at, original_data
            FROM reviews
            ORDER BY created_at DESC NULLS LAST
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
    }
}
