use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::auth::claims::Role;

/// Postgres unique-violation SQLSTATE. Registration and token-creation
/// races resolve on this, not on check-then-insert.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code == "23505")
        .unwrap_or(false)
}

/// User record in the database. Email is the unique lookup key and is
/// normalized (trimmed, lowercased) before it ever reaches this layer.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, role, is_active, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await
    }

    pub async fn create(
        db: &PgPool,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, role)
            VALUES ($1, $2, $3)
            RETURNING id, email, password_hash, role, is_active, created_at, updated_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .fetch_one(db)
        .await
    }

    pub async fn list(db: &PgPool) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, role, is_active, created_at, updated_at
            FROM users
            ORDER BY created_at
            "#,
        )
        .fetch_all(db)
        .await
    }

    /// Apply a partial admin update (role and/or active flag). Returns the
    /// updated record, or `None` if no user matched.
    pub async fn update(
        db: &PgPool,
        email: &str,
        role: Option<Role>,
        is_active: Option<bool>,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET role = COALESCE($2, role),
                is_active = COALESCE($3, is_active),
                updated_at = now()
            WHERE email = $1
            RETURNING id, email, password_hash, role, is_active, created_at, updated_at
            "#,
        )
        .bind(email)
        .bind(role)
        .bind(is_active)
        .fetch_optional(db)
        .await
    }

    pub async fn delete(db: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(r#"DELETE FROM users WHERE email = $1"#)
            .bind(email)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Long-lived revocable session credential. Opaque: the string carries no
/// structure and is looked up verbatim in the store.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RefreshToken {
    pub id: Uuid,
    pub token: String,
    pub user_email: String,
    pub expires_at: OffsetDateTime,
    pub created_at: OffsetDateTime,
    pub is_revoked: bool,
}

impl RefreshToken {
    /// 32 random bytes, base64url without padding (43 chars, URL-safe).
    pub fn generate_token() -> String {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        Base64UrlUnpadded::encode_string(&bytes)
    }

    /// Authoritative validity check, regardless of whether the sweep has
    /// physically deleted the row yet.
    pub fn is_valid(&self) -> bool {
        !self.is_revoked && OffsetDateTime::now_utc() < self.expires_at
    }

    pub async fn create(
        db: &PgPool,
        user_email: &str,
        ttl_days: i64,
    ) -> Result<RefreshToken, sqlx::Error> {
        let token = Self::generate_token();
        let expires_at = OffsetDateTime::now_utc() + Duration::days(ttl_days);
        sqlx::query_as::<_, RefreshToken>(
            r#"
            INSERT INTO refresh_tokens (token, user_email, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, token, user_email, expires_at, created_at, is_revoked
            "#,
        )
        .bind(&token)
        .bind(user_email)
        .bind(expires_at)
        .fetch_one(db)
        .await
    }

    pub async fn find(db: &PgPool, token: &str) -> Result<Option<RefreshToken>, sqlx::Error> {
        sqlx::query_as::<_, RefreshToken>(
            r#"
            SELECT id, token, user_email, expires_at, created_at, is_revoked
            FROM refresh_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(db)
        .await
    }

    /// Single atomic update; `false` means no row matched. Re-revoking an
    /// existing token matches the row and succeeds.
    pub async fn revoke(db: &PgPool, token: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(r#"UPDATE refresh_tokens SET is_revoked = TRUE WHERE token = $1"#)
            .bind(token)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Garbage collection for expired rows; validity never depends on it.
    pub async fn delete_expired(db: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(r#"DELETE FROM refresh_tokens WHERE expires_at < now()"#)
            .execute(db)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tokens_are_unique_and_url_safe() {
        let a = RefreshToken::generate_token();
        let b = RefreshToken::generate_token();
        assert_ne!(a, b);
        // 32 bytes -> 43 base64url chars, no padding
        assert_eq!(a.len(), 43);
        assert!(a
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn validity_requires_unrevoked_and_unexpired() {
        let mut token = RefreshToken {
            id: Uuid::new_v4(),
            token: RefreshToken::generate_token(),
            user_email: "bob@test.com".into(),
            expires_at: OffsetDateTime::now_utc() + Duration::days(7),
            created_at: OffsetDateTime::now_utc(),
            is_revoked: false,
        };
        assert!(token.is_valid());

        token.is_revoked = true;
        assert!(!token.is_valid());

        token.is_revoked = false;
        token.expires_at = OffsetDateTime::now_utc() - Duration::seconds(1);
        assert!(!token.is_valid());
    }

    #[test]
    fn refresh_token_serde_round_trip() {
        let original = RefreshToken {
            id: Uuid::new_v4(),
            token: RefreshToken::generate_token(),
            user_email: "bob@test.com".into(),
            expires_at: OffsetDateTime::now_utc() + Duration::days(30),
            created_at: OffsetDateTime::now_utc(),
            is_revoked: false,
        };
        let json = serde_json::to_string(&original).unwrap();
        let decoded: RefreshToken = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.token, original.token);
        assert_eq!(decoded.user_email, original.user_email);
        assert_eq!(decoded.expires_at, original.expires_at);
        assert_eq!(decoded.is_revoked, original.is_revoked);
    }

    #[test]
    fn user_never_serializes_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            email: "bob@test.com".into(),
            password_hash: "$argon2id$secret".into(),
            role: Role::User,
            is_active: true,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("argon2id"));
    }
}
