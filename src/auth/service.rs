use axum::extract::FromRef;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::auth::claims::Role;
use crate::auth::jwt::JwtKeys;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::repo::{is_unique_violation, RefreshToken, User};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Both the uniqueness check and storage see only the normalized form, so
/// `A@x.com` and `a@x.com` can never become two accounts.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub struct LoginOutcome {
    pub access_token: String,
    pub refresh_token: String,
    pub role: Role,
}

/// Single source for the login failure response. Unknown email and wrong
/// password must stay byte-identical, or error bodies leak which accounts
/// exist.
fn credential_error() -> ApiError {
    ApiError::Unauthorized("Invalid email or password".into())
}

pub async fn register(state: &AppState, email: &str, password: &str, role: Role) -> ApiResult<()> {
    let email = normalize_email(email);

    if email.is_empty() || password.is_empty() {
        return Err(ApiError::Validation(
            "Email and password are required".into(),
        ));
    }
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email format");
        return Err(ApiError::Validation("Invalid email format".into()));
    }
    if password.len() < 6 {
        return Err(ApiError::Validation(
            "Password must be at least 6 characters long".into(),
        ));
    }

    let hash = hash_password(password)?;

    // Uniqueness is enforced by the DB index; a lost race surfaces here.
    match User::create(&state.db, &email, &hash, role).await {
        Ok(user) => {
            info!(email = %user.email, role = %user.role, "user registered");
            Ok(())
        }
        Err(e) if is_unique_violation(&e) => {
            warn!(email = %email, "email already registered");
            Err(ApiError::Conflict(
                "User with this email already exists".into(),
            ))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn login(state: &AppState, email: &str, password: &str) -> ApiResult<LoginOutcome> {
    let email = normalize_email(email);

    let user = match User::find_by_email(&state.db, &email).await? {
        Some(u) => u,
        None => {
            warn!(email = %email, "login with unknown email");
            return Err(credential_error());
        }
    };

    if !user.is_active {
        warn!(email = %email, "login to deactivated account");
        return Err(ApiError::Unauthorized("User account is deactivated".into()));
    }

    if !verify_password(password, &user.password_hash)? {
        warn!(email = %email, "login with invalid password");
        return Err(credential_error());
    }

    let keys = JwtKeys::from_ref(state);
    let access_token = keys.sign_access(&user.email, user.role)?;
    let refresh_token =
        create_refresh_token(state, &user.email, state.config.jwt.refresh_ttl_days).await?;

    info!(email = %user.email, "user logged in");
    Ok(LoginOutcome {
        access_token,
        refresh_token: refresh_token.token,
        role: user.role,
    })
}

/// Insert a fresh refresh token, retrying on the astronomically unlikely
/// token collision. Prior sessions are left untouched.
async fn create_refresh_token(
    state: &AppState,
    email: &str,
    ttl_days: i64,
) -> ApiResult<RefreshToken> {
    for _ in 0..3 {
        match RefreshToken::create(&state.db, email, ttl_days).await {
            Ok(token) => return Ok(token),
            Err(e) if is_unique_violation(&e) => {
                warn!(email = %email, "refresh token collision, regenerating");
                continue;
            }
            Err(e) => return Err(e.into()),
        }
    }
    Err(ApiError::Internal(anyhow::anyhow!(
        "could not generate a unique refresh token"
    )))
}

pub async fn refresh(state: &AppState, refresh_token: &str) -> ApiResult<String> {
    let record = match RefreshToken::find(&state.db, refresh_token).await? {
        Some(r) => r,
        None => {
            warn!("refresh with unknown token");
            return Err(ApiError::Unauthorized("Invalid refresh token".into()));
        }
    };

    if !record.is_valid() {
        warn!(email = %record.user_email, "refresh with expired or revoked token");
        return Err(ApiError::Unauthorized(
            "Refresh token expired or revoked".into(),
        ));
    }

    // Re-read the user so the new access token carries the current role,
    // not the role at login time.
    let user = User::find_by_email(&state.db, &record.user_email)
        .await?
        .ok_or_else(|| {
            warn!(email = %record.user_email, "refresh for deleted user");
            ApiError::Unauthorized("User not found".into())
        })?;

    let keys = JwtKeys::from_ref(state);
    let access_token = keys.sign_access(&user.email, user.role)?;
    Ok(access_token)
}

pub async fn logout(state: &AppState, refresh_token: &str) -> ApiResult<()> {
    // One atomic update; other sessions for the same user stay live.
    if !RefreshToken::revoke(&state.db, refresh_token).await? {
        warn!("logout with unknown token");
        return Err(ApiError::BadRequest("Invalid refresh token".into()));
    }
    info!("user logged out");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_normalized_before_comparison() {
        assert_eq!(normalize_email("  Bob@Test.Com "), "bob@test.com");
        assert_eq!(normalize_email("a@x.com"), normalize_email("A@x.com"));
    }

    #[test]
    fn credential_failures_are_indistinguishable() {
        // Unknown email and wrong password both report through this value.
        let err = credential_error();
        assert_eq!(err.to_string(), "Invalid email or password");
        assert_eq!(err.status(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("bob@test.com"));
        assert!(is_valid_email("a.b+c@sub.domain.io"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("missing@tld"));
        assert!(!is_valid_email("two words@x.com"));
        assert!(!is_valid_email(""));
    }
}
