use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    admin::dto::{CreateUserRequest, UpdateUserRequest, UserSummary},
    auth::{
        claims::Role,
        dto::MessageResponse,
        extractors::AdminUser,
        repo::User,
        service::{self, normalize_email},
    },
    error::{ApiError, ApiResult},
    state::AppState,
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users).post(create_user))
        .route(
            "/admin/users/:email",
            axum::routing::put(update_user).delete(delete_user),
        )
}

/// Self-lockout prevention: an admin may not mutate or delete their own
/// account. Checked before the target lookup, so the caller's own email
/// gets 403, never 404.
fn ensure_not_self(admin_email: &str, target_email: &str) -> ApiResult<()> {
    if admin_email == target_email {
        return Err(ApiError::Forbidden(
            "Admins cannot modify their own account".into(),
        ));
    }
    Ok(())
}

fn parse_role(raw: &str) -> ApiResult<Role> {
    raw.parse::<Role>().map_err(|_| {
        ApiError::Validation(r#"Invalid role. Must be "user" or "admin""#.into())
    })
}

#[instrument(skip(state, payload), fields(admin = %admin.0.email))]
pub async fn create_user(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(payload): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    let role = match payload.role.as_deref() {
        Some(raw) => parse_role(raw)?,
        None => Role::User,
    };

    service::register(&state, &payload.email, &payload.password, role).await?;
    info!(email = %normalize_email(&payload.email), role = %role, "admin created user");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "User registered successfully".into(),
        }),
    ))
}

#[instrument(skip(state), fields(admin = %admin.0.email))]
pub async fn list_users(
    State(state): State<AppState>,
    admin: AdminUser,
) -> ApiResult<Json<Vec<UserSummary>>> {
    let users = User::list(&state.db).await?;
    Ok(Json(users.into_iter().map(UserSummary::from).collect()))
}

#[instrument(skip(state, payload), fields(admin = %admin.0.email))]
pub async fn update_user(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(email): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> ApiResult<Json<UserSummary>> {
    let email = normalize_email(&email);
    ensure_not_self(&admin.0.email, &email)?;

    if payload.role.is_none() && payload.is_active.is_none() {
        return Err(ApiError::Validation("Nothing to update".into()));
    }
    let role = payload.role.as_deref().map(parse_role).transpose()?;

    let updated = User::update(&state.db, &email, role, payload.is_active)
        .await?
        .ok_or_else(|| {
            warn!(email = %email, "update for missing user");
            ApiError::NotFound("User not found".into())
        })?;

    info!(email = %updated.email, role = %updated.role, is_active = updated.is_active, "admin updated user");
    Ok(Json(UserSummary::from(updated)))
}

#[instrument(skip(state), fields(admin = %admin.0.email))]
pub async fn delete_user(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(email): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let email = normalize_email(&email);
    ensure_not_self(&admin.0.email, &email)?;

    if !User::delete(&state.db, &email).await? {
        warn!(email = %email, "delete for missing user");
        return Err(ApiError::NotFound("User not found".into()));
    }

    info!(email = %email, "admin deleted user");
    Ok(Json(MessageResponse {
        message: "User deleted successfully".into(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_modification_is_forbidden() {
        let err = ensure_not_self("admin@test.com", "admin@test.com").unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn other_targets_pass_the_self_check() {
        assert!(ensure_not_self("admin@test.com", "bob@test.com").is_ok());
    }

    #[test]
    fn role_parsing_rejects_unknown_values() {
        assert_eq!(parse_role("admin").unwrap(), Role::Admin);
        assert_eq!(parse_role("user").unwrap(), Role::User);
        let err = parse_role("root").unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
