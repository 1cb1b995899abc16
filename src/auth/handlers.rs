use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        claims::Role,
        dto::{
            LoginRequest, LoginResponse, MessageResponse, RefreshRequest, RefreshResponse,
            RegisterRequest, UserInfoResponse,
        },
        extractors::AuthUser,
        repo::User,
        service,
    },
    error::{ApiError, ApiResult},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .route("/user_info", get(user_info))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    // Public registration always creates a regular user; admins are
    // provisioned through the admin API.
    service::register(&state, &payload.email, &payload.password, Role::User).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "User registered successfully".into(),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let outcome = service::login(&state, &payload.email, &payload.password).await?;
    Ok(Json(LoginResponse {
        access_token: outcome.access_token,
        refresh_token: outcome.refresh_token,
        role: outcome.role,
    }))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    if payload.refresh_token.is_empty() {
        return Err(ApiError::Validation("Refresh token is required".into()));
    }
    let access_token = service::refresh(&state, &payload.refresh_token).await?;
    Ok(Json(RefreshResponse { access_token }))
}

#[instrument(skip(state, payload))]
pub async fn logout(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> ApiResult<Json<MessageResponse>> {
    if payload.refresh_token.is_empty() {
        return Err(ApiError::Validation("Refresh token is required".into()));
    }
    service::logout(&state, &payload.refresh_token).await?;
    Ok(Json(MessageResponse {
        message: "Logged out successfully".into(),
    }))
}

#[instrument(skip(state))]
pub async fn user_info(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<UserInfoResponse>> {
    // Re-read the store rather than echoing the claims; role changes since
    // token issue show up here.
    let record = User::find_by_email(&state.db, &user.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(Json(UserInfoResponse {
        email: record.email,
        role: record.role,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_info_response_serialization() {
        let response = UserInfoResponse {
            email: "bob@test.com".into(),
            role: Role::Admin,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["email"], "bob@test.com");
        assert_eq!(json["role"], "admin");
    }
}
