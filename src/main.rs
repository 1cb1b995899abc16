use std::time::Duration;

mod admin;
mod app;
mod auth;
mod config;
mod error;
mod reviews;
mod state;

use crate::auth::repo::RefreshToken;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "reviewhub=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = AppState::init().await?;

    sqlx::migrate!("./migrations").run(&app_state.db).await?;

    // Expired refresh tokens stay rejectable without this; the sweep only
    // reclaims storage.
    let sweep_db = app_state.db.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60 * 60));
        loop {
            interval.tick().await;
            match RefreshToken::delete_expired(&sweep_db).await {
                Ok(0) => {}
                Ok(n) => tracing::info!(deleted = n, "swept expired refresh tokens"),
                Err(e) => tracing::warn!(error = %e, "refresh token sweep failed"),
            }
        }
    });

    let app = app::build_app(app_state);
    app::serve(app).await
}
