use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewsConfig {
    pub api_url: String,
    pub api_cookie: String,
    pub location: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub reviews: ReviewsConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "reviewhub".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "reviewhub-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(15),
            refresh_ttl_days: std::env::var("REFRESH_TTL_DAYS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(30),
        };
        let reviews = ReviewsConfig {
            api_url: std::env::var("REVIEWS_API_URL").unwrap_or_default(),
            api_cookie: std::env::var("REVIEWS_API_COOKIE").unwrap_or_default(),
            location: std::env::var("REVIEWS_LOCATION").unwrap_or_default(),
        };
        Ok(Self {
            database_url,
            jwt,
            reviews,
        })
    }
}
