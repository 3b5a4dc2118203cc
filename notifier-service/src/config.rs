use std::env;

pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub weather_api_url: String,
    pub weather_api_key: String,
    pub cache_ttl_seconds: u64,
    pub http_timeout_seconds: u64,
    pub mail_api_url: String,
    pub mail_server_token: String,
    pub mail_sender: String,
    pub send_timeout_seconds: u64,
    pub max_inflight_sends: usize,
    pub max_concurrent_lookups: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3004),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost/weather_notifier".to_string()),
            weather_api_url: env::var("WEATHER_API_URL")
                .unwrap_or_else(|_| "http://api.wunderground.com/api".to_string()),
            weather_api_key: env::var("WEATHER_API_KEY").unwrap_or_default(),
            cache_ttl_seconds: env::var("CACHE_TTL_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1200), // 20 minutes default
            http_timeout_seconds: env::var("HTTP_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            mail_api_url: env::var("MAIL_API_URL")
                .unwrap_or_else(|_| "http://localhost:3025".to_string()),
            mail_server_token: env::var("MAIL_SERVER_TOKEN").unwrap_or_default(),
            mail_sender: env::var("MAIL_SENDER")
                .unwrap_or_else(|_| "weather@example.com".to_string()),
            send_timeout_seconds: env::var("SEND_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            max_inflight_sends: env::var("MAX_INFLIGHT_SENDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(16),
            max_concurrent_lookups: env::var("MAX_CONCURRENT_LOOKUPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
        }
    }
}
