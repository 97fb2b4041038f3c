use dotenv::dotenv;
use once_cell::sync::Lazy;
use std::env;
use std::str::FromStr;

pub struct Config {
    pub port: u16,
    pub log_level: String,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub bcrypt_cost: u32,
    pub allowed_origins: Vec<String>,
    pub request_timeout_secs: u64,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("log_level", &self.log_level)
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("allowed_origins", &self.allowed_origins)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

fn parsed_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

impl Config {
    fn from_env() -> Self {
        dotenv().ok();

        Self {
            port: parsed_or("PORT", 3000),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| "change-me".to_string()),
            token_ttl_hours: parsed_or("TOKEN_TTL_HOURS", 24 * 7),
            bcrypt_cost: parsed_or("BCRYPT_COST", 8),
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .map(|v| split_origins(&v))
                .unwrap_or_else(|_| vec!["http://localhost:3001".to_string()]),
            request_timeout_secs: parsed_or("REQUEST_TIMEOUT_SECS", 30),
        }
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);
