use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
///
/// The oracle credential is checked here, once, before any network call —
/// a missing `GEMINI_API_KEY` is a fatal configuration error at startup,
/// never a mid-session surprise.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub gemini_api_key: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            db_max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse::<u32>()
                .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?,
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_applies_defaults() {
        std::env::set_var("DATABASE_URL", "postgres://localhost/test");
        std::env::set_var("GEMINI_API_KEY", "test-key");
        std::env::remove_var("DATABASE_MAX_CONNECTIONS");
        std::env::remove_var("PORT");
        std::env::remove_var("RUST_LOG");

        let config = Config::from_env().unwrap();
        assert_eq!(config.db_max_connections, 10);
        assert_eq!(config.port, 8080);
        assert_eq!(config.rust_log, "info");
    }
}
