//! Application configuration loaded from environment variables.

use std::str::FromStr;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `DATABASE_URL`: Postgres connection string; unset means the in-memory store
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: `10`)
/// - `CACHE_MAX_ENTRIES`: cache capacity (default: `10000`)
/// - `MAIL_FROM_ADDRESS` / `MAIL_FROM_NAME`: report sender
/// - `REPORTS_SCHEDULE_ENABLED`: run the monthly report job (default: `true`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub cache_max_entries: u64,
    pub mail_from_address: String,
    pub mail_from_name: String,
    pub reports_schedule_enabled: bool,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parsed(&lookup, "PORT").unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            database_max_connections: parsed(&lookup, "DATABASE_MAX_CONNECTIONS")
                .unwrap_or(defaults.database_max_connections),
            cache_max_entries: parsed(&lookup, "CACHE_MAX_ENTRIES")
                .unwrap_or(defaults.cache_max_entries),
            mail_from_address: lookup("MAIL_FROM_ADDRESS").unwrap_or(defaults.mail_from_address),
            mail_from_name: lookup("MAIL_FROM_NAME").unwrap_or(defaults.mail_from_name),
            reports_schedule_enabled: lookup("REPORTS_SCHEDULE_ENABLED")
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.reports_schedule_enabled),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            database_max_connections: 10,
            cache_max_entries: 10_000,
            mail_from_address: "noreply@onlineshop.example".to_string(),
            mail_from_name: "Online Shopping Team".to_string(),
            reports_schedule_enabled: true,
        }
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
