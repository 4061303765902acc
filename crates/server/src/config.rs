//! Environment-driven server configuration.

use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

pub struct Config {
    pub port: u16,
    pub db_url: String,
}

impl Config {
    #[must_use]
    pub fn load() -> Self {
        Self {
            port: try_load("PREP_PORT", "3000"),
            db_url: try_load("PREP_DB_URL", "sqlite:prep.db?mode=rwc"),
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    env::var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}
