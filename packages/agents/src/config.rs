use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    /// Pause between pipeline stages to keep load on the shared database down
    pub courtesy_delay: Duration,
    /// Cron expression for the periodic full cycle (seconds field included)
    pub cycle_schedule: String,
    /// Number of completed cycles kept in the in-process history
    pub history_limit: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a valid number")?,
            courtesy_delay: Duration::from_millis(
                env::var("AGENT_COURTESY_DELAY_MS")
                    .unwrap_or_else(|_| "1000".to_string())
                    .parse()
                    .context("AGENT_COURTESY_DELAY_MS must be a valid number")?,
            ),
            cycle_schedule: env::var("AGENT_CYCLE_SCHEDULE")
                .unwrap_or_else(|_| "0 0 * * * *".to_string()),
            history_limit: env::var("AGENT_HISTORY_LIMIT")
                .unwrap_or_else(|_| "50".to_string())
                .parse()
                .context("AGENT_HISTORY_LIMIT must be a valid number")?,
        })
    }
}
