//! Configuration from the environment.
//!
//! `DRIP_API_KEY` is required; everything else has defaults.

use anyhow::{Context, bail};

pub const DEFAULT_API_URL: &str = "https://api.drip.re";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub api_url: String,
    pub test_customer_id: Option<String>,
    pub skip_cleanup: bool,
    pub timeout_ms: u64,
}

pub fn load_config() -> anyhow::Result<Config> {
    let api_key = match std::env::var("DRIP_API_KEY") {
        Ok(key) if !key.trim().is_empty() => key,
        _ => bail!(
            "DRIP_API_KEY environment variable is required. \
             Set it in your .env file or environment."
        ),
    };

    let api_url = std::env::var("DRIP_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
    let test_customer_id = std::env::var("TEST_CUSTOMER_ID").ok().filter(|s| !s.is_empty());
    let skip_cleanup = std::env::var("SKIP_CLEANUP")
        .map(|v| parse_bool(&v))
        .unwrap_or(false);
    let timeout_ms = match std::env::var("CHECK_TIMEOUT") {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .with_context(|| format!("CHECK_TIMEOUT must be milliseconds, got {raw:?}"))?,
        Err(_) => DEFAULT_TIMEOUT_MS,
    };

    Ok(Config {
        api_key,
        api_url,
        test_customer_id,
        skip_cleanup,
        timeout_ms,
    })
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}
