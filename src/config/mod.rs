pub mod bell;

use anyhow::{anyhow, Result};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use crate::config::bell::BellPolicy;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub app_mode: String,
    pub request_timeout_seconds: u64,
    pub bell: BellPolicy,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let api_base_url = env_or_err("API_BASE_URL")?;
        Url::parse(&api_base_url).map_err(|err| anyhow!("invalid API_BASE_URL: {}", err))?;

        let threshold_percent: u32 = env_or_parse("SCROLL_THRESHOLD_PERCENT", "80")?;
        let bell = BellPolicy {
            page_size: env_or_parse("PAGE_SIZE", "10")?,
            expanded_page_size: env_or_parse("EXPANDED_PAGE_SIZE", "30")?,
            display_limit: env_or_parse("DISPLAY_LIMIT", "4")?,
            scroll_threshold: f64::from(threshold_percent) / 100.0,
            poll_interval: Duration::from_secs(env_or_parse("UNREAD_POLL_SECONDS", "30")?),
        };
        bell.validate()
            .map_err(|err| anyhow!("invalid bell settings: {}", err))?;

        Ok(Self {
            api_base_url,
            api_token: std::env::var("API_TOKEN").ok().filter(|token| !token.is_empty()),
            app_mode: env_or("APP_MODE", "watch"),
            request_timeout_seconds: env_or_parse("REQUEST_TIMEOUT_SECONDS", "10")?,
            bell,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_err(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| anyhow!("missing required env var: {}", key))
}

fn env_or_parse<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    let value = std::env::var(key).unwrap_or_else(|_| default.to_string());
    value
        .parse::<T>()
        .map_err(|err| anyhow!("invalid {}: {}", key, err))
}
