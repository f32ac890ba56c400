//! Environment-backed configuration.

use anyhow::{Context, Result};
use std::env;

/// SMTP transport settings.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub use_starttls: bool,
    /// Unset credentials select unauthenticated transport.
    pub username: Option<String>,
    pub password: Option<String>,
    /// Sender address for the digest emails.
    pub sender: String,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub notion_token: String,
    /// Staleness window in weeks. `None` when unset or unparseable; the
    /// cohort resolves that to its default.
    pub stale_after_weeks: Option<u32>,
    /// Root page ids to scan.
    pub root_page_ids: Vec<String>,
    pub smtp: SmtpConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&|key| env::var(key).ok())
    }

    fn from_lookup(get: &dyn Fn(&str) -> Option<String>) -> Result<Self> {
        let notion_token =
            get("NHOUND_NOTION_TOKEN").context("NHOUND_NOTION_TOKEN must be set")?;

        let root_page_ids = parse_page_ids(
            &get("NHOUND_PAGES_UUIDS").context("NHOUND_PAGES_UUIDS must be set")?,
        )?;

        let stale_after_weeks =
            get("NHOUND_PAGES_ARE_STALE_AFTER_X_WEEKS").and_then(|v| v.parse().ok());

        let smtp = SmtpConfig {
            host: get("NHOUND_SMTP_HOST").context("NHOUND_SMTP_HOST must be set")?,
            port: get("NHOUND_SMTP_PORT")
                .context("NHOUND_SMTP_PORT must be set")?
                .parse()
                .context("NHOUND_SMTP_PORT must be a valid port number")?,
            use_starttls: get("NHOUND_SMTP_USE_STARTTLS")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
            username: get("NHOUND_SMTP_USERNAME").filter(|v| !v.is_empty()),
            password: get("NHOUND_SMTP_PASSWORD").filter(|v| !v.is_empty()),
            sender: get("NHOUND_SMTP_EMAIL_SENDER")
                .context("NHOUND_SMTP_EMAIL_SENDER must be set")?,
        };

        Ok(Self {
            notion_token,
            stale_after_weeks,
            root_page_ids,
            smtp,
        })
    }
}

/// Accepts `["id-1", "id-2"]` as well as `id-1,id-2`.
fn parse_page_ids(raw: &str) -> Result<Vec<String>> {
    let ids: Vec<String> = match serde_json::from_str(raw) {
        Ok(ids) => ids,
        Err(_) => raw.split(',').map(|s| s.trim().to_string()).collect(),
    };
    let ids: Vec<String> = ids.into_iter().filter(|s| !s.is_empty()).collect();
    if ids.is_empty() {
        anyhow::bail!("NHOUND_PAGES_UUIDS contains no page ids");
    }
    Ok(ids)
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}
