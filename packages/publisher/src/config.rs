use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    /// Bearer secret for the HTTP cron triggers. Unset disables them.
    pub cron_secret: Option<String>,
    pub openai_api_key: String,
    pub openai_model: String,
    pub resend_api_key: Option<String>,
    pub alert_email_to: Option<String>,
    pub alert_email_from: Option<String>,
    pub scheduler_enabled: bool,
    pub generate_cron: String,
    pub publish_cron: String,
    pub allowed_origins: Vec<String>,
    pub admin_emails: Vec<String>,
    pub admin_rate_limit_per_minute: u32,
    /// Take the client address from X-Forwarded-For / X-Real-IP. Only safe
    /// behind a proxy that overwrites those headers.
    pub trust_proxy_headers: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            jwt_secret: env::var("JWT_SECRET")
                .context("JWT_SECRET must be set")?,
            jwt_issuer: env::var("JWT_ISSUER")
                .unwrap_or_else(|_| "publisher".to_string()),
            cron_secret: non_empty("CRON_SECRET"),
            openai_api_key: env::var("OPENAI_API_KEY")
                .context("OPENAI_API_KEY must be set")?,
            openai_model: env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            resend_api_key: non_empty("RESEND_API_KEY"),
            alert_email_to: non_empty("ALERT_EMAIL_TO"),
            alert_email_from: non_empty("ALERT_EMAIL_FROM"),
            scheduler_enabled: flag("SCHEDULER_ENABLED"),
            generate_cron: env::var("GENERATE_CRON")
                .unwrap_or_else(|_| "0 0 */6 * * *".to_string()),
            publish_cron: env::var("PUBLISH_CRON")
                .unwrap_or_else(|_| "0 30 9 * * *".to_string()),
            allowed_origins: list("ALLOWED_ORIGINS"),
            admin_emails: list("ADMIN_EMAILS"),
            admin_rate_limit_per_minute: env::var("ADMIN_RATE_LIMIT_PER_MINUTE")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .context("ADMIN_RATE_LIMIT_PER_MINUTE must be a valid number")?,
            trust_proxy_headers: flag("TRUST_PROXY_HEADERS"),
        })
    }
}

fn flag(key: &str) -> bool {
    env::var(key)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false)
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Comma-separated list, blanks dropped
fn list(key: &str) -> Vec<String> {
    env::var(key)
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}
