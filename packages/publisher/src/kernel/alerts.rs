//! Low-queue alert delivery.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};

use super::BaseAlertNotifier;

const RESEND_API_URL: &str = "https://api.resend.com/emails";

/// Email via the Resend HTTP API
pub struct ResendNotifier {
    client: Client,
    api_key: String,
    from: String,
    to: String,
}

#[derive(Debug, Serialize)]
struct ResendEmail<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: String,
    text: String,
}

impl ResendNotifier {
    pub fn new(api_key: String, from: String, to: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            from,
            to,
        }
    }
}

pub(crate) fn alert_subject(titles: &[String]) -> String {
    format!("Content queue low: {} title(s) left", titles.len())
}

pub(crate) fn alert_body(titles: &[String]) -> String {
    let mut body = format!(
        "Only {} title(s) remain in the content queue. Add more to keep the schedule going.\n\n",
        titles.len()
    );
    for (i, title) in titles.iter().enumerate() {
        body.push_str(&format!("{}. {}\n", i + 1, title));
    }
    body
}

#[async_trait]
impl BaseAlertNotifier for ResendNotifier {
    async fn send_low_queue_alert(&self, titles: &[String]) -> Result<()> {
        let email = ResendEmail {
            from: &self.from,
            to: [&self.to],
            subject: alert_subject(titles),
            text: alert_body(titles),
        };

        let response = self
            .client
            .post(RESEND_API_URL)
            .bearer_auth(&self.api_key)
            .json(&email)
            .send()
            .await
            .context("Failed to send low-queue alert email")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Resend API error ({}): {}", status, error_text);
        }

        info!(to = %self.to, remaining = titles.len(), "Low-queue alert emailed");
        Ok(())
    }
}

/// Writes the alert to the log. Used when email is not configured.
pub struct LogNotifier;

#[async_trait]
impl BaseAlertNotifier for LogNotifier {
    async fn send_low_queue_alert(&self, titles: &[String]) -> Result<()> {
        warn!(remaining = titles.len(), titles = ?titles, "{}", alert_subject(titles));
        Ok(())
    }
}

/// Factory: email when fully configured, log otherwise
pub fn create_alert_notifier(
    api_key: Option<String>,
    from: Option<String>,
    to: Option<String>,
) -> Arc<dyn BaseAlertNotifier> {
    match (api_key, from, to) {
        (Some(api_key), Some(from), Some(to)) => {
            info!(to = %to, "Low-queue alerts will be emailed");
            Arc::new(ResendNotifier::new(api_key, from, to))
        }
        _ => {
            info!("Email not configured, low-queue alerts will be logged");
            Arc::new(LogNotifier)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_body_lists_titles_in_order() {
        let titles = vec!["First".to_string(), "Second".to_string()];
        let body = alert_body(&titles);

        let first = body.find("1. First").unwrap();
        let second = body.find("2. Second").unwrap();
        assert!(first < second);
        assert_eq!(alert_subject(&titles), "Content queue low: 2 title(s) left");
    }

    #[tokio::test]
    async fn test_log_notifier_never_fails() {
        let notifier = create_alert_notifier(Some("key".into()), None, None);
        notifier
            .send_low_queue_alert(&["Only one".to_string()])
            .await
            .unwrap();
    }
}
