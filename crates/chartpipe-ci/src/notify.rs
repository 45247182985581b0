//! Pipeline notifications: console banners and a Discord webhook

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Value, json};
use url::Url;

use crate::config::CiEnvironment;
use crate::error::{CiError, Result};

/// Discord embed colour for published charts (green)
pub const EMBED_COLOR: u32 = 5_763_719;

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);
const RULE_WIDTH: usize = 70;
const UNKNOWN: &str = "unknown";

/// Which milestone is being announced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Validated,
    Published,
}

impl FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "validated" => Ok(NotificationKind::Validated),
            "published" => Ok(NotificationKind::Published),
            other => Err(format!(
                "unknown notification kind '{}' (expected validated or published)",
                other
            )),
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::Validated => f.write_str("validated"),
            NotificationKind::Published => f.write_str("published"),
        }
    }
}

/// One announcement
#[derive(Debug, Clone)]
pub struct Notification {
    pub kind: NotificationKind,
    pub charts: Vec<String>,
    pub commit: String,
    pub ref_name: String,
    /// Registry repository without scheme, e.g. `ghcr.io/acme/charts`
    pub registry: String,
}

impl Notification {
    /// Build from the CI context
    pub fn new(
        kind: NotificationKind,
        charts: Vec<String>,
        env: &CiEnvironment,
        registry: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            charts,
            commit: env
                .commit_short_sha
                .clone()
                .unwrap_or_else(|| UNKNOWN.to_string()),
            ref_name: env
                .commit_ref_name
                .clone()
                .unwrap_or_else(|| UNKNOWN.to_string()),
            registry: registry.into(),
        }
    }

    /// Console banner text
    pub fn banner(&self) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        let mut lines = vec![String::new(), rule.clone()];

        match self.kind {
            NotificationKind::Validated => {
                lines.push("  CHARTS VALIDATED AND PACKAGED".to_string());
                lines.push(rule.clone());
                lines.push(String::new());

                if self.charts.is_empty() {
                    lines.push("No charts changed in this commit".to_string());
                } else {
                    lines.push("Packaged charts:".to_string());
                    lines.extend(self.charts.iter().map(|c| format!("   ✓ {}", c)));
                }
                lines.push(String::new());
                lines.push(format!("Commit:  {}", self.commit));
                lines.push(format!("Branch:  {}", self.ref_name));
            }
            NotificationKind::Published => {
                lines.push("  CHARTS PUBLISHED SUCCESSFULLY".to_string());
                lines.push(rule.clone());
                lines.push(String::new());

                if !self.charts.is_empty() {
                    lines.push("Published charts:".to_string());
                    lines.extend(self.charts.iter().map(|c| format!("   ✓ {}", c)));
                    lines.push(String::new());
                    lines.push(rule.clone());
                    lines.push(format!("Registry:    {}", self.registry));
                    lines.push(format!("Commit:      {}", self.commit));
                    lines.push(format!("Branch/Tag:  {}", self.ref_name));
                    lines.push(rule);
                    lines.push(String::new());
                    lines.push("Install with:".to_string());
                    lines.push(format!(
                        "   helm pull oci://{}/<chart-name> --version <version>",
                        self.registry
                    ));
                }
            }
        }

        lines.push(String::new());
        lines.join("\n")
    }

    /// Only published runs with at least one chart reach the webhook
    pub fn wants_webhook(&self) -> bool {
        self.kind == NotificationKind::Published && !self.charts.is_empty()
    }

    /// Discord webhook body
    pub fn discord_payload(&self, timestamp: DateTime<Utc>) -> Value {
        json!({
            "embeds": [{
                "title": "Helm Charts Published",
                "description": "New chart versions published to registry",
                "color": EMBED_COLOR,
                "fields": [
                    { "name": "Charts", "value": self.charts.join(", "), "inline": false },
                    { "name": "Commit", "value": self.commit, "inline": true },
                    { "name": "Branch/Tag", "value": self.ref_name, "inline": true },
                    { "name": "Registry", "value": self.registry, "inline": false },
                ],
                "footer": { "text": "chartpipe" },
                "timestamp": timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            }]
        })
    }
}

/// Posts notifications to a Discord webhook
pub struct Notifier {
    client: reqwest::blocking::Client,
    webhook: Url,
}

impl Notifier {
    pub fn new(webhook: &str) -> Result<Self> {
        let webhook = Url::parse(webhook).map_err(|e| CiError::Webhook {
            message: format!("invalid webhook URL: {}", e),
        })?;

        let client = reqwest::blocking::Client::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .build()?;

        Ok(Self { client, webhook })
    }

    /// Notifier for `DISCORD_WEBHOOK_URL`, if set
    pub fn from_env(env: &CiEnvironment) -> Result<Option<Self>> {
        env.discord_webhook_url.as_deref().map(Self::new).transpose()
    }

    /// POST the notification, failing on any non-2xx answer
    pub fn send(&self, notification: &Notification) -> Result<()> {
        let payload = notification.discord_payload(Utc::now());
        tracing::debug!("Posting webhook notification to {}", self.webhook.host_str().unwrap_or("?"));

        self.client
            .post(self.webhook.clone())
            .json(&payload)
            .send()?
            .error_for_status()?;

        tracing::info!("Discord notification sent");
        Ok(())
    }
}

/// Send `notification` to the webhook when it applies
///
/// Returns whether a message was delivered. Delivery failures are logged
/// and never abort the pipeline.
pub fn deliver(notifier: Option<&Notifier>, notification: &Notification) -> bool {
    let Some(notifier) = notifier else {
        tracing::debug!("Discord webhook URL not configured - skipping");
        return false;
    };

    if !notification.wants_webhook() {
        tracing::debug!("Nothing to announce for {} - skipping webhook", notification.kind);
        return false;
    }

    match notifier.send(notification) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Discord notification failed: {}", e);
            false
        }
    }
}
