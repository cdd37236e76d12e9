//! Notification channels. Exactly one channel is selected per run.

use crate::alerts::condition::AlertResult;
use crate::alerts::transport::{MailMessage, Transport};
use crate::reporting::Reporter;
use crate::settings::{EmailSettings, PushSettings, Settings};
use crate::types::observation_batch::ObservationBatch;
use chrono::Local;
use serde_json::{json, Value};
use std::time::Duration;

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);
const PUSH_TIMEOUT: Duration = Duration::from_secs(6);
const DISCORD_ALERT_COLOR: u32 = 15158332;
const RULE: &str = "==================================================";

/// A notification channel.
#[derive(Debug, Clone, PartialEq)]
pub enum Notifier {
    /// Writes alerts through the reporter. Always succeeds.
    Console,
    Slack { webhook_url: String },
    Discord { webhook_url: String },
    Email(EmailSettings),
    /// ntfy-style push, one message per triggered alert.
    Push(PushSettings),
}

impl Notifier {
    /// Picks the channel for a run: Slack, then Discord, then email, then push, else console.
    pub fn from_settings(settings: &Settings) -> Self {
        if let Some(url) = &settings.slack_webhook_url {
            return Notifier::Slack {
                webhook_url: url.clone(),
            };
        }
        if let Some(url) = &settings.discord_webhook_url {
            return Notifier::Discord {
                webhook_url: url.clone(),
            };
        }
        if let Some(email) = &settings.email {
            return Notifier::Email(email.clone());
        }
        if let Some(push) = &settings.push {
            return Notifier::Push(push.clone());
        }
        Notifier::Console
    }

    pub fn channel_name(&self) -> &'static str {
        match self {
            Notifier::Console => "console",
            Notifier::Slack { .. } => "slack",
            Notifier::Discord { .. } => "discord",
            Notifier::Email(_) => "email",
            Notifier::Push(_) => "push",
        }
    }

    /// Delivers the triggered subset of `results`. Returns `false` if delivery failed.
    ///
    /// When nothing triggered, every channel returns `true` without touching the transport.
    pub fn send(
        &self,
        transport: &dyn Transport,
        results: &[AlertResult],
        location: &str,
        batch: &ObservationBatch,
        reporter: &dyn Reporter,
    ) -> bool {
        let triggered: Vec<&AlertResult> = results.iter().filter(|r| r.triggered).collect();

        match self {
            Notifier::Console => {
                send_console(&triggered, location, batch, reporter);
                true
            }
            _ if triggered.is_empty() => true,
            Notifier::Slack { webhook_url } => post_webhook(
                transport,
                webhook_url,
                &slack_payload(&triggered, location),
                "Slack",
                reporter,
            ),
            Notifier::Discord { webhook_url } => post_webhook(
                transport,
                webhook_url,
                &discord_payload(&triggered, location),
                "Discord",
                reporter,
            ),
            Notifier::Email(email) => send_email(transport, email, &triggered, location, batch, reporter),
            Notifier::Push(push) => send_push(transport, push, &triggered, location, reporter),
        }
    }
}

fn severity_line(result: &AlertResult) -> String {
    format!(
        "{} [{}] {}",
        result.severity.icon(),
        result.severity.as_str().to_uppercase(),
        result.message
    )
}

fn send_console(
    triggered: &[&AlertResult],
    location: &str,
    batch: &ObservationBatch,
    reporter: &dyn Reporter,
) {
    if triggered.is_empty() {
        reporter.info(&format!("No alerts triggered for {}", location));
        return;
    }

    reporter.info(RULE);
    reporter.info(&format!("ALERTS FOR {}", location.to_uppercase()));
    reporter.info(RULE);
    reporter.info(&batch.to_string());
    for result in triggered {
        reporter.info(&severity_line(result));
    }
    reporter.info(RULE);
}

fn slack_payload(triggered: &[&AlertResult], location: &str) -> Value {
    let mut blocks = vec![
        json!({
            "type": "header",
            "text": {"type": "plain_text", "text": format!("⚠️ Weather Alerts - {}", location)},
        }),
        json!({"type": "divider"}),
    ];
    blocks.extend(triggered.iter().map(|result| {
        json!({
            "type": "section",
            "text": {
                "type": "mrkdwn",
                "text": format!("{} *{}*\n{}", result.severity.icon(), result.condition_name, result.message),
            },
        })
    }));
    json!({ "blocks": blocks })
}

fn discord_payload(triggered: &[&AlertResult], location: &str) -> Value {
    let fields: Vec<Value> = triggered
        .iter()
        .map(|result| {
            json!({
                "name": result.condition_name,
                "value": result.message,
                "inline": false,
            })
        })
        .collect();
    json!({
        "embeds": [{
            "title": format!("⚠️ Weather Alerts - {}", location),
            "color": DISCORD_ALERT_COLOR,
            "fields": fields,
        }]
    })
}

fn post_webhook(
    transport: &dyn Transport,
    url: &str,
    payload: &Value,
    service: &str,
    reporter: &dyn Reporter,
) -> bool {
    match transport.post_json(url, payload, WEBHOOK_TIMEOUT) {
        Ok(()) => {
            reporter.info(&format!("{} notification sent successfully", service));
            true
        }
        Err(e) => {
            reporter.error(&format!("Failed to send {} notification: {}", service, e));
            false
        }
    }
}

fn send_email(
    transport: &dyn Transport,
    settings: &EmailSettings,
    triggered: &[&AlertResult],
    location: &str,
    batch: &ObservationBatch,
    reporter: &dyn Reporter,
) -> bool {
    let csv = match batch.to_csv() {
        Ok(csv) => csv,
        Err(e) => {
            reporter.error(&format!("Failed to export data for {}: {}", location, e));
            return false;
        }
    };

    for result in triggered {
        reporter.info(&severity_line(result));
    }

    let message = MailMessage {
        subject: format!(
            "Weather Alerts for {} - {}",
            location,
            Local::now().date_naive()
        ),
        body: [
            format!("ALERTS TYPE: {}", location.to_uppercase()),
            "=".repeat(40),
            "\nSee attached CSV for full data.".to_string(),
        ]
        .join("\n"),
        attachment_name: format!("{}_weather.csv", location.to_lowercase()),
        attachment_content_type: "text/csv".to_string(),
        attachment: csv,
    };

    match transport.send_mail(settings, &message) {
        Ok(()) => {
            reporter.info(&format!("Email sent for {}", location));
            true
        }
        Err(e) => {
            reporter.error(&format!("Failed to send email for {}: {}", location, e));
            false
        }
    }
}

fn push_text(result: &AlertResult) -> String {
    let value = display_number(result.value);
    let threshold = display_number(result.threshold);
    let copy = match result.condition_name.as_str() {
        "UV Index" => format!(
            "PUT SUNSCREEN !!! --> ⛱️🌞 UV Index is at {}, which is above your threshold of {}!",
            value, threshold
        ),
        "Heavy Precipitation" => format!(
            "TAKE AN ☔ !!! --> ⛈️ Precipitation is at {}, which is above your threshold of {}!",
            value, threshold
        ),
        _ => format!(
            "STAY NEAR THE AC !!! --> ⛱️🌞 Temperature max today would be {}, which is above your threshold of {}!",
            value, threshold
        ),
    };
    format!(
        "{} [{}] \n{}",
        result.severity.icon(),
        result.severity.as_str().to_uppercase(),
        copy
    )
}

fn display_number(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:?}", v))
}

fn send_push(
    transport: &dyn Transport,
    settings: &PushSettings,
    triggered: &[&AlertResult],
    location: &str,
    reporter: &dyn Reporter,
) -> bool {
    let url = settings.url();
    let title = format!("Weather Alerts - {}", location);
    for result in triggered {
        if let Err(e) = transport.post_text(&url, &title, &push_text(result), PUSH_TIMEOUT) {
            reporter.error(&format!(
                "Failed to send push notification for {}: {}",
                location, e
            ));
            return false;
        }
        reporter.info(&format!("Push notification sent for {}", location));
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::condition::Severity;
    use crate::alerts::transport::recording::{Call, RecordingTransport};
    use crate::reporting::MemoryReporter;
    use crate::types::observation_batch::TEMPERATURE;
    use polars::prelude::*;

    fn triggered(name: &str, severity: Severity, value: f64, threshold: f64) -> AlertResult {
        AlertResult {
            triggered: true,
            condition_name: name.to_string(),
            message: format!("{name}: x={value:?} (gt threshold {threshold:?})"),
            severity,
            value: Some(value),
            threshold: Some(threshold),
            date: None,
        }
    }

    fn quiet(name: &str) -> AlertResult {
        AlertResult {
            triggered: false,
            condition_name: name.to_string(),
            message: format!("{name}: OK (x=1.0)"),
            severity: Severity::Info,
            value: Some(1.0),
            threshold: Some(2.0),
            date: None,
        }
    }

    fn batch() -> PolarsResult<ObservationBatch> {
        Ok(ObservationBatch::new(df!(TEMPERATURE => [38.0, 25.0])?))
    }

    fn push() -> Notifier {
        Notifier::Push(PushSettings {
            endpoint: "https://ntfy.sh".to_string(),
            topic: "paris-weather".to_string(),
        })
    }

    #[test]
    fn test_from_settings_priority() {
        let mut settings = Settings::default();
        assert_eq!(Notifier::from_settings(&settings), Notifier::Console);

        settings.push = Some(PushSettings {
            endpoint: "https://ntfy.sh".to_string(),
            topic: "t".to_string(),
        });
        assert_eq!(Notifier::from_settings(&settings).channel_name(), "push");

        settings.discord_webhook_url = Some("https://discord.test/hook".to_string());
        assert_eq!(Notifier::from_settings(&settings).channel_name(), "discord");

        settings.slack_webhook_url = Some("https://slack.test/hook".to_string());
        assert_eq!(
            Notifier::from_settings(&settings),
            Notifier::Slack {
                webhook_url: "https://slack.test/hook".to_string()
            }
        );
    }

    #[test]
    fn test_webhook_without_triggers_makes_no_call() -> Result<(), Box<dyn std::error::Error>> {
        let transport = RecordingTransport::default();
        let notifier = Notifier::Slack {
            webhook_url: "https://slack.test/hook".to_string(),
        };
        let sent = notifier.send(
            &transport,
            &[quiet("High Temperature")],
            "Paris",
            &batch()?,
            &MemoryReporter::new(),
        );
        assert!(sent);
        assert!(transport.calls().is_empty());
        Ok(())
    }

    #[test]
    fn test_slack_payload_has_only_triggered_sections() -> Result<(), Box<dyn std::error::Error>> {
        let transport = RecordingTransport::default();
        let notifier = Notifier::Slack {
            webhook_url: "https://slack.test/hook".to_string(),
        };
        let results = [
            triggered("High Temperature", Severity::Warning, 38.0, 35.0),
            quiet("UV Index"),
        ];
        assert!(notifier.send(&transport, &results, "Paris", &batch()?, &MemoryReporter::new()));

        let calls = transport.calls();
        let [Call::Json { url, payload }] = calls.as_slice() else {
            return Err("expected a single JSON post".into());
        };
        assert_eq!(url, "https://slack.test/hook");
        let blocks = payload["blocks"].as_array().ok_or("no blocks")?;
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0]["text"]["text"], "⚠️ Weather Alerts - Paris");
        assert_eq!(blocks[1]["type"], "divider");
        assert_eq!(
            blocks[2]["text"]["text"],
            "🟡 *High Temperature*\nHigh Temperature: x=38.0 (gt threshold 35.0)"
        );
        Ok(())
    }

    #[test]
    fn test_discord_embed_fields() -> Result<(), Box<dyn std::error::Error>> {
        let transport = RecordingTransport::default();
        let notifier = Notifier::Discord {
            webhook_url: "https://discord.test/hook".to_string(),
        };
        let results = [
            triggered("High Temperature", Severity::Warning, 38.0, 35.0),
            triggered("UV Index", Severity::Critical, 9.0, 8.0),
        ];
        assert!(notifier.send(&transport, &results, "Paris", &batch()?, &MemoryReporter::new()));

        let calls = transport.calls();
        let [Call::Json { payload, .. }] = calls.as_slice() else {
            return Err("expected a single JSON post".into());
        };
        let embed = &payload["embeds"][0];
        assert_eq!(embed["color"], DISCORD_ALERT_COLOR);
        assert_eq!(embed["fields"].as_array().ok_or("no fields")?.len(), 2);
        assert_eq!(embed["fields"][1]["name"], "UV Index");
        assert_eq!(embed["fields"][1]["inline"], false);
        Ok(())
    }

    #[test]
    fn test_webhook_failure_returns_false() -> Result<(), Box<dyn std::error::Error>> {
        let transport = RecordingTransport::failing_on(vec![1]);
        let reporter = MemoryReporter::new();
        let notifier = Notifier::Discord {
            webhook_url: "https://discord.test/hook".to_string(),
        };
        let results = [triggered("High Temperature", Severity::Warning, 38.0, 35.0)];
        assert!(!notifier.send(&transport, &results, "Paris", &batch()?, &reporter));
        assert!(reporter.contains("Failed to send Discord notification"));
        Ok(())
    }

    #[test]
    fn test_push_stops_at_first_failure() -> Result<(), Box<dyn std::error::Error>> {
        let transport = RecordingTransport::failing_on(vec![1]);
        let results = [
            triggered("UV Index", Severity::Critical, 9.0, 8.0),
            triggered("Heavy Precipitation", Severity::Warning, 12.0, 8.0),
        ];
        let sent = push().send(&transport, &results, "Paris", &batch()?, &MemoryReporter::new());
        assert!(!sent);
        assert_eq!(transport.calls().len(), 1);
        Ok(())
    }

    #[test]
    fn test_push_copy_per_condition() -> Result<(), Box<dyn std::error::Error>> {
        let transport = RecordingTransport::default();
        let results = [
            triggered("UV Index", Severity::Critical, 9.0, 8.0),
            triggered("High Temperature", Severity::Warning, 38.0, 35.0),
        ];
        assert!(push().send(&transport, &results, "Paris", &batch()?, &MemoryReporter::new()));

        let calls = transport.calls();
        let [Call::Text { url, title, body }, Call::Text { body: second, .. }] = calls.as_slice()
        else {
            return Err("expected two text posts".into());
        };
        assert_eq!(url, "https://ntfy.sh/paris-weather");
        assert_eq!(title, "Weather Alerts - Paris");
        assert_eq!(
            body,
            "🔴 [CRITICAL] \nPUT SUNSCREEN !!! --> ⛱️🌞 UV Index is at 9.0, which is above your threshold of 8.0!"
        );
        assert!(second.contains("STAY NEAR THE AC !!!"));
        assert!(second.contains("Temperature max today would be 38.0"));
        Ok(())
    }

    #[test]
    fn test_email_attaches_csv() -> Result<(), Box<dyn std::error::Error>> {
        let transport = RecordingTransport::default();
        let notifier = Notifier::Email(EmailSettings {
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: 465,
            user: "me@example.com".to_string(),
            password: "secret".to_string(),
            from: "me@example.com".to_string(),
            to: vec!["you@example.com".to_string()],
        });
        let results = [triggered("High Temperature", Severity::Warning, 38.0, 35.0)];
        let batch = batch()?;
        assert!(notifier.send(&transport, &results, "Paris", &batch, &MemoryReporter::new()));

        let calls = transport.calls();
        let [Call::Mail {
            subject,
            body,
            attachment_name,
            attachment,
        }] = calls.as_slice()
        else {
            return Err("expected one email".into());
        };
        assert!(subject.starts_with("Weather Alerts for Paris - "));
        assert!(body.starts_with("ALERTS TYPE: PARIS"));
        assert!(body.contains("See attached CSV for full data."));
        assert_eq!(attachment_name, "paris_weather.csv");
        assert!(!attachment.is_empty());
        assert_eq!(attachment, &batch.to_csv()?);
        Ok(())
    }

    #[test]
    fn test_console_reports_frame_and_icons() -> Result<(), Box<dyn std::error::Error>> {
        let reporter = MemoryReporter::new();
        let transport = RecordingTransport::default();
        let results = [
            triggered("UV Index", Severity::Critical, 9.0, 8.0),
            quiet("High Temperature"),
        ];
        assert!(Notifier::Console.send(&transport, &results, "Paris", &batch()?, &reporter));
        assert!(reporter.contains("ALERTS FOR PARIS"));
        assert!(reporter.contains("🔴 [CRITICAL] UV Index"));
        assert!(!reporter.contains("High Temperature: OK"));
        assert!(transport.calls().is_empty());
        Ok(())
    }

    #[test]
    fn test_console_without_triggers() -> Result<(), Box<dyn std::error::Error>> {
        let reporter = MemoryReporter::new();
        let transport = RecordingTransport::default();
        assert!(Notifier::Console.send(&transport, &[], "Paris", &batch()?, &reporter));
        assert!(reporter.contains("No alerts triggered for Paris"));
        Ok(())
    }
}
