//! Runtime configuration for the pipeline.
//!
//! Settings are read once at process start from environment variables (optionally
//! seeded from a `.env` file) into an immutable [`Settings`] value, which is then passed
//! by reference into every component that needs it.

use crate::reporting::Reporter;
use crate::types::location::LatLon;
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {key}: expected {expected}")]
    InvalidValue {
        key: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("{key} must be set when {feature} is enabled")]
    MissingCredential {
        key: &'static str,
        feature: &'static str,
    },

    #[error("Failed to load environment file '{0}'")]
    EnvFile(PathBuf, #[source] dotenvy::Error),
}

/// SMTP account used by the email channel.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailSettings {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub user: String,
    pub password: String,
    pub from: String,
    pub to: Vec<String>,
}

/// ntfy-style push target: messages are POSTed to `<endpoint>/<topic>`.
#[derive(Debug, Clone, PartialEq)]
pub struct PushSettings {
    pub endpoint: String,
    pub topic: String,
}

impl PushSettings {
    pub fn url(&self) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), self.topic)
    }
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading. The notification channel fields are
/// independent here; [`crate::Notifier::from_settings`] picks exactly one of them.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub location_name: String,
    pub location: LatLon,

    pub temp_max_threshold: f64,
    pub uv_threshold: f64,
    pub precipitation_threshold: f64,

    pub alert_enabled: bool,

    pub slack_webhook_url: Option<String>,
    pub discord_webhook_url: Option<String>,
    /// `Some` only when `EMAIL_ENABLED` is true.
    pub email: Option<EmailSettings>,
    /// `Some` only when `PUSH_NOTIFICATION_ENABLED` is true.
    pub push: Option<PushSettings>,

    pub data_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            location_name: "Paris".to_string(),
            location: LatLon(48.8566, 2.3522),
            temp_max_threshold: 35.0,
            uv_threshold: 8.0,
            precipitation_threshold: 8.0,
            alert_enabled: true,
            slack_webhook_url: None,
            discord_webhook_url: None,
            email: None,
            push: None,
            data_dir: PathBuf::from("./data"),
        }
    }
}

/// Loads variables from `path`, or from `./.env` if no path is given.
///
/// A missing default `.env` is not an error; a missing explicit file is.
pub fn load_env_file(path: Option<&Path>) -> Result<(), ConfigError> {
    match path {
        Some(path) => dotenvy::from_path(path)
            .map_err(|e| ConfigError::EnvFile(path.to_path_buf(), e)),
        None => {
            dotenvy::dotenv().ok();
            Ok(())
        }
    }
}

impl Settings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads settings through an arbitrary key lookup. Unset or blank values fall back to
    /// the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Settings::default();

        let latitude = parse_f64(&get, "LATITUDE", defaults.location.0)?;
        let longitude = parse_f64(&get, "LONGITUDE", defaults.location.1)?;

        let email = if parse_bool(&get, "EMAIL_ENABLED", false)? {
            let user = get("EMAIL_USER").ok_or(ConfigError::MissingCredential {
                key: "EMAIL_USER",
                feature: "EMAIL_ENABLED",
            })?;
            let password = get("GMAIL_SMTP_APP_PASSWORD").ok_or(ConfigError::MissingCredential {
                key: "GMAIL_SMTP_APP_PASSWORD",
                feature: "EMAIL_ENABLED",
            })?;
            let to = get("EMAIL_TO")
                .map(|list| {
                    list.split(',')
                        .map(|address| address.trim().to_string())
                        .filter(|address| !address.is_empty())
                        .collect()
                })
                .unwrap_or_else(|| vec![user.clone()]);
            let smtp_port = match get("SMTP_PORT") {
                Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                    key: "SMTP_PORT",
                    value: raw,
                    expected: "a port number",
                })?,
                None => 465,
            };
            Some(EmailSettings {
                smtp_host: get("SMTP_HOST").unwrap_or_else(|| "smtp.gmail.com".to_string()),
                smtp_port,
                from: get("EMAIL_FROM").unwrap_or_else(|| user.clone()),
                user,
                password,
                to,
            })
        } else {
            None
        };

        let push = if parse_bool(&get, "PUSH_NOTIFICATION_ENABLED", false)? {
            let topic = get("PUSH_NOTIFICATION_TOPIC").ok_or(ConfigError::MissingCredential {
                key: "PUSH_NOTIFICATION_TOPIC",
                feature: "PUSH_NOTIFICATION_ENABLED",
            })?;
            Some(PushSettings {
                endpoint: get("PUSH_ENDPOINT").unwrap_or_else(|| "https://ntfy.sh".to_string()),
                topic,
            })
        } else {
            None
        };

        Ok(Settings {
            location_name: get("LOCATION_NAME").unwrap_or(defaults.location_name),
            location: LatLon(latitude, longitude),
            temp_max_threshold: parse_f64(&get, "TEMP_MAX_THRESHOLD", defaults.temp_max_threshold)?,
            uv_threshold: parse_f64(&get, "UV_THRESHOLD", defaults.uv_threshold)?,
            precipitation_threshold: parse_f64(
                &get,
                "PRECIPITATION_THRESHOLD",
                defaults.precipitation_threshold,
            )?,
            alert_enabled: parse_bool(&get, "ALERT_ENABLED", defaults.alert_enabled)?,
            slack_webhook_url: get("SLACK_WEBHOOK_URL"),
            discord_webhook_url: get("DISCORD_WEBHOOK_URL"),
            email,
            push,
            data_dir: get("DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
        })
    }

    /// Logs the loaded configuration, masking webhook URLs and credentials.
    pub fn log_config(&self, reporter: &dyn Reporter) {
        reporter.info("Configuration loaded:");
        reporter.info(&format!("  LOCATION_NAME           : {}", self.location_name));
        reporter.info(&format!(
            "  COORDINATES             : ({}, {})",
            self.location.0, self.location.1
        ));
        reporter.info(&format!("  TEMP_MAX_THRESHOLD      : {}", self.temp_max_threshold));
        reporter.info(&format!("  UV_THRESHOLD            : {}", self.uv_threshold));
        reporter.info(&format!(
            "  PRECIPITATION_THRESHOLD : {}",
            self.precipitation_threshold
        ));
        reporter.info(&format!("  ALERT_ENABLED           : {}", self.alert_enabled));
        reporter.info(&format!(
            "  SLACK_WEBHOOK_URL       : {}",
            mask(self.slack_webhook_url.as_deref())
        ));
        reporter.info(&format!(
            "  DISCORD_WEBHOOK_URL     : {}",
            mask(self.discord_webhook_url.as_deref())
        ));
        match &self.email {
            Some(email) => reporter.info(&format!(
                "  EMAIL                   : {} via {}:{} -> {}",
                email.user,
                email.smtp_host,
                email.smtp_port,
                email.to.join(", ")
            )),
            None => reporter.info("  EMAIL                   : disabled"),
        }
        match &self.push {
            Some(push) => reporter.info(&format!(
                "  PUSH                    : {}/****",
                push.endpoint.trim_end_matches('/')
            )),
            None => reporter.info("  PUSH                    : disabled"),
        }
        reporter.info(&format!("  DATA_DIR                : {}", self.data_dir.display()));
    }
}

fn mask(secret: Option<&str>) -> String {
    match secret {
        Some(url) => match url.find("://") {
            Some(scheme_end) => {
                let host_end = url[scheme_end + 3..]
                    .find('/')
                    .map(|i| scheme_end + 3 + i)
                    .unwrap_or(url.len());
                format!("{}/****", &url[..host_end])
            }
            None => "****".to_string(),
        },
        None => "unset".to_string(),
    }
}

fn parse_f64<G>(get: &G, key: &'static str, default: f64) -> Result<f64, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.parse::<f64>().map_err(|_| ConfigError::InvalidValue {
            key,
            value: raw,
            expected: "a number",
        }),
        None => Ok(default),
    }
}

fn parse_bool<G>(get: &G, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                key,
                value: raw,
                expected: "a boolean",
            }),
        },
        None => Ok(default),
    }
}
