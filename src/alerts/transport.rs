//! Network seam for the notification channels.
//!
//! Channels format their payloads and hand them to a [`Transport`]. [`NetworkTransport`]
//! does the real HTTP and SMTP work; tests substitute a recording fake.

use crate::settings::EmailSettings;
use lettre::address::AddressError;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport as _};
use reqwest::blocking::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Request to {0} failed")]
    Request(String, #[source] reqwest::Error),

    #[error("Request to {url} failed with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid email address '{0}'")]
    Address(String, #[source] AddressError),

    #[error("Invalid attachment content type '{0}'")]
    ContentType(String),

    #[error("Failed to build email message")]
    MailBuild(#[source] lettre::error::Error),

    #[error("SMTP delivery through {host} failed")]
    Smtp {
        host: String,
        #[source]
        source: lettre::transport::smtp::Error,
    },
}

/// A plain-text email with a single attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub subject: String,
    pub body: String,
    pub attachment_name: String,
    pub attachment_content_type: String,
    pub attachment: Vec<u8>,
}

/// Delivery primitives the notification channels are built on.
pub trait Transport {
    /// POSTs `payload` as a JSON body.
    fn post_json(&self, url: &str, payload: &Value, timeout: Duration) -> Result<(), TransportError>;

    /// POSTs `body` as plain text with a `Title` header.
    fn post_text(
        &self,
        url: &str,
        title: &str,
        body: &str,
        timeout: Duration,
    ) -> Result<(), TransportError>;

    /// Sends `message` from `settings.from` to every address in `settings.to`.
    fn send_mail(&self, settings: &EmailSettings, message: &MailMessage) -> Result<(), TransportError>;
}

/// [`Transport`] over a blocking `reqwest` client and `lettre` SMTP.
///
/// The HTTP client lives as long as this value; dropping it closes pooled connections.
#[derive(Debug, Clone)]
pub struct NetworkTransport {
    http: Client,
}

impl NetworkTransport {
    pub fn new() -> Result<Self, TransportError> {
        let http = Client::builder()
            .build()
            .map_err(TransportError::ClientBuild)?;
        Ok(Self { http })
    }

    fn send(
        &self,
        url: &str,
        request: reqwest::blocking::RequestBuilder,
    ) -> Result<(), TransportError> {
        let response = request
            .send()
            .map_err(|e| TransportError::Request(url.to_string(), e))?;
        match response.error_for_status() {
            Ok(_) => Ok(()),
            Err(e) => Err(match e.status() {
                Some(status) => TransportError::HttpStatus {
                    url: url.to_string(),
                    status,
                    source: e,
                },
                None => TransportError::Request(url.to_string(), e),
            }),
        }
    }
}

impl Transport for NetworkTransport {
    fn post_json(&self, url: &str, payload: &Value, timeout: Duration) -> Result<(), TransportError> {
        self.send(url, self.http.post(url).json(payload).timeout(timeout))
    }

    fn post_text(
        &self,
        url: &str,
        title: &str,
        body: &str,
        timeout: Duration,
    ) -> Result<(), TransportError> {
        let request = self
            .http
            .post(url)
            .header("Title", title)
            .body(body.to_string())
            .timeout(timeout);
        self.send(url, request)
    }

    fn send_mail(&self, settings: &EmailSettings, message: &MailMessage) -> Result<(), TransportError> {
        let email = build_email(settings, message)?;
        let mailer = SmtpTransport::relay(&settings.smtp_host)
            .map_err(|source| TransportError::Smtp {
                host: settings.smtp_host.clone(),
                source,
            })?
            .port(settings.smtp_port)
            .credentials(Credentials::new(
                settings.user.clone(),
                settings.password.clone(),
            ))
            .timeout(Some(SMTP_TIMEOUT))
            .build();
        mailer
            .send(&email)
            .map_err(|source| TransportError::Smtp {
                host: settings.smtp_host.clone(),
                source,
            })?;
        Ok(())
    }
}

fn mailbox(address: &str) -> Result<Mailbox, TransportError> {
    address
        .parse::<Mailbox>()
        .map_err(|e| TransportError::Address(address.to_string(), e))
}

fn build_email(settings: &EmailSettings, message: &MailMessage) -> Result<Message, TransportError> {
    let mut builder = Message::builder()
        .from(mailbox(&settings.from)?)
        .subject(message.subject.clone());
    for recipient in &settings.to {
        builder = builder.to(mailbox(recipient)?);
    }

    let content_type = ContentType::parse(&message.attachment_content_type)
        .map_err(|_| TransportError::ContentType(message.attachment_content_type.clone()))?;
    let attachment =
        Attachment::new(message.attachment_name.clone()).body(message.attachment.clone(), content_type);

    builder
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(message.body.clone()))
                .singlepart(attachment),
        )
        .map_err(TransportError::MailBuild)
}
