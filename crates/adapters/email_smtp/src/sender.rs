//! [`EmailSender`] over an async SMTP transport.

use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use careops_app::ports::EmailSender;
use careops_domain::notification::{Delivery, EmailMessage};

use crate::error::SmtpError;

/// SMTP relay settings. Sending is disabled unless both `username` and
/// `password` are set.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Sender address; defaults to `username`.
    pub from: Option<String>,
}

struct Relay {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl Relay {
    fn from_config(config: Config) -> Result<Option<Self>, SmtpError> {
        let (Some(username), Some(password)) = (config.username, config.password) else {
            return Ok(None);
        };

        let from = config.from.as_deref().unwrap_or(&username).parse()?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(Credentials::new(username, password))
            .build();
        tracing::info!(host = %config.host, port = config.port, "SMTP relay configured");

        Ok(Some(Self { transport, from }))
    }
}

pub struct SmtpEmailSender {
    relay: Option<Relay>,
}

impl SmtpEmailSender {
    /// Build the sender. No connection is opened until the first email.
    ///
    /// Missing credentials, a sender address that does not parse or a relay
    /// that cannot be configured all leave the sender disabled, so a broken
    /// mail setup never stops the service.
    #[must_use]
    pub fn new(config: Config) -> Self {
        match Relay::from_config(config) {
            Ok(Some(relay)) => Self { relay: Some(relay) },
            Ok(None) => {
                tracing::warn!("SMTP credentials not configured, emails will be skipped");
                Self::disabled()
            }
            Err(err) => {
                tracing::warn!(error = %err, "invalid SMTP configuration, emails will be skipped");
                Self::disabled()
            }
        }
    }

    /// Whether emails are actually handed to a relay.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.relay.is_some()
    }

    /// A sender that skips every email.
    #[must_use]
    pub fn disabled() -> Self {
        Self { relay: None }
    }
}

fn build_message(from: Mailbox, email: EmailMessage) -> Result<Message, SmtpError> {
    let content_type = if email.is_html {
        ContentType::TEXT_HTML
    } else {
        ContentType::TEXT_PLAIN
    };
    Ok(Message::builder()
        .from(from)
        .to(email.to.parse()?)
        .subject(email.subject)
        .header(content_type)
        .body(email.body)?)
}

impl EmailSender for SmtpEmailSender {
    async fn send_email(&self, email: EmailMessage) -> Delivery {
        let Some(relay) = &self.relay else {
            return Delivery::skipped("SMTP credentials not configured");
        };

        let message = match build_message(relay.from.clone(), email) {
            Ok(message) => message,
            Err(err) => return Delivery::failed(err),
        };
        match relay.transport.send(message).await {
            Ok(response) => Delivery::Sent {
                reference: response.code().to_string(),
            },
            Err(err) => Delivery::failed(SmtpError::from(err)),
        }
    }
}
