//! Escalation emails via SMTP.
//!
//! [`EmailDelivery`] wraps the `lettre` async SMTP transport. Configuration
//! comes from the environment; without `SMTP_HOST`, [`EmailConfig::from_env`]
//! returns `None` and no mail is sent.

use crate::bus::TicketEvent;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Email build error: {0}")]
    Build(String),
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

const DEFAULT_FROM_ADDRESS: &str = "servicedesk@localhost";

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    /// Team-lead mailboxes that receive escalation emails.
    pub escalation_recipients: Vec<String>,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set.
    ///
    /// | Variable            | Required | Default                 |
    /// |---------------------|----------|-------------------------|
    /// | `SMTP_HOST`         | yes      | --                      |
    /// | `SMTP_PORT`         | no       | `587`                   |
    /// | `SMTP_FROM`         | no       | `servicedesk@localhost` |
    /// | `SMTP_USER`         | no       | --                      |
    /// | `SMTP_PASSWORD`     | no       | --                      |
    /// | `ESCALATION_EMAILS` | no       | empty (comma-separated) |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
            escalation_recipients: parse_recipients(
                &std::env::var("ESCALATION_EMAILS").unwrap_or_default(),
            ),
        })
    }
}

/// Split a comma-separated address list, dropping blanks.
pub fn parse_recipients(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Subject line for an event email.
pub fn subject_for(event: &TicketEvent) -> String {
    match event.payload.get("severity").and_then(|s| s.as_str()) {
        Some(severity) => format!(
            "[Service Desk] {} escalated ({severity})",
            event.ticket_number
        ),
        None => format!("[Service Desk] {} {}", event.ticket_number, event.kind),
    }
}

// ---------------------------------------------------------------------------
// EmailDelivery
// ---------------------------------------------------------------------------

pub struct EmailDelivery {
    config: EmailConfig,
}

impl EmailDelivery {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    pub fn escalation_recipients(&self) -> &[String] {
        &self.config.escalation_recipients
    }

    /// Send a plain-text email describing `event` to one address.
    pub async fn deliver(&self, to_email: &str, event: &TicketEvent) -> Result<(), EmailError> {
        use lettre::{
            message::header::ContentType, transport::smtp::authentication::Credentials,
            AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
        };

        let body = format!(
            "Ticket: {}\nEvent: {}\nTime: {}\nDetails: {}",
            event.ticket_number,
            event.kind,
            event.occurred_at,
            serde_json::to_string_pretty(&event.payload).unwrap_or_default()
        );

        let email = Message::builder()
            .from(self.config.from_address.parse()?)
            .to(to_email.parse()?)
            .subject(subject_for(event))
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| EmailError::Build(e.to_string()))?;

        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)?
                .port(self.config.smtp_port);

        if let (Some(user), Some(pass)) = (&self.config.smtp_user, &self.config.smtp_password) {
            transport_builder =
                transport_builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        let mailer = transport_builder.build();
        mailer.send(email).await?;

        tracing::info!(
            to = to_email,
            ticket_id = event.ticket_id,
            event = %event.kind,
            "Notification email sent"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
