//! Outgoing email.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use platebook_common::{AppError, AppResult, config::EmailConfig};

/// Sends verification codes over SMTP. Without a configured relay,
/// messages are logged and dropped.
#[derive(Clone)]
pub struct EmailService {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: Mailbox,
}

impl EmailService {
    /// Create an email service from configuration.
    pub fn new(config: &EmailConfig) -> AppResult<Self> {
        let from: Mailbox = config
            .from_address
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid sender address: {e}")))?;

        let transport = match &config.smtp_host {
            Some(host) => {
                let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                    .map_err(|e| AppError::Config(format!("Invalid SMTP relay: {e}")))?
                    .port(config.smtp_port);
                if let (Some(username), Some(password)) =
                    (&config.smtp_username, &config.smtp_password)
                {
                    builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
                }
                Some(builder.build())
            }
            None => None,
        };

        Ok(Self { transport, from })
    }

    /// Whether messages actually leave the process.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    /// Send a verification code to `to`.
    pub async fn send_verification_code(&self, to: &str, code: &str, ttl_minutes: i64) -> AppResult<()> {
        let Some(transport) = &self.transport else {
            tracing::info!(to = %to, "Email delivery disabled, verification code not sent");
            return Ok(());
        };

        let recipient: Mailbox = to
            .parse()
            .map_err(|_| AppError::invalid_field("email", "Invalid email address"))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject("Your Platebook verification code")
            .header(ContentType::TEXT_PLAIN)
            .body(format!(
                "Your verification code is {code}.\n\nIt expires in {ttl_minutes} minutes."
            ))
            .map_err(|e| AppError::Internal(format!("Failed to build email: {e}")))?;

        transport
            .send(message)
            .await
            .map_err(|e| AppError::ExternalService(format!("SMTP delivery failed: {e}")))?;

        tracing::info!(to = %to, "Verification code sent");
        Ok(())
    }
}
