//! Email service for sending transactional emails.
//!
//! Uses `lettre` for SMTP transport.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor, message::header::ContentType,
    transport::smtp::authentication::Credentials,
};
use thiserror::Error;

use crate::config::EmailConfig;

/// Email service errors.
#[derive(Debug, Error)]
pub enum EmailError {
    /// Failed to build email message.
    #[error("Failed to build email: {0}")]
    BuildError(String),
    /// Failed to send email.
    #[error("Failed to send email: {0}")]
    SendError(String),
    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

/// Email service for sending transactional emails.
#[derive(Debug, Clone)]
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    /// Creates a new email service.
    #[must_use]
    pub const fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    fn create_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, EmailError> {
        let builder = if self.config.smtp_username.is_empty() {
            // Local relays (mailpit, mailhog) speak plain SMTP without auth.
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.config.smtp_host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)
                .map_err(|e| EmailError::SendError(e.to_string()))?
                .credentials(Credentials::new(
                    self.config.smtp_username.clone(),
                    self.config.smtp_password.clone(),
                ))
        };

        Ok(builder.port(self.config.smtp_port).build())
    }

    /// Builds the link the user follows to reset a password.
    #[must_use]
    pub fn password_reset_url(&self, token: &str) -> String {
        format!("{}/password-reset?token={token}", self.config.frontend_url)
    }

    /// Sends a password reset email.
    ///
    /// # Errors
    ///
    /// Returns an error if the email cannot be sent.
    pub async fn send_password_reset_email(
        &self,
        to_email: &str,
        to_name: &str,
        token: &str,
        valid_minutes: i64,
    ) -> Result<(), EmailError> {
        let reset_url = self.password_reset_url(token);

        let subject = "Reset your password - Foundry";
        let body = format!(
            r"Hi {to_name},

A password reset was requested for your Foundry account. Use the link below to choose a new password:

{reset_url}

This link will expire in {valid_minutes} minutes and can be used once.

If you did not request a reset, you can safely ignore this email.

Best regards,
The Foundry Team"
        );

        self.send_email(to_email, subject, &body).await
    }

    /// Sends a generic email.
    ///
    /// # Errors
    ///
    /// Returns an error if the email cannot be sent.
    pub async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), EmailError> {
        let from = format!("{} <{}>", self.config.from_name, self.config.from_email);

        let email = Message::builder()
            .from(
                from.parse()
                    .map_err(|e| EmailError::InvalidAddress(format!("{e}")))?,
            )
            .to(to_email
                .parse()
                .map_err(|e| EmailError::InvalidAddress(format!("{e}")))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| EmailError::BuildError(e.to_string()))?;

        let transport = self.create_transport()?;
        transport
            .send(email)
            .await
            .map_err(|e| EmailError::SendError(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_reset_url() {
        let service = EmailService::new(EmailConfig {
            frontend_url: "https://admin.example.com".to_string(),
            ..EmailConfig::default()
        });
        assert_eq!(
            service.password_reset_url("abc"),
            "https://admin.example.com/password-reset?token=abc"
        );
    }

    #[tokio::test]
    async fn test_invalid_recipient_is_rejected_before_sending() {
        let service = EmailService::new(EmailConfig::default());
        let result = service.send_email("not an address", "s", "b").await;
        assert!(matches!(result, Err(EmailError::InvalidAddress(_))));
    }
}
