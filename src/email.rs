//! Outbound email over SMTP.
//!
//! Only configured when the SMTP settings are present; signup still
//! succeeds when the welcome email cannot be sent.

use anyhow::{Context, Result};
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{info, warn};

pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl Mailer {
    pub fn new(host: &str, username: &str, password: &str, from: &str) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .context("failed to configure SMTP relay")?
            .credentials(Credentials::new(username.to_string(), password.to_string()))
            .build();
        Ok(Self {
            transport,
            from: from.to_string(),
        })
    }

    /// Send the post-signup welcome email. Failures are logged, not returned;
    /// a broken mail relay must never block account creation.
    pub async fn send_welcome(&self, to: &str, full_name: &str) {
        let body = format!(
            "Hello {full_name},\n\n\
             Welcome to the university FAQ chatbot! Your account has been created.\n\
             Sign in any time to ask about programs, fees, hostels, and campus life.\n\n\
             Best regards,\n\
             The university chatbot team"
        );

        let message = match Message::builder()
            .from(match self.from.parse() {
                Ok(mailbox) => mailbox,
                Err(e) => {
                    warn!(error = %e, "invalid sender address, skipping welcome email");
                    return;
                }
            })
            .to(match to.parse() {
                Ok(mailbox) => mailbox,
                Err(e) => {
                    warn!(error = %e, "invalid recipient address, skipping welcome email");
                    return;
                }
            })
            .subject("Welcome to the University FAQ Chatbot")
            .header(ContentType::TEXT_PLAIN)
            .body(body)
        {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "failed to build welcome email");
                return;
            }
        };

        match self.transport.send(message).await {
            Ok(_) => info!(to = %to, "welcome email sent"),
            Err(e) => warn!(error = %e, to = %to, "failed to send welcome email"),
        }
    }
}
