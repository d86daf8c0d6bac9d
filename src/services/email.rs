use crate::config::email::EmailConfig;
use anyhow::Result;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

#[derive(Clone)]
pub struct EmailService {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from_address: Option<String>,
    admin_address: Option<String>,
}

impl EmailService {
    /// Build from environment variables. If SMTP is not configured, email
    /// sending is silently skipped (graceful degradation).
    pub fn from_env() -> Self {
        match EmailConfig::from_env() {
            Some(cfg) => {
                let creds = Credentials::new(cfg.smtp_username.clone(), cfg.smtp_password.clone());
                let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.smtp_host)
                    .map(|builder| builder.port(cfg.smtp_port).credentials(creds).build());

                match transport {
                    Ok(t) => Self {
                        transport: Some(t),
                        from_address: Some(cfg.from_address),
                        admin_address: Some(cfg.admin_address),
                    },
                    Err(e) => {
                        tracing::warn!("Failed to build SMTP transport: {e}");
                        Self {
                            transport: None,
                            from_address: None,
                            admin_address: None,
                        }
                    }
                }
            }
            None => Self {
                transport: None,
                from_address: None,
                admin_address: None,
            },
        }
    }

    /// Returns true if SMTP is configured and available.
    pub fn is_configured(&self) -> bool {
        self.transport.is_some()
    }

    /// Welcome mail carrying the generated account password.
    pub async fn send_welcome_email(&self, to: &str, password: &str) -> Result<()> {
        let body = format!(
            "Welcome to kbase! Your account has been created.\n\nEmail: {to}\nPassword: {password}\n\nPlease login and change your password immediately.",
        );
        self.send_email(to, "Welcome to kbase - Your Account Details", &body)
            .await
    }

    /// Credentials mail for accounts created by an admin.
    pub async fn send_account_created_email(&self, to: &str, password: &str) -> Result<()> {
        let body = format!(
            "Your account has been created by an admin.\n\nEmail: {to}\nPassword: {password}\n\nPlease login and change your password.",
        );
        self.send_email(to, "kbase - Account Created", &body).await
    }

    /// Credentials mail for admins created by a superadmin.
    pub async fn send_admin_granted_email(&self, to: &str, password: &str) -> Result<()> {
        let body = format!(
            "You have been added as an Admin.\n\nEmail: {to}\nPassword: {password}\n\nPlease login and change your password.",
        );
        self.send_email(to, "kbase - Admin Access Granted", &body)
            .await
    }

    /// Password-reset code. The only mail whose failure fails the request.
    pub async fn send_otp_email(&self, to: &str, code: &str) -> Result<()> {
        let body = format!(
            "Your OTP for password reset is: {code}. It expires in 10 minutes.",
        );
        self.send_email(to, "kbase - Password Reset OTP", &body)
            .await
    }

    /// Temporary password issued after a successful OTP verification.
    pub async fn send_temp_password_email(&self, to: &str, password: &str) -> Result<()> {
        let body = format!(
            "Your new temporary password is: {password}. Please change it after logging in.",
        );
        self.send_email(to, "kbase - New Temporary Password", &body)
            .await
    }

    pub async fn send_post_approved_email(&self, to: &str, title: &str) -> Result<()> {
        let body = format!(
            "Your post \"{title}\" has been approved and is now published.",
        );
        self.send_email(to, "kbase - Post Approved", &body).await
    }

    pub async fn send_post_rejected_email(&self, to: &str, title: &str, reason: &str) -> Result<()> {
        let body = format!(
            "Your post \"{title}\" has been rejected.\nReason: {reason}",
        );
        self.send_email(to, "kbase - Post Rejected", &body).await
    }

    /// Notify the admin address about a contact-form submission.
    pub async fn send_contact_notification(
        &self,
        name: &str,
        email: &str,
        subject: &str,
        message: &str,
    ) -> Result<()> {
        let admin = match &self.admin_address {
            Some(a) => a.clone(),
            None => {
                tracing::debug!("No admin address configured, skipping contact notification");
                return Ok(());
            }
        };
        let body = format!(
            "You have received a new contact form submission:\n\nName: {name}\nEmail: {email}\nSubject: {subject}\n\nMessage:\n{message}",
        );
        self.send_email(&admin, &format!("Contact Form: {subject}"), &body)
            .await
    }

    /// Reply to a contact-form sender.
    pub async fn send_contact_reply(
        &self,
        to: &str,
        name: &str,
        subject: &str,
        message: &str,
    ) -> Result<()> {
        let body = format!("Dear {name},\n\n{message}\n\nBest regards,\nThe kbase Team");
        self.send_email(to, &format!("Re: {subject}"), &body).await
    }

    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let transport = match &self.transport {
            Some(t) => t,
            None => {
                tracing::debug!("SMTP not configured, skipping email to {to}");
                return Ok(());
            }
        };
        let from_address = match &self.from_address {
            Some(f) => f,
            None => return Ok(()),
        };

        let from_mailbox: Mailbox =
            from_address
                .parse()
                .map_err(|e: lettre::address::AddressError| {
                    anyhow::anyhow!("Invalid from address '{}': {}", from_address, e)
                })?;
        let to_mailbox: Mailbox = to.parse().map_err(|e: lettre::address::AddressError| {
            anyhow::anyhow!("Invalid to address '{}': {}", to, e)
        })?;

        let email = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;

        transport.send(email).await?;
        tracing::info!("Email sent to {to}: {subject}");
        Ok(())
    }
}
