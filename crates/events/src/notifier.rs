//! Requester notifications over email.
//!
//! [`EmailNotifier`] renders the approval and rejection messages and sends
//! them on a spawned task, so SMTP latency and failures never reach the
//! caller. Without SMTP configuration it only logs.

use std::sync::Arc;

use pms_core::notify::{Notifier, NotifyError};
use pms_core::parking::UserContact;
use pms_core::types::Amount;

use crate::delivery::email::{EmailConfig, EmailDelivery};

/// Subject and body of one outgoing email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub body: String,
}

pub fn approval_email(recipient: &UserContact, slot_number: i32, amount: Amount) -> RenderedEmail {
    RenderedEmail {
        subject: "Parking slot confirmed".to_string(),
        body: format!(
            "Hello {},\n\n\
             Your parking request has been approved.\n\
             Slot number: {slot_number}\n\
             Amount charged: {amount}\n\n\
             Thank you for using our parking service.",
            recipient.names
        ),
    }
}

pub fn rejection_email(recipient: &UserContact) -> RenderedEmail {
    RenderedEmail {
        subject: "Parking request rejected".to_string(),
        body: format!(
            "Hello {},\n\n\
             Unfortunately your parking request has been rejected.\n\
             Please contact the parking office if you have any questions.",
            recipient.names
        ),
    }
}

#[derive(Clone)]
pub struct EmailNotifier {
    delivery: Option<Arc<EmailDelivery>>,
}

impl EmailNotifier {
    pub fn new(config: EmailConfig) -> Self {
        Self {
            delivery: Some(Arc::new(EmailDelivery::new(config))),
        }
    }

    /// A notifier that logs instead of sending.
    pub fn disabled() -> Self {
        Self { delivery: None }
    }

    /// Build from `SMTP_*` environment variables, disabled when `SMTP_HOST`
    /// is unset.
    pub fn from_env() -> Self {
        match EmailConfig::from_env() {
            Some(config) => {
                tracing::info!(smtp_host = %config.smtp_host, "Email notifications enabled");
                Self::new(config)
            }
            None => {
                tracing::info!("SMTP_HOST not set, email notifications disabled");
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.delivery.is_some()
    }

    fn dispatch(&self, recipient: &UserContact, email: RenderedEmail) {
        let Some(delivery) = self.delivery.clone() else {
            tracing::debug!(
                user_id = recipient.user_id,
                subject = %email.subject,
                "Email notifications disabled, skipping"
            );
            return;
        };

        let to = recipient.email.clone();
        let user_id = recipient.user_id;
        tokio::spawn(async move {
            if let Err(e) = delivery.send(&to, &email.subject, email.body).await {
                tracing::error!(error = %e, user_id, "Failed to deliver notification email");
            }
        });
    }
}

impl Notifier for EmailNotifier {
    async fn send_approval(
        &self,
        recipient: &UserContact,
        slot_number: i32,
        amount: Amount,
    ) -> Result<(), NotifyError> {
        self.dispatch(recipient, approval_email(recipient, slot_number, amount));
        Ok(())
    }

    async fn send_rejection(&self, recipient: &UserContact) -> Result<(), NotifyError> {
        self.dispatch(recipient, rejection_email(recipient));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact() -> UserContact {
        UserContact {
            user_id: 1,
            email: "driver@example.com".into(),
            names: "Jane Driver".into(),
        }
    }

    #[test]
    fn approval_email_names_slot_and_amount() {
        let email = approval_email(&contact(), 7, 1500);
        assert_eq!(email.subject, "Parking slot confirmed");
        assert!(email.body.starts_with("Hello Jane Driver,"));
        assert!(email.body.contains("Slot number: 7"));
        assert!(email.body.contains("Amount charged: 1500"));
    }

    #[test]
    fn rejection_email_greets_requester() {
        let email = rejection_email(&contact());
        assert!(email.body.contains("Jane Driver"));
        assert!(email.body.contains("rejected"));
    }

    #[tokio::test]
    async fn disabled_notifier_succeeds_without_sending() {
        let notifier = EmailNotifier::disabled();
        assert!(!notifier.is_enabled());
        assert!(notifier.send_approval(&contact(), 1, 100).await.is_ok());
        assert!(notifier.send_rejection(&contact()).await.is_ok());
    }

    #[tokio::test]
    async fn enabled_notifier_returns_before_delivery() {
        // Unresolvable host: the spawned send fails and is only logged.
        let notifier = EmailNotifier::new(EmailConfig {
            smtp_host: "smtp.invalid".into(),
            smtp_port: 2525,
            from_address: "noreply@pms.local".into(),
            smtp_user: None,
            smtp_password: None,
        });
        assert!(notifier.is_enabled());
        assert!(notifier.send_approval(&contact(), 3, 500).await.is_ok());
    }
}
