//! Outbound notifications for the parking service.
//!
//! - [`delivery`] -- SMTP email transport.
//! - [`EmailNotifier`] -- the lifecycle's [`pms_core::notify::Notifier`],
//!   rendering approval and rejection messages and handing them to SMTP.

pub mod delivery;
pub mod notifier;

pub use delivery::email::{EmailConfig, EmailDelivery, EmailError};
pub use notifier::EmailNotifier;
