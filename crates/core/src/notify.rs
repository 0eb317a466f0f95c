//! Outcome notification contract.
//!
//! Notifications are sent after the lifecycle has committed. Implementations
//! may fail; the lifecycle logs the failure and carries on.

use std::future::Future;

use crate::parking::UserContact;
use crate::types::Amount;

#[derive(Debug, thiserror::Error)]
#[error("Notification failed: {0}")]
pub struct NotifyError(pub String);

/// Delivers parking request outcomes to the requester.
pub trait Notifier: Send + Sync {
    /// Tell the requester their request was approved.
    fn send_approval(
        &self,
        recipient: &UserContact,
        slot_number: i32,
        amount: Amount,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send;

    /// Tell the requester their request was rejected.
    fn send_rejection(
        &self,
        recipient: &UserContact,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send;
}
