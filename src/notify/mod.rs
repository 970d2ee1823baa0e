//! Admin notifications
//!
//! A [`Notifier`] delivers one message per accepted submission to the
//! administrator. Delivery is best effort: the submission pipeline runs it
//! detached from the request and only logs the outcome.

mod errors;
mod mailer;
mod memory;
pub mod template;

use std::sync::Arc;

pub use errors::{NotifyError, NotifyResult};
pub use mailer::{MailNotifier, MailTransportConfig, SmtpSettings};
pub use memory::MemoryNotifier;

use crate::validation::ValidContact;

/// Outcome of a successful delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// `Message-ID` header of the sent message
    pub message_id: String,
    /// Where a sandbox copy can be inspected, if any
    pub preview_url: Option<String>,
}

/// Delivers admin notifications.
///
/// Implementations may block (SMTP round trips); callers run them on the
/// blocking pool.
pub trait Notifier: Send + Sync {
    fn notify(&self, contact: &ValidContact) -> NotifyResult<Delivery>;
}

/// Shared notifier handle
pub type SharedNotifier = Arc<dyn Notifier>;
