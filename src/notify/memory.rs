//! In-process notifier
//!
//! Records notifications instead of sending them, or fails every call on
//! request. Used to exercise the pipeline without a mail server.

use std::sync::RwLock;

use crate::validation::ValidContact;

use super::errors::{NotifyError, NotifyResult};
use super::{Delivery, Notifier};

/// Notifier that keeps every delivered submission in memory
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    sent: RwLock<Vec<ValidContact>>,
    failure: Option<String>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose every call fails with `reason`
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            sent: RwLock::new(Vec::new()),
            failure: Some(reason.into()),
        }
    }

    /// Number of recorded notifications
    pub fn sent_count(&self) -> usize {
        self.sent.read().map(|sent| sent.len()).unwrap_or(0)
    }

    /// Copy of the recorded notifications, oldest first
    pub fn sent(&self) -> Vec<ValidContact> {
        self.sent.read().map(|sent| sent.clone()).unwrap_or_default()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, contact: &ValidContact) -> NotifyResult<Delivery> {
        if let Some(reason) = &self.failure {
            return Err(NotifyError::Rejected(reason.clone()));
        }

        let mut sent = self
            .sent
            .write()
            .map_err(|_| NotifyError::Rejected("memory notifier lock poisoned".into()))?;
        sent.push(contact.clone());

        Ok(Delivery {
            message_id: format!("<memory-{}@localhost>", sent.len()),
            preview_url: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact() -> ValidContact {
        ValidContact {
            name: "Test".into(),
            email: "test@example.com".into(),
            message: "Hello from the test suite".into(),
        }
    }

    #[test]
    fn test_records_notifications() {
        let notifier = MemoryNotifier::new();
        let first = notifier.notify(&contact()).unwrap();
        let second = notifier.notify(&contact()).unwrap();

        assert_eq!(notifier.sent_count(), 2);
        assert_ne!(first.message_id, second.message_id);
        assert_eq!(notifier.sent()[0], contact());
    }

    #[test]
    fn test_failing_notifier_records_nothing() {
        let notifier = MemoryNotifier::failing("transport unreachable");
        let err = notifier.notify(&contact()).unwrap_err();

        assert!(err.to_string().contains("transport unreachable"));
        assert_eq!(notifier.sent_count(), 0);
    }
}
