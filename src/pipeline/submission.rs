//! Submission pipeline
//!
//! ```text
//! Received ──validate──▶ Validated ──store.create──▶ Persisted ──▶ Responded
//!                                                       │
//!                                                       └─▶ notify (detached)
//! ```
//!
//! The notification branch starts only after the row is persisted and has
//! no path back into the response. Its errors and panics are caught and
//! logged inside the spawned task.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::notify::SharedNotifier;
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::storage::{ContactStore, ContactSubmission, NewContact};
use crate::validation::{validate, ContactInput, ValidContact};

use super::errors::{PipelineError, PipelineResult};

/// Validates, persists and announces contact submissions
#[derive(Clone)]
pub struct SubmissionPipeline {
    store: ContactStore,
    notifier: SharedNotifier,
    metrics: Arc<MetricsRegistry>,
}

impl SubmissionPipeline {
    pub fn new(store: ContactStore, notifier: SharedNotifier, metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            store,
            notifier,
            metrics,
        }
    }

    /// Accept one submission.
    ///
    /// Returns as soon as the row is written. The admin notification is
    /// still in flight (or already failed) when this returns.
    pub async fn submit(
        &self,
        input: &ContactInput,
        ip_address: Option<String>,
    ) -> PipelineResult<ContactSubmission> {
        let contact = validate(input).map_err(|violations| {
            self.metrics.increment_validation_failures();
            log_event_with_fields(
                Event::ValidationRejected,
                &[("violations", violations.messages().len().to_string().as_str())],
            );
            PipelineError::Invalid(violations)
        })?;

        let record = self
            .store
            .create(NewContact {
                name: contact.name.clone(),
                email: contact.email.clone(),
                message: contact.message.clone(),
                ip_address,
            })
            .await?;

        self.metrics.increment_contacts_created();
        log_event_with_fields(Event::ContactCreated, &[("id", record.id.to_string().as_str())]);

        // Dropping the handle detaches the task.
        drop(self.dispatch_notification(contact));

        Ok(record)
    }

    /// Run the notifier on the blocking pool inside a detached task.
    ///
    /// The task always completes normally: delivery errors and notifier
    /// panics are logged and counted, never propagated.
    fn dispatch_notification(&self, contact: ValidContact) -> JoinHandle<()> {
        let notifier = Arc::clone(&self.notifier);
        let metrics = Arc::clone(&self.metrics);

        tokio::spawn(async move {
            let email = contact.email.clone();
            let outcome = tokio::task::spawn_blocking(move || notifier.notify(&contact)).await;

            match outcome {
                Ok(Ok(delivery)) => {
                    metrics.increment_notifications_sent();
                    let preview = delivery.preview_url.unwrap_or_default();
                    log_event_with_fields(
                        Event::NotificationSent,
                        &[
                            ("message_id", delivery.message_id.as_str()),
                            ("preview_url", preview.as_str()),
                            ("submitter", email.as_str()),
                        ],
                    );
                }
                Ok(Err(err)) => {
                    metrics.increment_notifications_failed();
                    log_event_with_fields(
                        Event::NotificationFailed,
                        &[("reason", err.to_string().as_str()), ("submitter", email.as_str())],
                    );
                }
                Err(join_err) => {
                    metrics.increment_notifications_failed();
                    log_event_with_fields(
                        Event::NotificationFailed,
                        &[("reason", join_err.to_string().as_str()), ("submitter", email.as_str())],
                    );
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{Delivery, MemoryNotifier, Notifier, NotifyResult};

    struct PanickingNotifier;

    impl Notifier for PanickingNotifier {
        fn notify(&self, _contact: &ValidContact) -> NotifyResult<Delivery> {
            panic!("transport exploded");
        }
    }

    fn input() -> ContactInput {
        ContactInput {
            name: Some(" John Doe ".into()),
            email: Some("JOHN@Example.com ".into()),
            message: Some("Hello, I want info.".into()),
        }
    }

    fn build(notifier: SharedNotifier) -> (SubmissionPipeline, Arc<MetricsRegistry>) {
        let metrics = Arc::new(MetricsRegistry::new());
        let store = ContactStore::open_in_memory().unwrap();
        (SubmissionPipeline::new(store, notifier, Arc::clone(&metrics)), metrics)
    }

    fn valid() -> ValidContact {
        validate(&input()).unwrap()
    }

    #[tokio::test]
    async fn test_submit_persists_normalized_fields() {
        let (pipeline, metrics) = build(Arc::new(MemoryNotifier::new()));

        let record = pipeline
            .submit(&input(), Some("10.0.0.1".into()))
            .await
            .unwrap();

        assert_eq!(record.name, "John Doe");
        assert_eq!(record.email, "john@example.com");
        assert_eq!(record.message, "Hello, I want info.");
        assert_eq!(record.ip_address.as_deref(), Some("10.0.0.1"));
        assert_eq!(metrics.snapshot().contacts_created, 1);
    }

    #[tokio::test]
    async fn test_invalid_submission_never_reaches_store() {
        let (pipeline, metrics) = build(Arc::new(MemoryNotifier::new()));
        let bad = ContactInput {
            name: Some("a".into()),
            email: Some("bad".into()),
            message: Some("short".into()),
        };

        let err = pipeline.submit(&bad, None).await.unwrap_err();
        match err {
            PipelineError::Invalid(violations) => assert_eq!(violations.messages().len(), 3),
            other => panic!("expected validation error, got {:?}", other),
        }
        assert_eq!(pipeline.store.count().await.unwrap(), 0);
        assert_eq!(metrics.snapshot().validation_failures, 1);
    }

    #[tokio::test]
    async fn test_notification_receives_normalized_contact() {
        let notifier = Arc::new(MemoryNotifier::new());
        let (pipeline, metrics) = build(notifier.clone());

        pipeline.dispatch_notification(valid()).await.unwrap();

        assert_eq!(notifier.sent(), vec![valid()]);
        assert_eq!(metrics.snapshot().notifications_sent, 1);
    }

    #[tokio::test]
    async fn test_failed_notification_is_contained() {
        let (pipeline, metrics) = build(Arc::new(MemoryNotifier::failing("smtp down")));

        // The detached task finishes normally even though delivery failed.
        pipeline.dispatch_notification(valid()).await.unwrap();
        assert_eq!(metrics.snapshot().notifications_failed, 1);
    }

    #[tokio::test]
    async fn test_panicking_notifier_is_contained() {
        let (pipeline, metrics) = build(Arc::new(PanickingNotifier));

        pipeline.dispatch_notification(valid()).await.unwrap();
        assert_eq!(metrics.snapshot().notifications_failed, 1);
    }

    #[tokio::test]
    async fn test_submit_succeeds_when_notifier_fails() {
        let (pipeline, _) = build(Arc::new(MemoryNotifier::failing("smtp down")));

        let record = pipeline.submit(&input(), None).await.unwrap();
        let found = pipeline.store.find_by_id(record.id).await.unwrap();
        assert_eq!(found, Some(record));
    }
}
