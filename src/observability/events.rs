//! Observable events
//!
//! Every log line the service writes names one of these events.

use std::fmt;

use super::logger::Severity;

/// Observable events in the contact service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Boot & lifecycle
    /// Startup begins
    BootStart,
    /// Configuration loaded and validated
    ConfigLoaded,
    /// Contact store opened and schema ensured
    StoreOpened,
    /// Listener bound, ready for requests
    Serving,
    /// Shutdown initiated
    ShutdownStart,
    /// Shutdown complete, store released
    ShutdownComplete,

    // Submissions
    /// A submission was persisted
    ContactCreated,
    /// A submission was deleted
    ContactDeleted,
    /// A submission failed validation
    ValidationRejected,
    /// The admission gate turned a request away
    AdmissionRejected,

    // Notifications
    /// Admin notification delivered to the transport
    NotificationSent,
    /// Admin notification failed (never surfaced to the client)
    NotificationFailed,
    /// No SMTP credentials, messages go to the local outbox
    MailSandboxEnabled,

    // Requests
    /// Unclassified failure rendered as a 500
    RequestFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "CONTACTD_STARTUP_BEGIN",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::StoreOpened => "STORE_OPENED",
            Event::Serving => "CONTACTD_SERVING",
            Event::ShutdownStart => "SHUTDOWN_START",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",

            Event::ContactCreated => "CONTACT_CREATED",
            Event::ContactDeleted => "CONTACT_DELETED",
            Event::ValidationRejected => "VALIDATION_REJECTED",
            Event::AdmissionRejected => "ADMISSION_REJECTED",

            Event::NotificationSent => "NOTIFICATION_SENT",
            Event::NotificationFailed => "NOTIFICATION_FAILED",
            Event::MailSandboxEnabled => "MAIL_SANDBOX_ENABLED",

            Event::RequestFailed => "REQUEST_FAILED",
        }
    }

    /// Severity this event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::ValidationRejected | Event::AdmissionRejected | Event::MailSandboxEnabled => {
                Severity::Warn
            }
            Event::NotificationFailed | Event::RequestFailed => Severity::Error,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
