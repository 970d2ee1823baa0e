//! Email delivery of admin notifications
//!
//! The transport is picked once, at construction, from configuration:
//! SMTP when credentials are configured, otherwise a sandbox that writes
//! each message as an `.eml` file into a local outbox.

use std::fs;
use std::path::{Path, PathBuf};

use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{FileTransport, Message, SmtpTransport, Transport};
use uuid::Uuid;

use crate::config::MailConfig;
use crate::observability::{log_event_with_fields, Event};
use crate::validation::ValidContact;

use super::errors::{NotifyError, NotifyResult};
use super::template;
use super::{Delivery, Notifier};

/// SMTP relay settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    /// Implicit TLS when true, STARTTLS otherwise
    pub secure: bool,
    pub user: String,
    pub password: String,
}

/// Which transport delivers notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailTransportConfig {
    /// Real SMTP relay with credentials
    Configured(SmtpSettings),
    /// Local outbox directory, for development
    Sandbox { outbox_dir: PathBuf },
}

impl MailTransportConfig {
    /// `Sandbox` when no SMTP user is configured
    pub fn from_config(config: &MailConfig) -> Self {
        if config.smtp_user.is_empty() {
            MailTransportConfig::Sandbox {
                outbox_dir: config.sandbox_dir.clone(),
            }
        } else {
            MailTransportConfig::Configured(SmtpSettings {
                host: config.smtp_host.clone(),
                port: config.smtp_port,
                secure: config.smtp_secure,
                user: config.smtp_user.clone(),
                password: config.smtp_password.clone(),
            })
        }
    }
}

enum MailTransport {
    Smtp(SmtpTransport),
    Sandbox {
        transport: FileTransport,
        outbox_dir: PathBuf,
    },
}

/// Sends the admin notification by email
pub struct MailNotifier {
    from: Mailbox,
    admin: Mailbox,
    transport: MailTransport,
}

impl MailNotifier {
    /// Build the notifier and its transport
    pub fn new(from: &str, admin: &str, transport: MailTransportConfig) -> NotifyResult<Self> {
        let from = parse_mailbox(from)?;
        let admin = parse_mailbox(admin)?;

        let transport = match transport {
            MailTransportConfig::Configured(settings) => {
                MailTransport::Smtp(build_smtp(&settings)?)
            }
            MailTransportConfig::Sandbox { outbox_dir } => {
                fs::create_dir_all(&outbox_dir).map_err(|source| NotifyError::OutboxDir {
                    path: outbox_dir.clone(),
                    source,
                })?;
                let outbox_dir = fs::canonicalize(&outbox_dir).unwrap_or(outbox_dir);
                log_event_with_fields(
                    Event::MailSandboxEnabled,
                    &[("outbox", outbox_dir.display().to_string().as_str())],
                );
                MailTransport::Sandbox {
                    transport: FileTransport::new(&outbox_dir),
                    outbox_dir,
                }
            }
        };

        Ok(Self {
            from,
            admin,
            transport,
        })
    }

    /// Build from the `mail` configuration section
    pub fn from_config(config: &MailConfig) -> NotifyResult<Self> {
        Self::new(
            &config.from,
            &config.admin_email,
            MailTransportConfig::from_config(config),
        )
    }

    /// True when messages go to the local outbox
    pub fn is_sandbox(&self) -> bool {
        matches!(self.transport, MailTransport::Sandbox { .. })
    }

    fn build_message(&self, contact: &ValidContact, message_id: &str) -> NotifyResult<Message> {
        let rendered = template::render(contact);
        Ok(Message::builder()
            .from(self.from.clone())
            .to(self.admin.clone())
            .subject(rendered.subject)
            .message_id(Some(message_id.to_string()))
            .multipart(MultiPart::alternative_plain_html(rendered.text, rendered.html))?)
    }
}

impl Notifier for MailNotifier {
    fn notify(&self, contact: &ValidContact) -> NotifyResult<Delivery> {
        let message_id = format!("<{}@{}>", Uuid::new_v4(), self.from.email.domain());
        let message = self.build_message(contact, &message_id)?;

        match &self.transport {
            MailTransport::Smtp(transport) => {
                transport.send(&message)?;
                Ok(Delivery {
                    message_id,
                    preview_url: None,
                })
            }
            MailTransport::Sandbox {
                transport,
                outbox_dir,
            } => {
                let file_id = transport.send(&message)?;
                Ok(Delivery {
                    message_id,
                    preview_url: Some(preview_url(outbox_dir, &file_id)),
                })
            }
        }
    }
}

fn parse_mailbox(address: &str) -> NotifyResult<Mailbox> {
    address.parse().map_err(|source| NotifyError::Address {
        address: address.to_string(),
        source,
    })
}

fn build_smtp(settings: &SmtpSettings) -> NotifyResult<SmtpTransport> {
    let builder = if settings.secure {
        SmtpTransport::relay(&settings.host)?
    } else {
        SmtpTransport::starttls_relay(&settings.host)?
    };

    Ok(builder
        .port(settings.port)
        .credentials(Credentials::new(
            settings.user.clone(),
            settings.password.clone(),
        ))
        .build())
}

fn preview_url(outbox_dir: &Path, file_id: &str) -> String {
    format!("file://{}", outbox_dir.join(format!("{file_id}.eml")).display())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn contact() -> ValidContact {
        ValidContact {
            name: "Grace Hopper".into(),
            email: "grace@example.com".into(),
            message: "Please call me back about COBOL.".into(),
        }
    }

    #[test]
    fn test_transport_selection_follows_credentials() {
        let mut config = MailConfig::default();
        assert!(matches!(
            MailTransportConfig::from_config(&config),
            MailTransportConfig::Sandbox { .. }
        ));

        config.smtp_user = "mailer".into();
        config.smtp_password = "secret".into();
        config.smtp_host = "smtp.example.com".into();
        match MailTransportConfig::from_config(&config) {
            MailTransportConfig::Configured(settings) => {
                assert_eq!(settings.host, "smtp.example.com");
                assert_eq!(settings.user, "mailer");
                assert_eq!(settings.port, 587);
            }
            other => panic!("expected SMTP transport, got {:?}", other),
        }
    }

    #[test]
    fn test_sandbox_writes_eml_to_outbox() {
        let dir = TempDir::new().unwrap();
        let notifier = MailNotifier::new(
            "noreply@contactform.local",
            "admin@contactform.local",
            MailTransportConfig::Sandbox {
                outbox_dir: dir.path().join("outbox"),
            },
        )
        .unwrap();
        assert!(notifier.is_sandbox());

        let delivery = notifier.notify(&contact()).unwrap();
        assert!(delivery.message_id.ends_with("@contactform.local>"));

        let preview = delivery.preview_url.expect("sandbox returns a preview");
        let path = preview.strip_prefix("file://").unwrap();
        let eml = fs::read_to_string(path).unwrap();
        assert!(eml.contains("Subject: New Contact Form Submission from Grace Hopper"));
        assert!(eml.contains("admin@contactform.local"));
        assert!(eml.contains("multipart/alternative"));
    }

    #[test]
    fn test_invalid_admin_address_is_rejected() {
        let dir = TempDir::new().unwrap();
        let result = MailNotifier::new(
            "noreply@contactform.local",
            "not an address",
            MailTransportConfig::Sandbox {
                outbox_dir: dir.path().to_path_buf(),
            },
        );
        assert!(matches!(result, Err(NotifyError::Address { .. })));
    }

    #[test]
    fn test_smtp_notifier_builds_without_connecting() {
        let notifier = MailNotifier::new(
            "noreply@contactform.local",
            "admin@contactform.local",
            MailTransportConfig::Configured(SmtpSettings {
                host: "smtp.example.com".into(),
                port: 2525,
                secure: false,
                user: "u".into(),
                password: "p".into(),
            }),
        )
        .unwrap();
        assert!(!notifier.is_sandbox());
    }
}
