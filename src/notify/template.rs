//! Admin notification rendering
//!
//! Plain text and HTML bodies carry the same three fields. The HTML body
//! embeds them verbatim, without entity escaping.

use crate::validation::ValidContact;

/// Subject and both bodies of one notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedNotification {
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Render the admin notification for a submission
pub fn render(contact: &ValidContact) -> RenderedNotification {
    RenderedNotification {
        subject: format!("New Contact Form Submission from {}", contact.name),
        text: plain_text(contact),
        html: html(contact),
    }
}

fn plain_text(contact: &ValidContact) -> String {
    [
        "New Contact Form Submission".to_string(),
        "==========================".to_string(),
        String::new(),
        format!("Name:    {}", contact.name),
        format!("Email:   {}", contact.email),
        format!("Message: {}", contact.message),
    ]
    .join("\n")
}

fn html(contact: &ValidContact) -> String {
    format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #333; border-bottom: 2px solid #4f46e5; padding-bottom: 10px;">
    New Contact Form Submission
  </h2>
  <table style="width: 100%; border-collapse: collapse;">
    <tr>
      <td style="padding: 8px; font-weight: bold; color: #555;">Name</td>
      <td style="padding: 8px;">{name}</td>
    </tr>
    <tr style="background: #f9fafb;">
      <td style="padding: 8px; font-weight: bold; color: #555;">Email</td>
      <td style="padding: 8px;"><a href="mailto:{email}">{email}</a></td>
    </tr>
    <tr>
      <td style="padding: 8px; font-weight: bold; color: #555; vertical-align: top;">Message</td>
      <td style="padding: 8px; white-space: pre-wrap;">{message}</td>
    </tr>
  </table>
</div>
"#,
        name = contact.name,
        email = contact.email,
        message = contact.message,
    )
}
