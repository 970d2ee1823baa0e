//! Contact form validation
//!
//! Every rule is checked; violations accumulate instead of stopping at the
//! first one. Presence/shape rules look at the trimmed value, length caps
//! look at the raw value as submitted.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 100;
pub const EMAIL_MAX_CHARS: usize = 254;
pub const MESSAGE_MIN_CHARS: usize = 10;
pub const MESSAGE_MAX_CHARS: usize = 5000;

const NAME_REQUIRED: &str = "Name is required and must be at least 2 characters.";
const EMAIL_INVALID: &str = "A valid email address is required.";
const MESSAGE_REQUIRED: &str = "Message is required and must be at least 10 characters.";
const NAME_TOO_LONG: &str = "Name must not exceed 100 characters.";
const EMAIL_TOO_LONG: &str = "Email must not exceed 254 characters.";
const MESSAGE_TOO_LONG: &str = "Message must not exceed 5000 characters.";

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static email pattern"))
}

/// Raw request body for `POST /api/contacts`.
///
/// A field holding a non-string JSON value deserializes as `None`, so the
/// "required" rule reports it alongside every other violation instead of
/// the whole body being rejected at the first type error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ContactInput {
    #[serde(default, deserialize_with = "string_or_none")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "string_or_none")]
    pub email: Option<String>,

    #[serde(default, deserialize_with = "string_or_none")]
    pub message: Option<String>,
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

/// Normalized submission: trimmed, email lower-cased
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidContact {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// All violations found in one input, in rule order
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .0.join(" "))]
pub struct ValidationErrors(pub Vec<String>);

impl ValidationErrors {
    pub fn messages(&self) -> &[String] {
        &self.0
    }
}

/// Validate and normalize a submission. Pure.
pub fn validate(input: &ContactInput) -> Result<ValidContact, ValidationErrors> {
    let mut errors = Vec::new();

    let name = input.name.as_deref().map(str::trim);
    let email = input.email.as_deref().map(str::trim);
    let message = input.message.as_deref().map(str::trim);

    if !name.is_some_and(|n| char_len(n) >= NAME_MIN_CHARS) {
        errors.push(NAME_REQUIRED.to_string());
    }
    if !email.is_some_and(|e| email_pattern().is_match(e)) {
        errors.push(EMAIL_INVALID.to_string());
    }
    if !message.is_some_and(|m| char_len(m) >= MESSAGE_MIN_CHARS) {
        errors.push(MESSAGE_REQUIRED.to_string());
    }

    if exceeds(&input.name, NAME_MAX_CHARS) {
        errors.push(NAME_TOO_LONG.to_string());
    }
    if exceeds(&input.email, EMAIL_MAX_CHARS) {
        errors.push(EMAIL_TOO_LONG.to_string());
    }
    if exceeds(&input.message, MESSAGE_MAX_CHARS) {
        errors.push(MESSAGE_TOO_LONG.to_string());
    }

    match (name, email, message) {
        (Some(name), Some(email), Some(message)) if errors.is_empty() => Ok(ValidContact {
            name: name.to_string(),
            email: email.to_lowercase(),
            message: message.to_string(),
        }),
        _ => Err(ValidationErrors(errors)),
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn exceeds(raw: &Option<String>, max: usize) -> bool {
    raw.as_deref().is_some_and(|s| char_len(s) > max)
}
