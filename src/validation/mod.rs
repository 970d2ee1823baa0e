//! Input validation for contact submissions
//!
//! Turns an untrusted request body into a normalized [`ValidContact`] or
//! the full list of rule violations.

mod validator;

pub use validator::{
    validate, ContactInput, ValidContact, ValidationErrors, EMAIL_MAX_CHARS, MESSAGE_MAX_CHARS,
    MESSAGE_MIN_CHARS, NAME_MAX_CHARS, NAME_MIN_CHARS,
};
