//! Boundary validation for contact details.

use thiserror::Error;

use crate::model::Contact;

const MIN_PHONE_DIGITS: usize = 7;
const MAX_PHONE_DIGITS: usize = 15;

/// Why a contact record was rejected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContactError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),

    #[error("'{0}' is not a valid phone number")]
    InvalidPhone(String),
}

/// Check a contact record against simple format rules.
///
/// Returns the first problem found, checking name, then email, then phone.
pub fn validate_contact(contact: &Contact) -> Result<(), ContactError> {
    if contact.name.trim().is_empty() {
        return Err(ContactError::EmptyName);
    }
    if !is_valid_email(contact.email.trim()) {
        return Err(ContactError::InvalidEmail(contact.email.clone()));
    }
    if !is_valid_phone(contact.phone.trim()) {
        return Err(ContactError::InvalidPhone(contact.phone.clone()));
    }
    Ok(())
}

fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    // Dotted domain with no empty labels: "example.com", not ".com" or "a..b".
    domain.contains('.') && domain.split('.').all(|label| !label.is_empty())
}

fn is_valid_phone(phone: &str) -> bool {
    let body = phone.strip_prefix('+').unwrap_or(phone);
    let mut digits = 0;
    for c in body.chars() {
        match c {
            '0'..='9' => digits += 1,
            ' ' | '-' | '.' | '(' | ')' => {}
            _ => return false,
        }
    }
    (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits)
}
