//! Field-level validation helpers.
//!
//! Validators return the message that goes into the 400 response body for
//! the offending field, so handlers can collect them per field name.

use once_cell::sync::Lazy;
use regex::Regex;

static USERNAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w.@+-]+$").unwrap());
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

/// Message for image uploads that fail to decode.
pub const INVALID_IMAGE_MESSAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

/// Unwrap a required string field, rejecting missing and blank values.
pub fn required(value: &Option<String>) -> Result<&str, String> {
    match value.as_deref() {
        None => Err("This field is required.".to_string()),
        Some(v) if v.trim().is_empty() => Err("This field may not be blank.".to_string()),
        Some(v) => Ok(v),
    }
}

/// Character-counted length limit.
pub fn max_length(value: &str, max: usize) -> Result<(), String> {
    if value.chars().count() > max {
        Err(format!(
            "Ensure this field has no more than {} characters.",
            max
        ))
    } else {
        Ok(())
    }
}

/// Usernames allow word characters plus `.@+-`, up to 150 characters.
pub fn validate_username(value: &str) -> Result<(), String> {
    max_length(value, 150)?;
    if !USERNAME_RE.is_match(value) {
        return Err(
            "Enter a valid username. This value may contain only letters, numbers, \
             and @/./+/-/_ characters."
                .to_string(),
        );
    }
    Ok(())
}

pub fn validate_email(value: &str) -> Result<(), String> {
    max_length(value, 254)?;
    if !EMAIL_RE.is_match(value) {
        return Err("Enter a valid email address.".to_string());
    }
    Ok(())
}

/// Minimal password policy: at least 8 characters, not entirely numeric.
pub fn validate_password(value: &str) -> Result<(), String> {
    if value.chars().count() < 8 {
        return Err(
            "This password is too short. It must contain at least 8 characters.".to_string(),
        );
    }
    if value.chars().all(|c| c.is_ascii_digit()) {
        return Err("This password is entirely numeric.".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_missing_and_blank() {
        assert!(required(&None).is_err());
        assert!(required(&Some("   ".to_string())).is_err());
        assert_eq!(required(&Some("ok".to_string())).unwrap(), "ok");
    }

    #[test]
    fn username_charset() {
        assert!(validate_username("chef.master_2024").is_ok());
        assert!(validate_username("has space").is_err());
        assert!(validate_username(&"x".repeat(151)).is_err());
    }

    #[test]
    fn email_shape() {
        assert!(validate_email("cook@example.com").is_ok());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("two@@example.com").is_err());
    }

    #[test]
    fn password_policy() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("12345678").is_err());
        assert!(validate_password("garlic-and-thyme").is_ok());
    }
}
