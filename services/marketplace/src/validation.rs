//! Input validation utilities
//!
//! Each `validate_*` function checks one value and returns a human readable
//! message on failure. Request payloads implement [`Validate`] by feeding
//! those checks into a [`FieldErrors`] collector, so a rejected request
//! reports every offending field at once.

use chrono::{DateTime, Datelike, NaiveTime, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::OnceLock;

/// Largest magnitude a `NUMERIC(10, 2)` column can hold
fn max_money() -> Decimal {
    Decimal::new(9_999_999_999, 2)
}

/// A single rejected field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Collects field errors while a payload is being checked
#[derive(Debug, Default)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one check against `field`
    pub fn check(&mut self, field: &str, result: Result<(), String>) -> &mut Self {
        if let Err(message) = result {
            self.0.push(FieldError::new(field, message));
        }
        self
    }

    /// Like [`FieldErrors::check`] but skips absent optional values
    pub fn check_opt<T: ?Sized>(
        &mut self,
        field: &str,
        value: Option<&T>,
        check: impl FnOnce(&T) -> Result<(), String>,
    ) -> &mut Self {
        if let Some(value) = value {
            self.check(field, check(value));
        }
        self
    }

    pub fn finish(self) -> Result<(), Vec<FieldError>> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self.0)
        }
    }
}

/// Implemented by every request payload accepted over HTTP
pub trait Validate {
    fn validate(&self) -> Result<(), Vec<FieldError>>;
}

/// Validate a required, bounded piece of text (names, titles)
pub fn validate_required_text(value: &str, max_len: usize) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err("This field is required".to_string());
    }

    validate_text_length(value, max_len)
}

/// Validate the length of free text
pub fn validate_text_length(value: &str, max_len: usize) -> Result<(), String> {
    if value.chars().count() > max_len {
        return Err(format!("Must be at most {} characters long", max_len));
    }

    Ok(())
}

/// Validate a mobile number: optional leading `+`, then 7 to 15 digits
pub fn validate_mobile(mobile: &str) -> Result<(), String> {
    if mobile.is_empty() {
        return Err("Mobile number is required".to_string());
    }

    static MOBILE_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = MOBILE_REGEX
        .get_or_init(|| Regex::new(r"^\+?[0-9]{7,15}$").expect("Failed to compile mobile regex"));

    if !regex.is_match(mobile) {
        return Err("Mobile number must contain 7 to 15 digits".to_string());
    }

    Ok(())
}

/// Validate a new password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.len() < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }

    if password.len() > 128 {
        return Err("Password must be at most 128 characters long".to_string());
    }

    let has_letter = password.chars().any(|c| c.is_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if !has_letter {
        return Err("Password must contain at least one letter".to_string());
    }

    if !has_digit {
        return Err("Password must contain at least one digit".to_string());
    }

    Ok(())
}

/// Validate the shape of a submitted one-time passcode
pub fn validate_otp_code(code: &str) -> Result<(), String> {
    if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err("OTP must be exactly 6 digits".to_string());
    }

    Ok(())
}

/// Validate an email address
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate a public page slug
pub fn validate_custom_url(slug: &str) -> Result<(), String> {
    static SLUG_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = SLUG_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9_-]{0,63}$").expect("Failed to compile slug regex")
    });

    if !regex.is_match(slug) {
        return Err(
            "Custom URL may only contain letters, numbers, '-' and '_' (max 64)".to_string(),
        );
    }

    Ok(())
}

/// Validate an amount destined for a `NUMERIC(10, 2)` column
pub fn validate_money(amount: &Decimal) -> Result<(), String> {
    if amount.normalize().scale() > 2 {
        return Err("Amount must have at most 2 decimal places".to_string());
    }

    if amount.abs() > max_money() {
        return Err("Amount is out of range".to_string());
    }

    Ok(())
}

/// Validate a session length in minutes
pub fn validate_session_minutes(minutes: i32) -> Result<(), String> {
    if !(1..=1440).contains(&minutes) {
        return Err("Duration must be between 1 and 1440 minutes".to_string());
    }

    Ok(())
}

/// Validate a session start; four-digit years only
pub fn validate_scheduled_at(start: &DateTime<Utc>) -> Result<(), String> {
    if !(1970..=9999).contains(&start.year()) {
        return Err("Scheduled time must fall between the years 1970 and 9999".to_string());
    }

    Ok(())
}

/// Validate a day of week, 0 = Sunday
pub fn validate_day_of_week(day: i32) -> Result<(), String> {
    if !(0..=6).contains(&day) {
        return Err("Day of week must be between 0 (Sunday) and 6 (Saturday)".to_string());
    }

    Ok(())
}

/// Validate a wall-clock time written as `HH:mm`
pub fn validate_time_of_day(value: &str) -> Result<(), String> {
    if value.len() != 5 || NaiveTime::parse_from_str(value, "%H:%M").is_err() {
        return Err("Time must use the HH:mm format".to_string());
    }

    Ok(())
}

/// Validate an IANA-style timezone label
pub fn validate_timezone(value: &str) -> Result<(), String> {
    static TZ_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = TZ_REGEX.get_or_init(|| {
        Regex::new(r"^[A-Za-z_]+(/[A-Za-z0-9_+-]+)*$").expect("Failed to compile timezone regex")
    });

    if value.len() > 64 || !regex.is_match(value) {
        return Err("Invalid timezone".to_string());
    }

    Ok(())
}
