use std::collections::HashMap;

use crate::error::ApiError;

/// Request payloads check their own field rules before reaching a service
pub trait Validate {
    fn validate(&self) -> Result<(), ApiError>;
}

/// Collects per-field failures; the first message recorded for a field wins
#[derive(Debug, Default)]
pub struct FieldErrors(HashMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_insert_with(|| message.into());
    }

    /// Character count within `min..=max`; `required` is the message for an empty value
    pub fn length(&mut self, field: &str, value: &str, min: usize, max: usize, required: &str) {
        let len = value.trim().chars().count();
        if len == 0 && min > 0 {
            self.add(field, required);
        } else if len < min {
            self.add(field, format!("Must be at least {} characters", min));
        } else if value.chars().count() > max {
            self.add(field, format!("Must be at most {} characters", max));
        }
    }

    pub fn optional_length(&mut self, field: &str, value: Option<&str>, min: usize, max: usize, required: &str) {
        if let Some(value) = value {
            self.length(field, value, min, max, required);
        }
    }

    pub fn min_chars(&mut self, field: &str, value: &str, min: usize, message: &str) {
        if value.chars().count() < min {
            self.add(field, message);
        }
    }

    pub fn email(&mut self, field: &str, value: &str) {
        if !is_plausible_email(value) {
            self.add(field, "Valid email is required");
        }
    }

    pub fn http_url(&mut self, field: &str, value: &str, message: &str) {
        let valid = url::Url::parse(value)
            .map(|u| matches!(u.scheme(), "http" | "https") && u.host().is_some())
            .unwrap_or(false);
        if !valid {
            self.add(field, message);
        }
    }

    pub fn hex_color(&mut self, field: &str, value: &str) {
        let valid = value.len() == 7
            && value.starts_with('#')
            && value[1..].chars().all(|c| c.is_ascii_hexdigit());
        if !valid {
            self.add(field, "Color must be a valid hex color");
        }
    }

    pub fn positive(&mut self, field: &str, value: Option<i32>) {
        if matches!(value, Some(v) if v <= 0) {
            self.add(field, "Must be a positive number");
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation_error("Validation failed", Some(self.0)))
        }
    }
}

fn is_plausible_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}
