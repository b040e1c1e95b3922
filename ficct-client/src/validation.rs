//! Client-side form validation
//!
//! Checks that run before a request is built. A failing form never reaches
//! the network; the caller gets a local failure envelope instead.

use crate::envelope::{ApiResponse, FieldErrors};
use regex::Regex;
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Accumulates field errors
#[derive(Debug, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, field: &str, message: String) {
        self.errors.entry(field.to_string()).or_default().push(message);
    }

    pub fn required(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.push(field, format!("{} is required", field));
        }
        self
    }

    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        if !value.trim().is_empty() && !EMAIL_RE.is_match(value.trim()) {
            self.push(field, format!("{} must be a valid email address", field));
        }
        self
    }

    pub fn range(&mut self, field: &str, value: i64, min: i64, max: i64) -> &mut Self {
        if value < min || value > max {
            self.push(field, format!("{} must be between {} and {}", field, min, max));
        }
        self
    }

    pub fn max_len(&mut self, field: &str, value: &str, max: usize) -> &mut Self {
        if value.chars().count() > max {
            self.push(field, format!("{} must be at most {} characters", field, max));
        }
        self
    }

    /// `end` must not come before `start`
    pub fn not_before<T: PartialOrd>(&mut self, field: &str, start: T, end: T) -> &mut Self {
        if end < start {
            self.push(field, format!("{} must not be before the start", field));
        }
        self
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// `Err` carries the envelope to hand back instead of sending a request
    pub fn finish<T>(self) -> Result<(), ApiResponse<T>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiResponse::validation_failed(self.errors))
        }
    }
}

/// Forms that can check themselves before submission
pub trait Validate {
    fn validate(&self) -> Validator;
}
