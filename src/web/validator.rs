use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;

pub const BLANK: &str = "This field cannot be blank";
pub const TOO_LONG: &str = "This field cannot be more than 255 characters long";
/// Upper bound of the `VARCHAR(255)` name and email columns.
pub const MAX_FIELD_CHARS: usize = 255;

/// Field-level and form-level errors collected while checking a submission.
#[derive(Debug, Default, Clone)]
pub struct Validator {
    pub field_errors: BTreeMap<&'static str, String>,
    pub non_field_errors: Vec<String>,
}

impl Validator {
    pub fn valid(&self) -> bool {
        self.field_errors.is_empty() && self.non_field_errors.is_empty()
    }

    /// Keeps the first message recorded for `key`.
    pub fn add_field_error(&mut self, key: &'static str, message: impl Into<String>) {
        self.field_errors.entry(key).or_insert_with(|| message.into());
    }

    pub fn add_non_field_error(&mut self, message: impl Into<String>) {
        self.non_field_errors.push(message.into());
    }

    pub fn check_field(&mut self, ok: bool, key: &'static str, message: &str) {
        if !ok {
            self.add_field_error(key, message);
        }
    }

    pub fn field_error(&self, key: &str) -> Option<&str> {
        self.field_errors.get(key).map(String::as_str)
    }
}

pub fn not_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

pub fn min_chars(value: &str, n: usize) -> bool {
    value.chars().count() >= n
}

pub fn max_chars(value: &str, n: usize) -> bool {
    value.chars().count() <= n
}

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
