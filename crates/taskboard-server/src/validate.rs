//! Typed request-body validation.
//!
//! Each body struct reports every violated constraint at once; the
//! collected messages surface as a 400 with a `details` array.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::AppError;

pub trait Validate {
    /// Append one message per violated constraint.
    fn check(&self, details: &mut Vec<String>);

    fn validate(&self) -> Result<(), AppError> {
        let mut details = Vec::new();
        self.check(&mut details);
        if details.is_empty() {
            Ok(())
        } else {
            Err(AppError::validation(details))
        }
    }
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("infallible: pattern is valid")
    })
}

pub fn email(details: &mut Vec<String>, value: &str) {
    if !email_re().is_match(value) {
        details.push("email must be a valid email address".to_string());
    }
}

/// Non-empty (after trimming) and at most `max` characters.
pub fn length(details: &mut Vec<String>, field: &str, value: &str, max: usize) {
    if value.trim().is_empty() {
        details.push(format!("{field} is required"));
    } else if value.chars().count() > max {
        details.push(format!("{field} must be at most {max} characters"));
    }
}

pub fn min_length(details: &mut Vec<String>, field: &str, value: &str, min: usize) {
    if value.chars().count() < min {
        details.push(format!("{field} must be at least {min} characters"));
    }
}

pub fn optional_max(details: &mut Vec<String>, field: &str, value: Option<&str>, max: usize) {
    if let Some(v) = value {
        if v.chars().count() > max {
            details.push(format!("{field} must be at most {max} characters"));
        }
    }
}

pub fn non_negative(details: &mut Vec<String>, field: &str, value: i64) {
    if value < 0 {
        details.push(format!("{field} must be a non-negative integer"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sample {
        name: String,
        position: i64,
    }

    impl Validate for Sample {
        fn check(&self, details: &mut Vec<String>) {
            length(details, "name", &self.name, 10);
            non_negative(details, "position", self.position);
        }
    }

    #[test]
    fn all_violations_reported_together() {
        let bad = Sample {
            name: "   ".into(),
            position: -1,
        };
        let mut details = Vec::new();
        bad.check(&mut details);
        assert_eq!(details.len(), 2);
        assert!(details[0].contains("name is required"));
        assert!(details[1].contains("position"));
    }

    #[test]
    fn valid_body_passes() {
        let ok = Sample {
            name: "Backlog".into(),
            position: 0,
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn email_shapes() {
        let mut details = Vec::new();
        email(&mut details, "a@example.com");
        assert!(details.is_empty());

        email(&mut details, "not-an-email");
        email(&mut details, "a b@example.com");
        assert_eq!(details.len(), 2);
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let mut details = Vec::new();
        length(&mut details, "name", &"é".repeat(10), 10);
        assert!(details.is_empty());
    }
}
