//! Validation engine.
//!
//! A [`Validator`] is an ordered list of pure [`Rule`] objects for one subject
//! type. Every rule runs on every call; the result is the concatenation of all
//! violations, so callers always see the complete list rather than the first
//! failure. Rule sets are composed by concatenation, never by inheritance.
//!
//! Orchestrators call [`Validator::assert_valid`] before touching the
//! repository and fail with [`AuthnError::ValidationFailed`] on any violation.

pub mod rules;
pub mod validators;

use crate::config::RuleConfig;
use crate::errors::AuthnError;
use serde::Serialize;

pub use validators::{
    activation_validator, identity_validator, login_validator, registration_validator,
};

/// A single field-level rule violation.
///
/// `attempted_value` is `None` for secret fields (passwords, hashes, salts)
/// and for absent values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: String,
    pub message: String,
    pub attempted_value: Option<String>,
}

impl Violation {
    pub fn new(field: &str, message: impl Into<String>, attempted_value: Option<&str>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
            attempted_value: attempted_value.map(ToString::to_string),
        }
    }
}

/// A pure predicate over a subject and the shared thresholds.
pub trait Rule<T>: Send + Sync {
    fn check(&self, subject: &T, config: &RuleConfig) -> Vec<Violation>;
}

impl<T, F> Rule<T> for F
where
    F: Fn(&T, &RuleConfig) -> Vec<Violation> + Send + Sync,
{
    fn check(&self, subject: &T, config: &RuleConfig) -> Vec<Violation> {
        self(subject, config)
    }
}

/// Ordered rule set for one subject type.
pub struct Validator<T> {
    rules: Vec<Box<dyn Rule<T>>>,
}

impl<T> Default for Validator<T> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<T> Validator<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule.
    #[must_use]
    pub fn rule(mut self, rule: impl Rule<T> + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Append every rule of `other`, preserving order.
    #[must_use]
    pub fn then(mut self, other: Validator<T>) -> Self {
        self.rules.extend(other.rules);
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run every rule and collect all violations.
    pub fn validate(&self, subject: &T, config: &RuleConfig) -> Vec<Violation> {
        self.rules
            .iter()
            .flat_map(|rule| rule.check(subject, config))
            .collect()
    }

    /// Fail with `ValidationFailed` carrying the full list if any rule fails.
    pub fn assert_valid(&self, subject: &T, config: &RuleConfig) -> Result<(), AuthnError> {
        let violations = self.validate(subject, config);
        if violations.is_empty() {
            Ok(())
        } else {
            tracing::debug!(
                target: "authn.validation",
                violation_count = violations.len(),
                "Subject failed validation"
            );
            Err(AuthnError::ValidationFailed(violations))
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;

    struct Subject {
        a: i32,
        b: i32,
    }

    fn positive_a(subject: &Subject, _: &RuleConfig) -> Vec<Violation> {
        if subject.a > 0 {
            vec![]
        } else {
            vec![Violation::new("a", "a must be positive", None)]
        }
    }

    fn positive_b(subject: &Subject, _: &RuleConfig) -> Vec<Violation> {
        if subject.b > 0 {
            vec![]
        } else {
            vec![Violation::new("b", "b must be positive", None)]
        }
    }

    #[test]
    fn test_validate_collects_every_violation_in_order() {
        let validator = Validator::new().rule(positive_a).rule(positive_b);
        let violations = validator.validate(&Subject { a: 0, b: -1 }, &RuleConfig::default());

        let fields: Vec<_> = violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["a", "b"]);
    }

    #[test]
    fn test_then_concatenates_rule_sets() {
        let first = Validator::new().rule(positive_a);
        let second = Validator::new().rule(positive_b);
        let combined = first.then(second);

        assert_eq!(combined.len(), 2);
        let violations = combined.validate(&Subject { a: 1, b: 0 }, &RuleConfig::default());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "b");
    }

    #[test]
    fn test_assert_valid_carries_full_list() {
        let validator = Validator::new().rule(positive_a).rule(positive_b);
        let result = validator.assert_valid(&Subject { a: 0, b: 0 }, &RuleConfig::default());

        match result {
            Err(AuthnError::ValidationFailed(violations)) => assert_eq!(violations.len(), 2),
            other => panic!("Expected ValidationFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_assert_valid_passes_clean_subject() {
        let validator = Validator::new().rule(positive_a).rule(positive_b);
        assert!(validator
            .assert_valid(&Subject { a: 1, b: 1 }, &RuleConfig::default())
            .is_ok());
    }

    #[test]
    fn test_empty_validator_accepts_anything() {
        let validator: Validator<Subject> = Validator::new();
        assert!(validator.is_empty());
        assert!(validator
            .validate(&Subject { a: 0, b: 0 }, &RuleConfig::default())
            .is_empty());
    }
}
