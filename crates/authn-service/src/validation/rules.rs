//! Reusable field rules.
//!
//! Each rule names a field, knows how to read it from the subject, and reports
//! zero or more violations. Absent optional fields are skipped by every rule
//! except [`NotBlank`] and [`ExactlyOne`], which exist to report absence.

use super::{Rule, Violation};
use crate::config::RuleConfig;
use uuid::Uuid;

/// Reads a string field; `None` means absent.
pub type TextFn<T> = fn(&T) -> Option<&str>;

/// Reads a threshold from the shared configuration.
pub type BoundFn = fn(&RuleConfig) -> usize;

/// A named text field.
pub struct Field<T> {
    pub name: &'static str,
    pub label: &'static str,
    pub get: TextFn<T>,
    /// Secret fields never echo their value back in a violation.
    pub secret: bool,
}

impl<T> Field<T> {
    pub fn new(name: &'static str, label: &'static str, get: TextFn<T>) -> Self {
        Self {
            name,
            label,
            get,
            secret: false,
        }
    }

    pub fn secret(name: &'static str, label: &'static str, get: TextFn<T>) -> Self {
        Self {
            name,
            label,
            get,
            secret: true,
        }
    }

    fn violation(&self, message: String, value: Option<&str>) -> Violation {
        let attempted = if self.secret { None } else { value };
        Violation::new(self.name, message, attempted)
    }
}

impl<T> Clone for Field<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Field<T> {}

/// Field must be present and not whitespace-only.
pub struct NotBlank<T>(pub Field<T>);

impl<T> Rule<T> for NotBlank<T> {
    fn check(&self, subject: &T, _config: &RuleConfig) -> Vec<Violation> {
        let field = &self.0;
        match (field.get)(subject) {
            Some(value) if !value.trim().is_empty() => vec![],
            value => vec![field.violation(format!("'{}' must not be empty.", field.label), value)],
        }
    }
}

/// Character count must fall within `min..=max`. Absent values are skipped.
pub struct LengthBetween<T> {
    pub field: Field<T>,
    pub min: BoundFn,
    pub max: usize,
}

impl<T> LengthBetween<T> {
    pub fn new(field: Field<T>, min: BoundFn, max: usize) -> Self {
        Self { field, min, max }
    }
}

impl<T> Rule<T> for LengthBetween<T> {
    fn check(&self, subject: &T, config: &RuleConfig) -> Vec<Violation> {
        let Some(value) = (self.field.get)(subject) else {
            return vec![];
        };
        let min = (self.min)(config);
        let length = value.chars().count();
        if (min..=self.max).contains(&length) {
            return vec![];
        }
        vec![self.field.violation(
            format!(
                "'{}' must be between {} and {} characters. You entered {} characters.",
                self.field.label, min, self.max, length
            ),
            Some(value),
        )]
    }
}

/// Value must look like an email address. Absent or blank values are skipped.
pub struct EmailAddress<T>(pub Field<T>);

impl<T> Rule<T> for EmailAddress<T> {
    fn check(&self, subject: &T, _config: &RuleConfig) -> Vec<Violation> {
        let field = &self.0;
        match (field.get)(subject) {
            Some(value) if !value.trim().is_empty() && !is_valid_email(value.trim()) => {
                vec![field.violation(
                    format!("'{}' is not a valid email address.", field.label),
                    Some(value),
                )]
            }
            _ => vec![],
        }
    }
}

/// Password must contain an upper case letter, a lower case letter, a digit
/// and a symbol. Each missing class is its own violation. Absent values are
/// skipped.
pub struct PasswordComplexity<T>(pub Field<T>);

impl<T> Rule<T> for PasswordComplexity<T> {
    fn check(&self, subject: &T, _config: &RuleConfig) -> Vec<Violation> {
        let field = &self.0;
        let Some(value) = (field.get)(subject) else {
            return vec![];
        };

        let classes: [(fn(char) -> bool, &str); 4] = [
            (|c| c.is_uppercase(), "upper case letter"),
            (|c| c.is_lowercase(), "lower case letter"),
            (|c| c.is_ascii_digit(), "number"),
            (
                |c| !c.is_alphanumeric() && !c.is_whitespace(),
                "special character",
            ),
        ];

        classes
            .iter()
            .filter(|(matches, _)| !value.chars().any(matches))
            .map(|(_, description)| {
                field.violation(
                    format!("'{}' must contain at least one {}.", field.label, description),
                    Some(value),
                )
            })
            .collect()
    }
}

/// Exactly one of two fields must be present.
pub struct ExactlyOne<T> {
    pub first: Field<T>,
    pub second: Field<T>,
}

impl<T> Rule<T> for ExactlyOne<T> {
    fn check(&self, subject: &T, _config: &RuleConfig) -> Vec<Violation> {
        let present = |field: &Field<T>| {
            (field.get)(subject)
                .map(|v| !v.trim().is_empty())
                .unwrap_or(false)
        };
        let names = format!(
            "{} or {}",
            self.first.label.to_lowercase(),
            self.second.label.to_lowercase()
        );

        match (present(&self.first), present(&self.second)) {
            (true, false) | (false, true) => vec![],
            (false, false) => vec![
                Violation::new(
                    self.first.name,
                    format!("Either {} must be provided.", names),
                    None,
                ),
                Violation::new(
                    self.second.name,
                    format!("Either {} must be provided.", names),
                    None,
                ),
            ],
            (true, true) => vec![Violation::new(
                self.second.name,
                format!("Only one of {} may be provided.", names),
                (self.second.get)(subject),
            )],
        }
    }
}

/// UUID field must not be the nil sentinel.
pub struct NotNil<T> {
    pub name: &'static str,
    pub label: &'static str,
    pub get: fn(&T) -> Uuid,
}

impl<T> Rule<T> for NotNil<T> {
    fn check(&self, subject: &T, _config: &RuleConfig) -> Vec<Violation> {
        let value = (self.get)(subject);
        if value.is_nil() {
            vec![Violation::new(
                self.name,
                format!("'{}' must not be empty.", self.label),
                Some(&value.to_string()),
            )]
        } else {
            vec![]
        }
    }
}

/// Optional integer must fall within `min..=max`. Absent values are skipped.
pub struct InclusiveBetween<T> {
    pub name: &'static str,
    pub label: &'static str,
    pub get: fn(&T) -> Option<i64>,
    pub min: fn(&RuleConfig) -> i64,
    pub max: fn(&RuleConfig) -> i64,
}

impl<T> Rule<T> for InclusiveBetween<T> {
    fn check(&self, subject: &T, config: &RuleConfig) -> Vec<Violation> {
        let Some(value) = (self.get)(subject) else {
            return vec![];
        };
        let (min, max) = ((self.min)(config), (self.max)(config));
        if (min..=max).contains(&value) {
            return vec![];
        }
        vec![Violation::new(
            self.name,
            format!(
                "'{}' must be between {} and {}. You entered {}.",
                self.label, min, max, value
            ),
            Some(&value.to_string()),
        )]
    }
}

/// Two fields must be both present or both absent.
pub struct BothOrNeither<T> {
    pub first: (&'static str, &'static str),
    pub second: (&'static str, &'static str),
    pub present: fn(&T) -> (bool, bool),
}

impl<T> Rule<T> for BothOrNeither<T> {
    fn check(&self, subject: &T, _config: &RuleConfig) -> Vec<Violation> {
        let (first, second) = (self.present)(subject);
        if first == second {
            return vec![];
        }
        let missing = if first { self.second } else { self.first };
        vec![Violation::new(
            missing.0,
            format!(
                "'{}' and '{}' must both be present or both be absent.",
                self.first.1, self.second.1
            ),
            None,
        )]
    }
}

/// Basic email format check: `local@domain.tld`.
///
/// Exactly one `@`, a non-empty local part, and a domain with at least one
/// dot and no empty labels.
pub fn is_valid_email(email: &str) -> bool {
    let parts: Vec<&str> = email.split('@').collect();
    let (local, domain) = match parts.as_slice() {
        [local, domain] => (*local, *domain),
        _ => return false,
    };

    if local.is_empty() || local.chars().any(char::is_whitespace) {
        return false;
    }

    let domain_parts: Vec<&str> = domain.split('.').collect();
    if domain_parts.len() < 2 {
        return false;
    }

    domain_parts
        .iter()
        .all(|p| !p.is_empty() && !p.chars().any(char::is_whitespace))
}
