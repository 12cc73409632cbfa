//! Rule-based field validation shared by the user and astronaut services.
//!
//! A [`Validator`] owns a table of named rules. [`Validator::validate`] runs
//! every rule named by every [`Check`] and returns all failures in check
//! order; an empty list means the input is valid.

use chrono::NaiveDate;
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use crate::models::Role;
use crate::models::astronaut::{GENDERS, STATUSES};

/// One or more messages produced by a failing rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation(Vec<String>);

impl Violation {
    pub fn new(message: impl Into<String>) -> Self {
        Self(vec![message.into()])
    }

    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn into_messages(self) -> Vec<String> {
        self.0
    }
}

impl From<Vec<String>> for Violation {
    fn from(messages: Vec<String>) -> Self {
        Self(messages)
    }
}

pub type Rule = Arc<dyn Fn(&str, &str) -> Result<(), Violation> + Send + Sync>;

/// Named rule table.
#[derive(Clone, Default)]
pub struct Rules(HashMap<&'static str, Rule>);

impl Rules {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with<F>(mut self, key: &'static str, rule: F) -> Self
    where
        F: Fn(&str, &str) -> Result<(), Violation> + Send + Sync + 'static,
    {
        self.0.insert(key, Arc::new(rule));
        self
    }

    fn get(&self, key: &str) -> Option<&Rule> {
        self.0.get(key)
    }
}

/// A labelled value and the rule keys to run against it.
#[derive(Debug, Clone, Copy)]
pub struct Check<'a> {
    pub field: &'a str,
    pub value: &'a str,
    pub rules: &'a [&'a str],
}

impl<'a> Check<'a> {
    #[must_use]
    pub const fn new(field: &'a str, value: &'a str, rules: &'a [&'a str]) -> Self {
        Self {
            field,
            value,
            rules,
        }
    }
}

#[derive(Clone)]
pub struct Validator {
    rules: Rules,
}

impl Validator {
    #[must_use]
    pub const fn new(rules: Rules) -> Self {
        Self { rules }
    }

    /// Runs every check without short-circuiting.
    #[must_use]
    pub fn validate(&self, checks: &[Check<'_>]) -> Vec<String> {
        let mut errors = Vec::new();

        for check in checks {
            for key in check.rules {
                let Some(rule) = self.rules.get(key) else {
                    errors.push(format!("{}: unknown validation rule '{key}'", check.field));
                    continue;
                };

                if let Err(violation) = rule(check.field, check.value) {
                    errors.extend(violation.into_messages());
                }
            }
        }

        errors
    }
}

// ============================================================================
// Built-in rules
// ============================================================================

pub fn required(field: &str, value: &str) -> Result<(), Violation> {
    if value.trim().is_empty() {
        return Err(Violation::new(format!("{field} must not be blank")));
    }
    Ok(())
}

pub fn length(max: usize) -> impl Fn(&str, &str) -> Result<(), Violation> + Send + Sync {
    move |field, value| {
        if value.chars().count() > max {
            return Err(Violation::new(format!(
                "{field} must be less than or equal to {max} characters"
            )));
        }
        Ok(())
    }
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[\w.+-]+@([\w-]+\.)+[\w-]{2,}$").expect("Invalid email regex")
    })
}

pub fn email(field: &str, value: &str) -> Result<(), Violation> {
    if !email_regex().is_match(value) {
        return Err(Violation::new(format!("{field} is not a valid email address")));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Upper,
    Lower,
    Number,
    Special,
    Other,
}

// Precedence is upper, lower, number, special; a character lands in one class.
fn classify(c: char) -> CharClass {
    if c.is_uppercase() {
        CharClass::Upper
    } else if c.is_lowercase() {
        CharClass::Lower
    } else if c.is_numeric() {
        CharClass::Number
    } else if !c.is_alphanumeric() && !c.is_whitespace() && !c.is_control() {
        CharClass::Special
    } else {
        CharClass::Other
    }
}

pub fn password(min: usize) -> impl Fn(&str, &str) -> Result<(), Violation> + Send + Sync {
    move |field, value| {
        let (mut upper, mut lower, mut number, mut special) = (false, false, false, false);
        for c in value.chars() {
            match classify(c) {
                CharClass::Upper => upper = true,
                CharClass::Lower => lower = true,
                CharClass::Number => number = true,
                CharClass::Special => special = true,
                CharClass::Other => {}
            }
        }

        let mut messages = Vec::new();
        if value.chars().count() < min {
            messages.push(format!("{field} must be at least {min} characters"));
        }
        if !upper {
            messages.push(format!("{field} must contain an uppercase letter"));
        }
        if !lower {
            messages.push(format!("{field} must contain a lowercase letter"));
        }
        if !number {
            messages.push(format!("{field} must contain a number"));
        }
        if !special {
            messages.push(format!("{field} must contain a special character"));
        }

        if messages.is_empty() {
            Ok(())
        } else {
            Err(Violation::from(messages))
        }
    }
}

pub fn role(field: &str, value: &str) -> Result<(), Violation> {
    value
        .parse::<Role>()
        .map(|_| ())
        .map_err(|_| Violation::new(format!("{field} is not a valid role")))
}

pub fn status(field: &str, value: &str) -> Result<(), Violation> {
    let value = value.trim();
    if STATUSES.iter().any(|s| s.eq_ignore_ascii_case(value)) {
        return Ok(());
    }
    Err(Violation::new(format!(
        "{field} must be one of: {}",
        STATUSES.join(", ")
    )))
}

pub fn date(field: &str, value: &str) -> Result<(), Violation> {
    let value = value.trim();
    let parsed = NaiveDate::parse_from_str(value, "%m/%d/%Y")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d"));

    if parsed.is_err() {
        return Err(Violation::new(format!(
            "{field} must be a date formatted MM/DD/YYYY or YYYY-MM-DD"
        )));
    }
    Ok(())
}

pub fn gender(field: &str, value: &str) -> Result<(), Violation> {
    let value = value.trim();
    if GENDERS.iter().any(|g| g.eq_ignore_ascii_case(value)) {
        return Ok(());
    }
    Err(Violation::new(format!(
        "{field} must be one of: {}",
        GENDERS.join(", ")
    )))
}
