//! Declarative form validation
//!
//! A [`Schema`] is an ordered list of [`FieldRule`]s. Validating a
//! [`FormInput`] (the raw strings a user typed) yields either a coerced
//! [`Record`] or a field-keyed [`ValidationErrors`] map. Numeric fields are
//! parsed from their text; input that does not parse is an error, never a
//! silent default. Validation is synchronous and performs no I/O.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

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

/// How the raw text of a field is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    Integer,
    Number,
}

/// Constraints for one form field
///
/// For text kinds `min`/`max` bound the length in characters, for numeric
/// kinds they bound the parsed value. Both bounds are inclusive.
#[derive(Debug, Clone)]
pub struct FieldRule {
    name: &'static str,
    label: &'static str,
    kind: FieldKind,
    required: bool,
    min: Option<f64>,
    max: Option<f64>,
}

impl FieldRule {
    pub fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label: name,
            kind,
            required: false,
            min: None,
            max: None,
        }
    }

    pub fn text(name: &'static str) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub fn email(name: &'static str) -> Self {
        Self::new(name, FieldKind::Email)
    }

    pub fn integer(name: &'static str) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    pub fn number(name: &'static str) -> Self {
        Self::new(name, FieldKind::Number)
    }

    /// Human-readable name used in messages
    pub fn label(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    fn check(&self, raw: Option<&str>) -> Result<Option<FieldValue>, String> {
        let raw = match raw {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ if self.required => return Err(format!("{} is required", self.label)),
            _ => return Ok(None),
        };

        match self.kind {
            FieldKind::Text => {
                self.check_length(raw)?;
                Ok(Some(FieldValue::Text(raw.to_string())))
            }
            FieldKind::Email => {
                let email = raw.trim();
                validate_email(email)?;
                self.check_length(email)?;
                Ok(Some(FieldValue::Text(email.to_string())))
            }
            FieldKind::Integer => {
                let value: i64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| format!("{} must be a whole number", self.label))?;
                self.check_bounds(value as f64)?;
                Ok(Some(FieldValue::Integer(value)))
            }
            FieldKind::Number => {
                let value = raw
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|value| value.is_finite())
                    .ok_or_else(|| format!("{} must be a number", self.label))?;
                self.check_bounds(value)?;
                Ok(Some(FieldValue::Number(value)))
            }
        }
    }

    fn check_length(&self, value: &str) -> Result<(), String> {
        let length = value.chars().count() as f64;
        if let Some(min) = self.min {
            if length < min {
                return Err(format!(
                    "{} must be at least {} characters long",
                    self.label, min
                ));
            }
        }
        if let Some(max) = self.max {
            if length > max {
                return Err(format!(
                    "{} must be at most {} characters long",
                    self.label, max
                ));
            }
        }
        Ok(())
    }

    fn check_bounds(&self, value: f64) -> Result<(), String> {
        if let Some(min) = self.min {
            if value < min {
                return Err(format!("{} must be greater than or equal to {}", self.label, min));
            }
        }
        if let Some(max) = self.max {
            if value > max {
                return Err(format!("{} must be less than or equal to {}", self.label, max));
            }
        }
        Ok(())
    }
}

/// Raw form input, keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormInput(BTreeMap<String, String>);

impl FormInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormInput {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

/// A coerced field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Number(f64),
}

/// Result of a successful validation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record(BTreeMap<&'static str, FieldValue>);

impl Record {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(FieldValue::Text(value)) => Some(value),
            _ => None,
        }
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.get(name) {
            Some(FieldValue::Integer(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        match self.get(name) {
            Some(FieldValue::Number(value)) => Some(*value),
            Some(FieldValue::Integer(value)) => Some(*value as f64),
            _ => None,
        }
    }
}

/// Field-keyed validation messages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(field, message)| (field.as_str(), message.as_str()))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Ordered set of field rules
#[derive(Debug, Clone, Default)]
pub struct Schema {
    rules: Vec<FieldRule>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, rule: FieldRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    /// Check every rule against `input`; all failures are reported at once
    pub fn validate(&self, input: &FormInput) -> Result<Record, ValidationErrors> {
        let mut record = Record::default();
        let mut errors = ValidationErrors::default();

        for rule in &self.rules {
            match rule.check(input.get(rule.name)) {
                Ok(Some(value)) => {
                    record.0.insert(rule.name, value);
                }
                Ok(None) => {}
                Err(message) => errors.insert(rule.name, message),
            }
        }

        if errors.is_empty() {
            Ok(record)
        } else {
            Err(errors)
        }
    }
}
