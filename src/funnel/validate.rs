//! Per-field validators and normalizers.
//!
//! Validators are pure predicates over the raw answer; normalizers map an
//! accepted answer to the value stored in the session. Every normalizer is
//! idempotent over its own output.

use std::sync::OnceLock;

use regex::Regex;

use super::fields::FieldKey;
use crate::leads::types::{Operation, PropertyType, Urgency};

/// A normalized answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Number(u64),
    Text(String),
}

impl FieldValue {
    pub fn as_number(&self) -> Option<u64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(_) => None,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static email pattern"))
}

pub fn valid_name(raw: &str) -> bool {
    raw.split_whitespace().count() >= 2
}

/// Exactly eleven ASCII digits (area code + number), no separators.
pub fn valid_phone(raw: &str) -> bool {
    raw.len() == 11 && raw.bytes().all(|b| b.is_ascii_digit())
}

pub fn valid_email(raw: &str) -> bool {
    email_regex().is_match(raw)
}

pub fn valid_operation(raw: &str) -> bool {
    matches!(raw, "1" | "2")
}

pub fn valid_property_type(raw: &str) -> bool {
    PropertyType::parse(raw).is_some()
}

/// Non-empty, ASCII digits only, and small enough to store.
pub fn valid_count(raw: &str) -> bool {
    !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) && raw.parse::<u64>().is_ok()
}

pub fn valid_urgency(raw: &str) -> bool {
    Urgency::parse(raw).is_some()
}

/// Validator for `field`. The funnel is a closed set of [`FieldKey`]s, so
/// the engine can never meet a field without a validator; callers that only
/// hold a column name go through `validate_key`, where an unknown key is
/// always accepted rather than left to stall the funnel.
pub fn validate(field: FieldKey, raw: &str) -> bool {
    match field {
        FieldKey::Name => valid_name(raw),
        FieldKey::Phone => valid_phone(raw),
        FieldKey::Email => valid_email(raw),
        FieldKey::Operation => valid_operation(raw),
        FieldKey::PropertyType => valid_property_type(raw),
        FieldKey::Area | FieldKey::Bedrooms => valid_count(raw),
        FieldKey::PriceRange => true,
        FieldKey::Urgency => valid_urgency(raw),
    }
}

pub fn normalize(field: FieldKey, raw: &str) -> FieldValue {
    let trimmed = raw.trim();
    match field {
        FieldKey::Name | FieldKey::PriceRange => FieldValue::Text(trimmed.to_string()),
        FieldKey::Phone | FieldKey::Email => FieldValue::Text(raw.to_string()),
        FieldKey::Operation => {
            let op = Operation::from_choice(trimmed)
                .or_else(|| Operation::parse(trimmed))
                .unwrap_or(Operation::Rental);
            FieldValue::Text(op.as_str().to_string())
        }
        FieldKey::PropertyType | FieldKey::Urgency => FieldValue::Text(trimmed.to_lowercase()),
        FieldKey::Area | FieldKey::Bedrooms => match trimmed.parse::<u64>() {
            Ok(n) => FieldValue::Number(n),
            Err(_) => FieldValue::Text(trimmed.to_string()),
        },
    }
}

/// String-keyed lookup. Unknown keys are accepted.
#[cfg(test)]
pub fn validate_key(key: &str, raw: &str) -> bool {
    match FieldKey::from_key(key) {
        Some(field) => validate(field, raw),
        None => true,
    }
}

/// Unknown keys pass through untouched.
#[cfg(test)]
pub fn normalize_key(key: &str, raw: &str) -> FieldValue {
    match FieldKey::from_key(key) {
        Some(field) => normalize(field, raw),
        None => FieldValue::Text(raw.to_string()),
    }
}
