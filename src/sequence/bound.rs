//! Validation of the `max_job_sequence_id` server attribute.
//!
//! Everything here is pure. The validator decides whether a proposed
//! maximum is acceptable and normalizes it into a [`MaxSequenceValue`],
//! which is the only form the sequence store accepts.

use std::fmt;

use serde::Serialize;

use crate::contracts::ConfigError;

/// Lowest maximum an administrator may configure.
pub const MIN_MAX_SEQUENCE_ID: u64 = 9_999_999;
/// Highest maximum an administrator may configure.
pub const MAX_MAX_SEQUENCE_ID: u64 = 999_999_999_999;
/// Maximum used on first start and after an unset.
pub const DEFAULT_MAX_SEQUENCE_ID: u64 = 9_999_999;

/// A validated upper bound on issuable job sequence numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct MaxSequenceValue(u64);

impl MaxSequenceValue {
    pub const DEFAULT: Self = Self(DEFAULT_MAX_SEQUENCE_ID);

    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl Default for MaxSequenceValue {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u64> for MaxSequenceValue {
    type Error = ConfigError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if (MIN_MAX_SEQUENCE_ID..=MAX_MAX_SEQUENCE_ID).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ConfigError::OutOfRange)
        }
    }
}

impl fmt::Display for MaxSequenceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A proposed value as handed over by the management layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Candidate {
    Integer(i128),
    Float(f64),
    Text(String),
    /// Anything that has no numeric reading at all (booleans, lists,
    /// undecodable request bodies).
    Unrepresentable,
}

impl From<i64> for Candidate {
    fn from(value: i64) -> Self {
        Candidate::Integer(value.into())
    }
}

impl From<u64> for Candidate {
    fn from(value: u64) -> Self {
        Candidate::Integer(value.into())
    }
}

impl From<f64> for Candidate {
    fn from(value: f64) -> Self {
        Candidate::Float(value)
    }
}

impl From<&str> for Candidate {
    fn from(value: &str) -> Self {
        Candidate::Text(value.to_string())
    }
}

impl From<String> for Candidate {
    fn from(value: String) -> Self {
        Candidate::Text(value)
    }
}

impl From<serde_json::Value> for Candidate {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Candidate::Integer(i.into())
                } else if let Some(u) = n.as_u64() {
                    Candidate::Integer(u.into())
                } else if let Some(f) = n.as_f64() {
                    Candidate::Float(f)
                } else {
                    Candidate::Unrepresentable
                }
            }
            serde_json::Value::String(s) => Candidate::Text(s),
            _ => Candidate::Unrepresentable,
        }
    }
}

/// Validates a proposed maximum.
///
/// Non-integer input is `MalformedValue`; integer input outside
/// `[MIN_MAX_SEQUENCE_ID, MAX_MAX_SEQUENCE_ID]` is `OutOfRange`.
pub fn validate_max_sequence(candidate: &Candidate) -> Result<MaxSequenceValue, ConfigError> {
    match candidate {
        Candidate::Integer(value) => check_range(*value),
        Candidate::Float(value) => {
            if !value.is_finite() || value.fract() != 0.0 {
                return Err(ConfigError::MalformedValue);
            }
            if *value < MIN_MAX_SEQUENCE_ID as f64 || *value > MAX_MAX_SEQUENCE_ID as f64 {
                return Err(ConfigError::OutOfRange);
            }
            MaxSequenceValue::try_from(*value as u64)
        }
        Candidate::Text(text) => match parse_integer_text(text) {
            Some(IntegerText::Value(value)) => check_range(value),
            Some(IntegerText::Overflow) => Err(ConfigError::OutOfRange),
            None => Err(ConfigError::MalformedValue),
        },
        Candidate::Unrepresentable => Err(ConfigError::MalformedValue),
    }
}

fn check_range(value: i128) -> Result<MaxSequenceValue, ConfigError> {
    let value = u64::try_from(value).map_err(|_| ConfigError::OutOfRange)?;
    MaxSequenceValue::try_from(value)
}

#[derive(Debug, PartialEq, Eq)]
enum IntegerText {
    Value(i128),
    /// Integer-valued, but wider than any bound could ever be.
    Overflow,
}

/// Reads `[+-]digits` with surrounding whitespace. Returns `None` for
/// anything else, including wildcard characters and decimal points.
fn parse_integer_text(text: &str) -> Option<IntegerText> {
    let text = text.trim();
    let (negative, digits) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let significant = digits.trim_start_matches('0');
    if significant.len() > 20 {
        return Some(IntegerText::Overflow);
    }
    let magnitude: i128 = if significant.is_empty() {
        0
    } else {
        significant.parse().ok()?
    };
    Some(IntegerText::Value(if negative { -magnitude } else { magnitude }))
}
