//! Routing code (PIN code) parsing and decomposition.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Number of digits in a routing code
pub const CODE_LENGTH: usize = 6;

/// Largest value a routing code can hold ("999999")
const MAX_CODE: u32 = 999_999;

/// Reasons an input is not a well-formed routing code
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("expected 6 digits, got {0} characters")]
    InvalidLength(usize),

    #[error("invalid character {0:?} in routing code")]
    NonDigit(char),

    #[error("number {0} does not fit in 6 digits")]
    OutOfRange(i128),
}

/// Raw input accepted wherever a routing code is expected.
///
/// Codes reach the engine either as text (HTTP query strings, CSV cells) or
/// as integers (numeric JSON, callers holding a number). Both funnel through
/// [`RoutingCode::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeInput<'a> {
    Text(&'a str),
    Number(i128),
}

impl<'a> From<&'a str> for CodeInput<'a> {
    fn from(value: &'a str) -> Self {
        CodeInput::Text(value)
    }
}

impl<'a> From<&'a String> for CodeInput<'a> {
    fn from(value: &'a String) -> Self {
        CodeInput::Text(value.as_str())
    }
}

macro_rules! numeric_input {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for CodeInput<'_> {
                fn from(value: $ty) -> Self {
                    CodeInput::Number(i128::from(value))
                }
            }
        )*
    };
}

numeric_input!(u16, u32, u64, i32, i64);

impl From<RoutingCode> for CodeInput<'_> {
    fn from(value: RoutingCode) -> Self {
        CodeInput::Number(i128::from(value.0))
    }
}

/// A validated 6-digit routing code.
///
/// Stored as its numeric value; always rendered zero-padded to six digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoutingCode(u32);

impl RoutingCode {
    /// Parse a routing code from text or a number.
    ///
    /// Text is trimmed and must then be exactly six ASCII digits. Numbers
    /// must lie in `0..=999999` and are zero-padded.
    pub fn parse<'a>(input: impl Into<CodeInput<'a>>) -> Result<Self, FormatError> {
        match input.into() {
            CodeInput::Text(text) => Self::parse_text(text),
            CodeInput::Number(n) => u32::try_from(n)
                .ok()
                .filter(|v| *v <= MAX_CODE)
                .map(RoutingCode)
                .ok_or(FormatError::OutOfRange(n)),
        }
    }

    fn parse_text(text: &str) -> Result<Self, FormatError> {
        let text = text.trim();
        let len = text.chars().count();
        if len != CODE_LENGTH {
            return Err(FormatError::InvalidLength(len));
        }

        let mut value = 0u32;
        for c in text.chars() {
            match c.to_digit(10) {
                Some(d) => value = value * 10 + d,
                None => return Err(FormatError::NonDigit(c)),
            }
        }
        Ok(RoutingCode(value))
    }

    /// Reassemble a code from its prefix and suffix. Both must be below 1000.
    pub fn from_parts(prefix: u16, suffix: u16) -> Option<Self> {
        if prefix > 999 || suffix > 999 {
            return None;
        }
        Some(RoutingCode(u32::from(prefix) * 1000 + u32::from(suffix)))
    }

    /// Split into (prefix, suffix): region digits and office digits.
    pub fn split(&self) -> (u16, u16) {
        ((self.0 / 1000) as u16, (self.0 % 1000) as u16)
    }

    pub fn prefix(&self) -> u16 {
        self.split().0
    }

    pub fn suffix(&self) -> u16 {
        self.split().1
    }

    /// Numeric value of the code
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for RoutingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06}", self.0)
    }
}

impl FromStr for RoutingCode {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<u32> for RoutingCode {
    type Error = FormatError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl Serialize for RoutingCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RoutingCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(CodeVisitor)
    }
}

struct CodeVisitor;

impl Visitor<'_> for CodeVisitor {
    type Value = RoutingCode;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a 6-digit routing code as string or integer")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        RoutingCode::parse(v).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        RoutingCode::parse(v).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        RoutingCode::parse(v).map_err(E::custom)
    }
}
