//! Runtime value representation for the VM.
//!
//! Strings are kept in their raw source form. A `\DDD` escape (three decimal
//! digits) stands for one character, but it is only decoded by
//! [`decode_escapes`] when the value is written to standard output. Length,
//! indexing, concatenation and comparison all see the raw text.

use std::fmt;

use crate::type_tag::TypeTag;

/// Runtime value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Signed 64-bit integer.
    Int(i64),
    /// Boolean value.
    Bool(bool),
    /// String in raw (escape-undecoded) form.
    Str(String),
    /// The nil value.
    Nil,
}

impl Value {
    /// Returns the type tag for this value.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Int(_) => TypeTag::Int,
            Value::Bool(_) => TypeTag::Bool,
            Value::Str(_) => TypeTag::String,
            Value::Nil => TypeTag::Nil,
        }
    }

    /// Convenience constructor for string values.
    pub fn string(raw: impl Into<String>) -> Self {
        Value::Str(raw.into())
    }
}

/// Formats the value's raw text, as DPRINT shows it.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Str(s) => f.write_str(s),
            Value::Nil => f.write_str("nil"),
        }
    }
}

/// Decode `\DDD` escapes into the characters they denote.
///
/// A backslash not followed by exactly three decimal digits is kept as-is.
pub fn decode_escapes(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '\\' && i + 3 < chars.len() && is_escape(&chars[i + 1..i + 4]) {
            let code = chars[i + 1..i + 4]
                .iter()
                .fold(0u32, |acc, c| acc * 10 + c.to_digit(10).unwrap_or(0));
            match char::from_u32(code) {
                Some(c) => out.push(c),
                None => out.extend(&chars[i..i + 4]),
            }
            i += 4;
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }

    out
}

fn is_escape(digits: &[char]) -> bool {
    digits.len() == 3 && digits.iter().all(|c| c.is_ascii_digit())
}
