//! Typed parameter values and their INI string form.
//!
//! Four primitive kinds can be persisted: integers, floats, booleans and
//! strings.  Each is a Rust type implementing the sealed [`ParamType`] trait,
//! so `Parameter<T>` is resolved at compile time and never needs a downcast.
//! [`ParamValue`] is the closed sum type used where kinds are mixed, e.g.
//! when listing every parameter.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The primitive kind of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamKind {
    Int,
    Float,
    Bool,
    Str,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKind::Int => write!(f, "integer"),
            ParamKind::Float => write!(f, "float"),
            ParamKind::Bool => write!(f, "boolean"),
            ParamKind::Str => write!(f, "string"),
        }
    }
}

/// A value of any supported kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i32),
    Float(f32),
    Bool(bool),
    Str(String),
}

impl ParamValue {
    /// The kind tag of this value.
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamValue::Int(_) => ParamKind::Int,
            ParamValue::Float(_) => ParamKind::Float,
            ParamValue::Bool(_) => ParamKind::Bool,
            ParamValue::Str(_) => ParamKind::Str,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Bool(v) => write!(f, "{v}"),
            ParamValue::Str(v) => write!(f, "{v}"),
        }
    }
}

/// Stored text could not be converted to the parameter's kind.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValueError {
    #[error("{text:?} is not a valid {kind}")]
    Invalid { kind: ParamKind, text: String },
}

impl ValueError {
    fn invalid(kind: ParamKind, text: &str) -> Self {
        ValueError::Invalid {
            kind,
            text: text.to_string(),
        }
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for i32 {}
    impl Sealed for f32 {}
    impl Sealed for bool {}
    impl Sealed for String {}
}

/// A Rust type that a [`Parameter`](super::parameter::Parameter) can hold.
///
/// Implemented for `i32`, `f32`, `bool` and `String` only.
pub trait ParamType: sealed::Sealed + Clone + fmt::Debug + PartialEq {
    /// Kind tag for this type.
    const KIND: ParamKind;

    /// The zero-equivalent used when no default is supplied.
    fn zero() -> Self;

    /// Renders the value as stored in the INI file.
    fn to_ini(&self) -> String;

    /// Parses the INI representation.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::Invalid`] if `text` does not describe a value of
    /// this kind.
    fn from_ini(text: &str) -> Result<Self, ValueError>;

    /// Wraps the value in the type-erased [`ParamValue`].
    fn into_value(self) -> ParamValue;
}

impl ParamType for i32 {
    const KIND: ParamKind = ParamKind::Int;

    fn zero() -> Self {
        0
    }

    fn to_ini(&self) -> String {
        self.to_string()
    }

    /// Decimal with optional sign, or `0x`-prefixed hex.  Hex is read as a
    /// 32-bit pattern, so `0xFFFFFFFF` is `-1`.
    fn from_ini(text: &str) -> Result<Self, ValueError> {
        let text = text.trim();
        let (negative, digits) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };

        let hex = digits
            .strip_prefix("0x")
            .or_else(|| digits.strip_prefix("0X"));

        let parsed = match hex {
            Some(hex_digits) => u32::from_str_radix(hex_digits, 16)
                .map(|bits| bits as i32)
                .map(|v| if negative { v.wrapping_neg() } else { v })
                .ok(),
            None => text.parse::<i32>().ok(),
        };

        parsed.ok_or_else(|| ValueError::invalid(ParamKind::Int, text))
    }

    fn into_value(self) -> ParamValue {
        ParamValue::Int(self)
    }
}

impl ParamType for f32 {
    const KIND: ParamKind = ParamKind::Float;

    fn zero() -> Self {
        0.0
    }

    /// Shortest text that parses back to the identical `f32`.
    fn to_ini(&self) -> String {
        self.to_string()
    }

    fn from_ini(text: &str) -> Result<Self, ValueError> {
        text.trim()
            .parse::<f32>()
            .map_err(|_| ValueError::invalid(ParamKind::Float, text))
    }

    fn into_value(self) -> ParamValue {
        ParamValue::Float(self)
    }
}

impl ParamType for bool {
    const KIND: ParamKind = ParamKind::Bool;

    fn zero() -> Self {
        false
    }

    fn to_ini(&self) -> String {
        self.to_string()
    }

    fn from_ini(text: &str) -> Result<Self, ValueError> {
        match text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ValueError::invalid(ParamKind::Bool, text)),
        }
    }

    fn into_value(self) -> ParamValue {
        ParamValue::Bool(self)
    }
}

impl ParamType for String {
    const KIND: ParamKind = ParamKind::Str;

    fn zero() -> Self {
        String::new()
    }

    fn to_ini(&self) -> String {
        self.clone()
    }

    fn from_ini(text: &str) -> Result<Self, ValueError> {
        Ok(text.to_string())
    }

    fn into_value(self) -> ParamValue {
        ParamValue::Str(self)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── Integers ──────────────────────────────────────────────────────────────

    #[test]
    fn test_int_parses_decimal_with_sign() {
        assert_eq!(i32::from_ini("44100"), Ok(44100));
        assert_eq!(i32::from_ini("-7"), Ok(-7));
        assert_eq!(i32::from_ini("+3"), Ok(3));
    }

    #[test]
    fn test_int_parses_hex_address() {
        assert_eq!(i32::from_ini("0x00D56494"), Ok(0x00D5_6494));
        assert_eq!(i32::from_ini("0XFF"), Ok(255));
    }

    #[test]
    fn test_int_hex_keeps_full_32_bit_pattern() {
        assert_eq!(i32::from_ini("0xFFFFFFFF"), Ok(-1));
    }

    #[test]
    fn test_int_rejects_overflow_and_garbage() {
        assert!(i32::from_ini("2147483648").is_err());
        assert!(i32::from_ini("six").is_err());
        assert!(i32::from_ini("").is_err());
        assert!(i32::from_ini("0x").is_err());
    }

    #[test]
    fn test_int_writes_decimal() {
        assert_eq!(0x10_i32.to_ini(), "16");
    }

    // ── Floats ────────────────────────────────────────────────────────────────

    #[test]
    fn test_float_text_round_trips_exactly() {
        // Arrange: values that do not have a short exact decimal form
        for v in [1.666_666_f32, 0.785_398, 1.777_778, f32::MIN_POSITIVE, -0.1] {
            // Act
            let back = f32::from_ini(&v.to_ini()).expect("parse");

            // Assert
            assert_eq!(back.to_bits(), v.to_bits(), "value {v} must round-trip");
        }
    }

    #[test]
    fn test_float_rejects_garbage() {
        let err = f32::from_ini("wide").unwrap_err();
        assert_eq!(
            err,
            ValueError::Invalid {
                kind: ParamKind::Float,
                text: "wide".to_string()
            }
        );
    }

    // ── Booleans ──────────────────────────────────────────────────────────────

    #[test]
    fn test_bool_accepts_common_spellings() {
        for text in ["true", "TRUE", "True", "1", "yes", "on"] {
            assert_eq!(bool::from_ini(text), Ok(true), "{text}");
        }
        for text in ["false", "False", "0", "no", "OFF"] {
            assert_eq!(bool::from_ini(text), Ok(false), "{text}");
        }
    }

    #[test]
    fn test_bool_rejects_other_text() {
        assert!(bool::from_ini("maybe").is_err());
        assert!(bool::from_ini("2").is_err());
    }

    #[test]
    fn test_bool_writes_words() {
        assert_eq!(true.to_ini(), "true");
        assert_eq!(false.to_ini(), "false");
    }

    // ── Strings ───────────────────────────────────────────────────────────────

    #[test]
    fn test_string_is_verbatim() {
        assert_eq!(String::from_ini("0.3.4"), Ok("0.3.4".to_string()));
        assert_eq!("ÆØÅ intro.bik".to_string().to_ini(), "ÆØÅ intro.bik");
    }

    // ── Kinds ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_zero_values() {
        assert_eq!(i32::zero(), 0);
        assert_eq!(f32::zero(), 0.0);
        assert!(!bool::zero());
        assert!(String::zero().is_empty());
    }

    #[test]
    fn test_into_value_tags_kind() {
        assert_eq!(5_i32.into_value().kind(), ParamKind::Int);
        assert_eq!(0.5_f32.into_value().kind(), ParamKind::Float);
        assert_eq!(true.into_value().kind(), ParamKind::Bool);
        assert_eq!(String::new().into_value().kind(), ParamKind::Str);
    }

    #[test]
    fn test_param_value_display_matches_ini_text() {
        assert_eq!(ParamValue::Int(6).to_string(), "6");
        assert_eq!(ParamValue::Bool(false).to_string(), "false");
        assert_eq!(ParamValue::Str("x".into()).to_string(), "x");
    }
}
