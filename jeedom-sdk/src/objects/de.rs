//! Lenient deserializers for Jeedom payloads.
//!
//! The PHP backend is loose about scalar types: identifiers arrive as
//! strings or numbers, visibility flags as `"1"`, `1` or `true`, and
//! timestamps as numbers or numeric strings. These helpers normalise them.

use compact_str::{CompactString, ToCompactString};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Str(CompactString),
    Int(i64),
    Float(f64),
    Bool(bool),
}

/// An identifier given either as a string or as a number.
pub fn id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<CompactString, D::Error> {
    match Scalar::deserialize(deserializer)? {
        Scalar::Str(s) => Ok(s),
        Scalar::Int(i) => Ok(i.to_compact_string()),
        Scalar::Float(f) if f.fract() == 0.0 => Ok((f as i64).to_compact_string()),
        Scalar::Float(f) => Err(D::Error::custom(format!("invalid identifier {f}"))),
        Scalar::Bool(b) => Err(D::Error::custom(format!("invalid identifier {b}"))),
    }
}

/// Same as [`id`] but `null`, missing and empty values map to `None`.
pub fn opt_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<CompactString>, D::Error> {
    let value: Option<Scalar> = Option::deserialize(deserializer)?;
    Ok(match value {
        None => None,
        Some(Scalar::Str(s)) if s.is_empty() => None,
        Some(Scalar::Str(s)) => Some(s),
        Some(Scalar::Int(i)) => Some(i.to_compact_string()),
        Some(Scalar::Float(f)) => Some(f.to_compact_string()),
        Some(Scalar::Bool(_)) => None,
    })
}

/// A boolean flag encoded the PHP way: `"1"`, `1`, `true` are set.
pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value: Option<Scalar> = Option::deserialize(deserializer)?;
    Ok(match value {
        None => false,
        Some(Scalar::Str(s)) => s == "1" || s.eq_ignore_ascii_case("true"),
        Some(Scalar::Int(i)) => i == 1,
        Some(Scalar::Float(f)) => f == 1.0,
        Some(Scalar::Bool(b)) => b,
    })
}

/// A floating-point number given either as a JSON number or a numeric string.
pub fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match Scalar::deserialize(deserializer)? {
        Scalar::Int(i) => Ok(i as f64),
        Scalar::Float(f) => Ok(f),
        Scalar::Str(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| D::Error::custom(format!("invalid number {s:?}"))),
        Scalar::Bool(b) => Err(D::Error::custom(format!("invalid number {b}"))),
    }
}

/// An optional integer bound: empty strings and `null` are `None`.
pub fn opt_bound<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let value: Option<Scalar> = Option::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Scalar::Bool(_)) => None,
        Some(Scalar::Int(i)) => Some(i),
        Some(Scalar::Float(f)) => Some(f as i64),
        Some(Scalar::Str(s)) => parse_leading_int(&s),
    })
}

/// Integer prefix of `s`, the way a lenient `parseInt` would read it.
fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim();
    let end = s
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    s[..end].parse().ok()
}
