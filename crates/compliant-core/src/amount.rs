//! Whole-dollar amount parsing.
//!
//! Certificate limits are written as `$2,000,000`, `2000000`, or occasionally
//! `$2,000,000.00`. All of them reduce to a plain dollar count; amounts with
//! non-zero cents are rejected.

use serde::Deserialize;

use crate::CoreError;

/// Parse a dollar amount into whole dollars.
///
/// Accepts an optional leading `$`, thousands separators, surrounding
/// whitespace, and a trailing `.00`-style zero fraction. Returns `None` for
/// anything else, including an empty digit run and values above `u64::MAX`.
pub fn parse_dollars(s: &str) -> Option<u64> {
    let s = s.trim();
    let s = s.strip_prefix('$').unwrap_or(s).trim_start();

    let (whole, fraction) = match s.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (s, None),
    };

    if let Some(f) = fraction
        && (f.is_empty() || !f.bytes().all(|b| b == b'0'))
    {
        return None;
    }

    let digits: String = whole.chars().filter(|c| *c != ',').collect();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// A limit as it arrives in a submitted JSON document: a number or a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AmountValue {
    Whole(u64),
    Signed(i64),
    Fractional(f64),
    Text(String),
}

impl AmountValue {
    /// Resolve to whole dollars, rejecting negative and fractional values.
    pub fn to_dollars(&self) -> Result<u64, CoreError> {
        match self {
            Self::Whole(n) => Ok(*n),
            Self::Signed(n) if *n < 0 => Err(CoreError::NegativeAmount(*n)),
            Self::Signed(n) => Ok(n.unsigned_abs()),
            // `u64::MAX as f64` rounds up to 2^64, which is already out of range.
            Self::Fractional(f)
                if f.is_finite() && *f >= 0.0 && *f < u64::MAX as f64 && f.fract() == 0.0 =>
            {
                Ok(*f as u64)
            }
            Self::Fractional(f) => Err(CoreError::InvalidAmount(f.to_string())),
            Self::Text(s) => parse_dollars(s).ok_or_else(|| CoreError::InvalidAmount(s.clone())),
        }
    }
}
