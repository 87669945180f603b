//! Numeric field parsing and money formatting.

use std::fmt;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

/// Parse an unsigned, zero-padded decimal field.
///
/// Surrounding spaces are ignored and a blank field reads as zero. Any other
/// non-digit character makes the field unreadable.
#[must_use]
pub fn parse_unsigned(field: &str) -> Option<u128> {
    let trimmed = field.trim_matches(' ');
    if trimmed.is_empty() {
        return Some(0);
    }
    if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}

/// `1234567` → `"1,234,567"`.
#[must_use]
pub fn group_thousands(value: u128) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Money amount in cents (two implied decimals).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cents(pub u128);

impl Cents {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub fn parse(field: &str) -> Option<Self> {
        parse_unsigned(field).map(Self)
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl Add for Cents {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Cents {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// `123456` cents → `"1,234.56"`.
impl fmt::Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", group_thousands(self.0 / 100), self.0 % 100)
    }
}
