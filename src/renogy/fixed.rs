use crate::prelude::*;

use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::fmt;
use std::str::FromStr;

/// How a raw register value maps onto its physical quantity.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Scale {
    /// raw value is already in the reported unit
    Unit,
    /// raw value is in tenths (x0.1)
    Tenths,
    /// raw value is in hundredths (x0.01)
    Hundredths,
    /// raw value is in deciwatt-hours, reported as kWh (/10000)
    TenThousandths,
}

impl Scale {
    pub(crate) fn divisor(self) -> i64 {
        match self {
            Scale::Unit => 1,
            Scale::Tenths => 10,
            Scale::Hundredths => 100,
            Scale::TenThousandths => 10_000,
        }
    }
}

/// Exact fixed-point quantity with two fractional digits, held as a count of
/// hundredths.
///
/// All conversions round half away from zero. The interchange form is a
/// string with exactly two fractional digits (`"13.60"`).
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    SerializeDisplay,
    DeserializeFromStr,
)]
pub struct Fixed2(i64);

impl Fixed2 {
    pub const ZERO: Fixed2 = Fixed2(0);

    pub const fn from_hundredths(hundredths: i64) -> Self {
        Self(hundredths)
    }

    pub const fn hundredths(self) -> i64 {
        self.0
    }

    /// Physical value of a raw register, rounded to two decimals.
    pub fn from_register(raw: u32, scale: Scale) -> Self {
        Self(div_round(i64::from(raw) * 100, scale.divisor()))
    }

    /// Nearest raw register value for this quantity. Saturates instead of
    /// overflowing; callers range check the result against the register width.
    pub fn to_register(self, scale: Scale) -> i64 {
        div_round(self.0.saturating_mul(scale.divisor()), 100)
    }
}

/// Integer division rounding half away from zero. `d` must be positive.
fn div_round(n: i64, d: i64) -> i64 {
    let q = n / d;
    let r = n % d;
    if 2 * r.abs() >= d {
        q + n.signum()
    } else {
        q
    }
}

impl fmt::Display for Fixed2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl FromStr for Fixed2 {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CodecError::Decimal(s.to_string());

        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));

        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        if !whole.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };

        // first two fractional digits, then round on the third
        let mut cents = 0;
        let mut frac_digits = frac.bytes().map(|b| i64::from(b - b'0'));
        for _ in 0..2 {
            cents = cents * 10 + frac_digits.next().unwrap_or(0);
        }
        if frac_digits.next().is_some_and(|d| d >= 5) {
            cents += 1;
        }

        let magnitude = whole
            .checked_mul(100)
            .and_then(|w| w.checked_add(cents))
            .ok_or_else(invalid)?;

        Ok(Self(if negative { -magnitude } else { magnitude }))
    }
}
