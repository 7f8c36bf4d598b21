//! Exact currency amounts.
//!
//! Balances and transfer amounts are stored as signed integer minor units with a
//! fixed scale of two fractional digits. Parsing always goes through the textual
//! decimal representation so a value authored as `149970.25` never passes through
//! binary floating point. Serialized amounts are decimal strings (`"149970.25"`),
//! which keeps audit logs exact when they are re-read by other tooling.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error as _};
use serde_json::Value;
use thiserror::Error;

/// Number of fractional digits carried by every [`Amount`].
pub const AMOUNT_SCALE: usize = 2;

const MINOR_UNITS_PER_MAJOR: i64 = 100;

/// Errors produced while parsing or combining amounts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("'{0}' is not a decimal amount")]
    Invalid(String),

    #[error("'{0}' has more than two fractional digits")]
    TooPrecise(String),

    #[error("'{0}' is outside the supported amount range")]
    OutOfRange(String),

    #[error("amount arithmetic overflowed")]
    Overflow,
}

/// Exact decimal currency amount with two fractional digits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount {
    minor_units: i64,
}

impl Amount {
    /// The zero amount.
    pub const ZERO: Amount = Amount { minor_units: 0 };

    /// Builds an amount from minor units (cents).
    pub const fn from_minor_units(minor_units: i64) -> Self {
        Self { minor_units }
    }

    /// Builds an amount from whole major units.
    pub fn from_major_units(major_units: i64) -> Result<Self, AmountError> {
        major_units
            .checked_mul(MINOR_UNITS_PER_MAJOR)
            .map(Self::from_minor_units)
            .ok_or_else(|| AmountError::OutOfRange(major_units.to_string()))
    }

    /// Returns the raw minor unit count.
    pub const fn minor_units(self) -> i64 {
        self.minor_units
    }

    pub const fn is_negative(self) -> bool {
        self.minor_units < 0
    }

    pub fn checked_add(self, other: Amount) -> Result<Amount, AmountError> {
        self.minor_units
            .checked_add(other.minor_units)
            .map(Self::from_minor_units)
            .ok_or(AmountError::Overflow)
    }

    pub fn checked_sub(self, other: Amount) -> Result<Amount, AmountError> {
        self.minor_units
            .checked_sub(other.minor_units)
            .map(Self::from_minor_units)
            .ok_or(AmountError::Overflow)
    }

    /// Interprets a JSON number or numeric string as an amount.
    ///
    /// Numbers are converted through their textual form, so integers and short
    /// decimals such as `30.5` are exact. Exponent notation is rejected.
    pub fn from_json(value: &Value) -> Result<Self, AmountError> {
        match value {
            Value::Number(number) => number.to_string().parse(),
            Value::String(text) => text.trim().parse(),
            other => Err(AmountError::Invalid(other.to_string())),
        }
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let invalid = || AmountError::Invalid(text.to_string());

        let (negative, unsigned) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };
        let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));

        if whole.is_empty() || !whole.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(invalid());
        }
        if !fraction.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(invalid());
        }

        let significant_fraction = fraction.trim_end_matches('0');
        if significant_fraction.len() > AMOUNT_SCALE {
            return Err(AmountError::TooPrecise(text.to_string()));
        }

        let out_of_range = || AmountError::OutOfRange(text.to_string());
        let whole_units: i64 = whole.parse().map_err(|_| out_of_range())?;
        let fraction_units: i64 = if significant_fraction.is_empty() {
            0
        } else {
            format!("{significant_fraction:0<AMOUNT_SCALE$}")
                .parse()
                .map_err(|_| invalid())?
        };

        let magnitude = whole_units
            .checked_mul(MINOR_UNITS_PER_MAJOR)
            .and_then(|units| units.checked_add(fraction_units))
            .ok_or_else(out_of_range)?;

        Ok(Self::from_minor_units(if negative { -magnitude } else { magnitude }))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        let magnitude = self.minor_units.unsigned_abs();
        let per_major = MINOR_UNITS_PER_MAJOR.unsigned_abs();
        write!(f, "{sign}{}.{:02}", magnitude / per_major, magnitude % per_major)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Amount::from_json(&value).map_err(D::Error::custom)
    }
}
