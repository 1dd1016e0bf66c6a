use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use crate::{CoreError, CoreResult};

/// Fixed-point weight with two fractional digits, stored as hundredths.
///
/// A single bag is limited to `0.00..=999.99` (a `NUMERIC(5,2)` column).
/// Sums of many bags may exceed that range; they are never re-validated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Weight(i64);

impl Weight {
    pub const ZERO: Weight = Weight(0);
    pub const MAX_BAG: Weight = Weight(99_999);

    pub const fn from_hundredths(hundredths: i64) -> Self {
        Weight(hundredths)
    }

    pub const fn from_units(units: i64) -> Self {
        Weight(units * 100)
    }

    pub const fn hundredths(self) -> i64 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Parse a decimal string such as `"23"`, `"12.5"` or `"7.125"`.
    ///
    /// Extra fractional digits are rounded half-up to two places.
    pub fn parse(input: &str) -> CoreResult<Self> {
        let raw = input.trim();
        let value = Decimal::from_str(raw).map_err(|_| {
            CoreError::Validation(format!("weight '{}' is not a valid decimal number", raw))
        })?;
        Self::checked(value)
    }

    /// Validate a bag weight: non-negative, at most 999.99 once rounded.
    pub fn checked(value: Decimal) -> CoreResult<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(CoreError::Validation("weight must not be negative".to_string()));
        }
        let weight = Self::from_decimal(value);
        if weight > Self::MAX_BAG {
            return Err(CoreError::Validation(format!(
                "weight '{}' must be between 0.00 and 999.99",
                value
            )));
        }
        Ok(weight)
    }

    /// Round to two places (midpoint away from zero) without range checks.
    pub fn from_decimal(value: Decimal) -> Self {
        let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(2);
        Weight(rounded.mantissa() as i64)
    }

    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// `total / count` rounded half-up to two decimals; zero when `count == 0`.
    pub fn average(total: Weight, count: usize) -> Weight {
        if count == 0 {
            return Weight::ZERO;
        }
        let count = count as i64;
        let doubled = 2 * total.0;
        let rounded = if doubled >= 0 {
            (doubled + count) / (2 * count)
        } else {
            (doubled - count) / (2 * count)
        };
        Weight(rounded)
    }

}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Add for Weight {
    type Output = Weight;

    fn add(self, rhs: Weight) -> Weight {
        Weight(self.0 + rhs.0)
    }
}

impl AddAssign for Weight {
    fn add_assign(&mut self, rhs: Weight) {
        self.0 += rhs.0;
    }
}

impl Sum for Weight {
    fn sum<I: Iterator<Item = Weight>>(iter: I) -> Weight {
        iter.fold(Weight::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Weight> for Weight {
    fn sum<I: Iterator<Item = &'a Weight>>(iter: I) -> Weight {
        iter.copied().sum()
    }
}

impl Serialize for Weight {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Weight {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        WeightInput::deserialize(deserializer)?
            .parse()
            .map_err(serde::de::Error::custom)
    }
}

/// Raw weight as it arrives in a request body: a JSON number or a numeric string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum WeightInput {
    Number(f64),
    Text(String),
}

impl WeightInput {
    pub fn parse(&self) -> CoreResult<Weight> {
        match self {
            WeightInput::Number(n) => Decimal::try_from(*n)
                .map_err(|_| {
                    CoreError::Validation(format!("weight {} is not a representable number", n))
                })
                .and_then(Weight::checked),
            WeightInput::Text(s) => Weight::parse(s),
        }
    }
}
