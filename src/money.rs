use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Money in currency minor units. Always non-negative; arithmetic is checked so
/// an overdraft surfaces as `None` instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn new(minor_units: u64) -> Self {
        Money(minor_units)
    }

    /// get underlying minor units
    pub fn minor_units(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    pub fn saturating_add(self, other: Money) -> Money {
        Money(self.0.saturating_add(other.0))
    }

    /// difference floored at zero
    pub fn saturating_sub(self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0))
    }

    /// true when this amount is a whole number of `unit`s; a zero unit never divides
    pub fn is_multiple_of(&self, unit: Money) -> bool {
        unit.0 != 0 && self.0 % unit.0 == 0
    }

    /// `self * percent / 100`, truncated
    pub fn percentage(&self, percent: u32) -> Option<Money> {
        self.0
            .checked_mul(u64::from(percent))
            .map(|scaled| Money(scaled / 100))
    }

    /// `self / divisor`, truncated; `None` for a zero divisor
    pub fn checked_div(&self, divisor: u32) -> Option<Money> {
        self.0.checked_div(u64::from(divisor)).map(Money)
    }

    /// sum of all amounts, `None` on overflow
    pub fn checked_sum<I: IntoIterator<Item = Money>>(amounts: I) -> Option<Money> {
        amounts
            .into_iter()
            .try_fold(Money::ZERO, |acc, m| acc.checked_add(m))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Money {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(Money)
    }
}

impl From<u64> for Money {
    fn from(units: u64) -> Self {
        Money(units)
    }
}

impl From<u32> for Money {
    fn from(units: u32) -> Self {
        Money(u64::from(units))
    }
}
