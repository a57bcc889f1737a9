//! Odds notations and conversions between them.

use crate::OddsError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// American moneyline odds.
///
/// Positive prices are the profit on a 100 stake, negative prices are the
/// stake needed to profit 100. Construction rejects zero and anything inside
/// (-100, +100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AmericanOdds(i32);

impl AmericanOdds {
    /// Smallest magnitude an American price can have (even money).
    pub const EVEN_MONEY: i32 = 100;

    /// Validate a raw American price.
    pub fn new(price: i32) -> Result<Self, OddsError> {
        if price.unsigned_abs() < Self::EVEN_MONEY as u32 {
            return Err(OddsError::InvalidOddsFormat(price));
        }
        Ok(Self(price))
    }

    /// Raw signed price.
    #[inline]
    pub fn value(self) -> i32 {
        self.0
    }

    /// Whether this is the underdog side (pays more than the stake).
    #[inline]
    pub fn is_underdog(self) -> bool {
        self.0 > 0
    }

    /// Convert to a decimal payout multiplier (stake included).
    ///
    /// `+150` -> `2.5`, `-200` -> `1.5`.
    pub fn to_decimal(self) -> DecimalOdds {
        let price = Decimal::from(self.0);
        let multiplier = if self.0 > 0 {
            price / Decimal::ONE_HUNDRED + Decimal::ONE
        } else {
            Decimal::ONE_HUNDRED / price.abs() + Decimal::ONE
        };
        DecimalOdds(multiplier)
    }
}

/// A price sent as a number, kept only when it is a whole number in `i32`
/// range. `-110.0` becomes `-110`; `-110.5` is dropped.
pub fn whole_american_price(price: f64) -> Option<i32> {
    let whole = price.is_finite()
        && price.fract() == 0.0
        && price >= f64::from(i32::MIN)
        && price <= f64::from(i32::MAX);
    whole.then_some(price as i32)
}

impl TryFrom<i32> for AmericanOdds {
    type Error = OddsError;

    fn try_from(price: i32) -> Result<Self, Self::Error> {
        Self::new(price)
    }
}

impl fmt::Display for AmericanOdds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+}", self.0)
    }
}

/// Decimal odds: total return per unit staked, stake included. Always > 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct DecimalOdds(Decimal);

impl DecimalOdds {
    /// Wrap a decimal multiplier. Returns `None` unless it is above 1.
    pub fn new(multiplier: Decimal) -> Option<Self> {
        (multiplier > Decimal::ONE).then_some(Self(multiplier))
    }

    /// The multiplier.
    #[inline]
    pub fn value(self) -> Decimal {
        self.0
    }

    /// Implied probability of the outcome: `1 / multiplier`.
    #[inline]
    pub fn implied_probability(self) -> Decimal {
        Decimal::ONE / self.0
    }

    /// Convert back to the nearest American price.
    pub fn to_american(self) -> Option<i32> {
        let profit = self.0 - Decimal::ONE;
        let price = if self.0 >= Decimal::TWO {
            profit * Decimal::ONE_HUNDRED
        } else {
            -(Decimal::ONE_HUNDRED / profit)
        };
        price.round().to_i32()
    }
}

impl TryFrom<Decimal> for DecimalOdds {
    type Error = OddsError;

    fn try_from(multiplier: Decimal) -> Result<Self, Self::Error> {
        Self::new(multiplier).ok_or(OddsError::InvalidDecimalOdds(multiplier))
    }
}

impl From<DecimalOdds> for Decimal {
    fn from(odds: DecimalOdds) -> Self {
        odds.0
    }
}

impl fmt::Display for DecimalOdds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}
