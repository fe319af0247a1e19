//! Prices

use std::{fmt, iter::Sum, ops::Add, ops::Deref};

use serde::{Deserialize, Serialize};

/// Represents a price in whole currency units (pesos).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price {
    value: u64,
}

impl Price {
    /// A zero price.
    pub const ZERO: Price = Price { value: 0 };

    /// Creates a new Price
    pub const fn new(value: u64) -> Self {
        Price { value }
    }

    /// Multiplies the price by a quantity, saturating on overflow.
    #[must_use]
    pub fn times(self, qty: u32) -> Self {
        Price {
            value: self.value.saturating_mul(u64::from(qty)),
        }
    }
}

impl Deref for Price {
    type Target = u64;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl From<u64> for Price {
    fn from(value: u64) -> Self {
        Price::new(value)
    }
}

impl Add for Price {
    type Output = Price;

    fn add(self, rhs: Self) -> Self::Output {
        Price {
            value: self.value.saturating_add(rhs.value),
        }
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Price::ZERO, Add::add)
    }
}

/// Formats the amount with `es-AR` digit grouping (`1.234.567`).
impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.value.to_string();
        let len = digits.len();

        for (idx, digit) in digits.chars().enumerate() {
            if idx > 0 && (len - idx) % 3 == 0 {
                f.write_str(".")?;
            }

            write!(f, "{digit}")?;
        }

        Ok(())
    }
}

/// A tiered price table: unit price plus optional wholesale prices for 3+ and 10+ units.
///
/// `unitario` may be absent on catalog records; it is always present on cart snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTable {
    /// Price per unit when no wholesale tier applies.
    #[serde(default)]
    pub unitario: Option<Price>,

    /// Price per unit from 3 full units upwards.
    #[serde(default)]
    pub mayorista_3: Option<Price>,

    /// Price per unit from 10 full units upwards.
    #[serde(default)]
    pub mayorista_10: Option<Price>,
}

impl PriceTable {
    /// A table with a single fixed price and no wholesale tiers.
    pub fn fixed(price: Price) -> Self {
        PriceTable {
            unitario: Some(price),
            mayorista_3: None,
            mayorista_10: None,
        }
    }
}
