//! Pricing
//!
//! Tier selection and per-unit price resolution. Every function here is pure; absent
//! prices resolve through fallback chains and never produce an error.

use std::fmt;

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    prices::{Price, PriceTable},
    products::Product,
};

/// Wholesale pricing band, selected by the total quantity of full-size items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    /// Fewer than 3 full units.
    #[default]
    #[serde(rename = "unitario")]
    Unit,

    /// 3 to 9 full units.
    #[serde(rename = "mayorista_3")]
    Wholesale3,

    /// 10 or more full units.
    #[serde(rename = "mayorista_10")]
    Wholesale10,
}

impl Tier {
    /// Label shown to the customer and in the checkout message.
    pub const fn label(self) -> &'static str {
        match self {
            Tier::Unit => "Unitario",
            Tier::Wholesale3 => "Mayorista 3+",
            Tier::Wholesale10 => "Mayorista 10+",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Selects the tier for a total full-item quantity. Lower bounds are inclusive.
pub const fn select_tier(total_full_qty: u32) -> Tier {
    if total_full_qty >= 10 {
        Tier::Wholesale10
    } else if total_full_qty >= 3 {
        Tier::Wholesale3
    } else {
        Tier::Unit
    }
}

/// Resolves the per-unit price of a table under a tier.
///
/// A missing 10+ price falls back to the 3+ price before the unit price. A missing unit
/// price resolves to zero.
pub fn effective_price(table: &PriceTable, tier: Tier) -> Price {
    let wholesale = match tier {
        Tier::Wholesale10 => table.mayorista_10.or(table.mayorista_3),
        Tier::Wholesale3 => table.mayorista_3,
        Tier::Unit => None,
    };

    wholesale.or(table.unitario).unwrap_or(Price::ZERO)
}

/// Per-unit price of a decant snapshot: always its fixed unit price, whatever the quantity.
pub fn decant_price(table: &PriceTable) -> Price {
    table.unitario.unwrap_or(Price::ZERO)
}

/// The promotional unit price of a product.
///
/// An absolute offer price wins; otherwise the percentage is applied to the unit price and
/// rounded to the nearest whole unit; otherwise the regular unit price (or zero).
pub fn offer_price(product: &Product) -> Price {
    let unitario = product.unit_price();
    let oferta = product.oferta.as_ref();

    if let Some(price) = oferta.and_then(|oferta| oferta.precio_oferta) {
        return price;
    }

    match (oferta.and_then(|oferta| oferta.porcentaje_desc), unitario) {
        (Some(pct), Some(unitario)) => percent_off(unitario, pct),
        _ => unitario.unwrap_or(Price::ZERO),
    }
}

/// The price snapshot for a full item added from the promotions view.
///
/// The unit price is [`offer_price`]; when the offer is a percentage, each wholesale price is
/// discounted and rounded independently.
pub fn offer_prices(product: &Product) -> PriceTable {
    let precios = product.precios.unwrap_or_default();
    let pct = product
        .oferta
        .as_ref()
        .and_then(|oferta| oferta.porcentaje_desc);

    let discount = |price: Option<Price>| match pct {
        Some(pct) => price.map(|price| percent_off(price, pct)),
        None => price,
    };

    PriceTable {
        unitario: Some(offer_price(product)),
        mayorista_3: discount(precios.mayorista_3),
        mayorista_10: discount(precios.mayorista_10),
    }
}

/// Applies a percentage discount (`15.0` = 15% off), rounding half away from zero.
///
/// Discounts above 100% clamp to zero. If the percentage cannot be represented, the price is
/// returned undiscounted.
fn percent_off(price: Price, pct: f64) -> Price {
    let Some(off) = Decimal::from_f64_retain(pct)
        .and_then(|pct| pct.checked_div(Decimal::ONE_HUNDRED))
        .map(Percentage::from)
    else {
        warn!(pct, "offer percentage is not finite; ignoring discount");
        return price;
    };

    let discounted = percent_of(off, price)
        .and_then(|discount| Decimal::from(*price).checked_sub(discount))
        .map(|value| {
            value
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                .max(Decimal::ZERO)
        })
        .and_then(|value| value.to_u64());

    match discounted {
        Some(value) => Price::new(value),
        None => {
            warn!(%price, pct, "discounted price out of range; ignoring discount");
            price
        }
    }
}

/// The unrounded share of `price` a percentage represents.
fn percent_of(percent: Percentage, price: Price) -> Option<Decimal> {
    (percent * Decimal::ONE).checked_mul(Decimal::from(*price))
}
