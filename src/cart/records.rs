//! Cart records
//!
//! The persisted cart shape is `{ "items": [CartLine, ...] }`. There is no schema version;
//! older records are recognised structurally and upgraded once, on decode.

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    cart::line::{CartLine, ItemType},
    prices::{Price, PriceTable},
};

/// Persisted cart record, as written.
#[derive(Debug, Serialize)]
struct CartRecord<'a> {
    items: &'a [CartLine],
}

/// Persisted cart record, as read. Lines are decoded one at a time so a malformed line is
/// dropped on its own.
#[derive(Debug, Deserialize)]
struct StoredCart {
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

/// A number as written by the storefront, which does not distinguish integers from floats.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum StoredNumber {
    Integer(i64),
    Float(f64),
}

impl StoredNumber {
    /// Round to a whole number, half away from zero. Non-finite values have none.
    fn whole(self) -> Option<i64> {
        match self {
            StoredNumber::Integer(value) => Some(value),
            StoredNumber::Float(value) => Decimal::from_f64_retain(value)?
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                .to_i64(),
        }
    }
}

/// A stored line. Every field past `id` may be missing on older records.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredLine {
    id: String,

    #[serde(default)]
    item_type: Option<ItemType>,

    #[serde(default)]
    name: String,

    #[serde(default)]
    marca: String,

    #[serde(default)]
    image: String,

    #[serde(default)]
    prices: Option<PriceTable>,

    /// Flat unit price written before tiered prices existed.
    #[serde(default)]
    price: Option<StoredNumber>,

    #[serde(default)]
    qty: Option<StoredNumber>,
}

impl StoredLine {
    /// Upgrade to the current line shape. Lines without a positive quantity are dropped.
    fn upgrade(self) -> Option<CartLine> {
        let qty = self
            .qty
            .and_then(StoredNumber::whole)
            .and_then(|qty| u32::try_from(qty).ok())
            .filter(|qty| *qty > 0)?;

        let prices = self.prices.unwrap_or_else(|| {
            debug!(id = %self.id, "migrating legacy flat price");

            let price = self
                .price
                .and_then(StoredNumber::whole)
                .and_then(|price| u64::try_from(price).ok())
                .map_or(Price::ZERO, Price::new);

            PriceTable::fixed(price)
        });

        Some(CartLine {
            id: self.id,
            item_type: self.item_type.unwrap_or(ItemType::Full),
            name: self.name,
            marca: self.marca,
            image: self.image,
            prices,
            qty,
        })
    }
}

/// Serialise cart lines into the persisted record.
///
/// # Errors
///
/// Returns a [`serde_json::Error`] if serialisation fails.
pub fn encode(items: &[CartLine]) -> Result<String, serde_json::Error> {
    serde_json::to_string(&CartRecord { items })
}

/// Decode a persisted record, upgrading legacy lines.
///
/// Lines sharing a key are merged by summing quantities, keeping the first line's position
/// and snapshot. Fractional quantities and legacy prices are rounded; a line that cannot be
/// read at all is dropped.
///
/// # Errors
///
/// Returns a [`serde_json::Error`] if the record is not valid JSON of the expected shape.
pub fn decode(json: &str) -> Result<Vec<CartLine>, serde_json::Error> {
    let stored: StoredCart = serde_json::from_str(json)?;

    let mut lines: Vec<CartLine> = Vec::with_capacity(stored.items.len());

    let upgraded = stored
        .items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<StoredLine>(item) {
            Ok(line) => line.upgrade(),
            Err(error) => {
                warn!(%error, "dropping unreadable cart line");
                None
            }
        });

    for line in upgraded {
        match lines.iter_mut().find(|existing| existing.matches(&line.key())) {
            Some(existing) => existing.qty = existing.qty.saturating_add(line.qty),
            None => lines.push(line),
        }
    }

    Ok(lines)
}
