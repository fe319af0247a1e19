//! Cart lines

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    prices::{Price, PriceTable},
    pricing::{Tier, decant_price, effective_price},
    products::Product,
};

/// Whether a line is a full-size bottle or a fixed-price 5ml decant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    /// Full-size product.
    #[default]
    Full,

    /// 5ml decant of the product.
    Decant,
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemType::Full => f.write_str("full"),
            ItemType::Decant => f.write_str("decant"),
        }
    }
}

/// Identity of a cart line: at most one line exists per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineKey {
    /// Product the line refers to.
    pub product_id: String,

    /// Full or decant.
    pub item_type: ItemType,
}

impl LineKey {
    /// Key of the full-size line for a product.
    pub fn full(product_id: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            item_type: ItemType::Full,
        }
    }

    /// Key of the decant line for a product.
    pub fn decant(product_id: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            item_type: ItemType::Decant,
        }
    }
}

impl fmt::Display for LineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.product_id, self.item_type)
    }
}

/// A single cart entry.
///
/// Display fields and prices are a snapshot taken when the line was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Product id.
    pub id: String,

    /// Full or decant.
    pub item_type: ItemType,

    /// Product name.
    pub name: String,

    /// Brand.
    pub marca: String,

    /// Image URL.
    pub image: String,

    /// Price snapshot. Decant lines hold the decant price as `unitario` and no wholesale prices.
    pub prices: PriceTable,

    /// Quantity, always positive.
    pub qty: u32,
}

impl CartLine {
    /// A new full-size line with quantity 1.
    pub fn full(product: &Product, prices: PriceTable) -> Self {
        Self::snapshot(product, ItemType::Full, prices)
    }

    /// A new decant line with quantity 1.
    pub fn decant(product: &Product, price: Price) -> Self {
        Self::snapshot(product, ItemType::Decant, PriceTable::fixed(price))
    }

    fn snapshot(product: &Product, item_type: ItemType, prices: PriceTable) -> Self {
        Self {
            id: product.id.clone(),
            item_type,
            name: product.nombre.clone(),
            marca: product.marca.clone(),
            image: product.imagen.clone().unwrap_or_default(),
            prices,
            qty: 1,
        }
    }

    /// The line's identity.
    pub fn key(&self) -> LineKey {
        LineKey {
            product_id: self.id.clone(),
            item_type: self.item_type,
        }
    }

    /// Whether this line matches `key`.
    pub fn matches(&self, key: &LineKey) -> bool {
        self.item_type == key.item_type && self.id == key.product_id
    }

    /// Whether this is a full-size line.
    pub fn is_full(&self) -> bool {
        self.item_type == ItemType::Full
    }

    /// Whether this is a decant line.
    pub fn is_decant(&self) -> bool {
        self.item_type == ItemType::Decant
    }

    /// Per-unit price under the cart's tier. Decants ignore the tier.
    pub fn unit_price(&self, tier: Tier) -> Price {
        match self.item_type {
            ItemType::Full => effective_price(&self.prices, tier),
            ItemType::Decant => decant_price(&self.prices),
        }
    }

    /// Unit price times quantity.
    pub fn line_total(&self, tier: Tier) -> Price {
        self.unit_price(tier).times(self.qty)
    }
}
