//! Products
//!
//! Product records as delivered by the live catalog feed. Field names follow the feed's
//! Spanish schema on the wire; the core treats every record as immutable input.

use serde::{Deserialize, Serialize};

use crate::prices::{Price, PriceTable};

/// Price table of a catalog product, including the fixed 5ml decant price.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPrices {
    /// Unit price.
    #[serde(default)]
    pub unitario: Option<Price>,

    /// Wholesale price from 3 units.
    #[serde(default)]
    pub mayorista_3: Option<Price>,

    /// Wholesale price from 10 units.
    #[serde(default)]
    pub mayorista_10: Option<Price>,

    /// Fixed price of a 5ml decant, if the product is sold as a decant.
    #[serde(default)]
    pub decant: Option<Price>,
}

/// Promotional override on a product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    /// Whether the offer is currently shown in the promotions view.
    #[serde(default)]
    pub activa: bool,

    /// Absolute offer price; takes precedence over the percentage.
    #[serde(default)]
    pub precio_oferta: Option<Price>,

    /// Percentage off the regular prices (`15` means 15% off).
    #[serde(default)]
    pub porcentaje_desc: Option<f64>,

    /// Badge text.
    #[serde(default)]
    pub etiqueta: Option<String>,
}

/// Product
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier.
    pub id: String,

    /// Display name.
    pub nombre: String,

    /// Brand.
    pub marca: String,

    /// Gender the fragrance is aimed at.
    #[serde(default)]
    pub genero: Option<String>,

    /// Style.
    #[serde(default)]
    pub estilo: Option<String>,

    /// Concentration (EDT, EDP, Extrait, ...).
    #[serde(default)]
    pub concentracion: Option<String>,

    /// Seasons.
    #[serde(default)]
    pub temporadas: Vec<String>,

    /// Times of day.
    #[serde(default)]
    pub horarios: Vec<String>,

    /// Occasions.
    #[serde(default)]
    pub ocasiones: Vec<String>,

    /// Age groups.
    #[serde(default)]
    pub edades: Vec<String>,

    /// Olfactory notes.
    #[serde(default)]
    pub notas: Option<String>,

    /// Free-form description.
    #[serde(default)]
    pub descripcion: Option<String>,

    /// Image URL.
    #[serde(default)]
    pub imagen: Option<String>,

    /// Price table.
    #[serde(default)]
    pub precios: Option<ProductPrices>,

    /// Units in stock. Display only; `<= 0` means unavailable.
    #[serde(default)]
    pub stock: i64,

    /// Promotional override.
    #[serde(default)]
    pub oferta: Option<Offer>,

    /// Whether the record is published.
    #[serde(default)]
    pub active: bool,
}

impl Product {
    /// Unit price, if one is set.
    pub fn unit_price(&self) -> Option<Price> {
        self.precios.and_then(|precios| precios.unitario)
    }

    /// Fixed decant price, if the product is sold as a decant.
    pub fn decant_price(&self) -> Option<Price> {
        self.precios.and_then(|precios| precios.decant)
    }

    /// Whether the product has stock.
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Whether the product can be added to the cart: it needs stock and a non-zero unit price.
    pub fn is_purchasable(&self) -> bool {
        self.in_stock() && self.unit_price().is_some_and(|price| *price > 0)
    }

    /// Whether the product is listed in the promotions view.
    pub fn has_active_offer(&self) -> bool {
        self.oferta.as_ref().is_some_and(|oferta| oferta.activa)
    }

    /// Badge text for the offer: the configured label, else `"{pct}% OFF"`, else `"OFERTA"`.
    pub fn offer_label(&self) -> String {
        let Some(oferta) = &self.oferta else {
            return "OFERTA".to_string();
        };

        match (&oferta.etiqueta, oferta.porcentaje_desc) {
            (Some(etiqueta), _) if !etiqueta.is_empty() => etiqueta.clone(),
            (_, Some(pct)) if pct != 0.0 => format!("{pct}% OFF"),
            _ => "OFERTA".to_string(),
        }
    }

    /// The regular (non-promotional) price snapshot used when adding from the catalog.
    ///
    /// An absent unit price is captured as zero.
    pub fn price_table(&self) -> PriceTable {
        let precios = self.precios.unwrap_or_default();

        PriceTable {
            unitario: Some(precios.unitario.unwrap_or(Price::ZERO)),
            mayorista_3: precios.mayorista_3,
            mayorista_10: precios.mayorista_10,
        }
    }
}

/// Keeps only published products, preserving feed order.
pub fn active_only(products: Vec<Product>) -> Vec<Product> {
    products.into_iter().filter(|product| product.active).collect()
}

/// Products shown in the promotions view.
pub fn on_offer(products: &[Product]) -> impl Iterator<Item = &Product> {
    products.iter().filter(|product| product.has_active_offer())
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn product(stock: i64, unitario: Option<u64>) -> Product {
        Product {
            id: "p1".to_string(),
            nombre: "Rose".to_string(),
            marca: "Maison".to_string(),
            stock,
            precios: Some(ProductPrices {
                unitario: unitario.map(Price::new),
                ..ProductPrices::default()
            }),
            active: true,
            ..Product::default()
        }
    }

    #[test]
    fn purchasable_needs_stock_and_unit_price() {
        assert!(product(1, Some(100)).is_purchasable());
        assert!(!product(0, Some(100)).is_purchasable());
        assert!(!product(-3, Some(100)).is_purchasable());
        assert!(!product(5, None).is_purchasable());
        assert!(!product(5, Some(0)).is_purchasable());
    }

    #[test]
    fn offer_label_prefers_etiqueta_then_percentage() {
        let mut p = product(1, Some(100));
        assert_eq!(p.offer_label(), "OFERTA");

        p.oferta = Some(Offer {
            activa: true,
            porcentaje_desc: Some(15.0),
            ..Offer::default()
        });
        assert_eq!(p.offer_label(), "15% OFF");

        p.oferta = Some(Offer {
            activa: true,
            porcentaje_desc: Some(15.0),
            etiqueta: Some("Hot Sale".to_string()),
            ..Offer::default()
        });
        assert_eq!(p.offer_label(), "Hot Sale");
    }

    #[test]
    fn price_table_captures_absent_unit_as_zero() {
        let p = Product {
            precios: None,
            ..product(1, None)
        };

        assert_eq!(p.price_table(), PriceTable::fixed(Price::ZERO));
    }

    #[test]
    fn deserializes_feed_record() -> TestResult {
        let json = r#"{
            "id": "abc",
            "nombre": "Ambre Sacré",
            "marca": "Maison",
            "temporadas": ["Invierno"],
            "precios": {"unitario": 45000, "mayorista_3": 42000, "decant": 6000},
            "stock": 3,
            "oferta": {"activa": true, "porcentajeDesc": 10, "etiqueta": ""},
            "active": true
        }"#;

        let p: Product = serde_json::from_str(json)?;

        assert_eq!(p.unit_price(), Some(Price::new(45_000)));
        assert_eq!(p.decant_price(), Some(Price::new(6_000)));
        assert_eq!(p.temporadas, vec!["Invierno".to_string()]);
        assert!(p.has_active_offer());
        assert_eq!(p.offer_label(), "10% OFF");

        Ok(())
    }

    #[test]
    fn active_only_drops_unpublished() {
        let published = product(1, Some(1));
        let hidden = Product {
            active: false,
            ..product(1, Some(1))
        };

        assert_eq!(active_only(vec![hidden, published.clone()]), vec![published]);
    }
}
