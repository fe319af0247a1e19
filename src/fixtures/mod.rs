//! Fixtures
//!
//! Product snapshots loaded from disk, standing in for the live catalog feed. A file holds
//! either a bare list of products or a `products:` list; `.json` files are read as JSON and
//! everything else as YAML.

use std::{fs, path::Path};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::products::{Product, active_only};

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// JSON parsing error
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Two records share an id
    #[error("Duplicate product id: {0}")]
    DuplicateId(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProductsFixture {
    Wrapped { products: Vec<Product> },
    Bare(Vec<Product>),
}

impl ProductsFixture {
    fn into_products(self) -> Vec<Product> {
        match self {
            ProductsFixture::Wrapped { products } | ProductsFixture::Bare(products) => products,
        }
    }
}

/// Load a product snapshot, keeping published records only, in file order.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if two records share an id.
pub fn load_products(path: impl AsRef<Path>) -> Result<Vec<Product>, FixtureError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let is_json = path
        .extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("json"));

    let products = if is_json {
        parse_json(&contents)?
    } else {
        parse_yaml(&contents)?
    };

    debug!(path = %path.display(), products = products.len(), "loaded product fixture");

    Ok(products)
}

/// Parse a YAML product snapshot.
///
/// # Errors
///
/// Returns an error if the document is malformed or two records share an id.
pub fn parse_yaml(contents: &str) -> Result<Vec<Product>, FixtureError> {
    let fixture: ProductsFixture = serde_norway::from_str(contents)?;

    finish(fixture)
}

/// Parse a JSON product snapshot.
///
/// # Errors
///
/// Returns an error if the document is malformed or two records share an id.
pub fn parse_json(contents: &str) -> Result<Vec<Product>, FixtureError> {
    let fixture: ProductsFixture = serde_json::from_str(contents)?;

    finish(fixture)
}

fn finish(fixture: ProductsFixture) -> Result<Vec<Product>, FixtureError> {
    let products = fixture.into_products();

    for (idx, product) in products.iter().enumerate() {
        if products.iter().take(idx).any(|seen| seen.id == product.id) {
            return Err(FixtureError::DuplicateId(product.id.clone()));
        }
    }

    Ok(active_only(products))
}
