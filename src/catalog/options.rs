//! Filter options
//!
//! The selectable values for each filter dimension, derived from the current product
//! snapshot.

use crate::{
    catalog::{ALL, FilterDimension, collation},
    products::Product,
};

/// Options per dimension. Each list starts with the "all" sentinel, followed by the
/// distinct values found in the catalog in Spanish alphabetical order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOptions {
    options: [Vec<String>; 8],
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self::from_products(&[])
    }
}

impl FilterOptions {
    /// Collect the options offered by a set of products.
    pub fn from_products(products: &[Product]) -> Self {
        let options = FilterDimension::ALL.map(|dimension| {
            let mut values: Vec<String> = Vec::new();

            for value in products.iter().flat_map(|product| dimension.values(product)) {
                if !values.iter().any(|seen| seen == value) {
                    values.push(value.to_string());
                }
            }

            values.sort_by(|a, b| collation::compare(a, b));
            values.insert(0, ALL.to_string());
            values
        });

        Self { options }
    }

    /// Options for one dimension, sentinel first.
    pub fn get(&self, dimension: FilterDimension) -> &[String] {
        self.options
            .get(dimension.slot())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Whether `value` is offered for `dimension`.
    pub fn contains(&self, dimension: FilterDimension, value: &str) -> bool {
        self.get(dimension).iter().any(|option| option == value)
    }
}
