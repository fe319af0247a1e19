//! Catalog
//!
//! The filter/sort pipeline turning a product snapshot and a query into the ordered list
//! shown in the catalog. Products without stock always sink below those with stock,
//! whatever the sort.

use std::{cmp::Ordering, convert::Infallible, fmt, str::FromStr};

use smallvec::SmallVec;

use crate::products::Product;

pub mod collation;
pub mod options;
pub mod view;
pub mod window;

pub use options::FilterOptions;
pub use view::CatalogView;
pub use window::VisibleWindow;

/// Sentinel selection meaning "no filter".
pub const ALL: &str = "Todas";

/// A selection for one filter dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Filter {
    /// No filtering on this dimension.
    #[default]
    All,

    /// Keep products carrying this value.
    Value(String),
}

impl Filter {
    /// Whether this selection filters anything.
    pub fn is_active(&self) -> bool {
        matches!(self, Filter::Value(_))
    }
}

impl From<&str> for Filter {
    fn from(value: &str) -> Self {
        if value == ALL {
            Filter::All
        } else {
            Filter::Value(value.to_string())
        }
    }
}

impl FromStr for Filter {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Filter::from(s))
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::All => f.write_str(ALL),
            Filter::Value(value) => f.write_str(value),
        }
    }
}

/// The eight categorical filter dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum FilterDimension {
    /// Gender (single-valued).
    Genero,

    /// Style (single-valued).
    Estilo,

    /// Concentration (single-valued).
    Concentracion,

    /// Brand (single-valued).
    Marca,

    /// Seasons (multi-valued).
    Temporada,

    /// Times of day (multi-valued).
    Horario,

    /// Occasions (multi-valued).
    Ocasion,

    /// Age groups (multi-valued).
    Edad,
}

impl FilterDimension {
    /// Every dimension, in display order.
    pub const ALL: [FilterDimension; 8] = [
        FilterDimension::Genero,
        FilterDimension::Estilo,
        FilterDimension::Concentracion,
        FilterDimension::Marca,
        FilterDimension::Temporada,
        FilterDimension::Horario,
        FilterDimension::Ocasion,
        FilterDimension::Edad,
    ];

    /// Values a product carries on this dimension. Empty strings are ignored.
    pub fn values(self, product: &Product) -> SmallVec<[&str; 4]> {
        let mut values: SmallVec<[&str; 4]> = match self {
            FilterDimension::Genero => product.genero.as_deref().into_iter().collect(),
            FilterDimension::Estilo => product.estilo.as_deref().into_iter().collect(),
            FilterDimension::Concentracion => {
                product.concentracion.as_deref().into_iter().collect()
            }
            FilterDimension::Marca => std::iter::once(product.marca.as_str()).collect(),
            FilterDimension::Temporada => product.temporadas.iter().map(String::as_str).collect(),
            FilterDimension::Horario => product.horarios.iter().map(String::as_str).collect(),
            FilterDimension::Ocasion => product.ocasiones.iter().map(String::as_str).collect(),
            FilterDimension::Edad => product.edades.iter().map(String::as_str).collect(),
        };

        values.retain(|value| !value.is_empty());
        values
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// Selections for all eight dimensions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    selections: [Filter; 8],
}

impl Filters {
    /// Selection for a dimension.
    pub fn get(&self, dimension: FilterDimension) -> &Filter {
        self.selections
            .get(dimension.slot())
            .unwrap_or(&Filter::All)
    }

    /// Replace the selection for a dimension.
    pub fn set(&mut self, dimension: FilterDimension, filter: impl Into<Filter>) {
        if let Some(slot) = self.selections.get_mut(dimension.slot()) {
            *slot = filter.into();
        }
    }

    /// Number of dimensions with an active selection.
    pub fn active_count(&self) -> usize {
        self.selections.iter().filter(|f| f.is_active()).count()
    }

    /// Whether a product passes every active selection.
    pub fn matches(&self, product: &Product) -> bool {
        FilterDimension::ALL
            .iter()
            .all(|&dimension| match self.get(dimension) {
                Filter::All => true,
                Filter::Value(wanted) => dimension.values(product).contains(&wanted.as_str()),
            })
    }
}

/// Catalog ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum SortKey {
    /// Repository order.
    #[default]
    Relevance,

    /// Cheapest first.
    PriceAsc,

    /// Most expensive first.
    PriceDesc,

    /// Name A→Z.
    NameAsc,

    /// Name Z→A.
    NameDesc,

    /// Brand A→Z, then name.
    BrandAsc,

    /// Most stock first.
    StockDesc,
}

impl SortKey {
    /// Every sort key, in display order.
    pub const ALL: [SortKey; 7] = [
        SortKey::Relevance,
        SortKey::PriceAsc,
        SortKey::PriceDesc,
        SortKey::NameAsc,
        SortKey::NameDesc,
        SortKey::BrandAsc,
        SortKey::StockDesc,
    ];

    /// Storefront label.
    pub const fn label(self) -> &'static str {
        match self {
            SortKey::Relevance => "Relevancia",
            SortKey::PriceAsc => "Precio: menor a mayor",
            SortKey::PriceDesc => "Precio: mayor a menor",
            SortKey::NameAsc => "Nombre A-Z",
            SortKey::NameDesc => "Nombre Z-A",
            SortKey::BrandAsc => "Marca A-Z",
            SortKey::StockDesc => "Mayor stock",
        }
    }

    /// Compare two products under this key. Relevance considers every pair equal.
    pub fn compare(self, a: &Product, b: &Product) -> Ordering {
        match self {
            SortKey::Relevance => Ordering::Equal,
            SortKey::PriceAsc => sort_price(a).cmp(&sort_price(b)),
            SortKey::PriceDesc => sort_price(b).cmp(&sort_price(a)),
            SortKey::NameAsc => collation::compare(&a.nombre, &b.nombre),
            SortKey::NameDesc => collation::compare(&b.nombre, &a.nombre),
            SortKey::BrandAsc => collation::compare(&a.marca, &b.marca)
                .then_with(|| collation::compare(&a.nombre, &b.nombre)),
            SortKey::StockDesc => b.stock.cmp(&a.stock),
        }
    }
}

/// Unit price for ordering; absent prices count as zero.
fn sort_price(product: &Product) -> u64 {
    product.unit_price().map_or(0, |price| *price)
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Errors parsing a sort label.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown sort option: {0}")]
pub struct UnknownSortKey(String);

impl FromStr for SortKey {
    type Err = UnknownSortKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortKey::ALL
            .into_iter()
            .find(|key| key.label() == s)
            .ok_or_else(|| UnknownSortKey(s.to_string()))
    }
}

/// A catalog query: free text, eight filters and a sort key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    /// Free-text search.
    pub search: String,

    /// Categorical filters.
    pub filters: Filters,

    /// Ordering.
    pub sort: SortKey,
}

impl CatalogQuery {
    /// Reset the search text and every filter. The sort key is kept.
    pub fn clear_filters(&mut self) {
        self.search.clear();
        self.filters = Filters::default();
    }

    /// Number of active filters (search excluded).
    pub fn active_filter_count(&self) -> usize {
        self.filters.active_count()
    }

    /// Whether a product passes the search and every filter.
    pub fn matches(&self, product: &Product) -> bool {
        matches_search(product, &self.search) && self.filters.matches(product)
    }
}

/// Case-insensitive substring match against name, brand, concentration, notes and
/// description. An empty search matches everything.
pub fn matches_search(product: &Product, search: &str) -> bool {
    if search.is_empty() {
        return true;
    }

    let needle = search.to_lowercase();

    [
        Some(product.nombre.as_str()),
        Some(product.marca.as_str()),
        product.concentracion.as_deref(),
        product.notas.as_deref(),
        product.descripcion.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|field| field.to_lowercase().contains(&needle))
}

/// Run the pipeline, returning positions into `products`.
///
/// Matching products are split by stock; each partition is sorted on its own (stably) and
/// the out-of-stock partition is appended after the in-stock one.
pub fn order(products: &[Product], query: &CatalogQuery) -> Vec<usize> {
    let (mut available, mut unavailable): (Vec<usize>, Vec<usize>) = products
        .iter()
        .enumerate()
        .filter(|(_, product)| query.matches(product))
        .map(|(idx, _)| idx)
        .partition(|&idx| products.get(idx).is_some_and(Product::in_stock));

    // Stable: relevance keeps repository order.
    let by = |a: &usize, b: &usize| match (products.get(*a), products.get(*b)) {
        (Some(a), Some(b)) => query.sort.compare(a, b),
        _ => Ordering::Equal,
    };

    available.sort_by(by);
    unavailable.sort_by(by);

    available.extend(unavailable);
    available
}

/// Run the pipeline, returning the ordered products.
pub fn filter_and_sort<'a>(products: &'a [Product], query: &CatalogQuery) -> Vec<&'a Product> {
    order(products, query)
        .into_iter()
        .filter_map(|idx| products.get(idx))
        .collect()
}
