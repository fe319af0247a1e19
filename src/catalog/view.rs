//! Catalog view
//!
//! Holds the current product snapshot and query, and keeps the ordered results, filter
//! options and visible window in step with them.

use tracing::debug;

use crate::{
    catalog::{CatalogQuery, FilterOptions, VisibleWindow, order},
    products::{Product, active_only},
};

/// A live catalog listing.
#[derive(Debug, Clone, Default)]
pub struct CatalogView {
    products: Vec<Product>,
    query: CatalogQuery,
    results: Vec<usize>,
    options: FilterOptions,
    window: VisibleWindow,
}

impl CatalogView {
    /// Create an empty view revealing `batch_size` results at a time.
    pub fn new(batch_size: usize) -> Self {
        Self {
            window: VisibleWindow::new(batch_size),
            ..Self::default()
        }
    }

    /// Replace the product snapshot, as delivered by the catalog feed. Unpublished records
    /// are dropped.
    pub fn replace_products(&mut self, products: Vec<Product>) {
        self.products = active_only(products);
        self.options = FilterOptions::from_products(&self.products);

        debug!(products = self.products.len(), "catalog snapshot replaced");

        self.recompute();
    }

    /// Replace the query.
    pub fn set_query(&mut self, query: CatalogQuery) {
        self.query = query;
        self.recompute();
    }

    /// Modify the query in place.
    pub fn update_query(&mut self, update: impl FnOnce(&mut CatalogQuery)) {
        update(&mut self.query);
        self.recompute();
    }

    /// Current query.
    pub fn query(&self) -> &CatalogQuery {
        &self.query
    }

    /// Filter options for the current snapshot.
    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    /// Current snapshot.
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Every result, in display order.
    pub fn results(&self) -> impl Iterator<Item = &Product> {
        self.results.iter().filter_map(|&idx| self.products.get(idx))
    }

    /// The results currently revealed.
    pub fn visible(&self) -> impl Iterator<Item = &Product> {
        self.results().take(self.window.visible_count())
    }

    /// Number of results.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether nothing matches.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Whether results remain hidden.
    pub fn has_more(&self) -> bool {
        self.window.has_more()
    }

    /// The end-of-list sentinel became visible: reveal the next batch.
    pub fn on_sentinel_visible(&mut self) -> bool {
        self.window.grow()
    }

    /// Window state.
    pub fn window(&self) -> &VisibleWindow {
        &self.window
    }

    fn recompute(&mut self) {
        self.results = order(&self.products, &self.query);
        self.window.reset(self.results.len());

        debug!(
            results = self.results.len(),
            sort = %self.query.sort,
            filters = self.query.active_filter_count(),
            "catalog results recomputed"
        );
    }
}
