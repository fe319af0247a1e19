//! Cart
//!
//! The cart store owns the authoritative list of lines. All mutations go through it, run to
//! completion synchronously and persist the result before returning. Aggregates (counts,
//! tier, totals) are derived from the lines on every read.
//!
//! Two invariants hold after every mutation:
//!
//! - at most one line exists per [`LineKey`];
//! - removing the last full-size line removes every decant line.
//!
//! Decants may still be added to a cart with no full-size line; [`CartStore::checkout`]
//! refuses such a cart.

use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use crate::{
    prices::{Price, PriceTable},
    pricing::{Tier, select_tier},
    products::Product,
    storage::{Clock, ExpiringStorage, KeyValueStore, SystemClock},
};

pub mod line;
pub mod message;
pub mod records;

pub use line::{CartLine, ItemType, LineKey};
pub use message::{MessageLauncher, MockMessageLauncher};

/// Storage key of the persisted cart record.
pub const CART_KEY: &str = "bp-cart";

/// Default `WhatsApp` number orders are sent to.
pub const DEFAULT_WHATSAPP_NUMBER: &str = "5491112345678";

/// Whether the decant-dependency rule currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecantValidity {
    /// No decants, or at least one full-size line alongside them.
    Valid,

    /// Decants present without any full-size line. Checkout is blocked.
    Invalid,
}

/// The cart store.
#[derive(Debug)]
pub struct CartStore<S, C = SystemClock> {
    lines: Vec<CartLine>,
    index: FxHashMap<LineKey, usize>,
    is_open: bool,
    whatsapp_number: String,
    storage: ExpiringStorage<S, C>,
}

impl<S: KeyValueStore, C: Clock> CartStore<S, C> {
    /// Create a store, restoring any unexpired persisted cart.
    ///
    /// A missing, expired or unreadable record yields an empty cart.
    pub fn load(mut storage: ExpiringStorage<S, C>) -> Self {
        let lines = match storage.get(CART_KEY) {
            Ok(Some(json)) => records::decode(&json).unwrap_or_else(|error| {
                warn!(%error, "discarding unreadable persisted cart");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(error) => {
                warn!(%error, "failed to read persisted cart; starting empty");
                Vec::new()
            }
        };

        debug!(lines = lines.len(), "cart restored");

        let mut store = Self {
            lines,
            index: FxHashMap::default(),
            is_open: false,
            whatsapp_number: DEFAULT_WHATSAPP_NUMBER.to_string(),
            storage,
        };
        store.reindex();

        store
    }

    /// Set the number orders are sent to.
    #[must_use]
    pub fn with_whatsapp_number(mut self, number: impl Into<String>) -> Self {
        self.whatsapp_number = number.into();
        self
    }

    /// Lines in insertion order.
    pub fn items(&self) -> &[CartLine] {
        &self.lines
    }

    /// Find a line by key.
    pub fn line(&self, key: &LineKey) -> Option<&CartLine> {
        self.index.get(key).and_then(|&idx| self.lines.get(idx))
    }

    /// Whether the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Whether the cart drawer is shown.
    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Show or hide the cart drawer. Not persisted.
    pub fn set_open(&mut self, open: bool) {
        self.is_open = open;
    }

    /// Total quantity of full-size items.
    pub fn full_count(&self) -> u32 {
        self.count_of(ItemType::Full)
    }

    /// Total quantity of decants.
    pub fn decant_count(&self) -> u32 {
        self.count_of(ItemType::Decant)
    }

    /// Total quantity of all items.
    pub fn count(&self) -> u32 {
        self.full_count().saturating_add(self.decant_count())
    }

    /// Tier selected by the full-size quantity.
    pub fn tier(&self) -> Tier {
        select_tier(self.full_count())
    }

    /// Sum of full-size line totals under the current tier.
    pub fn full_subtotal(&self) -> Price {
        self.subtotal_of(ItemType::Full)
    }

    /// Sum of decant line totals.
    pub fn decant_subtotal(&self) -> Price {
        self.subtotal_of(ItemType::Decant)
    }

    /// Grand total.
    pub fn total(&self) -> Price {
        self.full_subtotal() + self.decant_subtotal()
    }

    /// Current state of the decant-dependency rule.
    pub fn decant_validity(&self) -> DecantValidity {
        if self.decant_count() > 0 && self.full_count() == 0 {
            DecantValidity::Invalid
        } else {
            DecantValidity::Valid
        }
    }

    /// Whether [`checkout`](Self::checkout) would hand the order off.
    pub fn can_checkout(&self) -> bool {
        !self.is_empty() && self.decant_validity() == DecantValidity::Valid
    }

    /// Add one full-size unit of a product with the given price snapshot.
    ///
    /// An existing full-size line for the product is incremented and keeps its original
    /// snapshot. Opens the drawer.
    pub fn add_full(&mut self, product: &Product, prices: PriceTable) {
        self.add(CartLine::full(product, prices));
    }

    /// Add `qty` full-size units, one at a time.
    pub fn add_full_n(&mut self, product: &Product, prices: PriceTable, qty: u32) {
        for _ in 0..qty {
            self.add_full(product, prices);
        }
    }

    /// Add one decant of a product at a fixed price. Opens the drawer.
    ///
    /// Does not require a full-size line; checkout enforces that.
    pub fn add_decant(&mut self, product: &Product, price: Price) {
        self.add(CartLine::decant(product, price));
    }

    /// Add `qty` decants, one at a time.
    pub fn add_decant_n(&mut self, product: &Product, price: Price, qty: u32) {
        for _ in 0..qty {
            self.add_decant(product, price);
        }
    }

    /// Remove a line. If no full-size line remains, every decant line is removed too.
    pub fn remove_line(&mut self, key: &LineKey) {
        let before = self.lines.len();

        self.lines.retain(|line| !line.matches(key));

        if !self.lines.iter().any(CartLine::is_full) {
            self.lines.retain(CartLine::is_full);
        }

        debug!(%key, removed = before - self.lines.len(), "cart line removed");

        self.reindex();
        self.persist();
    }

    /// Set a line's quantity. A quantity of zero or less removes the line, cascade included.
    pub fn update_qty(&mut self, key: &LineKey, qty: i64) {
        let Ok(qty) = u32::try_from(qty) else {
            if qty <= 0 {
                self.remove_line(key);
            } else {
                self.set_qty(key, u32::MAX);
            }
            return;
        };

        if qty == 0 {
            self.remove_line(key);
        } else {
            self.set_qty(key, qty);
        }
    }

    /// Hand the order off to `WhatsApp`.
    ///
    /// Does nothing on an empty cart or while decants are present without a full-size line.
    /// Returns the opened URL when the hand-off happened.
    pub fn checkout(&self, launcher: &dyn MessageLauncher) -> Option<String> {
        if self.is_empty() {
            debug!("checkout ignored: cart is empty");
            return None;
        }

        if self.decant_validity() == DecantValidity::Invalid {
            warn!(
                decants = self.decant_count(),
                "checkout refused: decants require at least one full-size item"
            );
            return None;
        }

        let text = message::compose(&self.lines);
        let url = message::whatsapp_url(&self.whatsapp_number, &text);

        info!(
            lines = self.lines.len(),
            tier = %self.tier(),
            total = %self.total(),
            "handing order off to WhatsApp"
        );

        launcher.open(&url);

        Some(url)
    }

    /// The underlying storage.
    pub fn storage(&self) -> &ExpiringStorage<S, C> {
        &self.storage
    }

    /// Tear the store down, returning its storage.
    pub fn into_storage(self) -> ExpiringStorage<S, C> {
        self.storage
    }

    fn add(&mut self, line: CartLine) {
        let key = line.key();

        match self.index.get(&key).and_then(|&idx| self.lines.get_mut(idx)) {
            Some(existing) => {
                existing.qty = existing.qty.saturating_add(1);
                debug!(%key, qty = existing.qty, "cart line incremented");
            }
            None => {
                debug!(%key, "cart line added");
                self.index.insert(key, self.lines.len());
                self.lines.push(line);
            }
        }

        self.is_open = true;
        self.persist();
    }

    fn set_qty(&mut self, key: &LineKey, qty: u32) {
        let Some(line) = self.index.get(key).and_then(|&idx| self.lines.get_mut(idx)) else {
            debug!(%key, "quantity update for unknown line ignored");
            return;
        };

        line.qty = qty;
        debug!(%key, qty, "cart line quantity set");

        self.persist();
    }

    fn count_of(&self, item_type: ItemType) -> u32 {
        self.lines
            .iter()
            .filter(|line| line.item_type == item_type)
            .map(|line| line.qty)
            .fold(0, u32::saturating_add)
    }

    fn subtotal_of(&self, item_type: ItemType) -> Price {
        let tier = self.tier();

        self.lines
            .iter()
            .filter(|line| line.item_type == item_type)
            .map(|line| line.line_total(tier))
            .sum()
    }

    fn reindex(&mut self) {
        self.index = self
            .lines
            .iter()
            .enumerate()
            .map(|(idx, line)| (line.key(), idx))
            .collect();
    }

    /// Write the lines through; a failed write keeps the in-memory state.
    fn persist(&mut self) {
        let result = records::encode(&self.lines)
            .map_err(crate::storage::StorageError::from)
            .and_then(|json| self.storage.set(CART_KEY, &json));

        if let Err(error) = result {
            warn!(%error, "failed to persist cart; continuing with in-memory state");
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{
        products::ProductPrices,
        storage::{MemoryStore, StorageError, expiring::MockClock, MockKeyValueStore},
    };

    use super::*;

    fn product(id: &str, unit: u64, w3: Option<u64>, w10: Option<u64>) -> Product {
        Product {
            id: id.to_string(),
            nombre: format!("Perfume {id}"),
            marca: "Maison".to_string(),
            precios: Some(ProductPrices {
                unitario: Some(Price::new(unit)),
                mayorista_3: w3.map(Price::new),
                mayorista_10: w10.map(Price::new),
                decant: Some(Price::new(unit / 10)),
            }),
            stock: 5,
            active: true,
            ..Product::default()
        }
    }

    fn store() -> CartStore<MemoryStore> {
        CartStore::load(ExpiringStorage::new(MemoryStore::new()))
    }

    fn silent_launcher() -> MockMessageLauncher {
        let mut launcher = MockMessageLauncher::new();
        launcher.expect_open().never();
        launcher
    }

    #[test]
    fn repeated_adds_increment_a_single_line() {
        let mut cart = store();
        let p1 = product("p1", 100, Some(90), Some(80));

        for _ in 0..3 {
            cart.add_full(&p1, p1.price_table());
        }

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.line(&LineKey::full("p1")).map(|l| l.qty), Some(3));
        assert_eq!(cart.tier(), Tier::Wholesale3);
        assert_eq!(cart.total(), Price::new(270));
    }

    #[test]
    fn full_and_decant_of_same_product_are_distinct_lines() {
        let mut cart = store();
        let p1 = product("p1", 100, None, None);

        cart.add_full(&p1, p1.price_table());
        cart.add_decant(&p1, Price::new(10));
        cart.add_decant(&p1, Price::new(10));

        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.full_count(), 1);
        assert_eq!(cart.decant_count(), 2);
        assert_eq!(cart.count(), 3);
    }

    #[test]
    fn first_snapshot_is_kept_on_increment() {
        let mut cart = store();
        let p1 = product("p1", 100, None, None);

        cart.add_full(&p1, PriceTable::fixed(Price::new(80)));
        cart.add_full(&p1, PriceTable::fixed(Price::new(100)));

        assert_eq!(cart.total(), Price::new(160));
    }

    #[test]
    fn adds_open_the_drawer() {
        let mut cart = store();
        let p1 = product("p1", 100, None, None);

        assert!(!cart.is_open());
        cart.add_decant(&p1, Price::new(10));
        assert!(cart.is_open());

        cart.set_open(false);
        cart.add_full(&p1, p1.price_table());
        assert!(cart.is_open());
    }

    #[test]
    fn decants_never_affect_tier() {
        let mut cart = store();
        let p1 = product("p1", 100, Some(90), Some(80));

        cart.add_full(&p1, p1.price_table());
        cart.add_decant_n(&p1, Price::new(10), 15);

        assert_eq!(cart.tier(), Tier::Unit);
        assert_eq!(cart.total(), Price::new(100 + 150));
    }

    #[test]
    fn removing_last_full_cascades_all_decants() {
        let mut cart = store();
        let p1 = product("p1", 100, None, None);
        let p2 = product("p2", 200, None, None);

        cart.add_full_n(&p1, p1.price_table(), 2);
        cart.add_decant(&p1, Price::new(10));
        cart.add_decant(&p2, Price::new(20));

        cart.remove_line(&LineKey::full("p1"));

        assert!(cart.is_empty());
    }

    #[test]
    fn removing_one_of_several_full_lines_keeps_decants() {
        let mut cart = store();
        let p1 = product("p1", 100, None, None);
        let p2 = product("p2", 200, None, None);

        cart.add_full(&p1, p1.price_table());
        cart.add_full(&p2, p2.price_table());
        cart.add_decant(&p1, Price::new(10));

        cart.remove_line(&LineKey::full("p1"));

        assert_eq!(cart.items().len(), 2);
        assert!(cart.line(&LineKey::decant("p1")).is_some());
        assert!(cart.line(&LineKey::full("p2")).is_some());
    }

    #[test]
    fn removing_a_decant_leaves_full_lines() {
        let mut cart = store();
        let p1 = product("p1", 100, None, None);

        cart.add_full(&p1, p1.price_table());
        cart.add_decant(&p1, Price::new(10));
        cart.remove_line(&LineKey::decant("p1"));

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.decant_count(), 0);
    }

    #[test]
    fn update_qty_sets_absolute_quantity() {
        let mut cart = store();
        let p1 = product("p1", 100, Some(90), Some(80));

        cart.add_full(&p1, p1.price_table());
        cart.update_qty(&LineKey::full("p1"), 12);

        assert_eq!(cart.full_count(), 12);
        assert_eq!(cart.tier(), Tier::Wholesale10);
        assert_eq!(cart.total(), Price::new(960));
    }

    #[test]
    fn update_qty_to_zero_or_less_removes_with_cascade() {
        for qty in [0, -1, i64::MIN] {
            let mut cart = store();
            let p1 = product("p1", 100, None, None);

            cart.add_full(&p1, p1.price_table());
            cart.add_decant(&p1, Price::new(10));
            cart.update_qty(&LineKey::full("p1"), qty);

            assert!(cart.is_empty(), "qty {qty} should empty the cart");
        }
    }

    #[test]
    fn update_qty_on_unknown_line_is_ignored() {
        let mut cart = store();
        let p1 = product("p1", 100, None, None);

        cart.add_full(&p1, p1.price_table());
        cart.update_qty(&LineKey::full("missing"), 5);

        assert_eq!(cart.full_count(), 1);
    }

    #[test]
    fn decant_only_cart_is_invalid() {
        let mut cart = store();
        let p1 = product("p1", 100, None, None);

        cart.add_decant(&p1, Price::new(10));

        assert_eq!(cart.decant_validity(), DecantValidity::Invalid);
        assert!(!cart.can_checkout());
    }

    #[test]
    fn checkout_on_empty_cart_is_a_no_op() {
        let cart = store();

        assert_eq!(cart.checkout(&silent_launcher()), None);
        assert!(cart.is_empty());
    }

    #[test]
    fn checkout_refuses_decants_without_full_items() {
        let mut cart = store();
        let p1 = product("p1", 100, None, None);
        cart.add_decant(&p1, Price::new(10));
        let before = cart.items().to_vec();

        assert_eq!(cart.checkout(&silent_launcher()), None);
        assert_eq!(cart.items(), before.as_slice());
    }

    #[test]
    fn checkout_hands_the_url_to_the_launcher() {
        let mut cart = store().with_whatsapp_number("5491100000000");
        let p1 = product("p1", 100, None, None);
        cart.add_full(&p1, p1.price_table());

        let mut launcher = MockMessageLauncher::new();
        launcher
            .expect_open()
            .withf(|url| url.starts_with("https://wa.me/5491100000000?text=Hola%20Belle"))
            .times(1)
            .return_const(());

        let url = cart.checkout(&launcher);

        assert!(url.is_some_and(|url| url.contains("Total%3A%20%24100")));
    }

    #[test]
    fn mutations_are_persisted_and_restored() {
        let mut cart = store();
        let p1 = product("p1", 100, None, None);

        cart.add_full_n(&p1, p1.price_table(), 2);
        cart.add_decant(&p1, Price::new(10));
        cart.set_open(true);
        let items = cart.items().to_vec();

        let restored = CartStore::load(cart.into_storage());

        assert_eq!(restored.items(), items.as_slice());
        assert!(!restored.is_open());
    }

    #[test]
    fn expired_cart_restores_empty() -> TestResult {
        let written = jiff::Timestamp::from_second(1_700_000_000)?;
        let mut store = MemoryStore::new();
        store.set(CART_KEY, r#"{"items":[{"id":"p1","price":50,"qty":2}]}"#)?;
        store.set(
            crate::storage::expiring::TIMESTAMP_KEY,
            &written.as_millisecond().to_string(),
        )?;

        let mut clock = MockClock::new();
        clock
            .expect_now()
            .return_const(written.checked_add(jiff::SignedDuration::from_hours(24 * 31))?);

        let cart = CartStore::load(ExpiringStorage::with_clock(store, clock));

        assert!(cart.is_empty());

        Ok(())
    }

    #[test]
    fn storage_failures_keep_in_memory_state() {
        let mut kv = MockKeyValueStore::new();
        kv.expect_get().returning(|_| Ok(None));
        kv.expect_set()
            .returning(|_, _| Err(StorageError::Io(std::io::Error::other("quota exceeded"))));

        let mut cart = CartStore::load(ExpiringStorage::new(kv));
        let p1 = product("p1", 100, None, None);

        cart.add_full(&p1, p1.price_table());

        assert_eq!(cart.full_count(), 1);
    }

    #[test]
    fn unreadable_storage_starts_empty() {
        let mut kv = MockKeyValueStore::new();
        kv.expect_get()
            .returning(|_| Err(StorageError::Io(std::io::Error::other("locked"))));

        let cart = CartStore::load(ExpiringStorage::new(kv));

        assert!(cart.is_empty());
    }
}
