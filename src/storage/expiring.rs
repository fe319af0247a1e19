//! Expiring storage
//!
//! Sliding-window expiry on top of a [`KeyValueStore`]. A sibling key records the
//! time of the last write as Unix milliseconds; a read older than the window evicts both
//! keys and reports nothing stored.

use jiff::{SignedDuration, Timestamp};
use mockall::automock;
use tracing::{debug, info};

use super::{KeyValueStore, StorageError};

/// Default key holding the last-write timestamp.
pub const TIMESTAMP_KEY: &str = "bp-cart-ts";

/// Default expiry window: 30 days of inactivity.
pub const EXPIRY: SignedDuration = SignedDuration::from_hours(30 * 24);

/// Source of the current time.
#[automock]
pub trait Clock {
    /// The current instant.
    fn now(&self) -> Timestamp;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A [`KeyValueStore`] wrapper whose data expires after a period without writes.
#[derive(Debug)]
pub struct ExpiringStorage<S, C = SystemClock> {
    store: S,
    clock: C,
    timestamp_key: String,
    expiry: SignedDuration,
}

impl<S: KeyValueStore> ExpiringStorage<S> {
    /// Wrap a store with the default timestamp key, window and the wall clock.
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: KeyValueStore, C: Clock> ExpiringStorage<S, C> {
    /// Wrap a store with a custom clock.
    pub fn with_clock(store: S, clock: C) -> Self {
        Self {
            store,
            clock,
            timestamp_key: TIMESTAMP_KEY.to_string(),
            expiry: EXPIRY,
        }
    }

    /// Override the expiry window.
    #[must_use]
    pub fn expiry(mut self, expiry: SignedDuration) -> Self {
        self.expiry = expiry;
        self
    }

    /// Override the timestamp key.
    #[must_use]
    pub fn timestamp_key(mut self, key: impl Into<String>) -> Self {
        self.timestamp_key = key.into();
        self
    }

    /// Read `key`, evicting it (and the timestamp) if the window has elapsed.
    ///
    /// An unparseable timestamp never expires the data.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the underlying store fails.
    pub fn get(&mut self, key: &str) -> Result<Option<String>, StorageError> {
        let last_write = self
            .store
            .get(&self.timestamp_key)?
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .and_then(|millis| Timestamp::from_millisecond(millis).ok());

        if let Some(last_write) = last_write {
            let age = self.clock.now().duration_since(last_write);

            if age > self.expiry {
                info!(key, %last_write, "stored data expired; evicting");

                self.store.remove(key)?;
                self.store.remove(&self.timestamp_key)?;

                return Ok(None);
            }
        }

        self.store.get(key)
    }

    /// Write `value` under `key` and refresh the timestamp to now.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the underlying store fails.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let now = self.clock.now();

        self.store.set(key, value)?;
        self.store
            .set(&self.timestamp_key, &now.as_millisecond().to_string())?;

        debug!(key, %now, "stored data refreshed");

        Ok(())
    }

    /// Delete `key` together with the timestamp.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the underlying store fails.
    pub fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.store.remove(key)?;
        self.store.remove(&self.timestamp_key)
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.store
    }

    /// Unwrap into the underlying store.
    pub fn into_inner(self) -> S {
        self.store
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use testresult::TestResult;

    use crate::storage::{MemoryStore, MockKeyValueStore};

    use super::*;

    /// A clock tests can move forward.
    #[derive(Debug)]
    struct ManualClock(Cell<Timestamp>);

    impl ManualClock {
        fn advance(&self, by: SignedDuration) -> TestResult {
            self.0.set(self.0.get().checked_add(by)?);
            Ok(())
        }
    }

    impl Clock for &ManualClock {
        fn now(&self) -> Timestamp {
            self.0.get()
        }
    }

    fn start() -> Result<Timestamp, jiff::Error> {
        Timestamp::from_second(1_700_000_000)
    }

    #[test]
    fn set_writes_value_and_timestamp() -> TestResult {
        let clock = ManualClock(Cell::new(start()?));
        let mut storage = ExpiringStorage::with_clock(MemoryStore::new(), &clock);

        storage.set("bp-cart", "data")?;

        assert_eq!(storage.inner().get("bp-cart")?, Some("data".to_string()));
        assert_eq!(
            storage.inner().get(TIMESTAMP_KEY)?,
            Some("1700000000000".to_string())
        );

        Ok(())
    }

    #[test]
    fn get_within_window_returns_value() -> TestResult {
        let clock = ManualClock(Cell::new(start()?));
        let mut storage = ExpiringStorage::with_clock(MemoryStore::new(), &clock);

        storage.set("bp-cart", "data")?;
        clock.advance(SignedDuration::from_hours(30 * 24))?;

        assert_eq!(storage.get("bp-cart")?, Some("data".to_string()));

        Ok(())
    }

    #[test]
    fn get_after_window_evicts_both_keys() -> TestResult {
        let clock = ManualClock(Cell::new(start()?));
        let mut storage = ExpiringStorage::with_clock(MemoryStore::new(), &clock);

        storage.set("bp-cart", "data")?;
        clock.advance(SignedDuration::from_hours(30 * 24) + SignedDuration::from_millis(1))?;

        assert_eq!(storage.get("bp-cart")?, None);
        assert!(storage.inner().is_empty());

        Ok(())
    }

    #[test]
    fn every_write_slides_the_window() -> TestResult {
        let clock = ManualClock(Cell::new(start()?));
        let mut storage = ExpiringStorage::with_clock(MemoryStore::new(), &clock);

        storage.set("bp-cart", "v1")?;
        clock.advance(SignedDuration::from_hours(20 * 24))?;
        storage.set("bp-cart", "v2")?;
        clock.advance(SignedDuration::from_hours(20 * 24))?;

        assert_eq!(storage.get("bp-cart")?, Some("v2".to_string()));

        Ok(())
    }

    #[test]
    fn unparseable_timestamp_never_expires() -> TestResult {
        let mut store = MemoryStore::new();
        store.set("bp-cart", "data")?;
        store.set(TIMESTAMP_KEY, "garbage")?;

        let mut storage = ExpiringStorage::with_clock(store, SystemClock);

        assert_eq!(storage.get("bp-cart")?, Some("data".to_string()));

        Ok(())
    }

    #[test]
    fn remove_deletes_value_and_timestamp() -> TestResult {
        let mut storage = ExpiringStorage::new(MemoryStore::new());

        storage.set("bp-cart", "data")?;
        storage.remove("bp-cart")?;

        assert!(storage.inner().is_empty());

        Ok(())
    }

    #[test]
    fn underlying_failure_is_propagated() {
        let mut store = MockKeyValueStore::new();
        store
            .expect_set()
            .returning(|_, _| Err(StorageError::Io(std::io::Error::other("disk full"))));

        let mut storage = ExpiringStorage::new(store);

        assert!(matches!(
            storage.set("bp-cart", "data"),
            Err(StorageError::Io(_))
        ));
    }

    #[test]
    fn mocked_clock_controls_expiry() -> TestResult {
        let written = start()?;
        let mut store = MemoryStore::new();
        store.set("bp-cart", "data")?;
        store.set(TIMESTAMP_KEY, &written.as_millisecond().to_string())?;

        let mut clock = MockClock::new();
        let later = written.checked_add(SignedDuration::from_hours(31 * 24))?;
        clock.expect_now().return_const(later);

        let mut storage = ExpiringStorage::with_clock(store, clock);

        assert_eq!(storage.get("bp-cart")?, None);

        Ok(())
    }
}
