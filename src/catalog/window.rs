//! Visible window
//!
//! Progressive reveal of a result list in fixed-size batches, driven by a sentinel at the
//! end of the rendered list becoming visible.

/// Default batch size.
pub const DEFAULT_BATCH_SIZE: usize = 12;

/// The prefix of the result list currently shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleWindow {
    batch_size: usize,
    visible: usize,
    total: usize,
}

impl Default for VisibleWindow {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

impl VisibleWindow {
    /// Create an empty window revealing `batch_size` results at a time. A zero batch size
    /// is treated as one.
    pub fn new(batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);

        Self {
            batch_size,
            visible: batch_size,
            total: 0,
        }
    }

    /// Results revealed per batch.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Start over for a new result list of `total` entries: one batch is visible.
    pub fn reset(&mut self, total: usize) {
        self.visible = self.batch_size;
        self.total = total;
    }

    /// Reveal the next batch. Returns whether anything new became visible.
    pub fn grow(&mut self) -> bool {
        if !self.has_more() {
            return false;
        }

        self.visible = self.visible.saturating_add(self.batch_size).min(self.total);

        true
    }

    /// Number of results shown.
    pub fn visible_count(&self) -> usize {
        self.visible.min(self.total)
    }

    /// Whether results remain hidden; the sentinel is rendered only while this holds.
    pub fn has_more(&self) -> bool {
        self.visible < self.total
    }

    /// Total results in the underlying list.
    pub fn total(&self) -> usize {
        self.total
    }
}
