//! Canonical set of committed strokes for one room view.
//!
//! DESIGN
//! ======
//! Strokes are keyed by server id in a `BTreeMap`, so iteration order is
//! ascending id regardless of arrival order. Two clients holding the same id
//! set therefore render identically, and later strokes paint over earlier
//! ones. The store is append-only: an id, once present, is never replaced
//! or removed, which makes `insert_if_absent` idempotent and commutative.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::collections::BTreeMap;

use strokes::{Stroke, StrokeId};
use tracing::{debug, warn};

#[derive(Debug, Default)]
pub struct StrokeStore {
    strokes: BTreeMap<StrokeId, Stroke>,
}

impl StrokeStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bulk-load the bootstrap stroke set. Returns the number inserted.
    ///
    /// Strokes that fail committed-stroke validation are dropped with a
    /// warning; duplicates keep the first copy.
    pub fn initialize(&mut self, strokes: impl IntoIterator<Item = Stroke>) -> usize {
        let mut inserted = 0;
        for stroke in strokes {
            if let Err(e) = stroke.validate_committed() {
                warn!(error = %e, "dropping invalid bootstrap stroke");
                continue;
            }
            if self.insert_if_absent(stroke) {
                inserted += 1;
            }
        }
        inserted
    }

    /// Insert `stroke` unless a stroke with the same id is already present.
    ///
    /// Returns whether an insertion happened. Provisional strokes are never
    /// accepted.
    pub fn insert_if_absent(&mut self, stroke: Stroke) -> bool {
        if stroke.is_provisional() {
            debug!("refusing provisional stroke in committed store");
            return false;
        }
        match self.strokes.entry(stroke.id) {
            std::collections::btree_map::Entry::Occupied(_) => false,
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(stroke);
                true
            }
        }
    }

    /// Committed strokes in render order (ascending id).
    pub fn iter(&self) -> impl Iterator<Item = &Stroke> {
        self.strokes.values()
    }

    /// Owned copy of the committed strokes in render order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Stroke> {
        self.iter().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: StrokeId) -> bool {
        self.strokes.contains_key(&id)
    }

    #[must_use]
    pub fn get(&self, id: StrokeId) -> Option<&Stroke> {
        self.strokes.get(&id)
    }

    /// Highest committed id seen so far.
    #[must_use]
    pub fn last_id(&self) -> Option<StrokeId> {
        self.strokes.keys().next_back().copied()
    }
}
