//! Index of live (not soft-deleted) row positions.
//!
//! Supports O(1) uniform picks and O(1) removal by keeping, for every row, the
//! slot it occupies in the dense `live` vector. Removal swaps the last live
//! position into the vacated slot.

use rand::Rng;

#[derive(Debug, Default, Clone)]
pub struct LiveIndex {
    /// Dense list of live row positions
    live: Vec<usize>,
    /// For each row position, its slot in `live` (None once deleted)
    slot: Vec<Option<usize>>,
}

impl LiveIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from per-row deletion flags, in row order
    pub fn from_deleted_flags<I: IntoIterator<Item = bool>>(flags: I) -> Self {
        let mut index = Self::new();
        for deleted in flags {
            index.push(!deleted);
        }
        index
    }

    /// Register the next row position
    pub fn push(&mut self, is_live: bool) {
        if is_live {
            self.slot.push(Some(self.live.len()));
            self.live.push(self.slot.len() - 1);
        } else {
            self.slot.push(None);
        }
    }

    /// Remove a row from the live set. Returns false if it was not live.
    pub fn remove(&mut self, row: usize) -> bool {
        let Some(slot) = self.slot.get(row).copied().flatten() else {
            return false;
        };

        self.live.swap_remove(slot);
        if let Some(&moved) = self.live.get(slot) {
            self.slot[moved] = Some(slot);
        }
        self.slot[row] = None;
        true
    }

    /// Pick a live row uniformly at random
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<usize> {
        if self.live.is_empty() {
            return None;
        }
        Some(self.live[rng.random_range(0..self.live.len())])
    }

    pub fn contains(&self, row: usize) -> bool {
        matches!(self.slot.get(row), Some(Some(_)))
    }

    /// Number of live rows
    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Number of rows tracked, live or not
    pub fn tracked(&self) -> usize {
        self.slot.len()
    }
}
