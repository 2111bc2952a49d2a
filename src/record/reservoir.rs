//! Reservoir sampling implementation (Algorithm R).
//!
//! Provides uniform random sampling over a stream of items
//! with a fixed-size reservoir. The simulator uses a reservoir of one to pick
//! a live row in a single pass when no live index is maintained.

use rand::Rng;

/// Reservoir sampler using Algorithm R.
///
/// Maintains a fixed-size sample of items seen so far,
/// with each item having equal probability of being in the sample.
#[derive(Debug)]
pub struct Reservoir<T> {
    /// Maximum capacity of the reservoir
    capacity: usize,
    /// Total count of items seen
    count: usize,
    /// Current items in the reservoir
    items: Vec<T>,
}

impl<T> Reservoir<T> {
    /// Create a new reservoir with the given capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            count: 0,
            items: Vec::with_capacity(capacity),
        }
    }

    /// Consider an item for inclusion in the reservoir
    pub fn consider<R: Rng + ?Sized>(&mut self, item: T, rng: &mut R) {
        self.count += 1;

        if self.items.len() < self.capacity {
            self.items.push(item);
        } else {
            let j = rng.random_range(0..self.count);
            if j < self.capacity {
                self.items[j] = item;
            }
        }
    }

    /// Get the number of items seen so far
    pub fn total_seen(&self) -> usize {
        self.count
    }

    /// Get the current size of the reservoir
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the reservoir is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Consume the reservoir and return the sampled items
    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

/// Pick one item uniformly from an iterator in a single O(n) pass
pub fn pick_one<T, I, R>(items: I, rng: &mut R) -> Option<T>
where
    I: IntoIterator<Item = T>,
    R: Rng + ?Sized,
{
    let mut reservoir = Reservoir::new(1);
    for item in items {
        reservoir.consider(item, rng);
    }
    reservoir.into_items().pop()
}
