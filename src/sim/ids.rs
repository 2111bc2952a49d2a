//! Pre-reserved pool of record IDs.

use std::ops::Range;

/// Monotonic ID range `[start, end)`. IDs are handed out in order and never
/// reused; running past `end` is a configuration error.
#[derive(Debug, Clone)]
pub struct IdPool {
    start: i64,
    next: i64,
    end: i64,
}

impl IdPool {
    /// Reserve `capacity` IDs starting at `start`
    pub fn reserve(start: i64, capacity: u64) -> Self {
        let end = start.saturating_add(i64::try_from(capacity).unwrap_or(i64::MAX));
        Self {
            start,
            next: start,
            end,
        }
    }

    /// Pool bounded only by the ID type
    pub fn unbounded(start: i64) -> Self {
        Self {
            start,
            next: start,
            end: i64::MAX,
        }
    }

    /// Size the pool from an expected creation count and a safety factor
    pub fn sized_for(start: i64, expected: f64, buffer: f64) -> Self {
        let capacity = (expected * buffer).ceil().max(0.0) as u64;
        Self::reserve(start, capacity)
    }

    /// Take the next `n` IDs
    pub fn allocate(&mut self, n: u64) -> anyhow::Result<Range<i64>> {
        let remaining = self.remaining();
        if n > remaining {
            anyhow::bail!(
                "ID pool exhausted: {} IDs requested at {} but only {} remain in the reserved range [{}, {}); raise id_pool_buffer",
                n,
                self.next,
                remaining,
                self.start,
                self.end
            );
        }
        let first = self.next;
        self.next += n as i64;
        Ok(first..self.next)
    }

    pub fn next_id(&self) -> i64 {
        self.next
    }

    pub fn remaining(&self) -> u64 {
        (self.end - self.next) as u64
    }

    pub fn allocated(&self) -> u64 {
        (self.next - self.start) as u64
    }
}
