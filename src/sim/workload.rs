//! Per-hour workload counts.

use super::config::{CountDistribution, HourlyRates, WorkloadProfile};
use super::schedule::{HourBucket, HourClass};
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Operations to perform in one hour bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HourWorkload {
    pub creations: u64,
    pub updates: u64,
    pub deletes: u64,
}

impl HourWorkload {
    pub const fn new(creations: u64, updates: u64, deletes: u64) -> Self {
        Self {
            creations,
            updates,
            deletes,
        }
    }
}

/// Floor a raw sample to a count: `max(0, round(sample))`
pub fn floor_count(sample: f64) -> u64 {
    if sample.is_nan() {
        return 0;
    }
    sample.round().max(0.0) as u64
}

/// Draw one count from a distribution
pub fn draw_count<R: Rng + ?Sized>(dist: &CountDistribution, rng: &mut R) -> u64 {
    if dist.std_dev == 0.0 {
        return floor_count(dist.mean);
    }
    match Normal::new(dist.mean, dist.std_dev) {
        Ok(normal) => floor_count(normal.sample(rng)),
        Err(_) => floor_count(dist.mean),
    }
}

impl WorkloadProfile {
    pub fn rates(&self, class: HourClass) -> &HourlyRates {
        match class {
            HourClass::Active => &self.active,
            HourClass::Inactive => &self.inactive,
        }
    }

    /// Draw creation, update and delete counts for one bucket, in that order
    pub fn draw<R: Rng + ?Sized>(&self, class: HourClass, rng: &mut R) -> HourWorkload {
        let rates = self.rates(class);
        HourWorkload {
            creations: draw_count(&rates.creations, rng),
            updates: draw_count(&rates.updates, rng),
            deletes: draw_count(&rates.deletes, rng),
        }
    }

    /// Generous estimate of creations over a schedule: mean plus three
    /// standard deviations per bucket.
    pub fn creation_ceiling<I: IntoIterator<Item = HourBucket>>(&self, buckets: I) -> f64 {
        buckets
            .into_iter()
            .map(|b| {
                let c = &self.rates(b.class).creations;
                (c.mean + 3.0 * c.std_dev).max(0.0)
            })
            .sum()
    }
}
