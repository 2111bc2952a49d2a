//! Activity simulator.
//!
//! A [`Simulator`] owns everything a run mutates: the record set, the live
//! index, the ID pool and the PRNG. It walks the [`Schedule`] one hour at a
//! time; each hour draws a [`HourWorkload`] and applies creations, then
//! updates, then soft deletes.

mod config;
mod deletion;
mod factory;
mod ids;
mod mutation;
mod schedule;
mod workload;

pub use config::{
    ActiveWindow, CountDistribution, HourlyRates, MutationRule, Selection, SimulationConfig,
    SimulationYamlConfig, WorkloadProfile,
};
pub use deletion::delete_one;
pub use factory::RowFactory;
pub use ids::IdPool;
pub use mutation::{Mutation, MutationSelector};
pub use schedule::{in_band, HourBucket, HourClass, Schedule, ScheduleIter};
pub use workload::{draw_count, floor_count, HourWorkload};

use crate::fields::FieldTable;
use crate::record::{pick_one, LiveIndex, RecordSet};
use chrono::{NaiveDate, NaiveDateTime};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::time::{Duration, Instant};

/// Pick a live row: O(1) from the index when one is kept, otherwise a
/// single reservoir pass over the deletion flags.
pub(crate) fn select_live<R: Rng + ?Sized>(
    table: &RecordSet,
    live: Option<&LiveIndex>,
    rng: &mut R,
) -> Option<usize> {
    match live {
        Some(index) => index.pick(rng),
        None => pick_one((0..table.len()).filter(|&i| !table.is_deleted(i)), rng),
    }
}

/// What one hour bucket actually did
#[derive(Debug, Clone, Copy, Serialize)]
pub struct HourReport {
    pub start: NaiveDateTime,
    pub class: HourClass,
    pub created: u64,
    pub updated: u64,
    pub deleted: u64,
    /// Updates and deletes drawn but skipped because nothing was live
    pub skipped: u64,
}

/// Totals for one simulated day
#[derive(Debug, Clone, Serialize)]
pub struct DayReport {
    pub day_index: u32,
    pub days: u32,
    pub date: NaiveDate,
    pub created: u64,
    pub updated: u64,
    pub deleted: u64,
    pub total_rows: usize,
    pub live_rows: usize,
    #[serde(skip)]
    pub elapsed: Duration,
}

/// Statistics from a simulation run
#[derive(Debug, Default, Clone, Serialize)]
pub struct SimulationStats {
    pub seed: u64,
    pub days: u32,
    pub hours_simulated: u64,
    pub active_hours: u64,
    pub inactive_hours: u64,
    pub input_rows: usize,
    pub rows_created: u64,
    pub updates_applied: u64,
    pub deletes_applied: u64,
    pub operations_skipped: u64,
    pub total_rows: usize,
    pub live_rows: usize,
    pub deleted_rows: usize,
    pub first_new_id: Option<i64>,
    pub last_new_id: Option<i64>,
    pub id_pool_capacity: Option<u64>,
    pub elapsed_ms: u128,
}

/// Final table plus run statistics
#[derive(Debug)]
pub struct SimulationOutput {
    pub table: RecordSet,
    pub stats: SimulationStats,
}

pub struct Simulator {
    config: SimulationConfig,
    schedule: Schedule,
    table: RecordSet,
    factory: RowFactory,
    mutations: MutationSelector,
    live: Option<LiveIndex>,
    ids: IdPool,
    rng: ChaCha8Rng,
    stats: SimulationStats,
    hour_fn: Option<Box<dyn Fn(u64)>>,
    day_fn: Option<Box<dyn FnMut(&DayReport)>>,
}

impl Simulator {
    /// Prepare a run over `table`.
    ///
    /// Validates the configuration against the input schema, rejects rows
    /// created after the simulation start and reserves the ID pool.
    pub fn new(config: SimulationConfig, table: RecordSet) -> anyhow::Result<Self> {
        config.validate()?;
        let fields = FieldTable::new(config.fields.clone())?;

        for row in 0..table.len() {
            let created = table.created(row).ok_or_else(|| {
                anyhow::anyhow!("row {} has no Created timestamp", row + 1)
            })?;
            if created > config.start {
                anyhow::bail!(
                    "row {} (ID {}) was created at {}, after the simulation start {}",
                    row + 1,
                    table.id(row).map_or_else(|| "?".to_string(), |id| id.to_string()),
                    created,
                    config.start
                );
            }
        }

        let factory = RowFactory::new(fields, &config.ordering, table.columns(), table.lifecycle())?;
        let mutations = MutationSelector::new(&config.mutations, table.columns())?;

        let schedule = Schedule::new(config.start, config.days, config.window);
        let first_id = match table.max_id() {
            Some(max) => max
                .checked_add(1)
                .ok_or_else(|| anyhow::anyhow!("input ID {} leaves no room for new IDs", max))?,
            None => 1,
        };
        let ids = match config.id_pool_buffer {
            Some(buffer) => IdPool::sized_for(
                first_id,
                config.workload.creation_ceiling(schedule.buckets()),
                buffer,
            ),
            None => IdPool::unbounded(first_id),
        };

        let live = match config.selection {
            Selection::Indexed => Some(LiveIndex::from_deleted_flags(
                (0..table.len()).map(|i| table.is_deleted(i)),
            )),
            Selection::Scan => None,
        };

        let stats = SimulationStats {
            seed: config.seed,
            days: config.days,
            input_rows: table.len(),
            id_pool_capacity: config.id_pool_buffer.map(|_| ids.remaining()),
            ..Default::default()
        };

        Ok(Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            schedule,
            table,
            factory,
            mutations,
            live,
            ids,
            stats,
            hour_fn: None,
            day_fn: None,
        })
    }

    /// Called with the number of hour buckets completed so far
    pub fn with_progress<F: Fn(u64) + 'static>(mut self, f: F) -> Self {
        self.hour_fn = Some(Box::new(f));
        self
    }

    /// Called once at the end of every simulated day
    pub fn with_day_report<F: FnMut(&DayReport) + 'static>(mut self, f: F) -> Self {
        self.day_fn = Some(Box::new(f));
        self
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn table(&self) -> &RecordSet {
        &self.table
    }

    pub fn ids(&self) -> &IdPool {
        &self.ids
    }

    /// Run one hour with explicit counts
    pub fn step(&mut self, bucket: &HourBucket, workload: HourWorkload) -> anyhow::Result<HourReport> {
        let records = self
            .factory
            .build(workload.creations, bucket.start, &mut self.ids, &mut self.rng)?;
        let created = records.len() as u64;
        for record in records {
            self.table.push(record);
            if let Some(live) = self.live.as_mut() {
                live.push(true);
            }
        }

        let mut updated = 0;
        for _ in 0..workload.updates {
            if self
                .mutations
                .mutate_one(&mut self.table, self.live.as_ref(), bucket.start, &mut self.rng)
                .is_some()
            {
                updated += 1;
            }
        }

        let mut deleted = 0;
        for _ in 0..workload.deletes {
            if delete_one(
                &mut self.table,
                self.live.as_mut(),
                self.config.stamp_deletes,
                bucket.start,
                &mut self.rng,
            )
            .is_some()
            {
                deleted += 1;
            }
        }

        let report = HourReport {
            start: bucket.start,
            class: bucket.class,
            created,
            updated,
            deleted,
            skipped: (workload.updates - updated) + (workload.deletes - deleted),
        };
        self.record(&report);
        Ok(report)
    }

    fn record(&mut self, report: &HourReport) {
        let stats = &mut self.stats;
        stats.hours_simulated += 1;
        match report.class {
            HourClass::Active => stats.active_hours += 1,
            HourClass::Inactive => stats.inactive_hours += 1,
        }
        stats.rows_created += report.created;
        stats.updates_applied += report.updated;
        stats.deletes_applied += report.deleted;
        stats.operations_skipped += report.skipped;
    }

    /// Walk the whole schedule, drawing each hour's workload
    pub fn run(mut self) -> anyhow::Result<SimulationOutput> {
        let start_time = Instant::now();
        let hours_per_day = self.schedule.hours_per_day();
        let days = self.schedule.days();

        let mut day_start = Instant::now();
        let mut day_totals = (0u64, 0u64, 0u64);
        let mut day_date = None;

        for (done, bucket) in self.schedule.buckets().enumerate() {
            let workload = self.config.workload.draw(bucket.class, &mut self.rng);
            let report = self.step(&bucket, workload)?;

            let date = *day_date.get_or_insert(bucket.start.date());
            day_totals.0 += report.created;
            day_totals.1 += report.updated;
            day_totals.2 += report.deleted;

            if let Some(ref f) = self.hour_fn {
                f(done as u64 + 1);
            }

            if bucket.hour_index + 1 == hours_per_day {
                let live_rows = self.live_rows();
                if let Some(ref mut f) = self.day_fn {
                    f(&DayReport {
                        day_index: bucket.day_index,
                        days,
                        date,
                        created: day_totals.0,
                        updated: day_totals.1,
                        deleted: day_totals.2,
                        total_rows: self.table.len(),
                        live_rows,
                        elapsed: day_start.elapsed(),
                    });
                }
                day_start = Instant::now();
                day_totals = (0, 0, 0);
                day_date = None;
            }
        }

        self.stats.elapsed_ms = start_time.elapsed().as_millis();
        Ok(self.finish())
    }

    fn live_rows(&self) -> usize {
        match self.live {
            Some(ref live) => live.len(),
            None => self.table.live_count(),
        }
    }

    /// Stop here and hand back the table
    pub fn finish(mut self) -> SimulationOutput {
        let live_rows = self.live_rows();
        let stats = &mut self.stats;
        stats.total_rows = self.table.len();
        stats.live_rows = live_rows;
        stats.deleted_rows = stats.total_rows - live_rows;
        if stats.rows_created > 0 {
            let first = self.ids.next_id() - stats.rows_created as i64;
            stats.first_new_id = Some(first);
            stats.last_new_id = Some(self.ids.next_id() - 1);
        }
        SimulationOutput {
            table: self.table,
            stats: self.stats,
        }
    }
}
