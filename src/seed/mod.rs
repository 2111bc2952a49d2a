//! Static seed dataset generator.
//!
//! Produces the historical starting table the simulator reads: sequential
//! IDs, the derived date chain of [`FieldTable::logistics_historical`], and
//! an exact number of nulls per column (`floor(null_rate * rows)` distinct
//! rows chosen at random).

use crate::fields::{clamp_chain, draw_row, FieldKind, FieldSpec, FieldTable, OrderingPolicy};
use crate::record::{RecordSet, Value};
use chrono::{NaiveDate, NaiveDateTime};
use rand::seq::index;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default file name for generated seed data
pub const DEFAULT_OUTPUT: &str = "synthetic_logistics_data.csv";

#[derive(Debug, Clone)]
pub struct SeedConfig {
    pub rows: usize,
    pub seed: u64,
    pub fields: Vec<FieldSpec>,
    pub ordering: OrderingPolicy,
    /// Hour used for `within_hour` fields
    pub anchor: NaiveDateTime,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            rows: 2000,
            seed: 42,
            fields: FieldTable::logistics_historical().fields().to_vec(),
            ordering: OrderingPolicy::default(),
            anchor: NaiveDate::from_ymd_opt(2024, 6, 10)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .unwrap_or_default(),
        }
    }
}

/// YAML overlay for the generate command
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeedYamlConfig {
    pub rows: Option<usize>,
    pub seed: Option<u64>,
    pub fields: Option<Vec<FieldSpec>>,
    pub ordering: Option<OrderingPolicy>,
    pub anchor: Option<NaiveDateTime>,
}

impl SeedYamlConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read config {}: {}", path.display(), e))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml_ng::from_str(content)?)
    }

    pub fn apply_to(self, config: &mut SeedConfig) {
        if let Some(rows) = self.rows {
            config.rows = rows;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(fields) = self.fields {
            config.fields = fields;
        }
        if let Some(ordering) = self.ordering {
            config.ordering = ordering;
        }
        if let Some(anchor) = self.anchor {
            config.anchor = anchor;
        }
    }
}

/// Generate the seed table.
///
/// Lifecycle columns are included (`isDeleted = false`, empty `Day`/`Hour`)
/// so the file is already in the simulator's output schema.
pub fn generate(config: &SeedConfig) -> anyhow::Result<RecordSet> {
    let table = FieldTable::new(config.fields.clone())?;
    let chain = config
        .ordering
        .effective_chain()
        .iter()
        .filter_map(|name| table.position(name))
        .collect::<Vec<_>>();

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut rows: Vec<Vec<Value>> = Vec::with_capacity(config.rows);
    for i in 0..config.rows {
        let mut values = draw_row(&table, config.anchor, &mut rng);
        clamp_chain(&mut values, &chain);
        for (value, spec) in values.iter_mut().zip(table.fields()) {
            if matches!(spec.kind, FieldKind::Sequence) {
                *value = Value::Int(i as i64 + 1);
            }
        }
        rows.push(values);
    }

    for (column, spec) in table.fields().iter().enumerate() {
        let count = null_count(spec.null_rate, config.rows);
        if count == 0 {
            continue;
        }
        for row in index::sample(&mut rng, config.rows, count) {
            rows[row][column] = Value::Null;
        }
    }

    let mut set = RecordSet::new(table.names())?;
    for values in rows {
        set.push_source_row(values)?;
    }
    Ok(set)
}

/// Exact null count for a column: `floor(rate * rows)`
pub fn null_count(rate: f64, rows: usize) -> usize {
    ((rate * rows as f64).floor() as usize).min(rows)
}
