//! Simulation configuration and its YAML overlay.

use crate::fields::{FieldKind, FieldSpec, OrderingPolicy, PRIORITY_VALUES, STATUS_VALUES};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// How hours of a simulated day are classified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ActiveWindow {
    /// Fixed count of inactive and active hours per simulated day
    Counted {
        active_hours: u32,
        inactive_hours: u32,
        /// Inactive hours lead the day (otherwise they trail it)
        #[serde(default = "default_true")]
        inactive_first: bool,
    },
    /// Wall-clock band `[start_hour, end_hour)`, wrapping past midnight when
    /// `end_hour < start_hour`. Equal bounds mean the whole day is active.
    WallClock {
        start_hour: u32,
        end_hour: u32,
        /// Jump over inactive hours instead of stepping through them
        #[serde(default)]
        skip_inactive: bool,
    },
}

impl Default for ActiveWindow {
    fn default() -> Self {
        ActiveWindow::Counted {
            active_hours: 16,
            inactive_hours: 8,
            inactive_first: true,
        }
    }
}

impl ActiveWindow {
    pub fn validate(&self) -> anyhow::Result<()> {
        match *self {
            ActiveWindow::Counted {
                active_hours,
                inactive_hours,
                ..
            } => {
                match active_hours.checked_add(inactive_hours) {
                    None => anyhow::bail!(
                        "active window hours overflow: {} active + {} inactive",
                        active_hours,
                        inactive_hours
                    ),
                    Some(0) => anyhow::bail!("active window needs at least one hour per day"),
                    Some(_) => {}
                }
            }
            ActiveWindow::WallClock {
                start_hour,
                end_hour,
                ..
            } => {
                if start_hour > 23 || end_hour > 23 {
                    anyhow::bail!(
                        "wall-clock window hours must be 0-23, got {}-{}",
                        start_hour,
                        end_hour
                    );
                }
            }
        }
        Ok(())
    }
}

impl std::str::FromStr for ActiveWindow {
    type Err = String;

    /// Parse a wall-clock band such as `06-22`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| format!("Invalid active window: {}. Use START-END, e.g. 06-22", s))?;
        let parse = |part: &str| {
            part.trim()
                .trim_end_matches(":00")
                .parse::<u32>()
                .map_err(|_| format!("Invalid hour in active window: {}", part))
        };
        let window = ActiveWindow::WallClock {
            start_hour: parse(start)?,
            end_hour: parse(end)?,
            skip_inactive: false,
        };
        window.validate().map_err(|e| e.to_string())?;
        Ok(window)
    }
}

impl std::fmt::Display for ActiveWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActiveWindow::Counted {
                active_hours,
                inactive_hours,
                inactive_first,
            } => {
                let order = if *inactive_first { "leading" } else { "trailing" };
                write!(
                    f,
                    "{} active / {} {} inactive hours",
                    active_hours, inactive_hours, order
                )
            }
            ActiveWindow::WallClock {
                start_hour,
                end_hour,
                skip_inactive,
            } => {
                write!(f, "{:02}:00-{:02}:00", start_hour, end_hour)?;
                if *skip_inactive {
                    write!(f, " (skipping inactive hours)")?;
                }
                Ok(())
            }
        }
    }
}

/// Approximately normal count distribution, floored at zero when drawn
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CountDistribution {
    pub mean: f64,
    pub std_dev: f64,
}

impl CountDistribution {
    pub const fn new(mean: f64, std_dev: f64) -> Self {
        Self { mean, std_dev }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.mean.is_finite() || !self.std_dev.is_finite() || self.std_dev < 0.0 {
            anyhow::bail!(
                "count distribution needs a finite mean and a non-negative std_dev, got mean={} std_dev={}",
                self.mean,
                self.std_dev
            );
        }
        Ok(())
    }
}

/// Count distributions for one hour class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourlyRates {
    pub creations: CountDistribution,
    pub updates: CountDistribution,
    pub deletes: CountDistribution,
}

impl HourlyRates {
    /// All counts fixed at zero
    pub const fn idle() -> Self {
        let zero = CountDistribution::new(0.0, 0.0);
        Self {
            creations: zero,
            updates: zero,
            deletes: zero,
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        self.creations.validate()?;
        self.updates.validate()?;
        self.deletes.validate()
    }
}

/// Rates for active and inactive hours
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkloadProfile {
    pub active: HourlyRates,
    pub inactive: HourlyRates,
}

impl Default for WorkloadProfile {
    fn default() -> Self {
        Self {
            active: HourlyRates {
                creations: CountDistribution::new(350.0, 65.0),
                updates: CountDistribution::new(80.0, 20.0),
                deletes: CountDistribution::new(30.0, 15.0),
            },
            inactive: HourlyRates {
                creations: CountDistribution::new(70.0, 20.0),
                updates: CountDistribution::new(30.0, 5.0),
                deletes: CountDistribution::new(10.0, 5.0),
            },
        }
    }
}

impl WorkloadProfile {
    pub fn validate(&self) -> anyhow::Result<()> {
        self.active
            .validate()
            .map_err(|e| anyhow::anyhow!("active rates: {}", e))?;
        self.inactive
            .validate()
            .map_err(|e| anyhow::anyhow!("inactive rates: {}", e))
    }
}

/// One entry of the mutable-field allowlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationRule {
    pub field: String,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl MutationRule {
    pub fn new(field: &str, kind: FieldKind) -> Self {
        Self {
            field: field.to_string(),
            kind,
        }
    }

    /// The default allowlist.
    ///
    /// `Status` and `Priority` both re-roll from the union of the two value
    /// sets, so a Priority can become "Shipped" and vice versa.
    pub fn defaults() -> Vec<MutationRule> {
        let status_or_priority = FieldKind::Categorical {
            values: STATUS_VALUES
                .iter()
                .chain(PRIORITY_VALUES)
                .map(|v| v.to_string())
                .collect(),
            weights: None,
        };
        vec![
            MutationRule::new(
                "StorageLocationID",
                FieldKind::UniformInt {
                    low: 1000,
                    high: 9999,
                },
            ),
            MutationRule::new(
                "InventoryStatusID",
                FieldKind::UniformInt { low: 10, high: 99 },
            ),
            MutationRule::new("Status", status_or_priority.clone()),
            MutationRule::new("Priority", status_or_priority),
        ]
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        match self.kind {
            FieldKind::Sequence
            | FieldKind::CopyOf { .. }
            | FieldKind::DaysAfterField { .. } => {
                anyhow::bail!(
                    "mutation of '{}' cannot use kind {:?}; only independent kinds can be re-rolled",
                    self.field,
                    self.kind
                )
            }
            _ => self
                .kind
                .validate()
                .map_err(|e| anyhow::anyhow!("mutation of '{}': {}", self.field, e)),
        }
    }
}

/// How a live row is picked for mutation or deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Selection {
    /// O(1) pick from a maintained index of live rows
    #[default]
    Indexed,
    /// O(n) single-pass reservoir pick over all rows
    Scan,
}

impl std::str::FromStr for Selection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "indexed" | "index" => Ok(Selection::Indexed),
            "scan" | "linear" => Ok(Selection::Scan),
            _ => Err(format!(
                "Unknown selection: {}. Valid options: indexed, scan",
                s
            )),
        }
    }
}

impl std::fmt::Display for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Selection::Indexed => write!(f, "indexed"),
            Selection::Scan => write!(f, "scan"),
        }
    }
}

/// Complete configuration for one simulation run
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Simulated time of day 0, hour 0
    pub start: NaiveDateTime,
    /// Number of simulated days
    pub days: u32,
    /// Active/inactive hour classification
    pub window: ActiveWindow,
    /// Per-class count distributions
    pub workload: WorkloadProfile,
    /// Fields drawn for new rows
    pub fields: Vec<FieldSpec>,
    /// Mutable-field allowlist
    pub mutations: Vec<MutationRule>,
    /// Temporal ordering of new rows
    pub ordering: OrderingPolicy,
    /// Stamp Modified/Day/Hour when soft-deleting
    pub stamp_deletes: bool,
    /// Live-row pick strategy
    pub selection: Selection,
    /// ID pool size as a multiple of the expected creations (None = unbounded)
    pub id_pool_buffer: Option<f64>,
    /// Random seed
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            start: default_start(),
            days: 10,
            window: ActiveWindow::default(),
            workload: WorkloadProfile::default(),
            fields: crate::fields::FieldTable::logistics_activity()
                .fields()
                .to_vec(),
            mutations: MutationRule::defaults(),
            ordering: OrderingPolicy::default(),
            stamp_deletes: true,
            selection: Selection::Indexed,
            id_pool_buffer: Some(1.5),
            seed: rand::random(),
        }
    }
}

impl SimulationConfig {
    /// Validate everything that does not depend on the input schema
    pub fn validate(&self) -> anyhow::Result<()> {
        self.window.validate()?;
        self.workload.validate()?;
        if self.mutations.is_empty() {
            anyhow::bail!("mutation allowlist must not be empty");
        }
        for rule in &self.mutations {
            rule.validate()?;
        }
        if let Some(buffer) = self.id_pool_buffer {
            if !buffer.is_finite() || buffer <= 0.0 {
                anyhow::bail!("id_pool_buffer must be a positive number, got {}", buffer);
            }
        }
        Ok(())
    }
}

fn default_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 10)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

fn default_true() -> bool {
    true
}

/// YAML configuration for the simulate command. Every key is optional and
/// overrides the built-in default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationYamlConfig {
    pub start: Option<NaiveDateTime>,
    pub days: Option<u32>,
    pub window: Option<ActiveWindow>,
    pub workload: Option<WorkloadProfile>,
    pub fields: Option<Vec<FieldSpec>>,
    pub mutations: Option<Vec<MutationRule>>,
    pub ordering: Option<OrderingPolicy>,
    pub stamp_deletes: Option<bool>,
    pub selection: Option<Selection>,
    pub id_pool_buffer: Option<f64>,
    pub seed: Option<u64>,
}

impl SimulationYamlConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read config {}: {}", path.display(), e))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        let config: SimulationYamlConfig = serde_yaml_ng::from_str(content)?;
        Ok(config)
    }

    /// Overlay the keys present in this file onto `config`
    pub fn apply_to(self, config: &mut SimulationConfig) {
        if let Some(start) = self.start {
            config.start = start;
        }
        if let Some(days) = self.days {
            config.days = days;
        }
        if let Some(window) = self.window {
            config.window = window;
        }
        if let Some(workload) = self.workload {
            config.workload = workload;
        }
        if let Some(fields) = self.fields {
            config.fields = fields;
        }
        if let Some(mutations) = self.mutations {
            config.mutations = mutations;
        }
        if let Some(ordering) = self.ordering {
            config.ordering = ordering;
        }
        if let Some(stamp) = self.stamp_deletes {
            config.stamp_deletes = stamp;
        }
        if let Some(selection) = self.selection {
            config.selection = selection;
        }
        if let Some(buffer) = self.id_pool_buffer {
            config.id_pool_buffer = Some(buffer);
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
    }
}
