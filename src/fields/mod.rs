//! Declarative field table.
//!
//! Each column of a generated record is described by a [`FieldSpec`]: a name,
//! a [`FieldKind`] saying how values are drawn, and a null rate. Derived kinds
//! read another field of the same record, so the table is ordered by
//! dependency before drawing (see [`graph`]).
//!
//! Kinds are a tagged enum so the table can be written in YAML:
//!
//! ```yaml
//! - name: Category
//!   kind: categorical
//!   values: [Electronics, Clothing, Furniture, Food]
//!   weights: [0.7, 0.1, 0.1, 0.1]
//! - name: ExpirationDateTime
//!   kind: days_after_field
//!   field: ManufacturedDateTime
//!   min_days: 30
//!   max_days: 365
//! ```

mod draw;
pub mod graph;

pub use draw::{clamp_chain, draw_row, draw_value, stamp_within_hour};

use crate::record::{ColumnType, CREATED, ID, MODIFIED};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub const STATUS_VALUES: &[&str] = &["Pending", "Shipped", "Delivered"];
pub const PRIORITY_VALUES: &[&str] = &["High", "Medium", "Low"];

/// How the values of one field are produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    /// Assigned from the ID pool, never drawn
    Sequence,

    /// Uniform integer in `[low, high)`
    UniformInt { low: i64, high: i64 },

    /// Uniform float in `[low, high)`
    UniformFloat {
        #[serde(default)]
        low: f64,
        high: f64,
    },

    /// One of `values`, uniformly or by `weights`
    Categorical {
        values: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        weights: Option<Vec<f64>>,
    },

    /// Whole days in `[min_days, max_days)` after a fixed date
    DaysAfter {
        from: NaiveDateTime,
        min_days: i64,
        max_days: i64,
    },

    /// Whole days in `[min_days, max_days)` after another field's value
    DaysAfterField {
        field: String,
        min_days: i64,
        max_days: i64,
    },

    /// Same value as another field
    CopyOf { field: String },

    /// Uniform second inside the simulated hour being generated
    WithinHour,
}

impl FieldKind {
    /// Validate the kind's parameters
    pub fn validate(&self) -> anyhow::Result<()> {
        match self {
            FieldKind::Sequence | FieldKind::WithinHour => Ok(()),
            FieldKind::UniformInt { low, high } => {
                if low >= high {
                    anyhow::bail!("uniform_int requires low < high, got [{}, {})", low, high);
                }
                Ok(())
            }
            FieldKind::UniformFloat { low, high } => {
                if !low.is_finite() || !high.is_finite() || low > high {
                    anyhow::bail!(
                        "uniform_float requires finite low <= high, got [{}, {})",
                        low,
                        high
                    );
                }
                Ok(())
            }
            FieldKind::Categorical { values, weights } => {
                if values.is_empty() {
                    anyhow::bail!("categorical requires at least one value");
                }
                if let Some(weights) = weights {
                    if weights.len() != values.len() {
                        anyhow::bail!(
                            "categorical has {} values but {} weights",
                            values.len(),
                            weights.len()
                        );
                    }
                    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
                        anyhow::bail!("categorical weights must be finite and non-negative");
                    }
                    if weights.iter().sum::<f64>() <= 0.0 {
                        anyhow::bail!("categorical weights must not all be zero");
                    }
                }
                Ok(())
            }
            FieldKind::DaysAfter {
                min_days, max_days, ..
            }
            | FieldKind::DaysAfterField {
                min_days, max_days, ..
            } => {
                if min_days >= max_days {
                    anyhow::bail!(
                        "day offsets require min_days < max_days, got [{}, {})",
                        min_days,
                        max_days
                    );
                }
                Ok(())
            }
            FieldKind::CopyOf { field } => {
                if field.is_empty() {
                    anyhow::bail!("copy_of requires a source field");
                }
                Ok(())
            }
        }
    }

    /// Field this kind reads from, if derived
    pub fn dependency(&self) -> Option<&str> {
        match self {
            FieldKind::DaysAfterField { field, .. } | FieldKind::CopyOf { field } => Some(field),
            _ => None,
        }
    }

    /// Type used to parse this field's column from CSV
    pub fn column_type(&self) -> ColumnType {
        match self {
            FieldKind::Sequence | FieldKind::UniformInt { .. } => ColumnType::Int,
            FieldKind::UniformFloat { .. } => ColumnType::Float,
            FieldKind::Categorical { .. } => ColumnType::Text,
            FieldKind::DaysAfter { .. }
            | FieldKind::DaysAfterField { .. }
            | FieldKind::WithinHour => ColumnType::Timestamp,
            // Resolved against the source field by FieldTable::column_type
            FieldKind::CopyOf { .. } => ColumnType::Inferred,
        }
    }

    /// Whether values of this kind are timestamps
    fn is_temporal(&self) -> bool {
        matches!(
            self,
            FieldKind::DaysAfter { .. }
                | FieldKind::DaysAfterField { .. }
                | FieldKind::WithinHour
                | FieldKind::CopyOf { .. }
        )
    }
}

/// One column of the field table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    /// Probability (row factory) or exact fraction (seed generator) of nulls
    #[serde(default)]
    pub null_rate: f64,
}

impl FieldSpec {
    pub fn new(name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            null_rate: 0.0,
        }
    }

    pub fn with_null_rate(mut self, rate: f64) -> Self {
        self.null_rate = rate;
        self
    }
}

/// Temporal ordering policy for generated rows.
///
/// With `clamp` set, the timestamps named in `chain` are made non-decreasing
/// by walking the chain backward and taking pairwise minimums. `Created <=
/// Modified` is enforced regardless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderingPolicy {
    pub clamp: bool,
    pub chain: Vec<String>,
}

impl Default for OrderingPolicy {
    fn default() -> Self {
        Self {
            clamp: false,
            chain: vec![
                CREATED.to_string(),
                "LastMoveDateTime".to_string(),
                MODIFIED.to_string(),
            ],
        }
    }
}

impl OrderingPolicy {
    /// The chain actually enforced
    pub fn effective_chain(&self) -> Vec<String> {
        if self.clamp {
            self.chain.clone()
        } else {
            vec![CREATED.to_string(), MODIFIED.to_string()]
        }
    }
}

/// Validated, dependency-ordered list of fields
#[derive(Debug, Clone)]
pub struct FieldTable {
    fields: Vec<FieldSpec>,
    /// For each field, the index of the field it reads
    parents: Vec<Option<usize>>,
    order: Vec<usize>,
}

impl FieldTable {
    pub fn new(fields: Vec<FieldSpec>) -> anyhow::Result<Self> {
        for (i, field) in fields.iter().enumerate() {
            if fields[..i].iter().any(|f| f.name == field.name) {
                anyhow::bail!("field '{}' is defined more than once", field.name);
            }
            field
                .kind
                .validate()
                .map_err(|e| anyhow::anyhow!("field '{}': {}", field.name, e))?;
            if !(0.0..=1.0).contains(&field.null_rate) {
                anyhow::bail!(
                    "field '{}': null_rate must be between 0 and 1, got {}",
                    field.name,
                    field.null_rate
                );
            }
            check_reserved(field)?;
        }

        let mut parents = Vec::with_capacity(fields.len());
        for field in &fields {
            let parent = match field.kind.dependency() {
                Some(dep) => {
                    let idx = fields.iter().position(|f| f.name == dep).ok_or_else(|| {
                        anyhow::anyhow!(
                            "field '{}' depends on unknown field '{}'",
                            field.name,
                            dep
                        )
                    })?;
                    if !fields[idx].kind.is_temporal() {
                        anyhow::bail!(
                            "field '{}' depends on '{}', which is not a timestamp field",
                            field.name,
                            dep
                        );
                    }
                    Some(idx)
                }
                None => None,
            };
            parents.push(parent);
        }

        let result = graph::draw_order(&parents);
        if !result.cyclic.is_empty() {
            let names: Vec<&str> = result
                .cyclic
                .iter()
                .map(|&i| fields[i].name.as_str())
                .collect();
            anyhow::bail!("field dependency cycle among: {}", names.join(", "));
        }

        Ok(Self {
            fields,
            parents,
            order: result.order,
        })
    }

    /// Fields drawn by the activity simulator's row factory.
    ///
    /// Historical dates are independent offsets from 2020-01-01 and
    /// `Created`/`Modified` fall inside the simulated hour.
    pub fn logistics_activity() -> Self {
        let epoch = epoch_2020();
        let mut fields = identity_and_measure_fields();
        fields.extend([
            FieldSpec::new(
                "ManufacturedDateTime",
                FieldKind::DaysAfter {
                    from: epoch,
                    min_days: 0,
                    max_days: 1000,
                },
            ),
            FieldSpec::new(
                "ExpirationDateTime",
                FieldKind::DaysAfter {
                    from: epoch,
                    min_days: 30,
                    max_days: 365,
                },
            ),
            FieldSpec::new(
                "ReceivedDateTime",
                FieldKind::DaysAfter {
                    from: epoch,
                    min_days: 0,
                    max_days: 30,
                },
            ),
            FieldSpec::new(
                "AddedDateTime",
                FieldKind::DaysAfter {
                    from: epoch,
                    min_days: 0,
                    max_days: 10,
                },
            ),
            FieldSpec::new(
                "LastMoveDateTime",
                FieldKind::DaysAfter {
                    from: epoch,
                    min_days: 0,
                    max_days: 30,
                },
            ),
            FieldSpec::new(CREATED, FieldKind::WithinHour),
            FieldSpec::new(MODIFIED, FieldKind::WithinHour),
        ]);
        Self::new(fields).expect("built-in activity field table is valid")
    }

    /// Fields drawn by the static seed generator.
    ///
    /// Dates form a chain `Manufactured -> Received -> Added -> LastMove ->
    /// Modified`, with `Expiration` after `Manufactured` and `Created` equal
    /// to `Manufactured`. Identifier, measure and categorical columns carry
    /// null rates.
    pub fn logistics_historical() -> Self {
        let mut fields: Vec<FieldSpec> = identity_and_measure_fields()
            .into_iter()
            .map(|f| {
                let rate = match (&f.kind, f.name.as_str()) {
                    (FieldKind::Sequence, _) => 0.0,
                    (_, "Weight" | "Volume") => 0.05,
                    _ => 0.1,
                };
                f.with_null_rate(rate)
            })
            .collect();
        fields.extend([
            FieldSpec::new(
                "ManufacturedDateTime",
                FieldKind::DaysAfter {
                    from: epoch_2020(),
                    min_days: 0,
                    max_days: 1000,
                },
            ),
            days_after_field("ExpirationDateTime", "ManufacturedDateTime", 30, 365),
            days_after_field("ReceivedDateTime", "ManufacturedDateTime", 0, 30),
            days_after_field("AddedDateTime", "ReceivedDateTime", 0, 10),
            days_after_field("LastMoveDateTime", "AddedDateTime", 0, 30),
            FieldSpec::new(
                CREATED,
                FieldKind::CopyOf {
                    field: "ManufacturedDateTime".to_string(),
                },
            ),
            days_after_field(MODIFIED, "LastMoveDateTime", 0, 100),
        ]);
        Self::new(fields).expect("built-in historical field table is valid")
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Field indices in draw order (dependencies first)
    pub fn draw_order(&self) -> &[usize] {
        &self.order
    }

    pub fn names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    /// Column type for parsing, following `copy_of` to its source
    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        let mut idx = self.position(name)?;
        loop {
            match self.parents[idx] {
                Some(parent) if self.fields[idx].kind.column_type() == ColumnType::Inferred => {
                    idx = parent;
                }
                _ => return Some(self.fields[idx].kind.column_type()),
            }
        }
    }

    /// Index of the field a derived field reads from
    pub(crate) fn parent(&self, index: usize) -> Option<usize> {
        self.parents[index]
    }
}

/// `ID`, `Created` and `Modified` may not be null, and `ID` is the sequence
fn check_reserved(field: &FieldSpec) -> anyhow::Result<()> {
    let is_sequence = matches!(field.kind, FieldKind::Sequence);
    match field.name.as_str() {
        ID if !is_sequence => anyhow::bail!("field 'ID' must be of kind sequence"),
        name if is_sequence && name != ID => {
            anyhow::bail!("field '{}': only 'ID' may be a sequence", name)
        }
        CREATED | MODIFIED if !field.kind.is_temporal() => {
            anyhow::bail!("field '{}' must be a timestamp kind", field.name)
        }
        ID | CREATED | MODIFIED if field.null_rate > 0.0 => {
            anyhow::bail!("field '{}' may not be nullable", field.name)
        }
        _ => Ok(()),
    }
}

fn epoch_2020() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2020, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

fn days_after_field(name: &str, field: &str, min_days: i64, max_days: i64) -> FieldSpec {
    FieldSpec::new(
        name,
        FieldKind::DaysAfterField {
            field: field.to_string(),
            min_days,
            max_days,
        },
    )
}

fn uniform_int(name: &str, low: i64, high: i64) -> FieldSpec {
    FieldSpec::new(name, FieldKind::UniformInt { low, high })
}

fn categorical(name: &str, values: &[&str], weights: Option<&[f64]>) -> FieldSpec {
    FieldSpec::new(
        name,
        FieldKind::Categorical {
            values: values.iter().map(|v| v.to_string()).collect(),
            weights: weights.map(|w| w.to_vec()),
        },
    )
}

/// Columns shared by both presets, in output order
fn identity_and_measure_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new(ID, FieldKind::Sequence),
        uniform_int("DetailNumber", 1000, 9999),
        uniform_int("LoadNumber", 1000, 9999),
        uniform_int("LotNumber", 1000, 9999),
        uniform_int("ShipmentLineID", 1000, 9999),
        uniform_int("ReceiptKey", 1000, 9999),
        uniform_int("ClientID", 100, 999),
        uniform_int("WarehouseID", 10, 99),
        uniform_int("SiteID", 10, 99),
        uniform_int("ProductID", 1000, 9999),
        uniform_int("InventoryStatusID", 10, 99),
        uniform_int("StorageLocationID", 1000, 9999),
        uniform_int("AssetTypeID", 1000, 9999),
        uniform_int("HoldFlagBool", 0, 2),
        uniform_int("UnitQTY", 1, 500),
        FieldSpec::new(
            "Weight",
            FieldKind::UniformFloat {
                low: 0.0,
                high: 1000.0,
            },
        ),
        FieldSpec::new(
            "Volume",
            FieldKind::UniformFloat {
                low: 0.0,
                high: 10.0,
            },
        ),
        categorical(
            "Category",
            &["Electronics", "Clothing", "Furniture", "Food"],
            Some(&[0.7, 0.1, 0.1, 0.1]),
        ),
        categorical(
            "Supplier",
            &["SupplierA", "SupplierB", "SupplierC"],
            Some(&[0.5, 0.3, 0.2]),
        ),
        categorical("Status", STATUS_VALUES, None),
        categorical("Priority", PRIORITY_VALUES, None),
    ]
}
