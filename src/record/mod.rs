//! Record storage for the simulator.
//!
//! A [`RecordSet`] is an append-only list of positional rows sharing one
//! column list. Rows are never removed; soft deletion flips the `isDeleted`
//! column. The lifecycle columns (`isDeleted`, `Day`, `Hour`) are always
//! present and are appended to the schema when the input lacks them.

mod live;
mod reservoir;
mod value;

pub use live::LiveIndex;
pub use reservoir::{pick_one, Reservoir};
pub use value::{parse_timestamp, ColumnType, Value, DATE_FORMAT, TIMESTAMP_FORMAT};

use ahash::AHashMap;
use chrono::{NaiveDateTime, Timelike};

pub const ID: &str = "ID";
pub const CREATED: &str = "Created";
pub const MODIFIED: &str = "Modified";
pub const IS_DELETED: &str = "isDeleted";
pub const DAY: &str = "Day";
pub const HOUR: &str = "Hour";

/// Columns every record set must carry in its input
pub const REQUIRED_COLUMNS: &[&str] = &[ID, CREATED, MODIFIED];

/// Columns appended when missing from the input
pub const LIFECYCLE_COLUMNS: &[&str] = &[IS_DELETED, DAY, HOUR];

/// One row, aligned with the owning record set's columns
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    values: Vec<Value>,
}

impl Record {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, index: usize) -> &Value {
        &self.values[index]
    }

    pub fn set(&mut self, index: usize, value: Value) {
        self.values[index] = value;
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

/// Positions of the columns the simulator reads and writes directly
#[derive(Debug, Clone, Copy)]
pub struct LifecycleColumns {
    pub id: usize,
    pub created: usize,
    pub modified: usize,
    pub is_deleted: usize,
    pub day: usize,
    pub hour: usize,
}

/// Ordered column names with name lookup
#[derive(Debug, Clone)]
pub struct Columns {
    names: Vec<String>,
    index: AHashMap<String, usize>,
}

impl Columns {
    pub fn new(names: Vec<String>) -> anyhow::Result<Self> {
        let mut index = AHashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                anyhow::bail!("duplicate column: {}", name);
            }
        }
        Ok(Self { names, index })
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Append-only table of records
#[derive(Debug, Clone)]
pub struct RecordSet {
    columns: Columns,
    lifecycle: LifecycleColumns,
    /// Number of lifecycle columns appended to the source schema
    appended: usize,
    rows: Vec<Record>,
}

impl RecordSet {
    /// Create an empty record set for the given source columns.
    ///
    /// Fails if a required column is missing. Lifecycle columns absent from
    /// `names` are appended.
    pub fn new(mut names: Vec<String>) -> anyhow::Result<Self> {
        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|c| !names.iter().any(|n| n == c))
            .collect();
        if !missing.is_empty() {
            anyhow::bail!("missing required column(s): {}", missing.join(", "));
        }

        let mut appended = 0;
        for column in LIFECYCLE_COLUMNS {
            if !names.iter().any(|n| n == column) {
                names.push(column.to_string());
                appended += 1;
            }
        }

        let columns = Columns::new(names)?;
        let position = |name: &str| {
            columns
                .position(name)
                .ok_or_else(|| anyhow::anyhow!("missing column: {}", name))
        };
        let lifecycle = LifecycleColumns {
            id: position(ID)?,
            created: position(CREATED)?,
            modified: position(MODIFIED)?,
            is_deleted: position(IS_DELETED)?,
            day: position(DAY)?,
            hour: position(HOUR)?,
        };

        Ok(Self {
            columns,
            lifecycle,
            appended,
            rows: Vec::new(),
        })
    }

    /// Append a row given in source column order.
    ///
    /// Appended lifecycle columns get their defaults: not deleted, no bucket.
    pub fn push_source_row(&mut self, mut values: Vec<Value>) -> anyhow::Result<()> {
        let source_len = self.columns.len() - self.appended;
        if values.len() != source_len {
            anyhow::bail!(
                "row has {} values, expected {}",
                values.len(),
                source_len
            );
        }
        values.resize(self.columns.len(), Value::Null);
        let deleted = &mut values[self.lifecycle.is_deleted];
        if deleted.is_null() {
            *deleted = Value::Bool(false);
        }
        self.rows.push(Record::new(values));
        Ok(())
    }

    /// Append a full-width record (as built by the row factory)
    pub fn push(&mut self, record: Record) {
        debug_assert_eq!(record.values().len(), self.columns.len());
        self.rows.push(record);
    }

    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    pub fn lifecycle(&self) -> LifecycleColumns {
        self.lifecycle
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> &Record {
        &self.rows[index]
    }

    pub fn row_mut(&mut self, index: usize) -> &mut Record {
        &mut self.rows[index]
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn id(&self, index: usize) -> Option<i64> {
        self.rows[index].get(self.lifecycle.id).as_int()
    }

    pub fn is_deleted(&self, index: usize) -> bool {
        self.rows[index]
            .get(self.lifecycle.is_deleted)
            .as_bool()
            .unwrap_or(false)
    }

    pub fn created(&self, index: usize) -> Option<NaiveDateTime> {
        self.rows[index].get(self.lifecycle.created).as_timestamp()
    }

    pub fn modified(&self, index: usize) -> Option<NaiveDateTime> {
        self.rows[index].get(self.lifecycle.modified).as_timestamp()
    }

    /// Highest ID present, live or deleted
    pub fn max_id(&self) -> Option<i64> {
        (0..self.rows.len()).filter_map(|i| self.id(i)).max()
    }

    pub fn live_count(&self) -> usize {
        (0..self.rows.len()).filter(|&i| !self.is_deleted(i)).count()
    }

    /// Set `Modified`, `Day` and `Hour` for a touched row
    pub fn stamp(&mut self, index: usize, modified: NaiveDateTime, bucket: NaiveDateTime) {
        let lc = self.lifecycle;
        let row = &mut self.rows[index];
        row.set(lc.modified, Value::Timestamp(modified));
        row.set(lc.day, Value::Date(bucket.date()));
        row.set(lc.hour, Value::Int(bucket.hour() as i64));
    }

    /// Render the first `n` rows as an aligned text table
    pub fn preview(&self, n: usize) -> String {
        let shown: Vec<Vec<String>> = self
            .rows
            .iter()
            .take(n)
            .map(|r| r.values().iter().map(|v| v.to_string()).collect())
            .collect();

        let widths: Vec<usize> = self
            .columns
            .names()
            .iter()
            .enumerate()
            .map(|(i, name)| {
                shown
                    .iter()
                    .map(|cells| cells[i].len())
                    .chain(std::iter::once(name.len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut out = String::new();
        let row_label_width = n.min(self.rows.len()).to_string().len().max(1);
        out.push_str(&" ".repeat(row_label_width));
        for (name, width) in self.columns.names().iter().zip(&widths) {
            out.push_str(&format!("  {:>width$}", name, width = width));
        }
        out.push('\n');
        for (i, cells) in shown.iter().enumerate() {
            out.push_str(&format!("{:<width$}", i, width = row_label_width));
            for (cell, width) in cells.iter().zip(&widths) {
                out.push_str(&format!("  {:>width$}", cell, width = width));
            }
            out.push('\n');
        }
        out.push_str(&format!(
            "\n[{} rows x {} columns]\n",
            self.rows.len(),
            self.columns.len()
        ));
        out
    }
}
