//! Row factory: builds new records for a simulated hour.

use super::ids::IdPool;
use crate::fields::{clamp_chain, draw_row, FieldKind, FieldTable, OrderingPolicy};
use crate::record::{Columns, LifecycleColumns, Record, Value, CREATED, MODIFIED};
use chrono::{NaiveDateTime, Timelike};
use rand::Rng;

#[derive(Debug, Clone)]
pub struct RowFactory {
    fields: FieldTable,
    /// Output column of each field (None when the input schema lacks it)
    field_columns: Vec<Option<usize>>,
    /// Field indices whose timestamps must be non-decreasing
    chain: Vec<usize>,
    lifecycle: LifecycleColumns,
    width: usize,
}

impl RowFactory {
    pub fn new(
        fields: FieldTable,
        ordering: &OrderingPolicy,
        columns: &Columns,
        lifecycle: LifecycleColumns,
    ) -> anyhow::Result<Self> {
        for required in [CREATED, MODIFIED] {
            if fields.get(required).is_none() {
                anyhow::bail!("field table must define '{}'", required);
            }
        }
        if !matches!(
            fields.get(MODIFIED).map(|f| &f.kind),
            Some(FieldKind::WithinHour)
        ) {
            anyhow::bail!(
                "field '{}' must be of kind within_hour so new rows fall inside their hour",
                MODIFIED
            );
        }

        let effective = ordering.effective_chain();
        // Clamping only lowers earlier links, so Modified must close the chain
        if let Some(pos) = effective.iter().position(|name| name == MODIFIED) {
            if pos + 1 != effective.len() {
                anyhow::bail!(
                    "ordering chain must end with '{}', got [{}]",
                    MODIFIED,
                    effective.join(", ")
                );
            }
        }

        let chain = effective
            .iter()
            .map(|name| {
                fields.position(name).ok_or_else(|| {
                    anyhow::anyhow!("ordering chain names unknown field '{}'", name)
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        let field_columns = fields
            .fields()
            .iter()
            .map(|f| columns.position(&f.name))
            .collect();

        Ok(Self {
            fields,
            field_columns,
            chain,
            lifecycle,
            width: columns.len(),
        })
    }

    /// Build `n` records stamped inside the hour starting at `hour_start`.
    ///
    /// IDs are taken from `ids` as one contiguous block, so the cursor
    /// advances by exactly `n`.
    pub fn build<R: Rng + ?Sized>(
        &self,
        n: u64,
        hour_start: NaiveDateTime,
        ids: &mut IdPool,
        rng: &mut R,
    ) -> anyhow::Result<Vec<Record>> {
        let id_range = ids.allocate(n)?;
        let mut records = Vec::with_capacity(n as usize);

        for id in id_range {
            let mut drawn = draw_row(&self.fields, hour_start, rng);
            clamp_chain(&mut drawn, &self.chain);
            for (value, spec) in drawn.iter_mut().zip(self.fields.fields()) {
                if spec.null_rate > 0.0 && rng.random_bool(spec.null_rate) {
                    *value = Value::Null;
                }
            }

            let mut values = vec![Value::Null; self.width];
            for (value, column) in drawn.into_iter().zip(&self.field_columns) {
                if let Some(column) = *column {
                    values[column] = value;
                }
            }

            let lc = self.lifecycle;
            values[lc.id] = Value::Int(id);
            values[lc.is_deleted] = Value::Bool(false);
            values[lc.day] = Value::Date(hour_start.date());
            values[lc.hour] = Value::Int(hour_start.hour() as i64);

            records.push(Record::new(values));
        }

        Ok(records)
    }

    pub fn fields(&self) -> &FieldTable {
        &self.fields
    }
}
