//! Mutation selector: re-rolls one allowlisted field of a random live record.

use super::config::MutationRule;
use super::select_live;
use crate::fields::{draw_value, stamp_within_hour, FieldKind};
use crate::record::{Columns, LiveIndex, RecordSet, LIFECYCLE_COLUMNS, REQUIRED_COLUMNS};
use chrono::NaiveDateTime;
use rand::Rng;

/// A mutable column and the rule for its fresh values
#[derive(Debug, Clone)]
struct MutationTarget {
    column: usize,
    kind: FieldKind,
}

/// Outcome of one applied mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mutation {
    pub row: usize,
    pub column: usize,
}

#[derive(Debug, Clone)]
pub struct MutationSelector {
    targets: Vec<MutationTarget>,
}

impl MutationSelector {
    /// Resolve the allowlist against the record set's columns.
    ///
    /// Every target must exist in the schema and none may be a required or
    /// lifecycle column.
    pub fn new(rules: &[MutationRule], columns: &Columns) -> anyhow::Result<Self> {
        if rules.is_empty() {
            anyhow::bail!("mutation allowlist must not be empty");
        }

        let mut targets = Vec::with_capacity(rules.len());
        for rule in rules {
            rule.validate()?;
            let name = rule.field.as_str();
            if REQUIRED_COLUMNS.contains(&name) || LIFECYCLE_COLUMNS.contains(&name) {
                anyhow::bail!("column '{}' is managed by the simulator and cannot be mutated", name);
            }
            let column = columns.position(name).ok_or_else(|| {
                anyhow::anyhow!("mutation target '{}' is not a column of the input", name)
            })?;
            targets.push(MutationTarget {
                column,
                kind: rule.kind.clone(),
            });
        }

        Ok(Self { targets })
    }

    /// Mutate one random live record inside the hour starting at `hour_start`.
    ///
    /// Returns None (and changes nothing) when no record is live.
    pub fn mutate_one<R: Rng + ?Sized>(
        &self,
        table: &mut RecordSet,
        live: Option<&LiveIndex>,
        hour_start: NaiveDateTime,
        rng: &mut R,
    ) -> Option<Mutation> {
        let row = select_live(table, live, rng)?;
        let target = &self.targets[rng.random_range(0..self.targets.len())];
        let value = draw_value(&target.kind, None, hour_start, rng);

        let not_before = table.created(row).max(table.modified(row));
        let modified = stamp_within_hour(rng, hour_start, not_before);

        table.row_mut(row).set(target.column, value);
        table.stamp(row, modified, hour_start);

        Some(Mutation {
            row,
            column: target.column,
        })
    }
}
