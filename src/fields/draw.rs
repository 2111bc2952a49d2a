//! Pure value drawing for field kinds.

use super::{FieldKind, FieldTable};
use crate::record::Value;
use chrono::{NaiveDateTime, TimeDelta};
use rand::Rng;

const SECONDS_PER_HOUR: i64 = 3600;

/// Draw one value of `kind`.
///
/// `source` is the already-drawn value of the field a derived kind reads;
/// `hour_start` anchors `within_hour`.
pub fn draw_value<R: Rng + ?Sized>(
    kind: &FieldKind,
    source: Option<&Value>,
    hour_start: NaiveDateTime,
    rng: &mut R,
) -> Value {
    match kind {
        FieldKind::Sequence => Value::Null,
        FieldKind::UniformInt { low, high } => Value::Int(rng.random_range(*low..*high)),
        FieldKind::UniformFloat { low, high } => {
            Value::Float(low + rng.random::<f64>() * (high - low))
        }
        FieldKind::Categorical { values, weights } => {
            let idx = match weights {
                Some(weights) => weighted_index(weights, rng),
                None => rng.random_range(0..values.len()),
            };
            Value::Text(values[idx].clone())
        }
        FieldKind::DaysAfter {
            from,
            min_days,
            max_days,
        } => Value::Timestamp(*from + TimeDelta::days(rng.random_range(*min_days..*max_days))),
        FieldKind::DaysAfterField {
            min_days, max_days, ..
        } => {
            let offset = TimeDelta::days(rng.random_range(*min_days..*max_days));
            match source.and_then(Value::as_timestamp) {
                Some(base) => Value::Timestamp(base + offset),
                None => Value::Null,
            }
        }
        FieldKind::CopyOf { .. } => source.cloned().unwrap_or(Value::Null),
        FieldKind::WithinHour => Value::Timestamp(stamp_within_hour(rng, hour_start, None)),
    }
}

/// Draw every field of `table` for one record, in table order.
///
/// Fields are visited in dependency order so derived fields see their
/// source. Sequence fields are left null for the caller to assign. Null rates
/// are not applied here.
pub fn draw_row<R: Rng + ?Sized>(
    table: &FieldTable,
    hour_start: NaiveDateTime,
    rng: &mut R,
) -> Vec<Value> {
    let mut values = vec![Value::Null; table.len()];
    for &idx in table.draw_order() {
        let value = {
            let source = table.parent(idx).map(|p| &values[p]);
            draw_value(&table.fields()[idx].kind, source, hour_start, rng)
        };
        values[idx] = value;
    }
    values
}

/// Make the timestamps at `chain` positions non-decreasing.
///
/// Walks backward taking pairwise minimums, so later links are kept and
/// earlier ones are pulled down. Null or non-timestamp links are skipped.
pub fn clamp_chain(values: &mut [Value], chain: &[usize]) {
    let mut upper: Option<NaiveDateTime> = None;
    for &idx in chain.iter().rev() {
        let Some(current) = values[idx].as_timestamp() else {
            continue;
        };
        match upper {
            Some(bound) if current > bound => values[idx] = Value::Timestamp(bound),
            _ => upper = Some(current),
        }
    }
}

/// Uniform whole-second timestamp inside `[hour_start, hour_start + 1h)`.
///
/// When `not_before` falls inside that hour the draw starts there instead,
/// so a re-stamped `Modified` never precedes an earlier stamp in the same
/// hour.
pub fn stamp_within_hour<R: Rng + ?Sized>(
    rng: &mut R,
    hour_start: NaiveDateTime,
    not_before: Option<NaiveDateTime>,
) -> NaiveDateTime {
    let hour_end = hour_start + TimeDelta::seconds(SECONDS_PER_HOUR);
    let mut low = 0;
    if let Some(floor) = not_before.filter(|t| *t >= hour_start && *t < hour_end) {
        low = (floor - hour_start).num_seconds();
        if hour_start + TimeDelta::seconds(low) < floor {
            low += 1;
        }
        low = low.min(SECONDS_PER_HOUR - 1);
    }
    hour_start + TimeDelta::seconds(rng.random_range(low..SECONDS_PER_HOUR))
}

fn weighted_index<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> usize {
    let total: f64 = weights.iter().sum();
    let mut target = rng.random::<f64>() * total;
    let mut last_positive = 0;
    for (i, w) in weights.iter().enumerate() {
        if *w <= 0.0 {
            continue;
        }
        if target < *w {
            return i;
        }
        target -= w;
        last_positive = i;
    }
    last_positive
}
