//! Deletion marker: soft-deletes a random live record.

use super::select_live;
use crate::fields::stamp_within_hour;
use crate::record::{LiveIndex, RecordSet, Value};
use chrono::NaiveDateTime;
use rand::Rng;

/// Flag one random live record as deleted.
///
/// The row stays in the table; only `isDeleted` changes, plus
/// `Modified`/`Day`/`Hour` when `stamp` is set. Returns the row position, or
/// None when no record is live.
pub fn delete_one<R: Rng + ?Sized>(
    table: &mut RecordSet,
    live: Option<&mut LiveIndex>,
    stamp: bool,
    hour_start: NaiveDateTime,
    rng: &mut R,
) -> Option<usize> {
    let row = select_live(table, live.as_deref(), rng)?;

    let is_deleted = table.lifecycle().is_deleted;
    table.row_mut(row).set(is_deleted, Value::Bool(true));
    if let Some(live) = live {
        live.remove(row);
    }

    if stamp {
        let not_before = table.created(row).max(table.modified(row));
        let modified = stamp_within_hour(rng, hour_start, not_before);
        table.stamp(row, modified, hour_start);
    }

    Some(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 10)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn table(n: i64) -> RecordSet {
        let names = ["ID", "Created", "Modified"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mut set = RecordSet::new(names).unwrap();
        for id in 1..=n {
            set.push_source_row(vec![
                Value::Int(id),
                Value::Timestamp(at(1)),
                Value::Timestamp(at(2)),
            ])
            .unwrap();
        }
        set
    }

    #[test]
    fn test_delete_until_empty() {
        let mut set = table(3);
        let mut live = LiveIndex::from_deleted_flags([false; 3]);
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        for _ in 0..3 {
            let row = delete_one(&mut set, Some(&mut live), true, at(5), &mut rng).unwrap();
            assert!(set.is_deleted(row));
            assert_eq!(set.row(row).get(set.lifecycle().hour), &Value::Int(5));
        }
        assert!(live.is_empty());
        assert_eq!(set.live_count(), 0);
        assert!(delete_one(&mut set, Some(&mut live), true, at(6), &mut rng).is_none());
    }

    #[test]
    fn test_unstamped_delete_keeps_modified() {
        let mut set = table(1);
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        let row = delete_one(&mut set, None, false, at(5), &mut rng).unwrap();
        assert!(set.is_deleted(row));
        assert_eq!(set.modified(row), Some(at(2)));
        assert!(set.row(row).get(set.lifecycle().day).is_null());
    }
}
