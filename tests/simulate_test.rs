//! Integration tests for the activity simulator.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta, Timelike};
use logistics_synth::fields::FieldTable;
use logistics_synth::reader::{read_table, read_table_from};
use logistics_synth::record::{RecordSet, Value};
use logistics_synth::seed::{self, SeedConfig};
use logistics_synth::sim::{
    ActiveWindow, CountDistribution, HourlyRates, HourWorkload, Selection, SimulationConfig,
    Simulator, WorkloadProfile,
};
use logistics_synth::writer::{table_to_bytes, write_table};
use std::collections::HashSet;
use std::fs;
use tempfile::TempDir;

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 10)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Small rates so full runs stay fast
fn light_workload() -> WorkloadProfile {
    WorkloadProfile {
        active: HourlyRates {
            creations: CountDistribution::new(12.0, 3.0),
            updates: CountDistribution::new(6.0, 2.0),
            deletes: CountDistribution::new(3.0, 1.5),
        },
        inactive: HourlyRates {
            creations: CountDistribution::new(3.0, 1.0),
            updates: CountDistribution::new(2.0, 1.0),
            deletes: CountDistribution::new(1.0, 1.0),
        },
    }
}

fn config(seed: u64) -> SimulationConfig {
    SimulationConfig {
        seed,
        days: 2,
        workload: light_workload(),
        ..Default::default()
    }
}

fn seed_table(rows: usize) -> RecordSet {
    let config = SeedConfig {
        rows,
        ..Default::default()
    };
    seed::generate(&config).unwrap()
}

/// Round-trip through CSV so the table is typed as the simulator reads it
fn reread(table: &RecordSet) -> RecordSet {
    let bytes = table_to_bytes(table).unwrap();
    read_table_from(bytes.as_slice(), &FieldTable::logistics_activity()).unwrap()
}

/// A full-width activity CSV with a single row
fn single_row_csv(id: i64, deleted: bool) -> String {
    let names = FieldTable::logistics_activity().names();
    let mut cells = vec![String::new(); names.len()];
    for (i, name) in names.iter().enumerate() {
        cells[i] = match name.as_str() {
            "ID" => id.to_string(),
            "Created" => "2024-06-01 08:00:00".to_string(),
            "Modified" => "2024-06-02 09:00:00".to_string(),
            "Status" => "Pending".to_string(),
            _ => String::new(),
        };
    }
    format!(
        "{},isDeleted\n{},{}\n",
        names.join(","),
        cells.join(","),
        deleted
    )
}

fn read_csv(text: &str) -> RecordSet {
    read_table_from(text.as_bytes(), &FieldTable::logistics_activity()).unwrap()
}

#[test]
fn test_one_hour_scenario() {
    let table = read_csv(&single_row_csv(5, false));
    let mut sim = Simulator::new(config(1), table).unwrap();
    let bucket = sim.schedule().buckets().next().unwrap();

    sim.step(&bucket, HourWorkload::new(3, 1, 1)).unwrap();
    let out = sim.finish();

    assert_eq!(out.table.len(), 4);
    let ids: Vec<i64> = (0..4).filter_map(|i| out.table.id(i)).collect();
    assert_eq!(ids, vec![5, 6, 7, 8]);
    let deleted = (0..4).filter(|&i| out.table.is_deleted(i)).count();
    assert_eq!(deleted, 1);
}

#[test]
fn test_zero_workload_is_identity() {
    let input = reread(&seed_table(200));
    let before = table_to_bytes(&input).unwrap();

    let mut config = config(9);
    config.workload = WorkloadProfile {
        active: HourlyRates::idle(),
        inactive: HourlyRates::idle(),
    };
    let out = Simulator::new(config, input).unwrap().run().unwrap();

    assert_eq!(out.stats.rows_created, 0);
    assert_eq!(table_to_bytes(&out.table).unwrap(), before);

    // Sub-second stamps are written back unchanged
    let text = single_row_csv(1, false).replace("2024-06-02 09:00:00", "2024-06-02 09:00:00.750");
    let input = read_csv(&text);
    let before = table_to_bytes(&input).unwrap();
    let mut config = self::config(9);
    config.workload = WorkloadProfile {
        active: HourlyRates::idle(),
        inactive: HourlyRates::idle(),
    };
    let out = Simulator::new(config, input).unwrap().run().unwrap();
    let after = table_to_bytes(&out.table).unwrap();
    assert_eq!(after, before);
    assert!(String::from_utf8(after).unwrap().contains("2024-06-02 09:00:00.750"));
}

#[test]
fn test_fixed_seed_is_reproducible() {
    let input = reread(&seed_table(150));
    let a = Simulator::new(config(2024), input.clone()).unwrap().run().unwrap();
    let b = Simulator::new(config(2024), input.clone()).unwrap().run().unwrap();
    let c = Simulator::new(config(2025), input).unwrap().run().unwrap();

    let bytes_a = table_to_bytes(&a.table).unwrap();
    assert_eq!(bytes_a, table_to_bytes(&b.table).unwrap());
    assert_ne!(bytes_a, table_to_bytes(&c.table).unwrap());
}

#[test]
fn test_all_deleted_input_is_untouched() {
    let table = read_csv(&single_row_csv(1, true));
    let before = table_to_bytes(&table).unwrap();
    let mut sim = Simulator::new(config(3), table).unwrap();
    let bucket = sim.schedule().buckets().next().unwrap();

    let report = sim.step(&bucket, HourWorkload::new(0, 10, 10)).unwrap();
    assert_eq!(report.updated, 0);
    assert_eq!(report.deleted, 0);
    assert_eq!(report.skipped, 20);
    assert_eq!(table_to_bytes(&sim.finish().table).unwrap(), before);
}

#[test]
fn test_output_invariants_hold() {
    for selection in [Selection::Indexed, Selection::Scan] {
        for stamp_deletes in [true, false] {
            let mut config = config(77);
            config.selection = selection;
            config.stamp_deletes = stamp_deletes;
            let out = Simulator::new(config, reread(&seed_table(100)))
                .unwrap()
                .run()
                .unwrap();
            let table = &out.table;
            let lc = table.lifecycle();

            let mut ids = HashSet::new();
            for i in 0..table.len() {
                assert!(ids.insert(table.id(i).unwrap()), "duplicate ID at row {}", i);
                let created = table.created(i).unwrap();
                let modified = table.modified(i).unwrap();
                assert!(created <= modified, "row {}: {} > {}", i, created, modified);

                // A stamped row's Modified lies inside its Day/Hour bucket
                let row = table.row(i);
                if let Some(hour) = row.get(lc.hour).as_int() {
                    let day = row.get(lc.day).as_timestamp().unwrap();
                    let hour_start = day + TimeDelta::hours(hour);
                    assert!(
                        hour_start <= modified && modified < hour_start + TimeDelta::hours(1),
                        "row {}: {} outside hour starting {} ({:?}, stamp_deletes={})",
                        i,
                        modified,
                        hour_start,
                        selection,
                        stamp_deletes
                    );
                }
            }

            // Input rows first, then new rows in creation order
            let new_ids: Vec<i64> = (100..table.len()).filter_map(|i| table.id(i)).collect();
            assert!(new_ids.windows(2).all(|w| w[1] == w[0] + 1));
            assert_eq!(new_ids.first().copied(), Some(101));
            assert_eq!(out.stats.live_rows, table.live_count());
        }
    }
}

#[test]
fn test_clamped_chain_holds_for_new_rows() {
    let mut config = config(5);
    config.ordering.clamp = true;
    let out = Simulator::new(config, reread(&seed_table(20)))
        .unwrap()
        .run()
        .unwrap();
    let table = &out.table;
    let last_move = table.columns().position("LastMoveDateTime").unwrap();

    for i in 20..table.len() {
        let moved = table.row(i).get(last_move).as_timestamp().unwrap();
        assert!(table.created(i).unwrap() <= moved);
    }
}

#[test]
fn test_deleted_rows_only_change_lifecycle_stamps() {
    let table = reread(&seed_table(50));
    let mut sim = Simulator::new(config(8), table).unwrap();
    let buckets: Vec<_> = sim.schedule().buckets().take(3).collect();

    let before = sim.table().rows().to_vec();
    sim.step(&buckets[0], HourWorkload::new(0, 0, 10)).unwrap();

    let lc = sim.table().lifecycle();
    let stamped = [lc.modified, lc.day, lc.hour, lc.is_deleted];
    let mut frozen = Vec::new();
    for (i, old) in before.iter().enumerate() {
        let new = sim.table().row(i);
        if !sim.table().is_deleted(i) {
            assert_eq!(old, new);
            continue;
        }
        frozen.push(i);
        for (col, (a, b)) in old.values().iter().zip(new.values()).enumerate() {
            if !stamped.contains(&col) {
                assert_eq!(a, b, "row {} column {} changed on delete", i, col);
            }
        }
    }
    assert_eq!(frozen.len(), 10);

    // Later activity never touches deleted rows
    let snapshot: Vec<_> = frozen.iter().map(|&i| sim.table().row(i).clone()).collect();
    sim.step(&buckets[1], HourWorkload::new(5, 40, 5)).unwrap();
    sim.step(&buckets[2], HourWorkload::new(5, 40, 5)).unwrap();
    for (&i, old) in frozen.iter().zip(&snapshot) {
        assert_eq!(sim.table().row(i), old);
    }
}

#[test]
fn test_unstamped_deletes_keep_modified() {
    let table = reread(&seed_table(30));
    let mut config = config(4);
    config.stamp_deletes = false;
    let mut sim = Simulator::new(config, table).unwrap();
    let before = sim.table().rows().to_vec();
    let bucket = sim.schedule().buckets().next().unwrap();

    sim.step(&bucket, HourWorkload::new(0, 0, 30)).unwrap();
    let is_deleted = sim.table().lifecycle().is_deleted;
    for (i, old) in before.iter().enumerate() {
        let mut expected = old.clone();
        expected.set(is_deleted, Value::Bool(true));
        assert_eq!(sim.table().row(i), &expected);
    }
}

#[test]
fn test_id_pool_exhaustion_is_fatal() {
    let mut config = config(6);
    config.days = 1;
    config.id_pool_buffer = Some(0.01);
    let mut sim = Simulator::new(config, read_csv(&single_row_csv(1, false))).unwrap();
    let capacity = sim.ids().remaining();
    let bucket = sim.schedule().buckets().next().unwrap();

    let err = sim
        .step(&bucket, HourWorkload::new(capacity + 1, 0, 0))
        .unwrap_err();
    assert!(err.to_string().contains("ID pool exhausted"));
}

#[test]
fn test_unbounded_pool_never_exhausts() {
    let mut config = config(6);
    config.id_pool_buffer = None;
    let mut sim = Simulator::new(config, read_csv(&single_row_csv(1, false))).unwrap();
    let bucket = sim.schedule().buckets().next().unwrap();
    let report = sim.step(&bucket, HourWorkload::new(5000, 0, 0)).unwrap();
    assert_eq!(report.created, 5000);
}

#[test]
fn test_malformed_input_is_fatal() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.csv");
    fs::write(&path, "ID,Created,Modified\n1,not-a-date,2024-06-01 00:00:00\n").unwrap();

    let err = read_table(&path, &FieldTable::logistics_activity()).unwrap_err();
    assert!(err.to_string().contains("bad.csv"));
    assert!(err.to_string().contains("Created"));
}

#[test]
fn test_rows_created_after_start_rejected() {
    let mut config = config(1);
    config.start = NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    assert!(Simulator::new(config, read_csv(&single_row_csv(1, false))).is_err());
}

#[test]
fn test_missing_mutation_column_rejected() {
    let table = read_csv("ID,Created,Modified\n1,2024-06-01,2024-06-01\n");
    let err = Simulator::new(config(1), table).err().unwrap();
    assert!(err.to_string().contains("mutation target"));
}

#[test]
fn test_skip_mode_stays_in_band() {
    let mut config = config(12);
    config.window = ActiveWindow::WallClock {
        start_hour: 6,
        end_hour: 22,
        skip_inactive: true,
    };
    let out = Simulator::new(config, reread(&seed_table(40)))
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(out.stats.hours_simulated, 32);
    assert_eq!(out.stats.inactive_hours, 0);

    let lc = out.table.lifecycle();
    let mut touched = 0;
    for row in out.table.rows() {
        if let Some(hour) = row.get(lc.hour).as_int() {
            assert!((6..22).contains(&hour), "hour {} outside band", hour);
            touched += 1;
        }
        if let Some(modified) = row.get(lc.modified).as_timestamp() {
            if modified >= start() {
                assert!((6..22).contains(&modified.hour()));
            }
        }
    }
    assert!(touched > 0);
}

#[test]
fn test_day_reports_cover_every_day() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let days = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&days);
    let out = Simulator::new(config(10), reread(&seed_table(30)))
        .unwrap()
        .with_day_report(move |report| sink.borrow_mut().push(report.clone()))
        .run()
        .unwrap();

    let days = days.borrow();
    assert_eq!(days.len(), 2);
    assert_eq!(days[0].date, start().date());
    assert_eq!(days[1].day_index, 1);
    let created: u64 = days.iter().map(|d| d.created).sum();
    assert_eq!(created, out.stats.rows_created);
    assert_eq!(days[1].total_rows, out.table.len());
}

#[test]
fn test_output_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let input_path = dir.path().join("seed.csv.gz");
    write_table(&input_path, &seed_table(60)).unwrap();

    let fields = FieldTable::logistics_activity();
    let input = read_table(&input_path, &fields).unwrap();
    let out = Simulator::new(config(33), input).unwrap().run().unwrap();

    let output_path = dir.path().join("seed_with_operations.csv");
    write_table(&output_path, &out.table).unwrap();
    let reread = read_table(&output_path, &fields).unwrap();

    assert_eq!(reread.len(), out.table.len());
    assert_eq!(
        table_to_bytes(&reread).unwrap(),
        fs::read(&output_path).unwrap()
    );
}

#[test]
fn test_stats_serialize_to_json() {
    let out = Simulator::new(config(3), reread(&seed_table(10)))
        .unwrap()
        .run()
        .unwrap();
    let json = serde_json::to_value(&out.stats).unwrap();
    assert_eq!(json["seed"], 3);
    assert_eq!(json["hours_simulated"], 48);
    assert_eq!(json["input_rows"], 10);
}

#[test]
fn test_historical_field_table_rejected() {
    let mut config = config(4);
    config.fields = FieldTable::logistics_historical().fields().to_vec();
    let err = Simulator::new(config, read_csv(&single_row_csv(1, false)))
        .err()
        .unwrap();
    assert!(err.to_string().contains("within_hour"));
}

#[test]
fn test_max_input_id_rejected() {
    let table = read_csv(&single_row_csv(i64::MAX, false));
    let err = Simulator::new(config(6), table).err().unwrap();
    assert!(err.to_string().contains("no room for new IDs"));
}
