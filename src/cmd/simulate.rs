//! Simulate command CLI handler.

use crate::fields::FieldTable;
use crate::progress::{format_count, SimulationProgress};
use crate::reader::read_table;
use crate::record::parse_timestamp;
use crate::sim::{ActiveWindow, Selection, SimulationConfig, SimulationYamlConfig, Simulator};
use crate::writer::write_table;
use std::path::{Path, PathBuf};

#[allow(clippy::too_many_arguments)]
pub fn run(
    file: PathBuf,
    output: Option<PathBuf>,
    config_file: Option<PathBuf>,
    start: Option<String>,
    days: Option<u32>,
    seed: Option<u64>,
    active_hours: Option<u32>,
    inactive_hours: Option<u32>,
    active_window: Option<String>,
    skip_inactive: bool,
    selection: Option<String>,
    id_pool_buffer: Option<f64>,
    clamp_ordering: bool,
    no_stamp_deletes: bool,
    preview: usize,
    json: bool,
    dry_run: bool,
    progress: bool,
) -> anyhow::Result<()> {
    let mut config = SimulationConfig::default();
    if let Some(ref path) = config_file {
        SimulationYamlConfig::load(path)?.apply_to(&mut config);
    }

    // CLI flags override the config file
    if let Some(start) = start {
        config.start = parse_timestamp(start.trim())
            .ok_or_else(|| anyhow::anyhow!("Invalid --start timestamp: {}", start))?;
    }
    if let Some(days) = days {
        config.days = days;
    }
    if let Some(seed) = seed {
        config.seed = seed;
    }
    if active_hours.is_some() || inactive_hours.is_some() {
        let (active, inactive, first) = match config.window {
            ActiveWindow::Counted {
                active_hours,
                inactive_hours,
                inactive_first,
            } => (active_hours, inactive_hours, inactive_first),
            ActiveWindow::WallClock { .. } => (16, 8, true),
        };
        config.window = ActiveWindow::Counted {
            active_hours: active_hours.unwrap_or(active),
            inactive_hours: inactive_hours.unwrap_or(inactive),
            inactive_first: first,
        };
    }
    if let Some(ref window) = active_window {
        config.window = window.parse().map_err(|e| anyhow::anyhow!("{}", e))?;
    }
    if skip_inactive {
        match config.window {
            ActiveWindow::WallClock {
                ref mut skip_inactive,
                ..
            } => *skip_inactive = true,
            ActiveWindow::Counted { .. } => {
                anyhow::bail!("--skip-inactive requires a wall-clock --active-window")
            }
        }
    }
    if let Some(ref s) = selection {
        config.selection = s.parse::<Selection>().map_err(|e| anyhow::anyhow!("{}", e))?;
    }
    if let Some(buffer) = id_pool_buffer {
        config.id_pool_buffer = if buffer == 0.0 { None } else { Some(buffer) };
    }
    if clamp_ordering {
        config.ordering.clamp = true;
    }
    if no_stamp_deletes {
        config.stamp_deletes = false;
    }

    let fields = FieldTable::new(config.fields.clone())?;
    let table = read_table(&file, &fields)?;
    let output = output.unwrap_or_else(|| default_output(&file));

    if !json {
        eprintln!(
            "Loaded {} rows ({} columns) from {}",
            format_count(table.len() as u64),
            table.columns().len(),
            file.display()
        );
        eprintln!(
            "Simulating {} days from {} [{}], seed {}",
            config.days, config.start, config.window, config.seed
        );
    }

    let simulator = Simulator::new(config, table)?;
    let total_hours = simulator.schedule().total_buckets();

    if dry_run {
        eprintln!();
        eprintln!("Dry run: configuration is valid");
        eprintln!("  Hour buckets: {}", format_count(total_hours));
        eprintln!(
            "  Next ID: {} ({} IDs reserved)",
            simulator.ids().next_id(),
            match simulator.ids().remaining() {
                n if n > u32::MAX as u64 => "unbounded".to_string(),
                n => format_count(n),
            }
        );
        eprintln!("  Output: {}", output.display());
        return Ok(());
    }

    let reporter = SimulationProgress::new(total_hours, progress, json);
    let result = simulator
        .with_progress(reporter.hour_callback())
        .with_day_report(reporter.day_callback())
        .run();
    reporter.finish();
    let result = result?;

    write_table(&output, &result.table)?;
    let stats = &result.stats;

    if json {
        println!("{}", serde_json::to_string_pretty(stats)?);
        return Ok(());
    }

    eprintln!();
    eprintln!("Simulation Statistics:");
    eprintln!(
        "  Hours simulated: {} ({} active, {} inactive)",
        stats.hours_simulated, stats.active_hours, stats.inactive_hours
    );
    eprintln!("  Rows created: {}", format_count(stats.rows_created));
    eprintln!("  Updates applied: {}", format_count(stats.updates_applied));
    eprintln!("  Deletes applied: {}", format_count(stats.deletes_applied));
    if stats.operations_skipped > 0 {
        eprintln!(
            "  Operations skipped (no live rows): {}",
            format_count(stats.operations_skipped)
        );
    }
    eprintln!(
        "  Total rows: {} ({} live, {} deleted)",
        format_count(stats.total_rows as u64),
        format_count(stats.live_rows as u64),
        format_count(stats.deleted_rows as u64)
    );
    eprintln!("  Elapsed: {}ms", stats.elapsed_ms);
    eprintln!("  Written to: {}", output.display());

    if preview > 0 {
        println!("{}", result.table.preview(preview));
    }

    Ok(())
}

/// `<dir>/<stem>_with_operations.csv[.<compression>]` next to the input
pub fn default_output(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("data.csv");

    let (base, compression) = match name.rsplit_once('.') {
        Some((base, ext)) if matches!(ext, "gz" | "bz2" | "xz" | "zst") => (base, Some(ext)),
        _ => (name, None),
    };
    let stem = base.strip_suffix(".csv").unwrap_or(base);

    let mut out = format!("{}_with_operations.csv", stem);
    if let Some(ext) = compression {
        out.push('.');
        out.push_str(ext);
    }
    input.with_file_name(out)
}
