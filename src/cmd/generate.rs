//! Generate command CLI handler.

use crate::progress::format_count;
use crate::seed::{self, SeedConfig, SeedYamlConfig};
use crate::writer::write_table;
use std::path::PathBuf;
use std::time::Instant;

pub fn run(
    output: PathBuf,
    rows: Option<usize>,
    seed: Option<u64>,
    config_file: Option<PathBuf>,
    clamp_ordering: bool,
    preview: usize,
) -> anyhow::Result<()> {
    let mut config = SeedConfig::default();
    if let Some(ref path) = config_file {
        SeedYamlConfig::load(path)?.apply_to(&mut config);
    }
    if let Some(rows) = rows {
        config.rows = rows;
    }
    if let Some(seed) = seed {
        config.seed = seed;
    }
    if clamp_ordering {
        config.ordering.clamp = true;
    }

    let start = Instant::now();
    let table = seed::generate(&config)?;
    write_table(&output, &table)?;

    eprintln!(
        "Generated {} rows ({} columns) with seed {} in {}ms",
        format_count(table.len() as u64),
        table.columns().len(),
        config.seed,
        start.elapsed().as_millis()
    );
    eprintln!("Written to: {}", output.display());

    if preview > 0 {
        println!("{}", table.preview(preview));
    }

    Ok(())
}
