mod generate;
mod simulate;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate as generate_completions, Shell};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "logistics-synth")]
#[command(version)]
#[command(about = "Generate and evolve synthetic logistics inventory data", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replay hourly create/update/delete activity on top of an existing CSV
    Simulate {
        /// Input CSV file (supports .gz, .bz2, .xz, .zst compression)
        file: PathBuf,

        /// Output CSV file (default: <input>_with_operations.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// YAML config file with rates, windows, fields and mutations
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Simulation start, e.g. "2024-06-10 00:00:00"
        #[arg(long)]
        start: Option<String>,

        /// Number of simulated days
        #[arg(long)]
        days: Option<u32>,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,

        /// Active hours per simulated day (counted window)
        #[arg(long, conflicts_with = "active_window")]
        active_hours: Option<u32>,

        /// Inactive hours per simulated day (counted window)
        #[arg(long, conflicts_with = "active_window")]
        inactive_hours: Option<u32>,

        /// Wall-clock active band START-END, e.g. 06-22
        #[arg(long)]
        active_window: Option<String>,

        /// Jump over hours outside the wall-clock band
        #[arg(long)]
        skip_inactive: bool,

        /// How live rows are picked: indexed, scan
        #[arg(long)]
        selection: Option<String>,

        /// ID pool size as a multiple of expected creations. Use 0 for no bound.
        #[arg(long)]
        id_pool_buffer: Option<f64>,

        /// Clamp new rows' Created <= LastMoveDateTime <= Modified
        #[arg(long)]
        clamp_ordering: bool,

        /// Leave Modified/Day/Hour untouched when soft-deleting
        #[arg(long)]
        no_stamp_deletes: bool,

        /// Rows to preview after the run (0 to disable)
        #[arg(long, default_value = "5")]
        preview: usize,

        /// Print run statistics as JSON
        #[arg(long)]
        json: bool,

        /// Validate input and configuration without simulating
        #[arg(long)]
        dry_run: bool,

        /// Show progress during simulation
        #[arg(short, long)]
        progress: bool,
    },

    /// Generate the static seed dataset
    Generate {
        /// Output CSV file (supports .gz, .bz2, .xz, .zst compression)
        #[arg(short, long, default_value = crate::seed::DEFAULT_OUTPUT)]
        output: PathBuf,

        /// Number of rows
        #[arg(long)]
        rows: Option<usize>,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,

        /// YAML config file with rows, seed and fields
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Clamp Created <= LastMoveDateTime <= Modified
        #[arg(long)]
        clamp_ordering: bool,

        /// Rows to preview after generating (0 to disable)
        #[arg(long, default_value = "5")]
        preview: usize,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Simulate {
            file,
            output,
            config,
            start,
            days,
            seed,
            active_hours,
            inactive_hours,
            active_window,
            skip_inactive,
            selection,
            id_pool_buffer,
            clamp_ordering,
            no_stamp_deletes,
            preview,
            json,
            dry_run,
            progress,
        } => simulate::run(
            file,
            output,
            config,
            start,
            days,
            seed,
            active_hours,
            inactive_hours,
            active_window,
            skip_inactive,
            selection,
            id_pool_buffer,
            clamp_ordering,
            no_stamp_deletes,
            preview,
            json,
            dry_run,
            progress,
        ),
        Commands::Generate {
            output,
            rows,
            seed,
            config,
            clamp_ordering,
            preview,
        } => generate::run(output, rows, seed, config, clamp_ordering, preview),
        Commands::Completions { shell } => {
            generate_completions(
                shell,
                &mut Cli::command(),
                "logistics-synth",
                &mut io::stdout(),
            );
            Ok(())
        }
    }
}
