//! Console progress for simulation runs.
//!
//! An optional `indicatif` bar counts hour buckets; per-day summary lines go
//! to stderr either way, printed through the bar when one is shown so they
//! do not tear it.

use crate::sim::DayReport;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

#[derive(Clone)]
pub struct SimulationProgress {
    bar: Option<ProgressBar>,
    quiet: bool,
}

impl SimulationProgress {
    /// `show_bar` draws the bucket bar; `quiet` suppresses day lines too
    pub fn new(total_hours: u64, show_bar: bool, quiet: bool) -> Self {
        let bar = if show_bar && !quiet {
            let pb = ProgressBar::new(total_hours);
            pb.set_style(
                ProgressStyle::with_template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} hours ({percent}%) {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓▒░  ")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
            );
            pb.enable_steady_tick(Duration::from_millis(100));
            pb.set_message("Simulating...");
            Some(pb)
        } else {
            None
        };
        Self { bar, quiet }
    }

    /// Callback for completed hour buckets
    pub fn hour_callback(&self) -> impl Fn(u64) + 'static {
        let bar = self.bar.clone();
        move |done| {
            if let Some(ref pb) = bar {
                pb.set_position(done);
            }
        }
    }

    /// Callback for finished days
    pub fn day_callback(&self) -> impl FnMut(&DayReport) + 'static {
        let this = self.clone();
        move |report| this.day(report)
    }

    fn day(&self, report: &DayReport) {
        if self.quiet {
            return;
        }
        let line = format_day(report);
        match self.bar {
            Some(ref pb) => pb.println(line),
            None => eprintln!("{}", line),
        }
    }

    pub fn finish(&self) {
        if let Some(ref pb) = self.bar {
            pb.finish_and_clear();
        }
    }
}

/// One summary line for a simulated day
pub fn format_day(report: &DayReport) -> String {
    format!(
        "Day {}/{} ({}) simulated in {}: +{} rows, {} updates, {} deletes ({} live of {})",
        report.day_index + 1,
        report.days,
        report.date,
        format_elapsed(report.elapsed),
        format_count(report.created),
        format_count(report.updated),
        format_count(report.deleted),
        format_count(report.live_rows as u64),
        format_count(report.total_rows as u64),
    )
}

fn format_elapsed(elapsed: Duration) -> String {
    if elapsed.as_secs() >= 1 {
        format!("{:.2}s", elapsed.as_secs_f64())
    } else {
        format!("{}ms", elapsed.as_millis())
    }
}

/// Group digits in thousands: `12345` -> `12,345`
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
