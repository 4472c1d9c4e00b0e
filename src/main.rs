use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::Parser;

use site_bracketer::config::{AnalysisConfig, DateRange};
use site_bracketer::loader::load_table;
use site_bracketer::pipeline;
use site_bracketer::report::{print_summary, print_user};
use site_bracketer::standards::ReferenceTables;

/// Development brackets and progress analysis for power/acceleration testing.
#[derive(Parser, Debug)]
#[command(name = "site-bracketer")]
#[command(about = "Scores athletes' tests against goal standards and tracks bracket movement")]
#[command(version)]
struct Args {
    /// Path to the CSV or spreadsheet export.
    /// Can also be set via BRACKETER_FILE environment variable.
    #[arg(value_name = "FILE", env = "BRACKETER_FILE")]
    file: PathBuf,

    /// Minimum whole days between two counted tests of the same exercise (0 disables).
    #[arg(long, env = "BRACKETER_MIN_DAYS", default_value_t = 0)]
    min_days: u32,

    /// Highest test number included in group and region statistics.
    #[arg(long)]
    max_tests: Option<usize>,

    /// Keep only executions at the standard resistance.
    #[arg(long)]
    standardize_resistance: bool,

    /// First day to include (YYYY-MM-DD).
    #[arg(long, requires = "to")]
    from: Option<NaiveDate>,

    /// Last day to include (YYYY-MM-DD).
    #[arg(long, requires = "from")]
    to: Option<NaiveDate>,

    /// Print the matrices of one user.
    #[arg(long)]
    user: Option<String>,

    /// Write the full report as JSON to this path.
    #[arg(long, value_name = "PATH")]
    json: Option<PathBuf>,
}

impl Args {
    fn config(&self) -> AnalysisConfig {
        AnalysisConfig {
            min_days_between_tests: self.min_days,
            max_tests: self.max_tests,
            standardize_resistance: self.standardize_resistance,
            date_range: match (self.from, self.to) {
                (Some(start), Some(end)) => Some(DateRange::new(start, end)),
                _ => None,
            },
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = args.config();

    println!("Loading test data from: {}", args.file.display());
    let table = load_table(&args.file)
        .with_context(|| format!("Failed to load test data from {}", args.file.display()))?;

    let reference = ReferenceTables::default();
    let report = pipeline::run(&table, &config, &reference).context("Analysis failed")?;

    print_summary(&report);

    if let Some(name) = &args.user {
        match report.user(name) {
            Some(user) => print_user(user),
            None => bail!("No test data for user '{}'", name),
        }
    }

    if let Some(path) = &args.json {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(file, &report)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        println!();
        println!("Report written to: {}", path.display());
    }

    Ok(())
}
