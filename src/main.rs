//! foldscope - Bounded, classified directory summaries.
//!
//! Usage:
//!   foldscope [PATH]              Scan and print a summary
//!   foldscope scan [PATH]         Scan with explicit options
//!   foldscope export [PATH]       Export the scan payload to JSON
//!   foldscope --help              Show help

mod render;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, eyre};
use tracing_subscriber::EnvFilter;

use foldscope_core::{
    DEFAULT_CLOUD_MAX_FILE_BYTES, DEFAULT_MAX_DURATION, DEFAULT_MAX_FILES,
    DEFAULT_MAX_TOTAL_BYTES, ScanLimits, ScanReport,
};
use foldscope_scan::{ProgressSnapshot, ScanRegistry};

use render::Payload;

/// Interval between progress polls.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Parser)]
#[command(
    name = "foldscope",
    version,
    about = "Bounded, classified directory summaries",
    long_about = "foldscope scans a directory under hard file-count, size and time ceilings \
                  and summarizes it: file types, largest and newest files, project type, \
                  dependencies and related files.\n\n\
                  Run `foldscope [PATH]` for a console summary, or use subcommands."
)]
struct Cli {
    /// Path to analyze (defaults to current directory)
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Log debug events to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    limits: LimitArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Scan and show a summary
    Scan {
        /// Path to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        #[command(flatten)]
        limits: LimitArgs,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Do not display progress while scanning
        #[arg(short, long)]
        quiet: bool,
    },

    /// Export the scan payload to JSON
    Export {
        /// Path to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        #[command(flatten)]
        limits: LimitArgs,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Scan ceilings, in human units.
#[derive(Args, Clone)]
struct LimitArgs {
    /// Maximum number of files to analyze
    #[arg(long, default_value_t = DEFAULT_MAX_FILES)]
    max_files: u64,

    /// Maximum total size of analyzed files (e.g., "500MB", "50GB")
    #[arg(long)]
    max_size: Option<String>,

    /// Maximum scan time (e.g., "30s", "15m", "1h")
    #[arg(long)]
    timeout: Option<String>,

    /// Largest single file analyzed on cloud storage (e.g., "10MB")
    #[arg(long)]
    cloud_max_file_size: Option<String>,
}

impl LimitArgs {
    fn to_limits(&self) -> Result<ScanLimits> {
        let max_total_bytes = match &self.max_size {
            Some(s) => parse_size(s)?,
            None => DEFAULT_MAX_TOTAL_BYTES,
        };
        let max_duration = match &self.timeout {
            Some(s) => parse_duration(s)?,
            None => DEFAULT_MAX_DURATION,
        };
        let cloud_max_file_bytes = match &self.cloud_max_file_size {
            Some(s) => parse_size(s)?,
            None => DEFAULT_CLOUD_MAX_FILE_BYTES,
        };

        ScanLimits::builder()
            .max_files(self.max_files)
            .max_total_bytes(max_total_bytes)
            .max_duration(max_duration)
            .cloud_max_file_bytes(cloud_max_file_bytes)
            .build()
            .map_err(|e| eyre!("Invalid limits: {e}"))
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(Command::Scan {
            path,
            limits,
            format,
            quiet,
        }) => {
            run_scan(&path, &limits, format, quiet)?;
        }
        Some(Command::Export {
            path,
            limits,
            output,
        }) => {
            run_export(&path, &limits, output)?;
        }
        None => {
            run_scan(&cli.path, &cli.limits, OutputFormat::Text, false)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Run a scan and display the result.
fn run_scan(path: &Path, limits: &LimitArgs, format: OutputFormat, quiet: bool) -> Result<()> {
    let (report, progress) = scan(path, limits, !quiet)?;

    match format {
        OutputFormat::Text => {
            let stdout = std::io::stdout();
            render::write_text(&mut stdout.lock(), &report)?;
        }
        OutputFormat::Json => {
            let payload = Payload::new(&report, &progress);
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
    }

    Ok(())
}

/// Export the scan payload to JSON.
fn run_export(path: &Path, limits: &LimitArgs, output: Option<PathBuf>) -> Result<()> {
    let (report, progress) = scan(path, limits, true)?;

    let payload = Payload::new(&report, &progress);
    let json = serde_json::to_string_pretty(&payload)?;

    match output {
        Some(output_path) => {
            std::fs::write(&output_path, json)
                .with_context(|| format!("Failed to write {}", output_path.display()))?;
            eprintln!("Exported to {}", output_path.display());
        }
        None => {
            println!("{}", json);
        }
    }

    Ok(())
}

/// Scan `path` on a background worker, showing progress on stderr.
fn scan(path: &Path, limits: &LimitArgs, show_progress: bool) -> Result<(Arc<ScanReport>, ProgressSnapshot)> {
    let limits = limits.to_limits()?;
    tracing::debug!(?limits, path = %path.display(), "starting scan");
    let registry = ScanRegistry::new();
    let handle = registry
        .start_scan(path, limits)
        .context("Invalid path")?;

    let root = registry.root(handle)?;
    eprintln!("Scanning {}...", root.display());

    if show_progress {
        let mut stderr = std::io::stderr();
        loop {
            let snapshot = registry.poll(handle)?;
            let _ = write!(
                stderr,
                "\r\x1b[2K {} {}/{} ({:.0}%)",
                snapshot.stage,
                snapshot.current,
                snapshot.total,
                snapshot.percentage()
            );
            let _ = stderr.flush();
            if snapshot.is_finished() {
                let _ = writeln!(stderr);
                break;
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    let report = registry.wait(handle).context("Scan failed")?;
    let progress = registry.poll(handle)?;
    Ok((report, progress))
}

/// Parse a size string (e.g., "1KB", "10MB", "1GB").
fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim().to_uppercase();
    let number = |s: &str| -> Result<f64> {
        s.trim_end_matches(|c: char| !c.is_ascii_digit() && c != '.')
            .parse()
            .with_context(|| format!("Invalid size: {s}"))
    };

    let (num, multiplier) = if s.ends_with("GB") || s.ends_with('G') {
        (number(&s)?, 1024 * 1024 * 1024)
    } else if s.ends_with("MB") || s.ends_with('M') {
        (number(&s)?, 1024 * 1024)
    } else if s.ends_with("KB") || s.ends_with('K') {
        (number(&s)?, 1024)
    } else {
        (number(&s)?, 1)
    };

    Ok((num * multiplier as f64) as u64)
}

/// Parse a duration string (e.g., "30s", "15m", "1h"). Bare numbers are seconds.
fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim().to_lowercase();
    let number = |digits: &str| -> Result<f64> {
        digits
            .parse()
            .with_context(|| format!("Invalid duration: {s}"))
    };

    let (num, multiplier) = if let Some(digits) = s.strip_suffix('h') {
        (number(digits)?, 60.0 * 60.0)
    } else if let Some(digits) = s.strip_suffix('m') {
        (number(digits)?, 60.0)
    } else if let Some(digits) = s.strip_suffix('s') {
        (number(digits)?, 1.0)
    } else {
        (number(&s)?, 1.0)
    };

    Duration::try_from_secs_f64(num * multiplier).map_err(|e| eyre!("Invalid duration {s}: {e}"))
}
