use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use redline::config::{ConfigOverrides, RunConfig};
use redline::pipeline;

#[derive(Parser, Debug)]
#[command(name = "redline")]
#[command(about = "Line redundancy checker and token-frequency classifier for Word documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// TOML file with output destinations and options
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use memory-mapped I/O instead of async buffered reads
    #[arg(long, global = true)]
    use_mmap: bool,

    /// Suppress console progress bars
    #[arg(long, global = true)]
    no_progress: bool,

    /// Write run statistics as JSON to this path
    #[arg(long, global = true)]
    stats_out: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Underline lines that repeat their predecessor and report line frequencies
    Annotate(AnnotateArgs),
    /// Reorganize each line around its most frequent token
    Classify(ClassifyArgs),
}

#[derive(Args, Debug)]
struct AnnotateArgs {
    /// Source document (.docx or .txt)
    input: PathBuf,

    /// Annotated output document (.docx)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Frequency report workbook
    #[arg(long)]
    frequency_report: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ClassifyArgs {
    /// Source document (.docx or .txt)
    input: PathBuf,

    /// Workbook whose first two columns hold token and count
    frequency_table: PathBuf,

    /// Classified reference table workbook
    #[arg(long)]
    reference_table: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // WHY: structured JSON logging, level taken from RUST_LOG
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();
    info!(?cli, "Parsed CLI arguments");

    let mut overrides = ConfigOverrides {
        use_mmap: cli.use_mmap,
        no_progress: cli.no_progress,
        ..Default::default()
    };

    match &cli.command {
        Command::Annotate(args) => {
            validate_input(&args.input)?;
            overrides.annotated_document = args.output.clone();
            overrides.frequency_report = args.frequency_report.clone();
            let config = RunConfig::resolve(cli.config.as_deref(), overrides)?;

            let stats = pipeline::annotate(&args.input, &config).await?;

            println!("redline v{} - annotation complete", env!("CARGO_PKG_VERSION"));
            println!("  Lines read: {}", stats.lines_read);
            println!("  Distinct lines: {}", stats.distinct_lines);
            println!("  Repeated lines underlined: {}", stats.duplicate_lines);
            println!("Output saved to: {}", stats.annotated_document);
            println!("Frequency table: {}", stats.frequency_report);

            write_stats(cli.stats_out.as_deref(), &stats).await?;
        }
        Command::Classify(args) => {
            validate_input(&args.input)?;
            validate_input(&args.frequency_table)?;
            overrides.reference_table = args.reference_table.clone();
            let config = RunConfig::resolve(cli.config.as_deref(), overrides)?;

            let stats = pipeline::classify(&args.input, &args.frequency_table, &config).await?;

            println!("redline v{} - classification complete", env!("CARGO_PKG_VERSION"));
            println!("  Lines read: {}", stats.lines_read);
            println!("  Frequency entries: {}", stats.table_entries);
            println!("  Rows with a dominant token: {}", stats.single_token_rows + stats.top_token_rows);
            println!("  Rows without a match: {}", stats.sorted_lines);
            println!("{} has been created successfully!", stats.reference_table);

            write_stats(cli.stats_out.as_deref(), &stats).await?;
        }
    }

    Ok(())
}

/// Fail early with a clear message before any reading starts
fn validate_input(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("Input file does not exist: {}", path.display());
    }
    if !path.is_file() {
        anyhow::bail!("Input path is not a file: {}", path.display());
    }
    Ok(())
}

async fn write_stats<T: Serialize>(path: Option<&Path>, stats: &T) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let json = serde_json::to_string_pretty(stats)?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write stats to {}", path.display()))?;
    info!("Run statistics written to {}", path.display());
    Ok(())
}
