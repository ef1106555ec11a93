use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mgmt_report_tools::consolidate::{self, RunOptions};
use mgmt_report_tools::model::Period;
use mgmt_report_tools::{Result, ToolError};

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    init_tracing()?;
    match cli.command {
        Command::Consolidate(args) => execute_consolidate(args),
        Command::Scan(args) => execute_scan(args),
    }
}

fn init_tracing() -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("mgmt_report_tools=info"));
    fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|error| ToolError::Logging(error.to_string()))
}

fn execute_consolidate(args: ConsolidateArgs) -> Result<()> {
    let options = RunOptions {
        input: args.input,
        output: args.output,
        period: args.period,
    };
    let summary = consolidate::consolidate_folder(&options)?;
    println!(
        "{} workbook(s) written, {} target(s) skipped, {} failed",
        summary.written.len(),
        summary.skipped_empty,
        summary.failed
    );
    Ok(())
}

fn execute_scan(args: ScanArgs) -> Result<()> {
    let inventory = consolidate::inventory(&args.input, args.period.as_ref())?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&inventory)?);
        return Ok(());
    }

    for record in &inventory.records {
        println!(
            "{:<24} {:<8} {:<7} {}",
            record.code,
            record.period,
            record.kind.code(),
            record.path.display()
        );
    }
    println!(
        "{} record(s), {} target(s):",
        inventory.records.len(),
        inventory.targets.len()
    );
    for target in &inventory.targets {
        println!("  {} {}", target.code, target.period);
    }
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Consolidate per-property portal reports into management report workbooks."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Assemble one consolidated workbook per property and period.
    Consolidate(ConsolidateArgs),
    /// List the recognised report files and the targets they imply.
    Scan(ScanArgs),
}

#[derive(clap::Args)]
struct ConsolidateArgs {
    /// Folder holding the downloaded report files.
    #[arg(long)]
    input: PathBuf,

    /// Output folder. Defaults to `<input>/Consolidated`.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Only consolidate this period (MM-YYYY).
    #[arg(long)]
    period: Option<Period>,
}

#[derive(clap::Args)]
struct ScanArgs {
    /// Folder holding the downloaded report files.
    #[arg(long)]
    input: PathBuf,

    /// Only list this period (MM-YYYY).
    #[arg(long)]
    period: Option<Period>,

    /// Emit the inventory as JSON.
    #[arg(long)]
    json: bool,
}
