//! Hevyload CLI - upload spreadsheet rows to the Hevy API
//!
//! # Main Commands
//!
//! ```bash
//! hevyload upload --input exercises.csv --config hevy.yaml           # Send every row
//! hevyload upload --input exercises.csv --config hevy.yaml --dry-run # Show payloads only
//! hevyload check-config --config hevy.yaml                           # Validate configuration
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! hevyload parse --input exercises.csv    # Dump parsed rows as JSON
//! ```

use clap::{Parser, Subcommand};
use hevyload::config::{check_delimiter, load_dotenv};
use hevyload::error::RunResult;
use hevyload::logs::{self, log_info, log_info_indent, log_success, log_warning};
use hevyload::upload::window;
use hevyload::{parse_file, report, AppConfig, RowNumbering, SourceOptions, Uploader};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "hevyload")]
#[command(about = "Bulk upload spreadsheet rows to the Hevy API", long_about = None)]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Map every row to a payload and submit it
    Upload {
        /// Input CSV file
        #[arg(short, long)]
        input: PathBuf,

        /// YAML configuration
        #[arg(short, long)]
        config: PathBuf,

        /// Validate and print payloads without sending
        #[arg(long)]
        dry_run: bool,

        /// First data row to process (0-based)
        #[arg(long, default_value = "0")]
        start: usize,

        /// Process at most N rows
        #[arg(long)]
        limit: Option<usize>,

        /// Results log
        #[arg(short, long, default_value = "results.csv")]
        output: PathBuf,

        /// CSV delimiter (overrides config and auto-detection)
        #[arg(short, long)]
        delimiter: Option<char>,
    },

    /// Parse a CSV file and output its rows as JSON
    Parse {
        /// Input CSV file
        #[arg(short, long)]
        input: PathBuf,

        /// Take source options from this configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Load and validate a configuration file
    CheckConfig {
        /// YAML configuration
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    load_dotenv();

    let cli = Cli::parse();
    logs::init(cli.verbose);

    let result = match cli.command {
        Commands::Upload {
            input,
            config,
            dry_run,
            start,
            limit,
            output,
            delimiter,
        } => cmd_upload(&input, &config, dry_run, start, limit, &output, delimiter).await,

        Commands::Parse {
            input,
            config,
            delimiter,
            output,
        } => cmd_parse(&input, config.as_deref(), delimiter, output.as_deref()),

        Commands::CheckConfig { config } => cmd_check_config(&config),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn cmd_upload(
    input: &Path,
    config_path: &Path,
    dry_run: bool,
    start: usize,
    limit: Option<usize>,
    output: &Path,
    delimiter: Option<char>,
) -> RunResult<()> {
    let config = AppConfig::load(config_path)?;
    let mut options = config.source.options();
    if let Some(delimiter) = delimiter {
        options.delimiter = Some(check_delimiter(delimiter)?);
    }

    log_info(format!("📄 Reading: {}", input.display()));
    let source = parse_file(input, &options)?;
    log_info_indent(format!("Encoding: {}", source.encoding), 1);
    log_info_indent(format!("Delimiter: '{}'", format_delimiter(source.delimiter)), 1);
    log_info_indent(format!("Rows: {}", source.rows.len()), 1);

    let unmapped = config.mapping.missing_columns(&source.headers);
    if !unmapped.is_empty() {
        log_warning(format!("Mapped columns not in file: {}", unmapped.join(", ")));
    }

    let rows = window(&source.rows, start, limit);
    let numbering = RowNumbering {
        start,
        header_row: options.header_row,
    };

    let mut uploader = Uploader::new(config.build_client()?, config.pipeline(), config.target()?)
        .dry_run(dry_run);
    let results = uploader.run(rows, numbering).await;

    let summary = report::write_results(output, &results)?;
    for (status, count) in &summary.counts {
        log_info_indent(format!("{}: {}", status, count), 1);
    }
    log_success(format!("Done. Wrote log to {}", output.display()));
    Ok(())
}

fn cmd_parse(
    input: &Path,
    config_path: Option<&Path>,
    delimiter: Option<char>,
    output: Option<&Path>,
) -> RunResult<()> {
    let mut options = match config_path {
        Some(path) => AppConfig::load(path)?.source.options(),
        None => SourceOptions::default(),
    };
    if let Some(delimiter) = delimiter {
        options.delimiter = Some(check_delimiter(delimiter)?);
    }

    eprintln!("📄 Parsing CSV: {}", input.display());
    let result = parse_file(input, &options)?;
    eprintln!("   Encoding: {}", result.encoding);
    eprintln!(
        "   Delimiter: '{}'{}",
        format_delimiter(result.delimiter),
        if options.delimiter.is_none() { " (auto-detected)" } else { "" }
    );
    eprintln!("   Columns: {}", result.headers.join(", "));
    eprintln!("✅ Parsed {} rows", result.rows.len());

    let rows: Vec<Value> = result.rows.iter().map(|row| row.to_json()).collect();
    let json = serde_json::to_string_pretty(&rows)?;
    write_output(&json, output)
}

fn cmd_check_config(config_path: &Path) -> RunResult<()> {
    let config = AppConfig::load(config_path)?;
    let client = config.client_config()?;
    let target = config.target()?;

    println!("✅ Configuration is valid");
    println!("   Endpoint: {} {}{}", target.method, client.base_url, target.path);
    println!("   Rate limit: {}/min", client.rate_limit_per_minute);
    println!("   Retries: {} attempt(s)", config.api.retry.attempts());
    println!("   Mapped columns: {}", config.mapping.len());
    for (column, path) in config.mapping.iter() {
        println!("     {} -> {}", column, path);
    }
    if client.token.is_none() {
        println!("   ⚠️  No API token configured");
    }
    Ok(())
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

fn write_output(content: &str, path: Option<&Path>) -> RunResult<()> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
