//! hts - garment HS tariff classification CLI
//!
//! Usage:
//!   hts classify rows.xlsx              Classify a spreadsheet of garment rows
//!   hts classify rows.csv --format csv  Write outcomes as CSV
//!   hts check                           Validate the reference tables

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde::Serialize;

use hts_core::{classify_rows, classify_rows_serial, ReferenceTables, RowOutcome, RowStatus};

mod config;
mod input;
mod loader;

use config::{default_config_path, load_config, Config};

#[derive(Parser)]
#[command(name = "hts", version, about = "Garment HS tariff classification")]
struct Cli {
    /// Path to the config file (default: ./hts.toml, if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct TableArgs {
    /// Fiber registry JSON file
    #[arg(long)]
    fibers: Option<PathBuf>,

    /// Category catalog JSON file
    #[arg(long)]
    categories: Option<PathBuf>,

    /// HS rule table JSON file
    #[arg(long)]
    rules: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify the rows of a spreadsheet or CSV file
    Classify {
        /// Input file (xlsx, xls, xlsm, xlsb, ods or csv)
        input: PathBuf,

        #[command(flatten)]
        tables: TableArgs,

        /// Worksheet name (default: first sheet)
        #[arg(long)]
        sheet: Option<String>,

        /// Write outcomes to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Classify rows single-threaded
        #[arg(long)]
        serial: bool,
    },
    /// Load and validate the reference tables without classifying
    Check {
        #[command(flatten)]
        tables: TableArgs,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

/// One classified row as written to the output. `row_number` is the
/// 1-based spreadsheet row (header is row 1, data starts at row 2).
#[derive(Serialize)]
struct OutcomeRecord {
    row_number: usize,
    style_no: String,
    product_name: String,
    weave_type: String,
    category: String,
    gender: String,
    composition: String,
    hs_code: String,
    status: String,
    note: String,
}

impl From<&RowOutcome> for OutcomeRecord {
    fn from(outcome: &RowOutcome) -> Self {
        let (status, note) = match &outcome.status {
            RowStatus::Classified => ("classified".to_string(), String::new()),
            RowStatus::Failed(reason) => (reason.tag().to_string(), reason.to_string()),
        };
        Self {
            row_number: outcome.row + 2,
            style_no: outcome.input.style_no.clone(),
            product_name: outcome.input.product_name.clone(),
            weave_type: outcome.input.weave_type.clone(),
            category: outcome.input.category.clone(),
            gender: outcome.input.gender.clone(),
            composition: outcome.input.composition.clone(),
            hs_code: outcome.hs_code_or_unknown().to_string(),
            status,
            note,
        }
    }
}

fn load_cli_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => load_config(path),
        None => {
            let default = default_config_path();
            if default.exists() {
                load_config(&default)
            } else {
                Ok(Config::default())
            }
        }
    }
}

fn resolve_tables(args: &TableArgs, config: &Config) -> Result<ReferenceTables> {
    let resolve = |flag: &Option<PathBuf>, from_config: Option<PathBuf>, name: &str| {
        flag.clone().or(from_config).with_context(|| {
            format!("No {name} table given; pass --{name} or set [tables] in hts.toml")
        })
    };
    let fibers = resolve(&args.fibers, config.fibers_path(), "fibers")?;
    let categories = resolve(&args.categories, config.categories_path(), "categories")?;
    let rules = resolve(&args.rules, config.rules_path(), "rules")?;
    loader::load_tables(&fibers, &categories, &rules)
}

fn write_output(records: &[OutcomeRecord], format: OutputFormat, output: Option<&Path>) -> Result<()> {
    let rendered = match format {
        OutputFormat::Json => {
            let mut text = serde_json::to_string_pretty(records)?;
            text.push('\n');
            text
        }
        OutputFormat::Csv => {
            let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
            for record in records {
                writer.serialize(record)?;
            }
            let buffer = writer
                .into_inner()
                .map_err(|err| anyhow::anyhow!("CSV buffer flush failed: {err}"))?;
            String::from_utf8(buffer)?
        }
    };

    match output {
        Some(path) => std::fs::write(path, rendered)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => std::io::stdout().write_all(rendered.as_bytes())?,
    }
    Ok(())
}

fn print_summary(outcomes: &[RowOutcome]) {
    let classified = outcomes
        .iter()
        .filter(|o| o.status == RowStatus::Classified)
        .count();
    let failed = outcomes.len() - classified;

    eprintln!(
        "{} {} classified, {} {}",
        classified.to_string().green().bold(),
        if classified == 1 { "row" } else { "rows" },
        failed.to_string().red().bold(),
        if failed == 1 { "failure" } else { "failures" },
    );

    let mut by_reason: BTreeMap<&'static str, usize> = BTreeMap::new();
    for outcome in outcomes {
        if let RowStatus::Failed(reason) = &outcome.status {
            *by_reason.entry(reason.tag()).or_default() += 1;
        }
    }
    for (tag, count) in by_reason {
        eprintln!("  {} {}", count.to_string().yellow(), tag);
    }
}

fn cmd_classify(
    config: &Config,
    input: &Path,
    table_args: &TableArgs,
    sheet: Option<&str>,
    output: Option<&Path>,
    format: OutputFormat,
    serial: bool,
) -> Result<()> {
    let tables = resolve_tables(table_args, config)?;
    let rows = input::read_rows(input, sheet)?;
    if rows.is_empty() {
        bail!("No data rows found in {}", input.display());
    }

    let outcomes = if serial || config.serial() {
        classify_rows_serial(&tables, &rows)
    } else {
        classify_rows(&tables, &rows)
    };

    let records: Vec<OutcomeRecord> = outcomes.iter().map(OutcomeRecord::from).collect();
    write_output(&records, format, output)?;
    print_summary(&outcomes);
    Ok(())
}

fn cmd_check(config: &Config, table_args: &TableArgs) -> Result<()> {
    let tables = resolve_tables(table_args, config)?;
    eprintln!(
        "{}: {} fibers, {} categories, {} rules",
        "Reference tables valid".green().bold(),
        tables.registry.len(),
        tables.catalog.len(),
        tables.rules.len(),
    );
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_cli_config(cli.config.as_deref())?;

    match &cli.command {
        Commands::Classify {
            input,
            tables,
            sheet,
            output,
            format,
            serial,
        } => cmd_classify(
            &config,
            input,
            tables,
            sheet.as_deref(),
            output.as_deref(),
            *format,
            *serial,
        ),
        Commands::Check { tables } => cmd_check(&config, tables),
    }
}
