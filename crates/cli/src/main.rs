//! # excelrelay-cli
//!
//! Command-line interface for running spreadsheet operations through the
//! document-processing API.

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use excelrelay_actions::{Attachment, ItemOutput, Operation, Runner, WorkItem};
use excelrelay_core::Params;
use excelrelay_http::{ClientConfig, ExcelClient};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// excelrelay - Excel operations through the document-processing API
#[derive(Parser)]
#[command(name = "excelrelay")]
#[command(author, version, about = "Excel operations through the document-processing API", long_about = None)]
struct Cli {
    /// Operation to run, by name or slug (e.g. `secure`, `merge-files`)
    #[arg(short = 'o', long = "operation", value_parser = parse_operation)]
    operation: Option<Operation>,

    /// List the supported operations
    #[arg(short = 'l', long = "list")]
    list: bool,

    /// Input document, attached under `binaryPropertyName` (default `data`)
    #[arg(short = 'i', long = "input", value_name = "FILE")]
    input: Option<PathBuf>,

    /// Set parameter (key=value)
    #[arg(short = 'D', long = "define", value_name = "KEY=VALUE")]
    vars: Vec<String>,

    /// JSON object of parameters; `-D` values take precedence
    #[arg(short = 'p', long = "params", value_name = "FILE")]
    params: Option<PathBuf>,

    /// JSON array of work items for a batch run
    #[arg(long = "items", value_name = "FILE", conflicts_with = "input")]
    items: Option<PathBuf>,

    /// Directory the output documents are written to
    #[arg(short = 'O', long = "output-dir", value_name = "DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Record failed items and keep going instead of aborting the batch
    #[arg(long = "continue-on-fail")]
    continue_on_fail: bool,

    /// API base URL (overrides EXCELRELAY_BASE_URL)
    #[arg(long = "base-url", value_name = "URL")]
    base_url: Option<String>,

    /// Authorization header value (overrides EXCELRELAY_API_KEY)
    #[arg(long = "api-key", value_name = "KEY")]
    api_key: Option<String>,

    /// Seconds between completion polls
    #[arg(long = "poll-interval", value_name = "SECS")]
    poll_interval: Option<u64>,

    /// Maximum number of completion polls
    #[arg(long = "max-poll-attempts", value_name = "N")]
    max_poll_attempts: Option<u32>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// One entry of an `--items` file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ItemEntry {
    json: Option<Value>,
    params: Params,
    /// Attachment key to file path, relative to the items file.
    binary: IndexMap<String, PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays JSON
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    if cli.list {
        print_operations();
        return Ok(());
    }

    let Some(operation) = cli.operation else {
        Cli::parse_from(["excelrelay", "--help"]);
        return Ok(());
    };

    let summaries = run(&cli, operation).await?;
    let printed = if summaries.len() == 1 {
        serde_json::to_string_pretty(&summaries[0])?
    } else {
        serde_json::to_string_pretty(&summaries)?
    };
    println!("{printed}");
    Ok(())
}

fn parse_operation(s: &str) -> Result<Operation, String> {
    s.parse().map_err(|e: excelrelay_core::ExcelError| e.to_string())
}

/// Parse a CLI value string into a JSON value.
fn parse_cli_value(s: &str) -> Value {
    if s.eq_ignore_ascii_case("null") {
        Value::Null
    } else if s.eq_ignore_ascii_case("true") {
        Value::Bool(true)
    } else if s.eq_ignore_ascii_case("false") {
        Value::Bool(false)
    } else if let Ok(n) = s.parse::<i64>() {
        Value::from(n)
    } else if let Some(f) = s.parse::<f64>().ok().filter(|f| f.is_finite()) {
        Value::from(f)
    } else if s.starts_with(['{', '[']) {
        // Structured options such as `filesToMerge` or `phrases`
        serde_json::from_str(s).unwrap_or_else(|_| Value::String(s.to_string()))
    } else {
        Value::String(s.to_string())
    }
}

/// Run the operation described by `cli` and write its documents.
///
/// Returns one summary per item, with the written paths filled in.
async fn run(cli: &Cli, operation: Operation) -> Result<Vec<Value>> {
    let runner = build_runner(cli)?;
    let items = load_items(cli)?;
    debug!(operation = %operation, items = items.len(), "running batch");

    let outputs = runner
        .run_batch(operation, &items, cli.continue_on_fail)
        .await?;
    write_outputs(&outputs, &cli.output_dir)
}

fn client_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = ClientConfig::from_env().context("Invalid EXCELRELAY_* environment")?;
    if let Some(url) = &cli.base_url {
        config = config.with_base_url(url);
    }
    if let Some(key) = &cli.api_key {
        config.default_headers.retain(|(name, _)| !name.eq_ignore_ascii_case("authorization"));
        config = config.with_api_key(key);
    }
    if let Some(secs) = cli.poll_interval {
        config = config.with_poll_interval(Duration::from_secs(secs));
    }
    if let Some(attempts) = cli.max_poll_attempts {
        config = config.with_max_poll_attempts(attempts);
    }
    Ok(config)
}

fn build_runner(cli: &Cli) -> Result<Runner> {
    let client = ExcelClient::new(client_config(cli)?).context("Failed to create HTTP client")?;
    Runner::new(client).context("Failed to create download client")
}

/// `-D` definitions as parameters.
fn defined_params(vars: &[String]) -> Result<Params> {
    let mut params = Params::new();
    for var in vars {
        let (key, value) = var.split_once('=').with_context(|| {
            format!("Invalid parameter format: '{var}'. Expected KEY=VALUE format")
        })?;
        params.set(key.trim(), parse_cli_value(value));
    }
    Ok(params)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn read_attachment(path: &Path) -> Result<Attachment> {
    let data =
        std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    let attachment = Attachment::new(data);
    Ok(match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => attachment.with_file_name(name),
        None => attachment,
    })
}

/// Parameters for one item: the `--params` file, then the item's own
/// parameters, then `-D` definitions.
fn layered_params(file: &Params, item: Params, defined: &Params) -> Params {
    let mut params = file.clone();
    params.merge(item);
    params.merge(defined.clone());
    params
}

/// Attachment key an operation reads its input from.
fn input_key(params: &Params) -> String {
    params
        .get("binaryPropertyName")
        .and_then(Value::as_str)
        .filter(|key| !key.trim().is_empty())
        .unwrap_or("data")
        .to_string()
}

fn load_items(cli: &Cli) -> Result<Vec<WorkItem>> {
    let file_params: Params = match &cli.params {
        Some(path) => read_json(path)?,
        None => Params::new(),
    };
    let defined = defined_params(&cli.vars)?;

    let Some(items_path) = &cli.items else {
        let params = layered_params(&file_params, Params::new(), &defined);
        let mut item = WorkItem::new(params);
        if let Some(input) = &cli.input {
            let key = input_key(&item.params);
            item = item.with_attachment(key, read_attachment(input)?);
        }
        return Ok(vec![item]);
    };

    let entries: Vec<ItemEntry> = read_json(items_path)?;
    if entries.is_empty() {
        bail!("No work items in {}", items_path.display());
    }
    let base_dir = items_path.parent().unwrap_or_else(|| Path::new("."));
    entries
        .into_iter()
        .map(|entry| {
            let mut item = WorkItem::new(layered_params(&file_params, entry.params, &defined));
            if let Some(json) = entry.json {
                item = item.with_json(json);
            }
            for (key, path) in entry.binary {
                item = item.with_attachment(key, read_attachment(&base_dir.join(path))?);
            }
            Ok(item)
        })
        .collect()
}

/// Write every output document under `dir` and return the item summaries.
///
/// Batches get one `item-N` subdirectory per item so equal file names do not
/// collide.
fn write_outputs(outputs: &[ItemOutput], dir: &Path) -> Result<Vec<Value>> {
    let batch = outputs.len() > 1;
    let mut summaries = Vec::with_capacity(outputs.len());

    for (index, output) in outputs.iter().enumerate() {
        let mut summary = output.to_summary();
        if let Some(error) = &output.error {
            eprintln!("{} item {}: {error}", "Failed".red().bold(), index + 1);
        }

        let item_dir = if batch {
            dir.join(format!("item-{}", index + 1))
        } else {
            dir.to_path_buf()
        };
        for (key, doc) in &output.binary {
            std::fs::create_dir_all(&item_dir)
                .with_context(|| format!("Failed to create directory: {}", item_dir.display()))?;
            let file_name = Path::new(&doc.file_name)
                .file_name()
                .map_or_else(|| PathBuf::from(key), PathBuf::from);
            let path = item_dir.join(file_name);
            std::fs::write(&path, &doc.data)
                .with_context(|| format!("Failed to write file: {}", path.display()))?;
            eprintln!("{} {}", "Saved".green().bold(), path.display());
            summary["binary"][key]["path"] = Value::String(path.display().to_string());
        }
        summaries.push(summary);
    }
    Ok(summaries)
}

fn print_operations() {
    println!("{}", "Operations:".bold());
    for op in Operation::ALL {
        println!("  {:<26} {}", op.slug().cyan(), op.name());
    }
}
