use anyhow::{Context, anyhow};
use clap::ArgMatches;
use colored::Colorize;
use specharvest_core::harvest::{HarvestOptions, HarvestOutcome, HarvestProgressCallback, execute_harvest};
use specharvest_core::normalize::{ColumnNormalizer, NormalizedDataset};
use specharvest_core::report::{HarvestSummary, generate_harvest_report, generate_normalize_report};
use specharvest_core::store::{
    OutputFormat, normalized_file_name, read_raw_table, timestamp, write_normalized,
};
use specharvest_scanner::{RetryPolicy, SiteLayout};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{Level, info};
use tracing_subscriber::fmt::writer::MakeWriterExt;

pub fn print_banner() {
    println!(
        "{} {}",
        "specharvest".bright_cyan().bold(),
        env!("CARGO_PKG_VERSION").bright_white()
    );
    println!("{}", "catalog specification harvester".bright_black());
    println!();
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

pub const LOG_DIR: &str = "logs";
pub const LOG_FILE_NAME: &str = "specharvest.log";

/// Level written to the log file: INFO at least, more with `-vv` and up.
pub fn log_level(verbosity: u8) -> Level {
    match verbosity {
        0 | 1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Whether log lines are mirrored to stderr: only with `-v`, never with `-q`.
pub fn mirror_to_stderr(verbosity: u8, quiet: bool) -> bool {
    verbosity > 0 && !quiet
}

/// `--log-file` when given, otherwise `<output>/logs/specharvest.log`.
pub fn log_file_path(log_file: Option<&Path>, output_dir: &Path) -> PathBuf {
    match log_file {
        Some(path) => expand_path(path),
        None => expand_path(output_dir).join(LOG_DIR).join(LOG_FILE_NAME),
    }
}

/// Every run appends to `log_path`; recoverable extraction warnings stay
/// out of the terminal unless `-v` asks for them.
pub fn init_logging(verbosity: u8, quiet: bool, log_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("cannot create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("cannot open log file {}", log_path.display()))?;

    let builder = tracing_subscriber::fmt()
        .with_max_level(log_level(verbosity))
        .with_target(false)
        .with_ansi(false);
    let file_writer = Mutex::new(file);

    let initialised = if mirror_to_stderr(verbosity, quiet) {
        builder.with_writer(file_writer.and(std::io::stderr)).try_init()
    } else {
        builder.with_writer(file_writer).try_init()
    };
    initialised.map_err(|e| anyhow!("failed to initialise logging: {}", e))
}

/// Expand a leading `~` and environment variables in a user-supplied path.
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    match shellexpand::full(&raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(shellexpand::tilde(&raw).as_ref()),
    }
}

pub fn load_layout(path: Option<&PathBuf>) -> anyhow::Result<SiteLayout> {
    match path {
        Some(path) => {
            let path = expand_path(path);
            SiteLayout::from_json_file(&path)
                .with_context(|| format!("cannot load page layout from {}", path.display()))
        }
        None => Ok(SiteLayout::default()),
    }
}

pub fn output_format(args: &ArgMatches) -> anyhow::Result<OutputFormat> {
    let name = args
        .get_one::<String>("format")
        .map(String::as_str)
        .unwrap_or("csv");
    OutputFormat::from_str(name).ok_or_else(|| anyhow!("unsupported output format '{}'", name))
}

fn output_dir(args: &ArgMatches) -> PathBuf {
    args.get_one::<PathBuf>("output")
        .map(|p| expand_path(p))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn harvest_options_from_args(args: &ArgMatches, quiet: bool) -> anyhow::Result<HarvestOptions> {
    let url_template = args
        .get_one::<String>("url")
        .context("--url is required")?
        .clone();
    let defaults = HarvestOptions::default();
    let retries = args
        .get_one::<u32>("retries")
        .copied()
        .unwrap_or(defaults.retry.max_retries);
    let retry_delay = args
        .get_one::<u64>("retry-delay-ms")
        .map(|ms| Duration::from_millis(*ms))
        .unwrap_or(defaults.retry.base_delay);

    Ok(HarvestOptions {
        url_template,
        workers: args
            .get_one::<usize>("threads")
            .copied()
            .unwrap_or(defaults.workers),
        layout: load_layout(args.get_one::<PathBuf>("layout"))?,
        retry: RetryPolicy::new(retries, retry_delay),
        timeout_secs: args
            .get_one::<u64>("timeout")
            .copied()
            .unwrap_or(defaults.timeout_secs),
        output_dir: output_dir(args),
        show_progress_bars: !quiet,
    })
}

/// Normalize `input` into a new timestamped file under `output_dir`.
pub fn normalize_file(
    input: &Path,
    output_dir: &Path,
    format: OutputFormat,
) -> anyhow::Result<(NormalizedDataset, PathBuf)> {
    let table = read_raw_table(input)
        .with_context(|| format!("cannot read raw dataset {}", input.display()))?;
    let dataset = ColumnNormalizer::default()
        .normalize(&table)
        .with_context(|| format!("cannot normalize {}", input.display()))?;

    let output = output_dir.join(normalized_file_name(&timestamp(), input, format));
    write_normalized(&dataset, &output, format)
        .with_context(|| format!("cannot write {}", output.display()))?;
    Ok((dataset, output))
}

pub async fn handle_scrape(args: &ArgMatches, quiet: bool) -> anyhow::Result<HarvestOutcome> {
    let options = harvest_options_from_args(args, quiet)?;

    if !quiet {
        println!("{} Harvesting {}", "→".blue(), options.url_template.bright_white());
        println!("Workers: {}", options.workers);
        println!(
            "Retries: {} (base delay {} ms)",
            options.retry.max_retries,
            options.retry.base_delay.as_millis()
        );
        println!("Output: {}\n", options.output_dir.display());
    }

    let progress_callback: Option<HarvestProgressCallback> = if quiet {
        None
    } else {
        Some(Arc::new(|msg: String| {
            println!("{} {}", "→".blue(), msg);
        }))
    };

    let outcome = execute_harvest(options, progress_callback)
        .await
        .context("harvest failed")?;

    if !quiet {
        println!(
            "\n{} Harvest complete: {}\n",
            "✓".green().bold(),
            outcome.raw_path.display().to_string().bright_white()
        );
        print!(
            "{}",
            generate_harvest_report(&HarvestSummary::from_outcome(&outcome))
        );
    }
    info!("Raw dataset written to {}", outcome.raw_path.display());
    Ok(outcome)
}

pub fn handle_normalize(args: &ArgMatches, quiet: bool) -> anyhow::Result<PathBuf> {
    let input = args
        .get_one::<PathBuf>("input")
        .map(|p| expand_path(p))
        .context("--input is required")?;
    let format = output_format(args)?;

    normalize_and_report(&input, &output_dir(args), format, quiet)
}

/// Scrape, then normalize the raw file of this run.
pub async fn handle_run(args: &ArgMatches, quiet: bool) -> anyhow::Result<()> {
    let format = output_format(args)?;
    let outcome = handle_scrape(args, quiet).await?;
    normalize_and_report(&outcome.raw_path, &output_dir(args), format, quiet)?;
    Ok(())
}

fn normalize_and_report(
    input: &Path,
    output_dir: &Path,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<PathBuf> {
    let (dataset, output) = normalize_file(input, output_dir, format)?;
    if !quiet {
        print_divider();
        println!(
            "{} Normalized {} row(s): {}",
            "✓".green().bold(),
            dataset.len().to_string().cyan(),
            output.display().to_string().bright_white()
        );
        print_divider();
        print!("{}", generate_normalize_report(&dataset, input, &output));
    }
    info!("Normalized dataset written to {}", output.display());
    Ok(output)
}
