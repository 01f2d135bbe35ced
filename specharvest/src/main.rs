use colored::Colorize;
use commands::command_argument_builder;
use specharvest::handlers::{
    handle_normalize, handle_run, handle_scrape, init_logging, log_file_path, print_banner,
};
use std::path::{Path, PathBuf};

mod commands;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");
    let verbosity = chosen_command.get_count("verbose");
    let log_file = chosen_command.get_one::<PathBuf>("log-file");
    let output_dir = chosen_command
        .subcommand()
        .and_then(|(_, args)| args.get_one::<PathBuf>("output"))
        .map(PathBuf::as_path)
        .unwrap_or(Path::new("."));
    let log_path = log_file_path(log_file.map(PathBuf::as_path), output_dir);

    if let Err(e) = init_logging(verbosity, quiet, &log_path) {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    let result = match chosen_command.subcommand() {
        Some(("scrape", primary_command)) => handle_scrape(primary_command, quiet).await.map(|_| ()),
        Some(("normalize", primary_command)) => handle_normalize(primary_command, quiet).map(|_| ()),
        Some(("run", primary_command)) => handle_run(primary_command, quiet).await,
        _ => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
