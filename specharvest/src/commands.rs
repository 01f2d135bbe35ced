use crate::CLAP_STYLING;
use clap::{arg, command};
use std::path::PathBuf;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("specharvest")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("specharvest")
        .about("Harvest product specifications from a paginated catalog and normalize them")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress the banner, summaries and log mirroring")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(-v --"verbose" "Mirror logs to stderr (-v info, -vv debug, -vvv trace)")
                .required(false)
                .action(clap::ArgAction::Count)
                .global(true),
        )
        .arg(
            arg!(--"log-file" <PATH>)
                .required(false)
                .help("Append logs to this file instead of <output>/logs/specharvest.log")
                .value_parser(clap::value_parser!(PathBuf))
                .global(true),
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(scrape_args(
            command!("scrape")
                .about("Walk every listing page and write the raw dataset to a timestamped CSV"),
        ))
        .subcommand(
            command!("normalize")
                .about("Normalize a raw dataset into typed analysis columns")
                .arg(
                    arg!(-i --"input" <RAW_CSV>)
                        .required(true)
                        .help("Raw CSV written by `scrape`")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(output_dir_arg())
                .arg(format_arg()),
        )
        .subcommand(
            scrape_args(
                command!("run").about("Scrape, then normalize the raw file that was just written"),
            )
            .arg(format_arg()),
        )
}

fn scrape_args(cmd: clap::Command) -> clap::Command {
    cmd.arg(
        arg!(-u --"url" <URL_TEMPLATE>)
            .required(true)
            .help("Listing URL with a {page} placeholder, e.g. https://shop.example/laptops/page={page}/"),
    )
    .arg(
        arg!(-t --"threads" <NUM_WORKERS>)
            .required(false)
            .help("The number of detail pages fetched concurrently")
            .value_parser(clap::value_parser!(usize))
            .default_value("8"),
    )
    .arg(output_dir_arg())
    .arg(
        arg!(--"retries" <N>)
            .required(false)
            .help("Retries per request for transport errors, 5xx and 429")
            .value_parser(clap::value_parser!(u32))
            .default_value("3"),
    )
    .arg(
        arg!(--"retry-delay-ms" <MS>)
            .required(false)
            .help("Base retry delay in milliseconds, doubled on every attempt")
            .value_parser(clap::value_parser!(u64))
            .default_value("500"),
    )
    .arg(
        arg!(--"timeout" <SECONDS>)
            .required(false)
            .help("Request timeout in seconds")
            .value_parser(clap::value_parser!(u64))
            .default_value("10"),
    )
    .arg(
        arg!(--"layout" <PATH>)
            .required(false)
            .help("JSON file overriding the default page selectors")
            .value_parser(clap::value_parser!(PathBuf)),
    )
}

fn output_dir_arg() -> clap::Arg {
    arg!(-o --"output" <DIR>)
        .required(false)
        .help("Directory for the generated files")
        .value_parser(clap::value_parser!(PathBuf))
        .default_value(".")
}

fn format_arg() -> clap::Arg {
    arg!(-f --"format" <FORMAT>)
        .required(false)
        .help("Normalized output format")
        .value_parser(["csv", "json"])
        .default_value("csv")
}
