//! aeb - extension bundle installer
//!
//! Installs, removes and crash-recovers application extension bundles with
//! all-or-nothing file transactions and reference counted shared files.

use clap::Parser;
use console::style;
use miette::Diagnostic;

mod bundle;
mod cli;
mod commands;
mod common;
mod config;
mod domain;
mod error;
mod installer;
mod manifest;
mod progress;
mod refcount;
mod transaction;

#[cfg(test)]
mod test_fixtures;

use cli::{Cli, Commands};
use commands::helpers::GlobalOptions;
use tracing_subscriber::EnvFilter;

/// Exit code for failures that leave the installation needing repair
const EXIT_INDETERMINATE: i32 = 2;

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_env("AEB_LOG").unwrap_or_else(|_| {
        let level = match verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        };
        EnvFilter::new(format!("aeb={level}"))
    });

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let options = GlobalOptions {
        home: cli.home,
        config: cli.config,
        quiet: cli.quiet,
    };

    let result = match cli.command {
        Commands::Install(args) => commands::install::run(&options, args),
        Commands::Uninstall(args) => commands::uninstall::run(&options, args),
        Commands::List(args) => commands::list::run(&options, args),
        Commands::Show(args) => commands::show::run(&options, args),
        Commands::ProcessPending => commands::process_pending::run(&options),
        Commands::Status(args) => commands::status::run(&options, args),
        Commands::Version => commands::version::run(),
        Commands::Completions(args) => commands::completions::run(args),
    };

    if let Err(e) = result {
        let code = if e.is_indeterminate() {
            EXIT_INDETERMINATE
        } else {
            1
        };
        eprintln!("{} {e}", style("Error:").red().bold());
        if let Some(help) = e.help() {
            eprintln!("  {} {help}", style("help:").cyan());
        }
        std::process::exit(code);
    }
}
