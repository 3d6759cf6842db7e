// File: main.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use clap::Parser;
use colored::Colorize;
use httpsuite::cli::{Cli, Commands, GlobalArgs};
use httpsuite::config::ScanConfig;
use httpsuite::output::Printer;
use httpsuite::runner;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(cli.log_level.as_str()),
    )
    .init();

    let global = global_args(&cli.command);

    let config = match ScanConfig::from_args(global) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{} {}", "[ERR]".red(), e);
            std::process::exit(1);
        }
    };

    if config.no_color {
        colored::control::set_override(false);
    }

    if config.targets.is_empty() {
        eprintln!(
            "{} provide target URL(s) via -u, -l, or stdin",
            "[ERR]".red()
        );
        std::process::exit(1);
    }

    let config = Arc::new(config);
    let printer = Arc::new(Printer::new(
        config.silent,
        config.json,
        config.output_file.as_deref(),
    ));
    printer.banner();

    let outcome = match &cli.command {
        Commands::Bypass(args) => runner::run_bypass(config, printer.clone(), args).await,
        Commands::Crlf(args) => runner::run_crlf(config, printer.clone(), args).await,
        Commands::Cors(args) => runner::run_cors(config, printer.clone(), args).await,
        Commands::Methods(args) => runner::run_methods(config, printer.clone(), args).await,
        Commands::Smuggle(args) => runner::run_smuggle(config, printer.clone(), args).await,
        Commands::All(args) => runner::run_all(config, printer.clone(), args).await,
    };

    printer.close();

    if let Err(e) = outcome {
        eprintln!("{} {}", "[ERR]".red(), e);
        std::process::exit(1);
    }
}

fn global_args(command: &Commands) -> &GlobalArgs {
    match command {
        Commands::Bypass(args) => &args.global,
        Commands::Crlf(args) => &args.global,
        Commands::Cors(args) => &args.global,
        Commands::Methods(args) => &args.global,
        Commands::Smuggle(args) => &args.global,
        Commands::All(args) => &args.global,
    }
}
