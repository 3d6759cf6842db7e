// File: runner.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::cli::{AllArgs, BypassArgs, CorsArgs, CrlfArgs, MethodsArgs, SmuggleArgs};
use crate::config::ScanConfig;
use crate::output::Printer;
use crate::scanners::bypass::BypassScanner;
use crate::scanners::cors::CorsScanner;
use crate::scanners::crlf::CrlfScanner;
use crate::scanners::methods::MethodsScanner;
use crate::scanners::smuggle::SmuggleScanner;
use anyhow::Result;
use std::sync::Arc;

pub async fn run_bypass(
    config: Arc<ScanConfig>,
    printer: Arc<Printer>,
    args: &BypassArgs,
) -> Result<()> {
    let techniques: Vec<String> = args
        .techniques
        .split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    for target in &config.targets {
        let scanner = BypassScanner::new(
            config.clone(),
            printer.clone(),
            target.clone(),
            techniques.clone(),
            args.bypass_ip.clone(),
        )?;
        scanner.run().await;
    }
    Ok(())
}

pub async fn run_crlf(
    config: Arc<ScanConfig>,
    printer: Arc<Printer>,
    _args: &CrlfArgs,
) -> Result<()> {
    let scanner = CrlfScanner::new(config, printer)?;
    scanner.run().await;
    Ok(())
}

pub async fn run_cors(
    config: Arc<ScanConfig>,
    printer: Arc<Printer>,
    args: &CorsArgs,
) -> Result<()> {
    let scanner = CorsScanner::new(config, printer, args.origin.clone(), args.deep)?;
    scanner.run().await;
    Ok(())
}

pub async fn run_methods(
    config: Arc<ScanConfig>,
    printer: Arc<Printer>,
    args: &MethodsArgs,
) -> Result<()> {
    let scanner = MethodsScanner::new(
        config,
        printer,
        args.methods.as_deref(),
        args.status.as_deref(),
    )?;
    scanner.run().await;
    Ok(())
}

pub async fn run_smuggle(
    config: Arc<ScanConfig>,
    printer: Arc<Printer>,
    args: &SmuggleArgs,
) -> Result<()> {
    let scanner = SmuggleScanner::new(
        config,
        printer,
        args.extended,
        args.wordlist.clone(),
        args.interval,
    )?;
    scanner.run().await;
    Ok(())
}

/// Runs every module with its defaults, sequentially so a saturated target
/// does not conflate one module's findings with the next.
pub async fn run_all(config: Arc<ScanConfig>, printer: Arc<Printer>, _args: &AllArgs) -> Result<()> {
    printer.section("403 BYPASS SCAN");
    let techniques = [
        "headers",
        "endpaths",
        "midpaths",
        "verbs",
        "double-encoding",
        "path-case",
    ];
    for target in &config.targets {
        let scanner = BypassScanner::new(
            config.clone(),
            printer.clone(),
            target.clone(),
            techniques.iter().map(|t| t.to_string()).collect(),
            None,
        )?;
        scanner.run().await;
    }

    printer.section("CRLF INJECTION SCAN");
    CrlfScanner::new(config.clone(), printer.clone())?.run().await;

    printer.section("CORS MISCONFIGURATION SCAN");
    CorsScanner::new(
        config.clone(),
        printer.clone(),
        "https://evil.com".to_string(),
        false,
    )?
    .run()
    .await;

    printer.section("HTTP METHOD SCAN");
    MethodsScanner::new(config.clone(), printer.clone(), None, None)?
        .run()
        .await;

    printer.section("HTTP SMUGGLING SCAN");
    SmuggleScanner::new(config.clone(), printer.clone(), false, None, 5)?
        .run()
        .await;

    let results = printer.results();
    let vuln_count = results.iter().filter(|r| r.vulnerable).count();
    printer.info(format!(
        "Scan complete. {} total results, {} potential vulnerabilities found.",
        results.len(),
        vuln_count
    ));

    Ok(())
}
