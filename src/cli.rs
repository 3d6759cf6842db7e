// File: cli.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = env!("CARGO_PKG_NAME"),
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = env!("CARGO_PKG_DESCRIPTION"),
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long = "log-level", default_value = "warn", global = true)]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Test for 403/401 bypass techniques
    Bypass(BypassArgs),
    /// Test for CRLF injection vulnerabilities
    Crlf(CrlfArgs),
    /// Test for CORS misconfiguration
    Cors(CorsArgs),
    /// Test allowed HTTP methods on targets
    Methods(MethodsArgs),
    /// Test for HTTP request smuggling via H2 downgrade
    Smuggle(SmuggleArgs),
    /// Run all modules against the target(s)
    All(AllArgs),
}

/// Flags shared by every scan subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    #[arg(short = 'u', help = "Target URL")]
    pub url: Option<String>,

    #[arg(short = 'l', help = "File containing list of URLs (one per line)")]
    pub list: Option<String>,

    #[arg(short = 'c', default_value_t = 10, help = "Concurrency level")]
    pub concurrency: usize,

    #[arg(short = 't', default_value_t = 10, help = "Timeout in seconds")]
    pub timeout: u64,

    #[arg(short = 'x', help = "Proxy URL (e.g., http://127.0.0.1:8080)")]
    pub proxy: Option<String>,

    #[arg(short = 'H', help = "Custom header (Key: Value), repeatable")]
    pub headers: Vec<String>,

    #[arg(short = 'o', help = "Output file path")]
    pub output: Option<String>,

    #[arg(short = 'j', help = "JSON output mode")]
    pub json: bool,

    #[arg(short = 's', help = "Silent mode")]
    pub silent: bool,

    #[arg(short = 'v', help = "Verbose mode")]
    pub verbose: bool,

    #[arg(long = "no-color", help = "Disable colored output")]
    pub no_color: bool,

    #[arg(long = "redirect", help = "Follow redirects")]
    pub redirect: bool,

    #[arg(long = "ua", default_value = "httpsuite/1.0", help = "User-Agent string")]
    pub user_agent: String,

    #[arg(long = "random-agent", help = "Use a random User-Agent")]
    pub random_agent: bool,
}

#[derive(Args, Debug)]
pub struct BypassArgs {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[arg(
        long = "techniques",
        default_value = "headers,endpaths,midpaths,verbs,double-encoding,path-case",
        help = "Comma-separated bypass techniques"
    )]
    pub techniques: String,

    #[arg(long = "bypass-ip", help = "Custom IP for header-based bypass")]
    pub bypass_ip: Option<String>,
}

#[derive(Args, Debug)]
pub struct CrlfArgs {
    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Args, Debug)]
pub struct CorsArgs {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[arg(
        long = "origin",
        default_value = "https://evil.com",
        help = "Custom origin for CORS testing"
    )]
    pub origin: String,

    #[arg(long = "deep", help = "Enable deep CORS scan")]
    pub deep: bool,
}

#[derive(Args, Debug)]
pub struct MethodsArgs {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[arg(long = "methods", help = "Comma-separated HTTP methods")]
    pub methods: Option<String>,

    #[arg(long = "status", help = "Filter by comma-separated status codes")]
    pub status: Option<String>,
}

#[derive(Args, Debug)]
pub struct SmuggleArgs {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[arg(long = "extended", help = "Use the extended gadget list")]
    pub extended: bool,

    #[arg(long = "wordlist", help = "Custom gadget/payload file")]
    pub wordlist: Option<String>,

    #[arg(
        long = "interval",
        default_value_t = 5,
        help = "Detection timeout in seconds"
    )]
    pub interval: u64,
}

#[derive(Args, Debug)]
pub struct AllArgs {
    #[command(flatten)]
    pub global: GlobalArgs,
}
