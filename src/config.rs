// File: config.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::cli::GlobalArgs;
use crate::utils;
use anyhow::{anyhow, bail, Result};
use std::time::Duration;

/// Global configuration shared by all scan modules. Built once from the CLI
/// layer and read-only afterwards.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub targets: Vec<String>,
    pub method: String,
    pub concurrency: usize,
    pub timeout: Duration,
    pub retries: u32,
    pub proxy: Option<String>,
    pub headers: Vec<(String, String)>,
    pub user_agent: String,
    pub silent: bool,
    pub verbose: bool,
    pub no_color: bool,
    pub json: bool,
    pub redirect: bool,
    pub output_file: Option<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            method: "GET".to_string(),
            concurrency: 10,
            timeout: Duration::from_secs(10),
            retries: 1,
            proxy: None,
            headers: Vec::new(),
            user_agent: format!("httpsuite/{}", env!("CARGO_PKG_VERSION")),
            silent: false,
            verbose: false,
            no_color: false,
            json: false,
            redirect: false,
            output_file: None,
        }
    }
}

impl ScanConfig {
    /// Validates and assembles the configuration from parsed global flags.
    /// Targets are collected from `-u`, `-l`, or piped stdin and normalized
    /// to carry an explicit scheme.
    pub fn from_args(args: &GlobalArgs) -> Result<Self> {
        let mut cfg = ScanConfig::default();

        if args.concurrency == 0 {
            bail!("concurrency must be at least 1");
        }
        if args.timeout == 0 {
            bail!("timeout must be greater than 0");
        }
        cfg.concurrency = args.concurrency;
        cfg.timeout = Duration::from_secs(args.timeout);

        if let Some(proxy) = &args.proxy {
            url::Url::parse(proxy).map_err(|e| anyhow!("invalid proxy URL {}: {}", proxy, e))?;
            cfg.proxy = Some(proxy.clone());
        }

        for header in &args.headers {
            match header.split_once(':') {
                Some((key, value)) => cfg
                    .headers
                    .push((key.trim().to_string(), value.trim().to_string())),
                None => bail!("invalid header format (expected \"Key: Value\"): {}", header),
            }
        }

        if let Some(url) = &args.url {
            cfg.targets.push(utils::normalize_url(url));
        }
        if let Some(list) = &args.list {
            let lines = utils::read_lines(list)
                .map_err(|e| anyhow!("error reading URL list {}: {}", list, e))?;
            cfg.targets
                .extend(lines.iter().map(|line| utils::normalize_url(line)));
        }
        if cfg.targets.is_empty() && utils::has_stdin() {
            cfg.targets = utils::read_urls_from_stdin();
        }
        cfg.targets.retain(|t| !t.is_empty());

        cfg.user_agent = args.user_agent.clone();
        if args.random_agent {
            cfg.user_agent = utils::random_user_agent();
        }

        cfg.silent = args.silent;
        cfg.verbose = args.verbose;
        cfg.no_color = args.no_color;
        cfg.json = args.json;
        cfg.redirect = args.redirect;
        cfg.output_file = args.output.clone();

        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::GlobalArgs;

    fn base_args() -> GlobalArgs {
        GlobalArgs {
            url: Some("example.com/admin".to_string()),
            list: None,
            concurrency: 10,
            timeout: 10,
            proxy: None,
            headers: Vec::new(),
            output: None,
            json: false,
            silent: false,
            verbose: false,
            no_color: false,
            redirect: false,
            user_agent: "httpsuite/1.0".to_string(),
            random_agent: false,
        }
    }

    #[test]
    fn test_target_is_normalized() {
        let cfg = ScanConfig::from_args(&base_args()).unwrap();
        assert_eq!(cfg.targets, vec!["https://example.com/admin"]);
    }

    #[test]
    fn test_header_parsing() {
        let mut args = base_args();
        args.headers = vec![
            "X-Api-Key: secret".to_string(),
            "Cookie: a=b; c=d".to_string(),
        ];
        let cfg = ScanConfig::from_args(&args).unwrap();
        assert_eq!(
            cfg.headers,
            vec![
                ("X-Api-Key".to_string(), "secret".to_string()),
                ("Cookie".to_string(), "a=b; c=d".to_string()),
            ]
        );
    }

    #[test]
    fn test_bad_header_is_rejected() {
        let mut args = base_args();
        args.headers = vec!["not-a-header".to_string()];
        assert!(ScanConfig::from_args(&args).is_err());
    }

    #[test]
    fn test_bad_proxy_is_rejected() {
        let mut args = base_args();
        args.proxy = Some("not a url".to_string());
        assert!(ScanConfig::from_args(&args).is_err());
    }

    #[test]
    fn test_zero_concurrency_is_rejected() {
        let mut args = base_args();
        args.concurrency = 0;
        assert!(ScanConfig::from_args(&args).is_err());
    }
}
