// File: scanners/methods.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::config::ScanConfig;
use crate::dispatcher::Dispatcher;
use crate::output::Printer;
use crate::result::ScanResult;
use crate::transport::{HttpClient, TransportResult};
use std::collections::HashSet;
use std::sync::Arc;

const MODULE: &str = "methods";

const DEFAULT_METHODS: &[&str] = &[
    "GET", "POST", "PUT", "DELETE", "PATCH",
    "HEAD", "OPTIONS", "TRACE", "CONNECT",
    "PROPFIND", "PROPPATCH", "MKCOL", "COPY",
    "MOVE", "LOCK", "UNLOCK", "PURGE",
];

/// Probes each target with every method in the list and classifies the
/// answer. A 2xx on a method outside GET/HEAD/OPTIONS is flagged.
pub struct MethodsScanner {
    config: Arc<ScanConfig>,
    printer: Arc<Printer>,
    client: Arc<HttpClient>,
    dispatcher: Dispatcher,
    methods: Vec<String>,
    status_filter: HashSet<u16>,
}

impl MethodsScanner {
    pub fn new(
        config: Arc<ScanConfig>,
        printer: Arc<Printer>,
        method_list: Option<&str>,
        filter_status: Option<&str>,
    ) -> TransportResult<Self> {
        let client = Arc::new(HttpClient::new(&config, config.redirect)?);
        let dispatcher = Dispatcher::new(config.concurrency);

        let methods: Vec<String> = match method_list {
            Some(list) if !list.is_empty() => list
                .split(',')
                .map(|m| m.trim().to_uppercase())
                .filter(|m| !m.is_empty())
                .collect(),
            _ => DEFAULT_METHODS.iter().map(|m| m.to_string()).collect(),
        };

        let status_filter: HashSet<u16> = filter_status
            .unwrap_or_default()
            .split(',')
            .filter_map(|code| code.trim().parse().ok())
            .collect();

        Ok(Self {
            config,
            printer,
            client,
            dispatcher,
            methods,
            status_filter,
        })
    }

    pub async fn run(&self) {
        self.printer.info(format!(
            "Starting HTTP method scan for {} target(s) with {} methods",
            self.config.targets.len(),
            self.methods.len()
        ));
        self.printer
            .info(format!("Methods: {}", self.methods.join(", ")));

        let probes: Vec<(String, String)> = self
            .config
            .targets
            .iter()
            .flat_map(|target| {
                self.methods
                    .iter()
                    .map(move |method| (target.clone(), method.clone()))
            })
            .collect();

        let client = self.client.clone();
        let printer = self.printer.clone();
        let verbose = self.config.verbose;
        let status_filter = self.status_filter.clone();

        self.dispatcher
            .run(probes, move |(target, method)| {
                let client = client.clone();
                let printer = printer.clone();
                let status_filter = status_filter.clone();
                async move {
                    let (status, body) = match client.simple(&method, &target, &[]).await {
                        Ok(r) => r,
                        Err(e) => {
                            if verbose {
                                printer.error(format!(
                                    "Error with {} [{}]: {}",
                                    target, method, e
                                ));
                            }
                            return;
                        }
                    };

                    if !status_filter.is_empty() && !status_filter.contains(&status) {
                        return;
                    }

                    let (vulnerable, detail) = classify(&method, status);
                    printer.result(
                        ScanResult::new(MODULE, &target)
                            .method(&method)
                            .status(status)
                            .content_length(body.len())
                            .detail(detail)
                            .vulnerable(vulnerable),
                    );
                }
            })
            .await;
    }
}

/// Classifies a (method, status) pair. Safe methods succeeding is expected;
/// anything else with a 2xx may be an enabled write path.
pub fn classify(method: &str, status: u16) -> (bool, &'static str) {
    match status {
        200..=299 => {
            if matches!(method, "GET" | "HEAD" | "OPTIONS") {
                (false, "success")
            } else {
                (true, "unexpected success - method may be enabled")
            }
        }
        405 => (false, "method not allowed"),
        501 => (false, "not implemented"),
        _ => (false, "active"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_safe_method_success() {
        assert_eq!(classify("GET", 200), (false, "success"));
        assert_eq!(classify("HEAD", 204), (false, "success"));
        assert_eq!(classify("OPTIONS", 200), (false, "success"));
    }

    #[test]
    fn test_classify_unsafe_method_success() {
        let (vulnerable, detail) = classify("PUT", 201);
        assert!(vulnerable);
        assert_eq!(detail, "unexpected success - method may be enabled");

        let (vulnerable, _) = classify("DELETE", 200);
        assert!(vulnerable);
    }

    #[test]
    fn test_classify_rejections() {
        assert_eq!(classify("PUT", 405), (false, "method not allowed"));
        assert_eq!(classify("TRACE", 501), (false, "not implemented"));
        assert_eq!(classify("POST", 403), (false, "active"));
        assert_eq!(classify("GET", 500), (false, "active"));
    }

    #[test]
    fn test_default_method_list() {
        assert_eq!(DEFAULT_METHODS.len(), 17);
        assert!(DEFAULT_METHODS.contains(&"PROPFIND"));
        assert!(DEFAULT_METHODS.contains(&"PURGE"));
        // The versioning long tail stays out of the default set.
        assert!(!DEFAULT_METHODS.contains(&"VERSION-CONTROL"));
    }
}
