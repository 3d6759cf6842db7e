// File: scanners/crlf.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::config::ScanConfig;
use crate::dispatcher::Dispatcher;
use crate::output::Printer;
use crate::result::ScanResult;
use crate::transport::{HttpClient, TransportResult};
use std::sync::Arc;

const MODULE: &str = "crlf";

/// Marker header the probes try to smuggle into the response. Finding it
/// reflected is the only vulnerability oracle; status codes do not count.
const INJECTED_HEADER_KEY: &str = "X-Injected-Header-By";
const INJECTED_HEADER_VAL: &str = "httpsuite";

/// URL-encoded CRLF escape variants, including space/hash-prefixed forms,
/// the canonical UTF-8 "CRLF lookalike" bytes, and IIS-style %u escapes.
const ESCAPE_LIST: &[&str] = &[
    "%0a",
    "%0a%20",
    "%0d",
    "%0d%09",
    "%0d%0a",
    "%0d%0a%09",
    "%0d%0a%20",
    "%0d%20",
    "%20%0a",
    "%20%0d",
    "%20%0d%0a",
    "%23%0a",
    "%23%0d",
    "%23%0d%0a",
    "%25%30a",
    "%25%30%61",
    "%2e%2e%2f%0d%0a",
    "%2f%2e%2e%0d%0a",
    "%2f..%0d%0a",
    "%3f%0d%0a",
    "%e5%98%8a%e5%98%8d",
    "%e5%98%8a%e5%98%8d%0a",
    "%e5%98%8a%e5%98%8d%0d",
    "%e5%98%8a%e5%98%8d%0d%0a",
    "%e5%98%8a%e5%98%8d%e5%98%8a%e5%98%8d",
    "%00",
    "%u000a",
    "%u000d",
];

/// Path appendages placed before the escape sequence.
const APPEND_LIST: &[&str] = &["", "crlftest", "?crlftest=", "#"];

/// Probes every target with the Cartesian product of appends and CRLF
/// escapes, each carrying the marker header URL-encoded into the path.
/// Redirects are never followed: the oracle needs the response the server
/// emits, not the post-redirect page.
pub struct CrlfScanner {
    config: Arc<ScanConfig>,
    printer: Arc<Printer>,
    client: Arc<HttpClient>,
    dispatcher: Dispatcher,
}

impl CrlfScanner {
    pub fn new(config: Arc<ScanConfig>, printer: Arc<Printer>) -> TransportResult<Self> {
        let client = Arc::new(HttpClient::new(&config, false)?);
        let dispatcher = Dispatcher::new(config.concurrency);
        Ok(Self {
            config,
            printer,
            client,
            dispatcher,
        })
    }

    pub async fn run(&self) {
        self.printer.info(format!(
            "Starting CRLF injection scan for {} target(s)",
            self.config.targets.len()
        ));

        for target_url in &self.config.targets {
            let test_urls = generate_urls(target_url);
            self.printer.info(format!(
                "Testing {} CRLF payloads against {}",
                test_urls.len(),
                target_url
            ));

            let client = self.client.clone();
            let printer = self.printer.clone();
            let method = self.config.method.clone();
            let verbose = self.config.verbose;

            self.dispatcher
                .run(test_urls, move |test_url| {
                    let client = client.clone();
                    let printer = printer.clone();
                    let method = method.clone();
                    async move {
                        let response = match client.execute(&method, &test_url, &[]).await {
                            Ok(r) => r,
                            Err(e) => {
                                if verbose {
                                    printer.error(format!(
                                        "CRLF test error for {}: {}",
                                        test_url, e
                                    ));
                                }
                                return;
                            }
                        };
                        let status = response.status().as_u16();
                        let reflected = response
                            .headers()
                            .get(INJECTED_HEADER_KEY)
                            .and_then(|v| v.to_str().ok())
                            .map(|v| v.contains(INJECTED_HEADER_VAL))
                            .unwrap_or(false);

                        if reflected {
                            printer.result(
                                ScanResult::new(MODULE, &test_url)
                                    .method(&method)
                                    .status(status)
                                    .detail("CRLF injection detected - injected header reflected")
                                    .vulnerable(true),
                            );
                        } else if verbose {
                            printer.result(
                                ScanResult::new(MODULE, &test_url)
                                    .method(&method)
                                    .status(status)
                                    .detail("not vulnerable"),
                            );
                        }
                    }
                })
                .await;
        }
    }
}

/// Builds the probe URLs for one target: `base/ + append + escape +
/// marker-key%3a%20marker-value` for every (append, escape) pair.
pub fn generate_urls(base_url: &str) -> Vec<String> {
    let mut base = base_url.to_string();
    if !base.ends_with('/') {
        base.push('/');
    }

    let mut urls = Vec::with_capacity(APPEND_LIST.len() * ESCAPE_LIST.len());
    for append in APPEND_LIST {
        for escape in ESCAPE_LIST {
            urls.push(format!(
                "{}{}{}{}%3a%20{}",
                base, append, escape, INJECTED_HEADER_KEY, INJECTED_HEADER_VAL
            ));
        }
    }
    urls
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_count_is_product_of_lists() {
        assert_eq!(ESCAPE_LIST.len(), 28);
        assert_eq!(APPEND_LIST.len(), 4);
        let urls = generate_urls("https://example.com");
        assert_eq!(urls.len(), 112);
    }

    #[test]
    fn test_urls_carry_marker_and_base_slash() {
        let urls = generate_urls("https://example.com");
        for url in &urls {
            assert!(url.starts_with("https://example.com/"));
            assert!(url.ends_with("X-Injected-Header-By%3a%20httpsuite"));
        }
    }

    #[test]
    fn test_trailing_slash_not_doubled() {
        let urls = generate_urls("https://example.com/");
        assert!(urls[0].starts_with("https://example.com/%0a"));
    }

    #[test]
    fn test_all_urls_distinct() {
        let urls = generate_urls("https://example.com");
        let unique: std::collections::HashSet<_> = urls.iter().collect();
        assert_eq!(unique.len(), urls.len());
    }
}
