// File: scanners/bypass.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::config::ScanConfig;
use crate::dispatcher::Dispatcher;
use crate::output::Printer;
use crate::result::ScanResult;
use crate::scanners::payloads::{
    is_ip_header, HeaderPayload, BYPASS_HEADERS, END_PATH_PAYLOADS, HTTP_METHODS,
    MID_PATH_PAYLOADS,
};
use crate::transport::{HttpClient, TransportResult};
use crate::utils;
use log::debug;
use std::sync::Arc;
use url::Url;

const MODULE: &str = "bypass";
const CASE_SAMPLE: usize = 20;

/// Probes one target for forbidden-resource access bypass across six
/// mutation families. A calibration request against a nonexistent sibling
/// path yields a baseline body length; most families suppress responses of
/// exactly that size.
pub struct BypassScanner {
    config: Arc<ScanConfig>,
    printer: Arc<Printer>,
    client: Arc<HttpClient>,
    dispatcher: Dispatcher,
    target_url: String,
    techniques: Vec<String>,
    bypass_ip: Option<String>,
}

impl BypassScanner {
    pub fn new(
        config: Arc<ScanConfig>,
        printer: Arc<Printer>,
        target_url: String,
        techniques: Vec<String>,
        bypass_ip: Option<String>,
    ) -> TransportResult<Self> {
        let client = Arc::new(HttpClient::new(&config, config.redirect)?);
        let dispatcher = Dispatcher::new(config.concurrency);
        Ok(Self {
            config,
            printer,
            client,
            dispatcher,
            target_url,
            techniques,
            bypass_ip,
        })
    }

    pub async fn run(&self) {
        self.printer
            .info(format!("Starting 403 bypass scan for: {}", self.target_url));

        let baseline = self.calibrate().await;
        self.default_request().await;

        for technique in &self.techniques {
            match technique.trim() {
                "verbs" => self.verb_tampering(baseline).await,
                "headers" => self.header_bypass(baseline).await,
                "endpaths" => self.end_path_bypass(baseline).await,
                "midpaths" => self.mid_path_bypass(baseline).await,
                "double-encoding" => self.double_encoding().await,
                "path-case" => self.path_case_switching().await,
                other => self.printer.warning(format!("Unknown technique: {}", other)),
            }
        }
    }

    /// Requests a path that cannot exist under the target and records the
    /// body length; identical-length responses are noise, not findings.
    async fn calibrate(&self) -> usize {
        let mut calibration_url = self.target_url.clone();
        if !calibration_url.ends_with('/') {
            calibration_url.push('/');
        }
        calibration_url.push_str("calibration_test_");
        calibration_url.push_str(&utils::random_string(8));

        match self.client.simple("GET", &calibration_url, &[]).await {
            Ok((status, body)) => {
                self.printer.info(format!(
                    "Auto-calibration: status={}, content-length={}",
                    status,
                    body.len()
                ));
                body.len()
            }
            Err(e) => {
                self.printer.warning(format!("Calibration failed: {}", e));
                0
            }
        }
    }

    async fn default_request(&self) {
        self.printer.section("DEFAULT REQUEST");
        match self
            .client
            .simple(&self.config.method, &self.target_url, &[])
            .await
        {
            Ok((status, body)) => {
                self.printer.result(
                    ScanResult::new(MODULE, &self.target_url)
                        .method(&self.config.method)
                        .status(status)
                        .content_length(body.len())
                        .detail("default request"),
                );
            }
            Err(e) => self.printer.error(format!("Default request failed: {}", e)),
        }
    }

    async fn verb_tampering(&self, baseline: usize) {
        self.printer.section("VERB TAMPERING");

        let client = self.client.clone();
        let printer = self.printer.clone();
        let target_url = self.target_url.clone();
        let methods: Vec<&'static str> = HTTP_METHODS.to_vec();

        self.dispatcher
            .run(methods, move |method| {
                let client = client.clone();
                let printer = printer.clone();
                let url = target_url.clone();
                async move {
                    let (status, body) = match client.simple(method, &url, &[]).await {
                        Ok(r) => r,
                        Err(e) => {
                            debug!("verb probe {} {} failed: {}", method, url, e);
                            return;
                        }
                    };
                    if baseline != 0 && body.len() == baseline {
                        return;
                    }
                    printer.result(
                        ScanResult::new(MODULE, &url)
                            .method(method)
                            .status(status)
                            .content_length(body.len())
                            .detail("verb tampering"),
                    );
                }
            })
            .await;
    }

    async fn header_bypass(&self, baseline: usize) {
        self.printer.section("HEADER BYPASS");

        let parsed = match Url::parse(&self.target_url) {
            Ok(u) => u,
            Err(e) => {
                self.printer.error(format!("Error parsing URL: {}", e));
                return;
            }
        };
        let path = if parsed.path().is_empty() {
            "/".to_string()
        } else {
            parsed.path().to_string()
        };

        let client = self.client.clone();
        let printer = self.printer.clone();
        let target_url = self.target_url.clone();
        let method = self.config.method.clone();
        let bypass_ip = self.bypass_ip.clone();
        let payloads: Vec<HeaderPayload> = BYPASS_HEADERS.to_vec();

        self.dispatcher
            .run(payloads, move |payload| {
                let client = client.clone();
                let printer = printer.clone();
                let url = target_url.clone();
                let method = method.clone();
                let bypass_ip = bypass_ip.clone();
                let path = path.clone();
                async move {
                    let mut value = payload.resolve(&url, &path);
                    if let Some(ip) = &bypass_ip {
                        if is_ip_header(payload.key) {
                            value = ip.clone();
                        }
                    }
                    let extra = vec![(payload.key.to_string(), value.clone())];

                    let (status, body) = match client.simple(&method, &url, &extra).await {
                        Ok(r) => r,
                        Err(e) => {
                            debug!("header probe {} failed: {}", payload.key, e);
                            return;
                        }
                    };
                    if baseline != 0 && body.len() == baseline {
                        return;
                    }
                    printer.result(
                        ScanResult::new(MODULE, &url)
                            .method(&method)
                            .status(status)
                            .content_length(body.len())
                            .detail(format!("header: {}: {}", payload.key, value)),
                    );
                }
            })
            .await;
    }

    async fn end_path_bypass(&self, baseline: usize) {
        self.printer.section("END PATH BYPASS");

        let client = self.client.clone();
        let printer = self.printer.clone();
        let target_url = self.target_url.clone();
        let method = self.config.method.clone();
        let payloads: Vec<&'static str> = END_PATH_PAYLOADS.to_vec();

        self.dispatcher
            .run(payloads, move |payload| {
                let client = client.clone();
                let printer = printer.clone();
                let test_url = utils::join_url(&target_url, payload);
                let method = method.clone();
                async move {
                    let (status, body) = match client.simple(&method, &test_url, &[]).await {
                        Ok(r) => r,
                        Err(e) => {
                            debug!("endpath probe {} failed: {}", test_url, e);
                            return;
                        }
                    };
                    if baseline != 0 && body.len() == baseline {
                        return;
                    }
                    printer.result(
                        ScanResult::new(MODULE, &test_url)
                            .method(&method)
                            .status(status)
                            .content_length(body.len())
                            .detail("endpath"),
                    );
                }
            })
            .await;
    }

    async fn mid_path_bypass(&self, baseline: usize) {
        self.printer.section("MID PATH BYPASS");

        let parsed = match Url::parse(&self.target_url) {
            Ok(u) => u,
            Err(e) => {
                self.printer.error(format!("Error parsing URL: {}", e));
                return;
            }
        };

        let path = parsed.path();
        if path.is_empty() || path == "/" {
            self.printer.info("No path to modify for midpath bypass");
            return;
        }

        let trailing_slash = path.ends_with('/');
        let trimmed = path.trim_matches('/');
        let segments: Vec<&str> = trimmed.split('/').collect();
        let last_segment = segments[segments.len() - 1].to_string();
        let base_path = if segments.len() > 1 {
            format!("/{}/", segments[..segments.len() - 1].join("/"))
        } else {
            "/".to_string()
        };
        let base_url = parsed.origin().ascii_serialization();

        let urls: Vec<String> = MID_PATH_PAYLOADS
            .iter()
            .map(|payload| {
                let mut full = format!("{}{}{}{}", base_url, base_path, payload, last_segment);
                if trailing_slash {
                    full.push('/');
                }
                full
            })
            .collect();

        let client = self.client.clone();
        let printer = self.printer.clone();
        let method = self.config.method.clone();

        self.dispatcher
            .run(urls, move |test_url| {
                let client = client.clone();
                let printer = printer.clone();
                let method = method.clone();
                async move {
                    let (status, body) = match client.simple(&method, &test_url, &[]).await {
                        Ok(r) => r,
                        Err(e) => {
                            debug!("midpath probe {} failed: {}", test_url, e);
                            return;
                        }
                    };
                    if baseline != 0 && body.len() == baseline {
                        return;
                    }
                    printer.result(
                        ScanResult::new(MODULE, &test_url)
                            .method(&method)
                            .status(status)
                            .content_length(body.len())
                            .detail("midpath"),
                    );
                }
            })
            .await;
    }

    /// Substitutes every non-slash path character with its double-encoded
    /// form, one probe per character. Responses are not baseline-filtered;
    /// servers answer encoding anomalies too unevenly for that.
    async fn double_encoding(&self) {
        self.printer.section("DOUBLE ENCODING");

        let parsed = match Url::parse(&self.target_url) {
            Ok(u) => u,
            Err(e) => {
                self.printer.error(format!("Error parsing URL: {}", e));
                return;
            }
        };

        let path = parsed.path();
        if path.is_empty() || path == "/" {
            self.printer.info("No path to modify for double encoding");
            return;
        }

        let base_url = parsed.origin().ascii_serialization();
        let urls: Vec<String> = double_encoded_paths(path)
            .into_iter()
            .map(|p| format!("{}{}", base_url, p))
            .collect();

        let client = self.client.clone();
        let printer = self.printer.clone();
        let method = self.config.method.clone();

        self.dispatcher
            .run(urls, move |test_url| {
                let client = client.clone();
                let printer = printer.clone();
                let method = method.clone();
                async move {
                    let (status, body) = match client.simple(&method, &test_url, &[]).await {
                        Ok(r) => r,
                        Err(e) => {
                            debug!("double-encoding probe {} failed: {}", test_url, e);
                            return;
                        }
                    };
                    printer.result(
                        ScanResult::new(MODULE, &test_url)
                            .method(&method)
                            .status(status)
                            .content_length(body.len())
                            .detail("double-encoding"),
                    );
                }
            })
            .await;
    }

    /// Random sample of case permutations of the path. Unfiltered like
    /// double-encoding.
    async fn path_case_switching(&self) {
        self.printer.section("PATH CASE SWITCHING");

        let parsed = match Url::parse(&self.target_url) {
            Ok(u) => u,
            Err(e) => {
                self.printer.error(format!("Error parsing URL: {}", e));
                return;
            }
        };

        let uri_path = parsed.path().trim_matches('/').to_string();
        if uri_path.is_empty() {
            self.printer.info("No path to modify for case switching");
            return;
        }

        let base_url = parsed.origin().ascii_serialization();
        let trailing_slash = self.target_url.ends_with('/');
        let mut variants = utils::case_variants(&uri_path, CASE_SAMPLE);
        variants.truncate(CASE_SAMPLE);

        let urls: Vec<String> = variants
            .into_iter()
            .map(|variant| {
                if trailing_slash {
                    format!("{}/{}/", base_url, variant)
                } else {
                    format!("{}/{}", base_url, variant)
                }
            })
            .collect();

        let client = self.client.clone();
        let printer = self.printer.clone();
        let method = self.config.method.clone();

        self.dispatcher
            .run(urls, move |test_url| {
                let client = client.clone();
                let printer = printer.clone();
                let method = method.clone();
                async move {
                    let (status, body) = match client.simple(&method, &test_url, &[]).await {
                        Ok(r) => r,
                        Err(e) => {
                            debug!("path-case probe {} failed: {}", test_url, e);
                            return;
                        }
                    };
                    printer.result(
                        ScanResult::new(MODULE, &test_url)
                            .method(&method)
                            .status(status)
                            .content_length(body.len())
                            .detail("path-case"),
                    );
                }
            })
            .await;
    }
}

/// One modified path per non-slash character: the character is replaced by
/// `%XX` (uppercase hex of its code point) run through query
/// percent-encoding a second time, so `a` becomes `%2561`.
fn double_encoded_paths(path: &str) -> Vec<String> {
    let mut paths = Vec::new();
    for (i, c) in path.char_indices() {
        if c == '/' {
            continue;
        }
        let single = format!("%{:X}", c as u32);
        let double: String = url::form_urlencoded::byte_serialize(single.as_bytes()).collect();
        let mut modified = String::with_capacity(path.len() + double.len());
        modified.push_str(&path[..i]);
        modified.push_str(&double);
        modified.push_str(&path[i + c.len_utf8()..]);
        paths.push(modified);
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_encoded_paths_count_matches_non_slash_chars() {
        let paths = double_encoded_paths("/admin");
        assert_eq!(paths.len(), 5);

        let paths = double_encoded_paths("/a/b");
        assert_eq!(paths.len(), 2);
    }

    #[test]
    fn test_double_encoded_paths_substitution() {
        let paths = double_encoded_paths("/ab");
        // 'a' is 0x61, single-encoded "%61", double-encoded "%2561".
        assert_eq!(paths[0], "/%2561b");
        assert_eq!(paths[1], "/a%2562");
    }

    #[test]
    fn test_double_encoded_paths_skips_slashes() {
        let paths = double_encoded_paths("///");
        assert!(paths.is_empty());
    }

    #[test]
    fn test_double_encoded_uppercase_hex() {
        let paths = double_encoded_paths("/~");
        // '~' is 0x7E; hex must be uppercase.
        assert_eq!(paths[0], "/%257E");
    }
}
