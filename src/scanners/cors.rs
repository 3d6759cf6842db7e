// File: scanners/cors.rs
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
use url::Url;

const MODULE: &str = "cors";

const ACAO: &str = "Access-Control-Allow-Origin";
const ACAC: &str = "Access-Control-Allow-Credentials";
const ACAM: &str = "Access-Control-Allow-Methods";
const ACAH: &str = "Access-Control-Allow-Headers";

/// Characters servers with sloppy origin validation are known to let
/// through in the registrable domain, used by the deep scan.
const DEEP_SCAN_CHARS: &[&str] = &[
    "!", "'", "(", ")", "*", ",", ";", "_", "{", "}", "|", "~", "\"", "`", "+", "-",
];

/// Probes CORS policy per target: one preflight, then a generated set of
/// malicious origins. Redirects are never followed so the inspected headers
/// are the ones the target itself emitted.
pub struct CorsScanner {
    config: Arc<ScanConfig>,
    printer: Arc<Printer>,
    client: Arc<HttpClient>,
    dispatcher: Dispatcher,
    origin: String,
    deep_scan: bool,
}

impl CorsScanner {
    pub fn new(
        config: Arc<ScanConfig>,
        printer: Arc<Printer>,
        origin: String,
        deep_scan: bool,
    ) -> TransportResult<Self> {
        let client = Arc::new(HttpClient::new(&config, false)?);
        let dispatcher = Dispatcher::new(config.concurrency);
        Ok(Self {
            config,
            printer,
            client,
            dispatcher,
            origin,
            deep_scan,
        })
    }

    pub async fn run(&self) {
        self.printer.info(format!(
            "Starting CORS misconfiguration scan for {} target(s)",
            self.config.targets.len()
        ));

        for target_url in &self.config.targets {
            self.preflight_check(target_url).await;
            self.probe_origins(target_url).await;
        }
    }

    /// Browser-style OPTIONS preflight with the attacker origin. The answer
    /// is informational; it is logged in verbose mode only.
    async fn preflight_check(&self, target_url: &str) {
        let extra = vec![
            ("Origin".to_string(), self.origin.clone()),
            ("Accept".to_string(), "*/*".to_string()),
            ("Connection".to_string(), "close".to_string()),
        ];

        let response = match self.client.execute("OPTIONS", target_url, &extra).await {
            Ok(r) => r,
            Err(e) => {
                self.printer
                    .error(format!("Preflight request failed for {}: {}", target_url, e));
                return;
            }
        };

        if self.config.verbose {
            let get = |name: &str| {
                response
                    .headers()
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("")
                    .to_string()
            };
            self.printer.info(format!(
                "Preflight for {}: ACAO={}, ACAC={}, Methods={}, Headers={}",
                target_url,
                get(ACAO),
                get(ACAC),
                get(ACAM),
                get(ACAH)
            ));
        }
    }

    async fn probe_origins(&self, target_url: &str) {
        let payloads = generate_payloads(target_url, &self.origin, self.deep_scan);

        let client = self.client.clone();
        let printer = self.printer.clone();
        let method = self.config.method.clone();
        let verbose = self.config.verbose;
        let target = target_url.to_string();

        self.dispatcher
            .run(payloads, move |origin| {
                let client = client.clone();
                let printer = printer.clone();
                let method = method.clone();
                let target = target.clone();
                async move {
                    let extra = vec![
                        ("Origin".to_string(), origin.clone()),
                        ("Accept".to_string(), "*/*".to_string()),
                        ("Accept-Language".to_string(), "en".to_string()),
                        ("Connection".to_string(), "close".to_string()),
                    ];

                    let response = match client.execute(&method, &target, &extra).await {
                        Ok(r) => r,
                        Err(_) => return,
                    };
                    let status = response.status().as_u16();
                    let acao = response
                        .headers()
                        .get(ACAO)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    let acac = response
                        .headers()
                        .get(ACAC)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();

                    let (vulnerable, details) = evaluate(&origin, &acao, &acac);
                    if vulnerable {
                        for detail in details {
                            printer.result(
                                ScanResult::new(MODULE, &target)
                                    .method(&method)
                                    .status(status)
                                    .detail(format!("Origin: {} → {}", origin, detail))
                                    .vulnerable(true),
                            );
                        }
                    } else if verbose {
                        printer.result(
                            ScanResult::new(MODULE, &target)
                                .method(&method)
                                .status(status)
                                .detail(format!("Origin: {} → not vulnerable", origin)),
                        );
                    }
                }
            })
            .await;
    }
}

/// Builds the malicious origin set for one target from its host, split into
/// registrable label and TLD where possible.
pub fn generate_payloads(target_url: &str, attacker_origin: &str, deep_scan: bool) -> Vec<String> {
    let parsed = match Url::parse(target_url) {
        Ok(u) => u,
        Err(_) => return vec![attacker_origin.to_string()],
    };
    let host = parsed.host_str().unwrap_or_default();

    let parts: Vec<&str> = host.split('.').collect();
    let (domain, tld) = if parts.len() >= 2 {
        (parts[parts.len() - 2], parts[parts.len() - 1])
    } else {
        (host, "")
    };

    let mut payloads = vec![
        "null".to_string(),
        "https://evil.com".to_string(),
        "http://evil.com".to_string(),
        // Reflected origin: the target itself.
        target_url.to_string(),
        // Prefix match bypass.
        format!("https://{}.{}.evil.com", domain, tld),
        // Suffix match bypass.
        format!("https://evil{}.{}", domain, tld),
        // Arbitrary subdomain.
        format!("https://sub.{}.{}", domain, tld),
        // Port confusion.
        format!("https://{}.{}:8080", domain, tld),
        // Double domain.
        format!("https://{}.{}.{}.{}", domain, tld, domain, tld),
    ];

    if deep_scan {
        for c in DEEP_SCAN_CHARS {
            payloads.push(format!("https://{}.{}{}.evil.com", domain, tld, c));
        }
        // Userinfo-style bypasses with encoded @ separators.
        payloads.push(format!("https://evil.com%40{}.{}", domain, tld));
        payloads.push(format!("https://evil.com%23@{}.{}", domain, tld));
    }

    payloads
}

/// Applies the misconfiguration rules in order; several may fire for the
/// same probe and each produces its own detail line.
pub fn evaluate(payload: &str, acao: &str, acac: &str) -> (bool, Vec<String>) {
    let mut details = Vec::new();

    if acao == payload {
        let mut detail = format!("ACAO reflects origin: {}", acao);
        if acac == "true" {
            detail.push_str(" (with credentials)");
        }
        details.push(detail);
    }

    if acao == "*" {
        details.push("Wildcard ACAO: *".to_string());
    }

    if acao == "null" && payload == "null" {
        details.push("Null origin allowed in ACAO".to_string());
    }

    if acac == "true" && !acao.is_empty() && acao != "*" && acao == payload {
        details.push(format!(
            "Credentials allowed with reflected origin: ACAO={}, ACAC=true",
            acao
        ));
    }

    (!details.is_empty(), details)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate_null_origin() {
        let (vulnerable, details) = evaluate("null", "null", "");
        assert!(vulnerable);
        assert!(details.iter().any(|d| d.contains("Null origin")));
    }

    #[test]
    fn test_evaluate_wildcard() {
        let (vulnerable, details) = evaluate("https://x", "*", "");
        assert!(vulnerable);
        assert_eq!(details, vec!["Wildcard ACAO: *"]);
    }

    #[test]
    fn test_evaluate_reflection_with_credentials() {
        let (vulnerable, details) = evaluate("https://x", "https://x", "true");
        assert!(vulnerable);
        assert_eq!(details.len(), 2);
        assert!(details[0].contains("reflects origin"));
        assert!(details[0].contains("(with credentials)"));
        assert!(details[1].contains("Credentials allowed with reflected origin"));
    }

    #[test]
    fn test_evaluate_no_match() {
        let (vulnerable, details) = evaluate("https://x", "https://y", "");
        assert!(!vulnerable);
        assert!(details.is_empty());
    }

    #[test]
    fn test_evaluate_reflection_without_credentials() {
        let (vulnerable, details) = evaluate("https://x", "https://x", "");
        assert!(vulnerable);
        assert_eq!(details, vec!["ACAO reflects origin: https://x"]);
    }

    #[test]
    fn test_payload_generation_base_set() {
        let payloads = generate_payloads("https://shop.example.com", "https://evil.com", false);
        assert_eq!(payloads.len(), 9);
        assert!(payloads.contains(&"null".to_string()));
        assert!(payloads.contains(&"https://shop.example.com".to_string()));
        assert!(payloads.contains(&"https://example.com.evil.com".to_string()));
        assert!(payloads.contains(&"https://evilexample.com".to_string()));
        assert!(payloads.contains(&"https://sub.example.com".to_string()));
        assert!(payloads.contains(&"https://example.com:8080".to_string()));
        assert!(payloads.contains(&"https://example.com.example.com".to_string()));
    }

    #[test]
    fn test_payload_generation_deep_scan() {
        let payloads = generate_payloads("https://example.com", "https://evil.com", true);
        assert_eq!(payloads.len(), 9 + DEEP_SCAN_CHARS.len() + 2);
        assert!(payloads.contains(&"https://example.com_.evil.com".to_string()));
        assert!(payloads.contains(&"https://evil.com%40example.com".to_string()));
        assert!(payloads.contains(&"https://evil.com%23@example.com".to_string()));
    }

    #[test]
    fn test_payload_generation_bare_host() {
        let payloads = generate_payloads("https://localhost", "https://evil.com", false);
        assert_eq!(payloads.len(), 9);
        assert!(payloads.contains(&"https://evillocalhost.".to_string()));
    }
}
