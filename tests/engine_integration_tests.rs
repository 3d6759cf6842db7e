// File: engine_integration_tests.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

mod common;

use common::{
    test_config, ForwardedForGate, InjectedHeaderEcho, PutEnabled, ReflectOriginWithCredentials,
};
use httpsuite::output::Printer;
use httpsuite::scanners::bypass::BypassScanner;
use httpsuite::scanners::cors::CorsScanner;
use httpsuite::scanners::crlf::CrlfScanner;
use httpsuite::scanners::methods::MethodsScanner;
use serial_test::serial;
use std::sync::Arc;
use wiremock::matchers::any;
use wiremock::{Mock, MockServer};

#[tokio::test]
#[serial]
async fn test_bypass_finds_forwarded_for_gate() {
    let mock_server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ForwardedForGate)
        .mount(&mock_server)
        .await;

    let target = format!("{}/admin", mock_server.uri());
    let config = Arc::new(test_config(&target));
    let printer = Arc::new(Printer::new(true, false, None));

    let scanner = BypassScanner::new(
        config,
        printer.clone(),
        target.clone(),
        vec!["headers".to_string()],
        None,
    )
    .unwrap();
    scanner.run().await;

    let results = printer.results();

    // The default request is always recorded, unfiltered.
    let default: Vec<_> = results
        .iter()
        .filter(|r| r.detail == "default request")
        .collect();
    assert_eq!(default.len(), 1);
    assert_eq!(default[0].status_code, 403);

    // The calibration baseline (len of "forbidden") suppresses every header
    // probe except the one that flipped the gate.
    let hits: Vec<_> = results
        .iter()
        .filter(|r| r.detail.starts_with("header:"))
        .collect();
    assert_eq!(hits.len(), 1);
    assert!(hits[0]
        .detail
        .starts_with("header: X-Forwarded-For: 127.0.0.1"));
    assert_eq!(hits[0].status_code, 200);
    assert_eq!(hits[0].content_length, "ok".len());
    assert_eq!(hits[0].module, "bypass");
}

#[tokio::test]
#[serial]
async fn test_bypass_custom_ip_substitution() {
    let mock_server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ForwardedForGate)
        .mount(&mock_server)
        .await;

    let target = format!("{}/admin", mock_server.uri());
    let config = Arc::new(test_config(&target));
    let printer = Arc::new(Printer::new(true, false, None));

    // Forcing every IP header to carry 127.0.0.1 turns all four
    // X-Forwarded-For table variants into hits.
    let scanner = BypassScanner::new(
        config,
        printer.clone(),
        target,
        vec!["headers".to_string()],
        Some("127.0.0.1".to_string()),
    )
    .unwrap();
    scanner.run().await;

    let hits: Vec<_> = printer
        .results()
        .into_iter()
        .filter(|r| r.detail.starts_with("header: X-Forwarded-For"))
        .collect();
    assert_eq!(hits.len(), 4);
    assert!(hits
        .iter()
        .all(|r| r.detail.ends_with("127.0.0.1") && r.status_code == 200));
}

#[tokio::test]
#[serial]
async fn test_crlf_reflecting_stub_marks_every_probe() {
    let mock_server = MockServer::start().await;
    Mock::given(any())
        .respond_with(InjectedHeaderEcho)
        .mount(&mock_server)
        .await;

    let config = Arc::new(test_config(&mock_server.uri()));
    let printer = Arc::new(Printer::new(true, false, None));

    let scanner = CrlfScanner::new(config, printer.clone()).unwrap();
    scanner.run().await;

    let results = printer.results();
    assert_eq!(results.len(), 112);
    assert!(results.iter().all(|r| r.vulnerable));
    assert!(results.iter().all(|r| r.module == "crlf"));
    assert!(results
        .iter()
        .all(|r| r.detail.contains("injected header reflected")));
}

#[tokio::test]
#[serial]
async fn test_crlf_non_reflecting_stub_is_silent() {
    let mock_server = MockServer::start().await;
    Mock::given(any())
        .respond_with(wiremock::ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let config = Arc::new(test_config(&mock_server.uri()));
    let printer = Arc::new(Printer::new(true, false, None));

    CrlfScanner::new(config, printer.clone()).unwrap().run().await;

    assert!(printer.results().is_empty());
}

#[tokio::test]
#[serial]
async fn test_cors_reflection_with_credentials() {
    let mock_server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ReflectOriginWithCredentials)
        .mount(&mock_server)
        .await;

    let config = Arc::new(test_config(&mock_server.uri()));
    let printer = Arc::new(Printer::new(true, false, None));

    let scanner = CorsScanner::new(
        config,
        printer.clone(),
        "https://evil.com".to_string(),
        false,
    )
    .unwrap();
    scanner.run().await;

    let results = printer.results();
    assert!(results.iter().all(|r| r.vulnerable && r.module == "cors"));

    // One credentialed-reflection finding per generated origin.
    let credentialed: Vec<_> = results
        .iter()
        .filter(|r| r.detail.contains("Credentials allowed with reflected origin"))
        .collect();
    assert!(credentialed.len() >= 9);
}

#[tokio::test]
#[serial]
async fn test_methods_flags_enabled_put() {
    let mock_server = MockServer::start().await;
    Mock::given(any())
        .respond_with(PutEnabled)
        .mount(&mock_server)
        .await;

    let config = Arc::new(test_config(&mock_server.uri()));
    let printer = Arc::new(Printer::new(true, false, None));

    let scanner = MethodsScanner::new(config, printer.clone(), None, None).unwrap();
    scanner.run().await;

    let results = printer.results();
    let vulnerable: Vec<_> = results.iter().filter(|r| r.vulnerable).collect();
    assert_eq!(vulnerable.len(), 1);
    assert_eq!(vulnerable[0].method, "PUT");
    assert_eq!(vulnerable[0].status_code, 200);
    assert_eq!(
        vulnerable[0].detail,
        "unexpected success - method may be enabled"
    );

    // No other method may be reported as an unexpected success.
    assert!(results
        .iter()
        .filter(|r| !r.vulnerable)
        .all(|r| r.detail != "unexpected success - method may be enabled"));
}

#[tokio::test]
#[serial]
async fn test_methods_status_filter_drops_other_codes() {
    let mock_server = MockServer::start().await;
    Mock::given(any())
        .respond_with(PutEnabled)
        .mount(&mock_server)
        .await;

    let config = Arc::new(test_config(&mock_server.uri()));
    let printer = Arc::new(Printer::new(true, false, None));

    let scanner =
        MethodsScanner::new(config, printer.clone(), None, Some("200,201")).unwrap();
    scanner.run().await;

    let results = printer.results();
    assert!(!results.is_empty());
    assert!(results.iter().all(|r| r.status_code == 200));
    assert!(results.iter().all(|r| r.method == "PUT"));
}
