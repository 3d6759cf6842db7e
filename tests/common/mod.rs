// File: common/mod.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use httpsuite::config::ScanConfig;
use wiremock::{Request, Respond, ResponseTemplate};

pub fn test_config(target: &str) -> ScanConfig {
    ScanConfig {
        targets: vec![target.to_string()],
        silent: true,
        ..ScanConfig::default()
    }
}

pub fn header_value(request: &Request, name: &str) -> Option<String> {
    request
        .headers
        .iter()
        .find(|(key, _)| key.as_str().eq_ignore_ascii_case(name))
        .map(|(_, values)| values.last().as_str().to_string())
}

/// 403 "forbidden" everywhere, 200 "ok" when the magic client IP header is
/// present. Models an access-control layer trusting X-Forwarded-For.
pub struct ForwardedForGate;

impl Respond for ForwardedForGate {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        if header_value(request, "x-forwarded-for").as_deref() == Some("127.0.0.1") {
            ResponseTemplate::new(200).set_body_string("ok")
        } else {
            ResponseTemplate::new(403).set_body_string("forbidden")
        }
    }
}

/// Unconditionally emits the header a CRLF probe tries to inject, as a
/// server that reflects the decoded path into its response headers would.
pub struct InjectedHeaderEcho;

impl Respond for InjectedHeaderEcho {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        ResponseTemplate::new(200)
            .set_body_string("hello")
            .insert_header("X-Injected-Header-By", "httpsuite")
    }
}

/// Reflects any Origin into ACAO and always allows credentials. The classic
/// worst-case CORS misconfiguration.
pub struct ReflectOriginWithCredentials;

impl Respond for ReflectOriginWithCredentials {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let origin = header_value(request, "origin").unwrap_or_default();
        ResponseTemplate::new(200)
            .set_body_string("cors")
            .insert_header("Access-Control-Allow-Origin", origin.as_str())
            .insert_header("Access-Control-Allow-Credentials", "true")
    }
}

/// 200 for PUT, 405 for everything else.
pub struct PutEnabled;

impl Respond for PutEnabled {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        if request.method.to_string() == "PUT" {
            ResponseTemplate::new(200).set_body_string("created")
        } else {
            ResponseTemplate::new(405).set_body_string("denied")
        }
    }
}
