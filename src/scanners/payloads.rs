// File: scanners/payloads.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

/// Value of a bypass header: either a fixed literal or derived from the
/// target at dispatch time. A closed set of derivations keeps probes
/// reproducible without runtime polymorphism.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderValue {
    Literal(&'static str),
    Derived(Derived),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Derived {
    Path,
    FullUrl,
}

#[derive(Debug, Clone, Copy)]
pub struct HeaderPayload {
    pub key: &'static str,
    pub value: HeaderValue,
}

impl HeaderPayload {
    pub fn resolve(&self, target_url: &str, path: &str) -> String {
        match self.value {
            HeaderValue::Literal(v) => v.to_string(),
            HeaderValue::Derived(Derived::Path) => path.to_string(),
            HeaderValue::Derived(Derived::FullUrl) => target_url.to_string(),
        }
    }
}

use Derived::{FullUrl, Path};
use HeaderValue::{Derived as Dv, Literal as Lit};

/// Headers commonly honored by reverse proxies and access-control layers.
/// Several keys repeat with different values on purpose; each variant is a
/// distinct probe.
pub const BYPASS_HEADERS: &[HeaderPayload] = &[
    HeaderPayload { key: "X-Original-URL", value: Dv(Path) },
    HeaderPayload { key: "X-Rewrite-URL", value: Dv(Path) },
    HeaderPayload { key: "X-Forwarded-For", value: Lit("127.0.0.1") },
    HeaderPayload { key: "X-Forwarded-For", value: Lit("10.0.0.1") },
    HeaderPayload { key: "X-Forwarded-For", value: Lit("172.16.0.1") },
    HeaderPayload { key: "X-Forwarded-For", value: Lit("192.168.0.1") },
    HeaderPayload { key: "X-Forwarded-Host", value: Lit("127.0.0.1") },
    HeaderPayload { key: "X-Forwarded-Host", value: Lit("localhost") },
    HeaderPayload { key: "X-Host", value: Lit("127.0.0.1") },
    HeaderPayload { key: "X-Custom-IP-Authorization", value: Lit("127.0.0.1") },
    HeaderPayload { key: "X-Originating-IP", value: Lit("127.0.0.1") },
    HeaderPayload { key: "X-Remote-IP", value: Lit("127.0.0.1") },
    HeaderPayload { key: "X-Client-IP", value: Lit("127.0.0.1") },
    HeaderPayload { key: "X-Real-IP", value: Lit("127.0.0.1") },
    HeaderPayload { key: "X-ProxyUser-Ip", value: Lit("127.0.0.1") },
    HeaderPayload { key: "X-Remote-Addr", value: Lit("127.0.0.1") },
    HeaderPayload { key: "True-Client-IP", value: Lit("127.0.0.1") },
    HeaderPayload { key: "Cluster-Client-IP", value: Lit("127.0.0.1") },
    HeaderPayload { key: "X-Forwarded-Port", value: Lit("443") },
    HeaderPayload { key: "X-Forwarded-Port", value: Lit("80") },
    HeaderPayload { key: "X-Forwarded-Port", value: Lit("8080") },
    HeaderPayload { key: "X-Forwarded-Port", value: Lit("8443") },
    HeaderPayload { key: "X-Forwarded-Scheme", value: Lit("https") },
    HeaderPayload { key: "X-Forwarded-Scheme", value: Lit("http") },
    HeaderPayload { key: "X-Forwarded-Proto", value: Lit("https") },
    HeaderPayload { key: "X-Forwarded-Proto", value: Lit("http") },
    HeaderPayload { key: "X-Original-Host", value: Lit("localhost") },
    HeaderPayload { key: "X-Override-URL", value: Dv(Path) },
    HeaderPayload { key: "Forwarded", value: Lit("for=127.0.0.1;by=127.0.0.1;host=localhost") },
    HeaderPayload { key: "X-Forwarded-Server", value: Lit("localhost") },
    HeaderPayload { key: "X-HTTP-DestinationURL", value: Dv(FullUrl) },
    HeaderPayload { key: "X-HTTP-Host-Override", value: Lit("localhost") },
    HeaderPayload { key: "Proxy-Host", value: Lit("127.0.0.1") },
    HeaderPayload { key: "Request-Uri", value: Dv(Path) },
    HeaderPayload { key: "Referer", value: Dv(FullUrl) },
    HeaderPayload { key: "X-Proxy-URL", value: Dv(FullUrl) },
    HeaderPayload { key: "X-Original-Method", value: Lit("GET") },
    HeaderPayload { key: "Content-Length", value: Lit("0") },
    HeaderPayload { key: "X-Requested-With", value: Lit("XMLHttpRequest") },
];

/// Headers that carry an IP value; a user-supplied bypass IP replaces the
/// table value for these keys only.
pub const IP_HEADERS: &[&str] = &[
    "X-Forwarded-For",
    "X-Forwarded-Host",
    "X-Host",
    "X-Custom-IP-Authorization",
    "X-Originating-IP",
    "X-Remote-IP",
    "X-Client-IP",
    "X-Real-IP",
    "X-ProxyUser-Ip",
    "X-Remote-Addr",
    "True-Client-IP",
    "Cluster-Client-IP",
    "Proxy-Host",
];

pub fn is_ip_header(key: &str) -> bool {
    IP_HEADERS.contains(&key)
}

/// Verbs for the tampering family, WebDAV and versioning tail included.
pub const HTTP_METHODS: &[&str] = &[
    "GET", "POST", "PUT", "DELETE", "PATCH",
    "HEAD", "OPTIONS", "TRACE", "CONNECT",
    "PROPFIND", "PROPPATCH", "MKCOL", "COPY",
    "MOVE", "LOCK", "UNLOCK", "VERSION-CONTROL",
    "REPORT", "CHECKOUT", "CHECKIN", "UNCHECKOUT",
    "MKWORKSPACE", "UPDATE", "LABEL", "MERGE",
    "ACL", "ORDERPATCH", "PURGE",
];

pub const END_PATH_PAYLOADS: &[&str] = &[
    "/",
    "//",
    "/./",
    "/..",
    "/..;/",
    "/%2e/",
    "/%2f/",
    "/.%00/",
    "/.%0d/",
    "/.%0a/",
    "/.%00",
    "?",
    "??",
    "#",
    "/*",
    "/.json",
    "/.html",
    "/.php",
    "/.asp",
    "/.aspx",
    "/..%00/",
    "/..%0d/",
    "/..%0a/",
    "/..%09/",
    "/..%ff/",
    "/%20/",
    "/%09/",
    ";/",
    ".;/",
    "..;/",
    ";%09",
    ";%09..",
    ";%09..;",
    ";%2f..",
    "/.randomstring",
];

pub const MID_PATH_PAYLOADS: &[&str] = &[
    "/./",
    "/../",
    "/;/",
    "/.;/",
    "/..;/",
    "/%2e/",
    "/%2f/",
    "/%20/",
    "/%09/",
    "/%00/",
    "/%0d%0a/",
    "/..%00/",
    "/..%0d/",
    "/.%00/",
    "/.%0d/",
    "//",
    "///",
];
