// File: result.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use serde::Serialize;

/// A single finding produced by any scan module. A `status_code` of 0 means
/// no HTTP response was obtained; the record is still valid and carries a
/// transport- or protocol-level signal in `detail`.
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    pub url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub method: String,
    pub status_code: u16,
    pub content_length: usize,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub detail: String,
    pub module: String,
    pub vulnerable: bool,
}

impl ScanResult {
    pub fn new(module: &str, url: &str) -> Self {
        Self {
            url: url.to_string(),
            method: String::new(),
            status_code: 0,
            content_length: 0,
            detail: String::new(),
            module: module.to_string(),
            vulnerable: false,
        }
    }

    pub fn method(mut self, method: &str) -> Self {
        self.method = method.to_string();
        self
    }

    pub fn status(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    pub fn content_length(mut self, content_length: usize) -> Self {
        self.content_length = content_length;
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    pub fn vulnerable(mut self, vulnerable: bool) -> Self {
        self.vulnerable = vulnerable;
        self
    }
}
