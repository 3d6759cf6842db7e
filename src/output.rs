// File: output.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::result::ScanResult;
use colored::Colorize;
use std::fs::File;
use std::io::Write;
use std::sync::Mutex;

/// Printer is the shared result sink and console formatter. Appends are
/// serialized under a single mutex; it is the only contended mutable
/// structure in the scanner core.
pub struct Printer {
    silent: bool,
    json: bool,
    inner: Mutex<PrinterInner>,
}

struct PrinterInner {
    results: Vec<ScanResult>,
    out_file: Option<File>,
}

impl Printer {
    pub fn new(silent: bool, json: bool, output_file: Option<&str>) -> Self {
        let out_file = output_file.and_then(|path| match File::create(path) {
            Ok(f) => Some(f),
            Err(e) => {
                eprintln!("{} Error creating output file {}: {}", "[ERR]".red(), path, e);
                None
            }
        });

        Self {
            silent,
            json,
            inner: Mutex::new(PrinterInner {
                results: Vec::new(),
                out_file,
            }),
        }
    }

    pub fn banner(&self) {
        if self.silent {
            return;
        }
        let art = r#"
   __    __  __
  / /   / /_/ /_____ ___  __(_) /____
 / _ \ / __/ __/ __ \/ ___/ / __/ _ \
/ / / / /_/ /_/ /_/ (__  ) / /_/  __/
\/ /_/\__/\__/ .___/____/_/\__/\___/
            /_/"#;
        println!("{}  {}", art.cyan(), format!("v{}", env!("CARGO_PKG_VERSION")).bold());
        println!();
        println!("  {}", "Unified HTTP Security Testing Tool".green());
        println!("  {}", "Bypass | CRLF | CORS | Methods | Smuggle".dimmed());
        println!();
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        if self.silent {
            return;
        }
        let _guard = self.inner.lock().unwrap();
        println!("{} {}", "[INF]".cyan(), msg.as_ref());
    }

    pub fn success(&self, msg: impl AsRef<str>) {
        if self.silent {
            return;
        }
        let _guard = self.inner.lock().unwrap();
        println!("{} {}", "[OK]".green(), msg.as_ref());
    }

    pub fn warning(&self, msg: impl AsRef<str>) {
        if self.silent {
            return;
        }
        let _guard = self.inner.lock().unwrap();
        println!("{} {}", "[WRN]".yellow(), msg.as_ref());
    }

    // Errors are always emitted, silent mode or not.
    pub fn error(&self, msg: impl AsRef<str>) {
        let _guard = self.inner.lock().unwrap();
        eprintln!("{} {}", "[ERR]".red(), msg.as_ref());
    }

    pub fn section(&self, title: &str) {
        if self.silent {
            return;
        }
        let _guard = self.inner.lock().unwrap();
        println!(
            "\n{}",
            format!("\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501} {} \u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}", title).magenta()
        );
    }

    /// Records a result and forwards it to stdout (and the output file when
    /// one is configured). Results are always emitted, even in silent mode.
    pub fn result(&self, r: ScanResult) {
        let mut inner = self.inner.lock().unwrap();

        if self.json {
            if let Ok(line) = serde_json::to_string(&r) {
                println!("{}", line);
            }
        } else {
            let status = colorize_status(r.status_code);
            let method = if r.method.is_empty() {
                String::new()
            } else {
                format!(" {}", r.method)
            };
            let detail = if r.detail.is_empty() {
                String::new()
            } else {
                format!(" ({})", r.detail)
            };
            let vuln = if r.vulnerable {
                format!(" {}", "[VULNERABLE]".green())
            } else {
                String::new()
            };
            println!(
                "{}{} {} {} bytes{}{} {}",
                status,
                method,
                r.url,
                r.content_length,
                detail,
                vuln,
                format!("[{}]", r.module).dimmed()
            );
        }

        if !self.json {
            if let Some(file) = inner.out_file.as_mut() {
                let mut line = format!(
                    "{} {} {} {} bytes",
                    r.status_code, r.method, r.url, r.content_length
                );
                if !r.detail.is_empty() {
                    line += &format!(" ({})", r.detail);
                }
                if r.vulnerable {
                    line += " [VULNERABLE]";
                }
                line += &format!(" [{}]", r.module);
                let _ = writeln!(file, "{}", line);
            }
        }

        inner.results.push(r);
    }

    /// Snapshot of everything recorded so far.
    pub fn results(&self) -> Vec<ScanResult> {
        self.inner.lock().unwrap().results.clone()
    }

    /// In JSON mode the output file receives the full pretty-printed result
    /// array at termination; plain mode has already written line by line.
    pub fn close(&self) {
        let mut guard = self.inner.lock().unwrap();
        let inner = &mut *guard;
        if self.json {
            if let Some(file) = inner.out_file.as_mut() {
                if let Ok(data) = serde_json::to_vec_pretty(&inner.results) {
                    let _ = file.write_all(&data);
                }
            }
        }
        inner.out_file = None;
    }
}

fn colorize_status(code: u16) -> colored::ColoredString {
    let text = code.to_string();
    match code {
        200..=299 => text.green(),
        300..=399 => text.blue(),
        400..=499 => text.magenta(),
        500..=599 => text.yellow(),
        _ => text.white(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_results_accumulate() {
        let printer = Printer::new(true, false, None);
        assert_eq!(printer.results().len(), 0);

        printer.result(ScanResult::new("crlf", "https://a"));
        assert_eq!(printer.results().len(), 1);

        printer.result(ScanResult::new("cors", "https://b").vulnerable(true));
        let results = printer.results();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| !r.url.is_empty()));
    }

    #[test]
    fn test_snapshot_is_detached() {
        let printer = Printer::new(true, false, None);
        printer.result(ScanResult::new("methods", "https://a"));
        let snapshot = printer.results();
        printer.result(ScanResult::new("methods", "https://b"));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(printer.results().len(), 2);
    }

    #[test]
    fn test_json_file_written_on_close() {
        let path = std::env::temp_dir().join(format!(
            "httpsuite_printer_test_{}.json",
            std::process::id()
        ));
        let path_str = path.to_str().unwrap().to_string();

        let printer = Printer::new(true, true, Some(&path_str));
        printer.result(
            ScanResult::new("bypass", "https://a/admin")
                .method("GET")
                .status(200),
        );
        printer.close();

        let data = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&data).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 1);
        assert_eq!(parsed[0]["url"], "https://a/admin");
        let _ = std::fs::remove_file(&path);
    }
}
