// File: utils.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader};

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Edge/120.0.0.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
];

/// Trims whitespace and prepends `https://` when the URL carries no scheme.
pub fn normalize_url(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }
    if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    }
}

/// Reads non-empty lines from a file, skipping `#` comments.
pub fn read_lines(path: &str) -> io::Result<Vec<String>> {
    let file = File::open(path)?;
    let mut lines = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        let line = line.trim();
        if !line.is_empty() && !line.starts_with('#') {
            lines.push(line.to_string());
        }
    }
    Ok(lines)
}

pub fn has_stdin() -> bool {
    !atty::is(atty::Stream::Stdin)
}

pub fn read_urls_from_stdin() -> Vec<String> {
    io::stdin()
        .lock()
        .lines()
        .map_while(Result::ok)
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() {
                None
            } else {
                Some(normalize_url(line))
            }
        })
        .collect()
}

pub fn random_string(len: usize) -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

pub fn random_user_agent() -> String {
    let mut rng = rand::thread_rng();
    USER_AGENTS
        .choose(&mut rng)
        .copied()
        .unwrap_or(USER_AGENTS[0])
        .to_string()
}

/// Joins a base URL and a payload suffix without doubling slashes.
pub fn join_url(base: &str, suffix: &str) -> String {
    match (base.ends_with('/'), suffix.starts_with('/')) {
        (false, false) => format!("{}/{}", base, suffix),
        (true, true) => format!("{}{}", base, &suffix[1..]),
        _ => format!("{}{}", base, suffix),
    }
}

/// Distinct case permutations of the ASCII-alphabetic characters in `s`,
/// capped at `max`. The full space of 2^k variants is enumerated when it fits
/// under the cap; otherwise random case masks are drawn until `max` distinct
/// strings exist.
pub fn case_variants(s: &str, max: usize) -> Vec<String> {
    let alpha: Vec<usize> = s
        .char_indices()
        .filter(|(_, c)| c.is_ascii_alphabetic())
        .map(|(i, _)| i)
        .collect();
    let k = alpha.len();

    if k == 0 {
        return vec![s.to_string()];
    }

    // 2^k distinct variants exist in total.
    if k < usize::BITS as usize && (1usize << k) <= max {
        let mut variants = vec![String::new()];
        for c in s.chars() {
            if c.is_ascii_alphabetic() {
                variants = variants
                    .into_iter()
                    .flat_map(|v| {
                        let mut lower = v.clone();
                        lower.push(c.to_ascii_lowercase());
                        let mut upper = v;
                        upper.push(c.to_ascii_uppercase());
                        [lower, upper]
                    })
                    .collect();
            } else {
                for v in &mut variants {
                    v.push(c);
                }
            }
        }
        let mut rng = rand::thread_rng();
        variants.shuffle(&mut rng);
        return variants;
    }

    let mut rng = rand::thread_rng();
    let mut seen: HashSet<String> = HashSet::with_capacity(max);
    while seen.len() < max {
        let variant: String = s
            .chars()
            .map(|c| {
                if c.is_ascii_alphabetic() && rng.gen_bool(0.5) {
                    c.to_ascii_uppercase()
                } else if c.is_ascii_alphabetic() {
                    c.to_ascii_lowercase()
                } else {
                    c
                }
            })
            .collect();
        seen.insert(variant);
    }
    seen.into_iter().collect()
}
