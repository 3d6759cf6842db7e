// File: scanners/smuggle.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

//! HTTP request smuggling detection via HTTP/2 to HTTP/1.1 downgrade.
//!
//! Each probe opens a fresh TLS session, speaks just enough raw HTTP/2 to
//! get a stream open, and sends one HEADERS frame whose gadget header would
//! violate HTTP/1.1 framing after a front-end downgrade. An ordinary HTTP/2
//! library refuses to emit these bytes, which is exactly why the frames are
//! written by hand here. The oracle is the frame-level reaction: a back-end
//! left waiting for a body it was promised shows up as a read timeout.

use crate::config::ScanConfig;
use crate::dispatcher::Dispatcher;
use crate::output::Printer;
use crate::result::ScanResult;
use crate::scanners::gadgets::{self, Gadget};
use crate::transport::{HttpClient, TransportError, TransportResult};
use log::debug;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use url::Url;

const MODULE: &str = "smuggle";

pub const FRAME_DATA: u8 = 0x0;
pub const FRAME_HEADERS: u8 = 0x1;
pub const FRAME_RST_STREAM: u8 = 0x3;
pub const FRAME_SETTINGS: u8 = 0x4;
pub const FRAME_GOAWAY: u8 = 0x7;

pub const FLAG_END_STREAM: u8 = 0x1;
pub const FLAG_END_HEADERS: u8 = 0x4;
pub const FLAG_ACK: u8 = 0x1;

pub const HTTP2_PREFACE: &[u8] = b"PRI * HTTP/2.0\r\n\r\nSM\r\n\r\n";

const PROBE_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:60.0) Gecko/20100101 Firefox/60.0";

/// A raw HTTP/2 frame: 9-byte header plus payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub frame_type: u8,
    pub flags: u8,
    pub stream_id: u32,
    pub payload: Vec<u8>,
}

pub async fn write_frame<W: AsyncWrite + Unpin>(
    w: &mut W,
    frame_type: u8,
    flags: u8,
    stream_id: u32,
    payload: &[u8],
) -> io::Result<()> {
    let len = payload.len();
    let mut header = [0u8; 9];
    header[0] = (len >> 16) as u8;
    header[1] = (len >> 8) as u8;
    header[2] = len as u8;
    header[3] = frame_type;
    header[4] = flags;
    header[5..9].copy_from_slice(&(stream_id & 0x7fff_ffff).to_be_bytes());

    w.write_all(&header).await?;
    if !payload.is_empty() {
        w.write_all(payload).await?;
    }
    w.flush().await
}

pub async fn read_frame<R: AsyncRead + Unpin>(r: &mut R) -> io::Result<Frame> {
    let mut header = [0u8; 9];
    r.read_exact(&mut header).await?;

    let len = (header[0] as usize) << 16 | (header[1] as usize) << 8 | header[2] as usize;
    let mut payload = vec![0u8; len];
    if len > 0 {
        r.read_exact(&mut payload).await?;
    }

    Ok(Frame {
        frame_type: header[3],
        flags: header[4],
        stream_id: u32::from_be_bytes([header[5], header[6], header[7], header[8]]) & 0x7fff_ffff,
        payload,
    })
}

/// HPACK string literal: raw 7-bit length prefix, multi-byte integer
/// continuation for lengths of 127 and above. No Huffman coding.
pub fn encode_hpack_string(s: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(s.len() + 4);
    let len = s.len();
    if len < 127 {
        buf.push(len as u8);
    } else {
        buf.push(127);
        let mut remaining = len - 127;
        while remaining >= 128 {
            buf.push((remaining % 128 + 128) as u8);
            remaining /= 128;
        }
        buf.push(remaining as u8);
    }
    buf.extend_from_slice(s);
    buf
}

/// The header block for one probe, in fixed order: indexed `:method=POST`
/// and `:scheme=https`, `:path` and `:authority` as literals with incremental
/// indexing on static name indices 4 and 1, then the user-agent and the
/// gadget header as literals without indexing. The gadget bytes go onto the
/// wire exactly as decoded, control characters included.
pub fn encode_headers(host: &str, path: &str, gadget: &Gadget) -> Vec<u8> {
    let mut buf = Vec::new();

    // :method = POST, static table index 3.
    buf.push(0x83);
    // :scheme = https, static table index 7.
    buf.push(0x87);
    // :path, literal with indexing on name index 4.
    buf.push(0x44);
    buf.extend_from_slice(&encode_hpack_string(path.as_bytes()));
    // :authority, literal with indexing on name index 1.
    buf.push(0x41);
    buf.extend_from_slice(&encode_hpack_string(host.as_bytes()));

    buf.push(0x00);
    buf.extend_from_slice(&encode_hpack_string(b"user-agent"));
    buf.extend_from_slice(&encode_hpack_string(PROBE_USER_AGENT.as_bytes()));

    buf.push(0x00);
    buf.extend_from_slice(&encode_hpack_string(gadget.header_name.as_bytes()));
    buf.extend_from_slice(&encode_hpack_string(gadget.header_value.as_bytes()));

    buf
}

/// Frame-level oracle outcome for one probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeSignal {
    /// The deadline passed without any frame: the back-end is stalled
    /// waiting for body bytes the gadget promised. The affirmative signal.
    Timeout,
    GoAway,
    RstStream,
    Response { stream_id: u32 },
    OtherFrame { frame_type: u8 },
}

impl ProbeSignal {
    fn detail(&self) -> String {
        match self {
            Self::Timeout => "TIMEOUT (potential smuggling)".to_string(),
            Self::GoAway => "GOAWAY".to_string(),
            Self::RstStream => "RST_STREAM".to_string(),
            Self::Response { stream_id } => format!("response received (stream {})", stream_id),
            Self::OtherFrame { frame_type } => format!("frame type {}", frame_type),
        }
    }

    fn vulnerable(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

/// Runs the fixed probe sequence over an established h2 stream: preface,
/// SETTINGS exchange, one HEADERS frame with the gadget, one DATA frame, and
/// a single bounded frame read that becomes the oracle.
pub async fn probe_stream<S>(
    stream: &mut S,
    host: &str,
    path: &str,
    gadget: &Gadget,
    detect_timeout: Duration,
) -> Result<ProbeSignal, TransportError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream
        .write_all(HTTP2_PREFACE)
        .await
        .map_err(|e| TransportError::Protocol(format!("preface error: {}", e)))?;

    write_frame(stream, FRAME_SETTINGS, 0, 0, &[])
        .await
        .map_err(|e| TransportError::Protocol(format!("settings error: {}", e)))?;

    // The peer's SETTINGS; contents are irrelevant to the oracle.
    read_frame(stream)
        .await
        .map_err(|e| TransportError::Protocol(format!("read settings error: {}", e)))?;

    write_frame(stream, FRAME_SETTINGS, FLAG_ACK, 0, &[])
        .await
        .map_err(|e| TransportError::Protocol(format!("settings ack error: {}", e)))?;

    let headers = encode_headers(host, path, gadget);
    write_frame(stream, FRAME_HEADERS, FLAG_END_HEADERS, 1, &headers)
        .await
        .map_err(|e| TransportError::Protocol(format!("headers error: {}", e)))?;

    write_frame(stream, FRAME_DATA, FLAG_END_STREAM, 1, b"99\r\n")
        .await
        .map_err(|e| TransportError::Protocol(format!("data error: {}", e)))?;

    let frame = match tokio::time::timeout(detect_timeout, read_frame(stream)).await {
        Err(_) => return Ok(ProbeSignal::Timeout),
        Ok(Err(e)) => return Err(TransportError::Protocol(format!("read error: {}", e))),
        Ok(Ok(frame)) => frame,
    };

    Ok(match frame.frame_type {
        FRAME_HEADERS => ProbeSignal::Response {
            stream_id: frame.stream_id,
        },
        FRAME_GOAWAY => ProbeSignal::GoAway,
        FRAME_RST_STREAM => ProbeSignal::RstStream,
        other => ProbeSignal::OtherFrame { frame_type: other },
    })
}

/// Probes each target with every gadget, one fresh TLS session per gadget.
pub struct SmuggleScanner {
    config: Arc<ScanConfig>,
    printer: Arc<Printer>,
    client: Arc<HttpClient>,
    dispatcher: Dispatcher,
    extended: bool,
    wordlist: Option<String>,
    detect_timeout: Duration,
}

impl SmuggleScanner {
    pub fn new(
        config: Arc<ScanConfig>,
        printer: Arc<Printer>,
        extended: bool,
        wordlist: Option<String>,
        detect_timeout_secs: u64,
    ) -> TransportResult<Self> {
        let client = Arc::new(HttpClient::new(&config, false)?);
        let dispatcher = Dispatcher::new(config.concurrency);
        Ok(Self {
            config,
            printer,
            client,
            dispatcher,
            extended,
            wordlist,
            detect_timeout: Duration::from_secs(detect_timeout_secs.max(1)),
        })
    }

    pub async fn run(&self) {
        self.printer.info(format!(
            "Starting HTTP smuggling scan for {} target(s)",
            self.config.targets.len()
        ));

        let gadgets = match gadgets::load(self.extended, self.wordlist.as_deref()) {
            Ok(g) => g,
            Err(e) => {
                self.printer.error(format!("Error reading gadget file: {}", e));
                return;
            }
        };
        if gadgets.is_empty() {
            self.printer.error("No smuggling payloads loaded");
            return;
        }
        self.printer
            .info(format!("Loaded {} smuggling gadgets", gadgets.len()));

        for target_url in &self.config.targets {
            self.scan_target(target_url, &gadgets).await;
        }
    }

    async fn scan_target(&self, target_url: &str, payloads: &[Gadget]) {
        let parsed = match Url::parse(target_url) {
            Ok(u) => u,
            Err(e) => {
                self.printer
                    .error(format!("Error parsing URL {}: {}", target_url, e));
                return;
            }
        };

        let host = match parsed.host_str() {
            Some(h) => h.to_string(),
            None => {
                self.printer
                    .error(format!("No host in URL: {}", target_url));
                return;
            }
        };
        let port = parsed
            .port()
            .unwrap_or(if parsed.scheme() == "https" { 443 } else { 80 });

        let mut path = parsed.path().to_string();
        if path.is_empty() {
            path = "/".to_string();
        }
        if let Some(query) = parsed.query() {
            path.push('?');
            path.push_str(query);
        }

        self.printer.info(format!(
            "Scanning {} for HTTP smuggling vulnerabilities",
            target_url
        ));

        let client = self.client.clone();
        let printer = self.printer.clone();
        let target = target_url.to_string();
        let verbose = self.config.verbose;
        let detect_timeout = self.detect_timeout;

        self.dispatcher
            .run(payloads.to_vec(), move |gadget| {
                let client = client.clone();
                let printer = printer.clone();
                let target = target.clone();
                let host = host.clone();
                let path = path.clone();
                async move {
                    let mut stream = match client.dial_h2(&host, port).await {
                        Ok(s) => s,
                        Err(TransportError::NoH2) => {
                            printer.result(
                                ScanResult::new(MODULE, &target)
                                    .method("POST")
                                    .detail(format!("{} → h2 not supported", gadget.name)),
                            );
                            return;
                        }
                        Err(e) => {
                            // An unreachable host is not a finding; skip the
                            // payload rather than flooding the sink.
                            if verbose {
                                printer.error(format!(
                                    "smuggle dial failed for {}: {}",
                                    target, e
                                ));
                            } else {
                                debug!("smuggle dial failed for {}: {}", target, e);
                            }
                            return;
                        }
                    };

                    let outcome =
                        probe_stream(&mut stream, &host, &path, &gadget, detect_timeout).await;

                    let result = match outcome {
                        Ok(signal) => ScanResult::new(MODULE, &target)
                            .method("POST")
                            .detail(format!("{} → {}", gadget.name, signal.detail()))
                            .vulnerable(signal.vulnerable()),
                        Err(e) => ScanResult::new(MODULE, &target)
                            .method("POST")
                            .detail(format!("{} → {}", gadget.name, e)),
                    };
                    printer.result(result);
                }
            })
            .await;
    }
}
