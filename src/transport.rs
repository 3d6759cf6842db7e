// File: transport.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::config::ScanConfig;
use log::debug;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;

#[derive(Debug)]
pub enum TransportError {
    /// Connection, DNS, or request-level failure.
    Request(String),
    /// The request exceeded its deadline. Kept separate because the smuggle
    /// engine treats timeouts as oracle signals, not failures.
    Timeout(String),
    /// TLS negotiated something other than h2.
    NoH2,
    /// Malformed wire data or handshake failure on the raw path.
    Protocol(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request(msg) => write!(f, "request error: {}", msg),
            Self::Timeout(msg) => write!(f, "timeout: {}", msg),
            Self::NoH2 => write!(f, "h2 not supported"),
            Self::Protocol(msg) => write!(f, "protocol error: {}", msg),
        }
    }
}

impl std::error::Error for TransportError {}

pub type TransportResult<T> = Result<T, TransportError>;

/// Shared HTTP transport. One configured reqwest client for the HTTP/1.1
/// probes plus a raw TCP+TLS dialer for the hand-rolled HTTP/2 path.
///
/// TLS certificate verification is disabled on both paths. That is the only
/// TLS mode: this is a security testing tool and targets routinely present
/// self-signed or mismatched certificates.
pub struct HttpClient {
    client: reqwest::Client,
    headers: Vec<(String, String)>,
    retries: u32,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(config: &ScanConfig, follow_redirects: bool) -> TransportResult<Self> {
        let redirect_policy = if follow_redirects {
            reqwest::redirect::Policy::limited(10)
        } else {
            reqwest::redirect::Policy::none()
        };

        let mut builder = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .redirect(redirect_policy)
            .user_agent(&config.user_agent);

        if let Some(proxy) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| TransportError::Request(format!("invalid proxy: {}", e)))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| TransportError::Request(format!("client build failed: {}", e)))?;

        Ok(Self {
            client,
            headers: config.headers.clone(),
            retries: config.retries.max(1),
            timeout: config.timeout,
        })
    }

    /// Sends a request and returns the response with headers intact. Retries
    /// on transport errors with linear 500ms backoff. Configured headers are
    /// applied first; `extra_headers` override them.
    pub async fn execute(
        &self,
        method: &str,
        url: &str,
        extra_headers: &[(String, String)],
    ) -> TransportResult<reqwest::Response> {
        let method = Method::from_bytes(method.as_bytes())
            .map_err(|e| TransportError::Request(format!("invalid method {}: {}", method, e)))?;

        let mut headers = HeaderMap::new();
        for (key, value) in self.headers.iter().chain(extra_headers.iter()) {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| TransportError::Request(format!("invalid header {}: {}", key, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| TransportError::Request(format!("invalid value for {}: {}", key, e)))?;
            headers.insert(name, value);
        }

        let request = self
            .client
            .request(method, url)
            .headers(headers)
            .build()
            .map_err(|e| TransportError::Request(format!("request build failed: {}", e)))?;

        let mut last_err = None;
        for attempt in 0..self.retries {
            let request = match request.try_clone() {
                Some(r) => r,
                None => return Err(TransportError::Request("request not cloneable".to_string())),
            };
            match self.client.execute(request).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    debug!("attempt {} for {} failed: {}", attempt + 1, url, e);
                    last_err = Some(e);
                    if attempt + 1 < self.retries {
                        tokio::time::sleep(Duration::from_millis(500 * (attempt as u64 + 1)))
                            .await;
                    }
                }
            }
        }

        let err = last_err.expect("retry loop ran at least once");
        if err.is_timeout() {
            Err(TransportError::Timeout(err.to_string()))
        } else {
            Err(TransportError::Request(format!(
                "request failed after {} retries: {}",
                self.retries, err
            )))
        }
    }

    /// Convenience wrapper returning status and the fully buffered body.
    pub async fn simple(
        &self,
        method: &str,
        url: &str,
        extra_headers: &[(String, String)],
    ) -> TransportResult<(u16, Vec<u8>)> {
        let response = self.execute(method, url, extra_headers).await?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Request(format!("body read failed: {}", e)))?;
        Ok((status, body.to_vec()))
    }

    /// Establishes a raw TLS session advertising exactly `h2` via ALPN. The
    /// proxy setting does not apply here; the smuggle engine always dials the
    /// target directly.
    pub async fn dial_h2(&self, host: &str, port: u16) -> TransportResult<TlsStream<TcpStream>> {
        let addr = format!("{}:{}", host, port);

        let tcp = tokio::time::timeout(self.timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| TransportError::Timeout(format!("connect timeout for {}", addr)))?
            .map_err(|e| TransportError::Request(format!("connection to {} failed: {}", addr, e)))?;

        let mut tls_config = rustls::ClientConfig::builder()
            .with_safe_defaults()
            .with_custom_certificate_verifier(Arc::new(NoVerification))
            .with_no_client_auth();
        tls_config.alpn_protocols = vec![b"h2".to_vec()];

        let connector = TlsConnector::from(Arc::new(tls_config));
        let server_name = rustls::ServerName::try_from(host)
            .map_err(|e| TransportError::Protocol(format!("invalid server name {}: {}", host, e)))?;

        let stream = tokio::time::timeout(self.timeout, connector.connect(server_name, tcp))
            .await
            .map_err(|_| TransportError::Timeout(format!("TLS handshake timeout for {}", addr)))?
            .map_err(|e| TransportError::Protocol(format!("TLS handshake failed: {}", e)))?;

        let (_, session) = stream.get_ref();
        if session.alpn_protocol() != Some(b"h2".as_ref()) {
            return Err(TransportError::NoH2);
        }

        Ok(stream)
    }
}

/// Accepts any certificate. Intentional: probing misconfigured or staging
/// hosts must not fail on certificate validation.
struct NoVerification;

impl rustls::client::ServerCertVerifier for NoVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::Certificate,
        _intermediates: &[rustls::Certificate],
        _server_name: &rustls::ServerName,
        _scts: &mut dyn Iterator<Item = &[u8]>,
        _ocsp_response: &[u8],
        _now: std::time::SystemTime,
    ) -> Result<rustls::client::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::ServerCertVerified::assertion())
    }
}
