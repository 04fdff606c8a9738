//! Blocking HTTP transport.
//!
//! # Design
//! A `Transport` executes one request and reports the raw response: the
//! header block followed by the buffered body, plus the header block size and
//! status. `HttpResponse::from_raw` does the rest, so alternative transports
//! (and the recording fake used in tests) only deal in bytes.

use std::io::{self, Read, Write};

use tracing::trace;

use crate::error::{Error, Result};
use crate::http::{HttpRequest, TransportOptions};

/// Raw transport output for one request.
#[derive(Debug, Clone, Default)]
pub struct RawResponse {
    /// Header block followed by the buffered body, if any.
    pub bytes: Vec<u8>,
    pub header_size: usize,
    pub status: u16,
}

/// Executes a single blocking HTTP request.
pub trait Transport: Send + Sync {
    /// Send `request`. With a `sink`, the body is streamed into it and
    /// `RawResponse::bytes` holds only the header block.
    fn execute(
        &self,
        request: &HttpRequest,
        options: &TransportOptions,
        sink: Option<&mut dyn Write>,
    ) -> Result<RawResponse>;
}

/// `Transport` backed by a fresh ureq agent per request.
#[derive(Debug, Clone, Default)]
pub struct UreqTransport;

impl UreqTransport {
    pub fn new() -> Self {
        Self
    }

    fn agent(options: &TransportOptions) -> ureq::Agent {
        let mut config = ureq::Agent::config_builder()
            .http_status_as_error(options.fail_on_error.unwrap_or(false))
            .timeout_global(options.timeout);
        if !options.verify_tls.unwrap_or(true) {
            config = config.tls_config(
                ureq::tls::TlsConfig::builder()
                    .disable_verification(true)
                    .build(),
            );
        }
        config.build().new_agent()
    }
}

impl Transport for UreqTransport {
    fn execute(
        &self,
        request: &HttpRequest,
        options: &TransportOptions,
        sink: Option<&mut dyn Write>,
    ) -> Result<RawResponse> {
        let mut builder = ureq::http::Request::builder()
            .method(request.method.as_str())
            .uri(request.url.as_str());

        let has_user_agent = request.header("User-Agent").is_some();
        for (name, value) in request.header_pairs() {
            builder = builder.header(name, value);
        }
        if let (false, Some(ua)) = (has_user_agent, options.user_agent.as_deref()) {
            builder = builder.header("User-Agent", ua);
        }

        let http_request = builder
            .body(request.body.clone().unwrap_or_default())
            .map_err(|e| Error::InvalidRequest(e.to_string()))?;

        let mut response = Self::agent(options).run(http_request)?;
        let status = response.status().as_u16();

        let mut bytes = header_block(&response);
        let header_size = bytes.len();
        trace!(status, header_size, "response headers received");

        let mut reader = response.body_mut().as_reader();
        match sink {
            Some(sink) => {
                io::copy(&mut reader, sink)?;
            }
            None if options.buffer_response.unwrap_or(true) => {
                reader.read_to_end(&mut bytes)?;
            }
            None => {
                io::copy(&mut reader, &mut io::sink())?;
            }
        }

        Ok(RawResponse {
            bytes,
            header_size,
            status,
        })
    }
}

/// Rebuild the raw header block: status line, header lines, blank line.
fn header_block(response: &ureq::http::Response<ureq::Body>) -> Vec<u8> {
    let status = response.status();
    let mut block = format!(
        "{:?} {} {}\r\n",
        response.version(),
        status.as_u16(),
        status.canonical_reason().unwrap_or("")
    );
    for (name, value) in response.headers() {
        block.push_str(name.as_str());
        block.push_str(": ");
        block.push_str(&String::from_utf8_lossy(value.as_bytes()));
        block.push_str("\r\n");
    }
    block.push_str("\r\n");
    block.into_bytes()
}
