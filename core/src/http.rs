//! HTTP wire types and response normalization.
//!
//! # Design
//! Requests and responses are plain data. Headers travel as ordered
//! `Name: Value` lines, the same shape the backend documents and the shape
//! the raw response header block is split into. `HttpResponse::from_raw`
//! is the single place where transport bytes become a response object, so
//! every transport reports a raw buffer plus the size of its header block.

use std::time::Duration;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// A fully built request ready for a `Transport`.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    /// Ordered `Name: Value` lines. Duplicates are sent as-is.
    pub headers: Vec<String>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Iterate headers as `(name, value)` pairs. Lines without a colon are skipped.
    pub fn header_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().filter_map(|line| {
            let (name, value) = line.split_once(':')?;
            Some((name.trim(), value.trim()))
        })
    }

    /// Last value sent for `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.header_pairs()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
            .last()
    }
}

/// Options handed to the transport for one request.
///
/// Every field is optional so option sets can be layered with `merged`:
/// base options, then the client's options, then per-call options.
/// Unknown keys are rejected when deserializing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransportOptions {
    /// Treat 4xx/5xx statuses as transport errors.
    #[serde(default)]
    pub fail_on_error: Option<bool>,

    /// Keep the response body in memory. When false and no sink is given,
    /// the body is read and dropped.
    #[serde(default)]
    pub buffer_response: Option<bool>,

    #[serde(default)]
    pub verify_tls: Option<bool>,

    #[serde(default)]
    pub user_agent: Option<String>,

    /// Whole-request timeout, in seconds when deserialized.
    #[serde(default, deserialize_with = "deserialize_secs")]
    pub timeout: Option<Duration>,
}

fn deserialize_secs<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
    Ok(Option::<u64>::deserialize(d)?.map(Duration::from_secs))
}

impl TransportOptions {
    /// Options every request starts from.
    pub fn base() -> Self {
        Self {
            fail_on_error: Some(false),
            buffer_response: Some(true),
            verify_tls: Some(true),
            user_agent: Some(format!("tabledb-rust/{}", env!("CARGO_PKG_VERSION"))),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Layer `other` over `self`; fields set in `other` win.
    pub fn merged(&self, other: &TransportOptions) -> TransportOptions {
        TransportOptions {
            fail_on_error: other.fail_on_error.or(self.fail_on_error),
            buffer_response: other.buffer_response.or(self.buffer_response),
            verify_tls: other.verify_tls.or(self.verify_tls),
            user_agent: other.user_agent.clone().or_else(|| self.user_agent.clone()),
            timeout: other.timeout.or(self.timeout),
        }
    }
}

/// A normalized backend response.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    /// Byte length of the raw header block.
    pub header_size: usize,
    pub status: u16,
    /// Decoded JSON body, `None` when the body was empty. A body that is not
    /// JSON is kept as a string value.
    pub body: Option<Value>,
    /// Header block split on newlines and trimmed; empty lines are kept.
    pub headers: Vec<String>,
}

impl HttpResponse {
    /// Split a raw transport buffer at `header_size` and decode the body.
    pub fn from_raw(raw: &[u8], header_size: usize, status: u16) -> Self {
        let split = header_size.min(raw.len());
        let (head, body) = raw.split_at(split);

        let headers = String::from_utf8_lossy(head)
            .split('\n')
            .map(|line| line.trim().to_string())
            .collect();

        let body = if body.is_empty() {
            None
        } else {
            Some(serde_json::from_slice(body).unwrap_or_else(|e| {
                warn!(status, error = %e, "response body is not JSON");
                Value::String(String::from_utf8_lossy(body).into_owned())
            }))
        };

        Self {
            header_size,
            status,
            body,
            headers,
        }
    }

    /// True for statuses in 200..=299.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Value of the first `name` header line, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find_map(|line| {
            let (n, v) = line.split_once(':')?;
            n.trim().eq_ignore_ascii_case(name).then(|| v.trim())
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const RAW_HEAD: &str = "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\r\n";

    #[test]
    fn from_raw_splits_headers_and_decodes_json() {
        let raw = format!("{RAW_HEAD}{{\"id\":1}}");
        let resp = HttpResponse::from_raw(raw.as_bytes(), RAW_HEAD.len(), 200);
        assert_eq!(resp.header_size, RAW_HEAD.len());
        assert_eq!(
            resp.headers,
            vec!["HTTP/1.1 200 OK", "Content-Type: application/json", "", ""]
        );
        assert_eq!(resp.body, Some(json!({"id": 1})));
        assert_eq!(resp.header("content-type"), Some("application/json"));
    }

    #[test]
    fn from_raw_empty_body_is_none() {
        let resp = HttpResponse::from_raw(RAW_HEAD.as_bytes(), RAW_HEAD.len(), 204);
        assert!(resp.body.is_none());
        assert!(resp.is_success());
    }

    #[test]
    fn from_raw_keeps_non_json_body_as_string() {
        let raw = format!("{RAW_HEAD}not json");
        let resp = HttpResponse::from_raw(raw.as_bytes(), RAW_HEAD.len(), 502);
        assert_eq!(resp.body, Some(Value::String("not json".into())));
    }

    #[test]
    fn from_raw_clamps_oversized_header_size() {
        let resp = HttpResponse::from_raw(b"abc", 10, 200);
        assert_eq!(resp.headers, vec!["abc"]);
        assert!(resp.body.is_none());
    }

    #[test]
    fn success_classification() {
        let mut resp = HttpResponse::from_raw(b"", 0, 204);
        assert!(resp.is_success());
        resp.status = 404;
        assert!(!resp.is_success());
        resp.status = 199;
        assert!(!resp.is_success());
        resp.status = 299;
        assert!(resp.is_success());
    }

    #[test]
    fn merged_prefers_later_layer() {
        let base = TransportOptions::base();
        let call = TransportOptions {
            buffer_response: Some(false),
            timeout: Some(Duration::from_secs(30)),
            ..Default::default()
        };
        let merged = base.merged(&call);
        assert_eq!(merged.buffer_response, Some(false));
        assert_eq!(merged.timeout, Some(Duration::from_secs(30)));
        assert_eq!(merged.verify_tls, Some(true));
        assert_eq!(merged.fail_on_error, Some(false));
        assert_eq!(merged.user_agent, base.user_agent);
    }

    #[test]
    fn request_header_lookup_takes_last() {
        let req = HttpRequest {
            method: HttpMethod::Get,
            url: "https://example.com".into(),
            headers: vec![
                "Accept: text/plain".into(),
                "garbage".into(),
                "accept: application/json".into(),
            ],
            body: None,
        };
        assert_eq!(req.header("Accept"), Some("application/json"));
        assert_eq!(req.header_pairs().count(), 2);
    }

    #[test]
    fn unsupported_transport_option_is_rejected() {
        let err = serde_json::from_str::<TransportOptions>(r#"{"proxy":"http://p:3128"}"#)
            .unwrap_err();
        assert!(err.to_string().contains("proxy"));

        let opts: TransportOptions =
            serde_json::from_str(r#"{"verify_tls":false,"timeout":3}"#).unwrap();
        assert_eq!(opts.verify_tls, Some(false));
        assert_eq!(opts.timeout, Some(Duration::from_secs(3)));
    }
}
