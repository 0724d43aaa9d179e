//! The incoming request contract
//!
//! The host hands the pipeline a [`LogRequest`]: method, absolute URL,
//! headers, an optional body, and the edge annotation bag. The pipeline
//! never consumes the body - it is a cheaply clonable [`Bytes`] handle,
//! so the caller keeps its own copy.

use std::collections::HashMap;

use bytes::Bytes;
use http::{HeaderMap, Method};
use once_cell::unsync::OnceCell;
use serde::{Deserialize, Serialize};
use url::Url;

#[cfg(test)]
#[path = "request_test.rs"]
mod tests;

/// Edge-supplied bot-management annotations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BotManagement {
    /// Bot likelihood score (1-99)
    pub score: Option<i64>,
    /// Whether the client is a known good bot
    pub verified_bot: Option<bool>,
    /// JA3 TLS fingerprint
    pub ja3_hash: Option<String>,
    /// Whether the client appears to be a corporate proxy
    pub corporate_proxy: Option<bool>,
}

/// Edge-supplied request annotations
///
/// Everything here is optional: a request arriving without annotations
/// (e.g. in local development) simply logs nulls.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CfProperties {
    pub asn: Option<i64>,
    pub colo: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub continent: Option<String>,
    pub region: Option<String>,
    pub region_code: Option<String>,
    pub postal_code: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub timezone: Option<String>,
    pub http_protocol: Option<String>,
    pub tls_cipher: Option<String>,
    pub tls_version: Option<String>,
    pub tls_client_random: Option<String>,
    pub client_tcp_rtt: Option<i64>,
    pub threat_score: Option<i64>,
    pub bot_management: Option<BotManagement>,
    pub tls_client_auth: Option<serde_json::Value>,
}

/// An incoming request to be logged
#[derive(Debug, Clone)]
pub struct LogRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute request URL
    pub url: String,
    /// Request headers (multi-map, case-insensitive)
    pub headers: HeaderMap,
    /// Request body, if the host captured one
    pub body: Option<Bytes>,
    /// Edge annotation bag
    pub cf: CfProperties,
}

impl LogRequest {
    /// Create a request with the given method and URL
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
            cf: CfProperties::default(),
        }
    }

    /// Set a header (appends, preserving any existing values)
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            http::header::HeaderName::try_from(name),
            http::header::HeaderValue::try_from(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Set the body
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set the edge annotation bag
    pub fn with_cf(mut self, cf: CfProperties) -> Self {
        self.cf = cf;
        self
    }

    /// First value of a header, as UTF-8 text
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Per-request evaluation view
///
/// Wraps a request and memoizes the two derived structures every filter
/// rule wants: the parsed URL and the cookie map. Both are computed at
/// most once per request no matter how many rules touch them.
pub struct RequestView<'a> {
    request: &'a LogRequest,
    url: OnceCell<Option<Url>>,
    cookies: OnceCell<HashMap<String, String>>,
}

impl<'a> RequestView<'a> {
    /// Create a view over a request
    pub fn new(request: &'a LogRequest) -> Self {
        Self {
            request,
            url: OnceCell::new(),
            cookies: OnceCell::new(),
        }
    }

    /// The underlying request
    pub fn request(&self) -> &LogRequest {
        self.request
    }

    /// The parsed URL, if the request URL is well-formed
    pub fn url(&self) -> Option<&Url> {
        self.url
            .get_or_init(|| Url::parse(&self.request.url).ok())
            .as_ref()
    }

    /// First value of a header, as UTF-8 text
    pub fn header(&self, name: &str) -> Option<&str> {
        self.request.header(name)
    }

    /// A cookie value by name
    ///
    /// Cookies are parsed from all `cookie` headers on first access and
    /// memoized for the lifetime of the view.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies()
            .get(name)
            .map(String::as_str)
    }

    /// The full cookie map
    pub fn cookies(&self) -> &HashMap<String, String> {
        self.cookies.get_or_init(|| {
            let mut map = HashMap::new();
            for value in self.request.headers.get_all(http::header::COOKIE) {
                if let Ok(text) = value.to_str() {
                    parse_cookie_header(text, &mut map);
                }
            }
            map
        })
    }
}

/// Parse a `Cookie:` header value into name/value pairs
///
/// First occurrence of a name wins, matching browser submission order.
fn parse_cookie_header(header: &str, out: &mut HashMap<String, String>) {
    for pair in header.split(';') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        if let Some((name, value)) = pair.split_once('=') {
            let name = name.trim();
            if !name.is_empty() && !out.contains_key(name) {
                out.insert(name.to_string(), value.trim().to_string());
            }
        }
    }
}
