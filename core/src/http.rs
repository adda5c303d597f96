//! HTTP request and response types.
//!
//! # Design
//! `Request` is plain data: a method from a closed vocabulary, a URL string,
//! an ordered list of headers and an optional raw body. It is built per call
//! and never mutated once handed to the executor.
//!
//! Validation is deferred to dispatch time. `Request::validate` resolves the
//! plain data into a `TransportRequest` (parsed URL, typed header map); any
//! failure there is reported as `NetworkError::InvalidRequest` without the
//! transport being contacted.
//!
//! Duplicate header keys are kept and sent in insertion order. Merging or
//! overwriting is left to the caller.

use std::fmt;

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::error::NetworkError;

/// HTTP method for a request. Custom methods are not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for http::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => http::Method::GET,
            HttpMethod::Post => http::Method::POST,
            HttpMethod::Put => http::Method::PUT,
            HttpMethod::Delete => http::Method::DELETE,
        }
    }
}

/// A single header as a key/value pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Header {
    pub key: String,
    pub value: String,
}

impl Header {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl<K: Into<String>, V: Into<String>> From<(K, V)> for Header {
    fn from((key, value): (K, V)) -> Self {
        Self::new(key, value)
    }
}

/// Well-known `Content-Type` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    ApplicationJson,
    TextJson,
    TextPlain,
}

impl ContentType {
    pub const KEY: &'static str = "Content-Type";

    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::ApplicationJson => "application/json",
            ContentType::TextJson => "text/json",
            ContentType::TextPlain => "text/plain",
        }
    }
}

impl From<ContentType> for Header {
    fn from(content_type: ContentType) -> Self {
        Header::new(ContentType::KEY, content_type.as_str())
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<Header>,
    pub body: Option<Bytes>,
}

impl Request {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, url)
    }

    /// Append one header. Existing headers with the same key are kept.
    pub fn header(mut self, header: impl Into<Header>) -> Self {
        self.headers.push(header.into());
        self
    }

    /// Append headers in order.
    pub fn headers<I>(mut self, headers: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Header>,
    {
        self.headers.extend(headers.into_iter().map(Into::into));
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Resolve into a dispatchable transport request.
    ///
    /// Fails with `InvalidRequest` when the URL is not an absolute `http`
    /// or `https` URL, when a header name or value is not valid on the wire,
    /// or when a GET carries a body.
    pub fn validate(&self) -> Result<TransportRequest, NetworkError> {
        let url = Url::parse(&self.url).map_err(|e| {
            NetworkError::InvalidRequest(format!("invalid URL '{}': {e}", self.url))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(NetworkError::InvalidRequest(format!(
                "unsupported URL scheme '{}' in '{}'",
                url.scheme(),
                self.url
            )));
        }
        if url.host_str().is_none() {
            return Err(NetworkError::InvalidRequest(format!(
                "URL '{}' has no host",
                self.url
            )));
        }
        if self.method == HttpMethod::Get && self.body.is_some() {
            return Err(NetworkError::InvalidRequest(
                "GET requests cannot carry a body".to_string(),
            ));
        }

        let mut headers = HeaderMap::with_capacity(self.headers.len());
        for header in &self.headers {
            let name = HeaderName::from_bytes(header.key.as_bytes()).map_err(|e| {
                NetworkError::InvalidRequest(format!("invalid header name '{}': {e}", header.key))
            })?;
            let value = HeaderValue::from_str(&header.value).map_err(|e| {
                NetworkError::InvalidRequest(format!(
                    "invalid value for header '{}': {e}",
                    header.key
                ))
            })?;
            headers.append(name, value);
        }

        Ok(TransportRequest {
            method: self.method,
            url,
            headers,
            body: self.body.clone(),
        })
    }
}

/// A validated request, ready to hand to a transport.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

/// A response as received from the transport, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl HttpResponse {
    /// Collect a typed header map into owned pairs, keeping duplicates.
    pub fn headers_from_map(map: &HeaderMap) -> Vec<(String, String)> {
        map.iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect()
    }

    /// First value for `key`, compared case-insensitively.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_keeps_insertion_order_and_duplicates() {
        let req = Request::get("https://example.com/birds")
            .header(("Accept", "application/json"))
            .header(("X-Trace", "a"))
            .header(("X-Trace", "b"));
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(
            req.headers,
            vec![
                Header::new("Accept", "application/json"),
                Header::new("X-Trace", "a"),
                Header::new("X-Trace", "b"),
            ]
        );

        let validated = req.validate().unwrap();
        let traces: Vec<_> = validated.headers.get_all("x-trace").iter().collect();
        assert_eq!(traces, vec!["a", "b"]);
    }

    #[test]
    fn content_type_becomes_header() {
        let header: Header = ContentType::ApplicationJson.into();
        assert_eq!(header, Header::new("Content-Type", "application/json"));
        assert_eq!(ContentType::TextJson.as_str(), "text/json");
        assert_eq!(ContentType::TextPlain.as_str(), "text/plain");
    }

    #[test]
    fn validate_accepts_body_on_post() {
        let req = Request::post("http://localhost:3000/birds")
            .header(ContentType::ApplicationJson)
            .body(&b"{}"[..]);
        let validated = req.validate().unwrap();
        assert_eq!(validated.method, HttpMethod::Post);
        assert_eq!(validated.url.as_str(), "http://localhost:3000/birds");
        assert_eq!(validated.body.as_deref(), Some(&b"{}"[..]));
    }

    #[test]
    fn validate_rejects_relative_url() {
        let err = Request::get("/birds").validate().unwrap_err();
        assert!(matches!(err, NetworkError::InvalidRequest(_)));
    }

    #[test]
    fn validate_rejects_non_http_scheme() {
        let err = Request::get("ftp://example.com/file").validate().unwrap_err();
        assert!(matches!(err, NetworkError::InvalidRequest(msg) if msg.contains("ftp")));
    }

    #[test]
    fn validate_rejects_bad_header_name() {
        let err = Request::get("https://example.com")
            .header(("bad header", "x"))
            .validate()
            .unwrap_err();
        assert!(matches!(err, NetworkError::InvalidRequest(_)));
    }

    #[test]
    fn validate_rejects_bad_header_value() {
        let err = Request::get("https://example.com")
            .header(("X-Line", "a\nb"))
            .validate()
            .unwrap_err();
        assert!(matches!(err, NetworkError::InvalidRequest(_)));
    }

    #[test]
    fn validate_rejects_get_with_body() {
        let err = Request::get("https://example.com")
            .body(&b"nope"[..])
            .validate()
            .unwrap_err();
        assert!(matches!(err, NetworkError::InvalidRequest(_)));
    }

    #[test]
    fn response_header_lookup_is_case_insensitive() {
        let response = HttpResponse {
            status: 200,
            headers: vec![("content-type".into(), "application/json".into())],
            body: Bytes::new(),
        };
        assert_eq!(response.header("Content-Type"), Some("application/json"));
        assert_eq!(response.header("x-missing"), None);
    }

    #[test]
    fn method_maps_to_http_method() {
        assert_eq!(http::Method::from(HttpMethod::Delete), http::Method::DELETE);
        assert_eq!(HttpMethod::Put.to_string(), "PUT");
    }
}
