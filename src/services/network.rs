//! Requests, responses and the network side of the offline cache

use crate::types::{BizdashError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

/// HTTP request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// What the requester intends to do with the response
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    Document,
    Script,
    Style,
    Image,
    Font,
    Manifest,
    Other,
}

impl Destination {
    /// Guess the destination from the file extension of a path
    pub fn from_path(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or(path);
        if path.is_empty() || path.ends_with('/') {
            return Destination::Document;
        }
        let file = path.rsplit('/').next().unwrap_or(path);
        if file == "manifest.json" {
            return Destination::Manifest;
        }
        match file.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()) {
            Some(ext) => match ext.as_str() {
                "html" | "htm" => Destination::Document,
                "js" | "mjs" => Destination::Script,
                "css" => Destination::Style,
                "png" | "jpg" | "jpeg" | "gif" | "svg" | "ico" | "webp" => Destination::Image,
                "woff" | "woff2" | "ttf" | "otf" => Destination::Font,
                "webmanifest" => Destination::Manifest,
                _ => Destination::Other,
            },
            None => Destination::Other,
        }
    }
}

impl FromStr for Destination {
    type Err = BizdashError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "document" => Ok(Destination::Document),
            "script" => Ok(Destination::Script),
            "style" => Ok(Destination::Style),
            "image" => Ok(Destination::Image),
            "font" => Ok(Destination::Font),
            "manifest" => Ok(Destination::Manifest),
            "other" | "" => Ok(Destination::Other),
            other => Err(BizdashError::Parse(format!("unknown destination {:?}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    /// Path relative to the origin, including any query string
    pub path: String,
    pub destination: Destination,
    /// Top-level page navigation
    pub navigate: bool,
}

impl Request {
    pub fn get(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            method: "GET".to_string(),
            destination: Destination::from_path(&path),
            path,
            navigate: false,
        }
    }

    pub fn navigation(path: impl Into<String>) -> Self {
        Self {
            destination: Destination::Document,
            navigate: true,
            ..Self::get(path)
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into().to_ascii_uppercase();
        self
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }

    pub fn cache_key(&self) -> &str {
        &self.path
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Response {
    pub status: u16,
    /// Header names are stored lowercase
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    /// Stand-in returned when neither the network nor a cache can answer
    pub fn offline() -> Self {
        Self::new(503, "Offline").with_header("content-type", "text/plain")
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Only complete 200 responses are worth caching
    pub fn is_cacheable(&self) -> bool {
        self.status == 200
    }

    /// Parsed `Date` header (RFC 7231 IMF-fixdate is a subset of RFC 2822)
    pub fn date(&self) -> Option<DateTime<Utc>> {
        let raw = self.header("date")?;
        DateTime::parse_from_rfc2822(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Anything that can answer a request over the wire
pub trait Network: Send + Sync {
    fn fetch(&self, request: &Request) -> Result<Response>;
}

/// Blocking HTTP client rooted at an origin such as `https://dash.example.com`
pub struct HttpNetwork {
    client: reqwest::blocking::Client,
    origin: String,
}

impl HttpNetwork {
    pub fn new(origin: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| BizdashError::Network(format!("HTTP client error: {}", e)))?;
        Ok(Self {
            client,
            origin: origin.into(),
        })
    }

    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.origin.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl Network for HttpNetwork {
    fn fetch(&self, request: &Request) -> Result<Response> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|e| BizdashError::Parse(format!("invalid method: {}", e)))?;

        let response = self
            .client
            .request(method, self.url_for(&request.path))
            .send()
            .map_err(|e| BizdashError::Network(format!("HTTP request failed: {}", e)))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .map_err(|e| BizdashError::Network(format!("failed to read body: {}", e)))?
            .to_vec();

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_destination_from_path() {
        assert_eq!(Destination::from_path("/"), Destination::Document);
        assert_eq!(Destination::from_path("/index.html"), Destination::Document);
        assert_eq!(Destination::from_path("/assets/app-3f2a.js"), Destination::Script);
        assert_eq!(Destination::from_path("/assets/app.css?v=2"), Destination::Style);
        assert_eq!(Destination::from_path("/icons/icon-192.PNG"), Destination::Image);
        assert_eq!(Destination::from_path("/manifest.json"), Destination::Manifest);
        assert_eq!(Destination::from_path("/api/reports"), Destination::Other);
    }

    #[test]
    fn test_navigation_request() {
        let req = Request::navigation("/reports");
        assert!(req.navigate);
        assert!(req.is_get());
        assert_eq!(req.destination, Destination::Document);
        assert_eq!(req.cache_key(), "/reports");
    }

    #[test]
    fn test_with_method_uppercases() {
        let req = Request::get("/api/clients").with_method("post");
        assert_eq!(req.method, "POST");
        assert!(!req.is_get());
    }

    #[test]
    fn test_response_header_case_insensitive() {
        let resp = Response::new(200, "ok").with_header("Content-Type", "text/html");
        assert_eq!(resp.header("content-type"), Some("text/html"));
        assert_eq!(resp.header("CONTENT-TYPE"), Some("text/html"));
    }

    #[test]
    fn test_response_date_header() {
        let resp = Response::new(200, "").with_header("Date", "Tue, 05 Mar 2024 08:49:37 GMT");
        let expected = Utc.with_ymd_and_hms(2024, 3, 5, 8, 49, 37).unwrap();
        assert_eq!(resp.date(), Some(expected));
    }

    #[test]
    fn test_response_bad_date_header() {
        let resp = Response::new(200, "").with_header("date", "yesterday");
        assert_eq!(resp.date(), None);
        assert_eq!(Response::new(200, "").date(), None);
    }

    #[test]
    fn test_offline_response() {
        let resp = Response::offline();
        assert_eq!(resp.status, 503);
        assert_eq!(resp.body, b"Offline");
        assert!(!resp.is_cacheable());
    }

    #[test]
    fn test_url_for_joins_slashes() {
        let net = HttpNetwork::new("https://dash.example.com/").unwrap();
        assert_eq!(net.url_for("/app.js"), "https://dash.example.com/app.js");
        assert_eq!(net.url_for("app.js"), "https://dash.example.com/app.js");
    }
}
