use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use serde_json::{Map, Value};

use crate::error::KimQueryError;
use crate::query::QuerySpec;

pub const DEFAULT_API_URL: &str = "https://query.openkim.org/api";

/// One flat result row as returned with `flat=on`.
pub type RawRecord = Map<String, Value>;

/// A single attempt at running a query. Retrying is the caller's job.
pub trait KimClient: Send + Sync {
    fn query(&self, spec: &QuerySpec) -> Result<Vec<RawRecord>, KimQueryError>;
}

#[derive(Clone)]
pub struct KimHttpClient {
    client: Client,
    base_url: String,
}

impl KimHttpClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, KimQueryError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("kimquery/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| KimQueryError::KimHttp(err.to_string()))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|err| KimQueryError::KimHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, KimQueryError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "OpenKIM request failed".to_string());
        Err(KimQueryError::KimStatus { status, message })
    }
}

impl KimClient for KimHttpClient {
    fn query(&self, spec: &QuerySpec) -> Result<Vec<RawRecord>, KimQueryError> {
        let url = spec.url(&self.base_url);
        tracing::debug!(%url, "openkim.request");
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|err| KimQueryError::KimHttp(err.to_string()))?;
        let response = Self::handle_status(response)?;
        let body = response
            .text()
            .map_err(|err| KimQueryError::KimHttp(err.to_string()))?;
        parse_body(&body)
    }
}

/// Parses a response body: a JSON array of flat objects.
pub fn parse_body(body: &str) -> Result<Vec<RawRecord>, KimQueryError> {
    serde_json::from_str(body).map_err(|err| KimQueryError::KimParse(err.to_string()))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_flat_rows() {
        let body = r#"[{"meta.model": "MO_A", "meta.runner.species": "Al"}]"#;
        let rows = parse_body(body).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["meta.model"], "MO_A");
    }

    #[test]
    fn reject_non_array_body() {
        let err = parse_body(r#"{"error": "bad query"}"#).unwrap_err();
        assert_matches!(err, KimQueryError::KimParse(_));
    }
}
