use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde_json::Value;
use std::thread;
use std::time::Duration;

use super::skip_log::SkipLog;
use crate::config::Config;

/// Raw HTTP response: status code and body text
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Performs a single GET. Implemented over reqwest, and by scripted transports in tests.
pub trait Transport {
    fn get(&self, url: &str) -> Result<Response>;
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent("swapi-frame")
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<Response> {
        let response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("Failed to fetch {}", url))?;

        let status = response.status().as_u16();
        let body = response.text().context("Failed to read response")?;
        Ok(Response { status, body })
    }
}

/// Fetch one JSON document.
///
/// A `None` url means there is nothing to fetch and returns `Ok(None)` without a request.
/// `Ok(None)` for a real url means the request failed with a non-200 status and was logged.
pub trait Fetch {
    fn fetch(&mut self, url: Option<&str>) -> Result<Option<Value>>;

    /// Requests that came back with a non-200 status, oldest first
    fn failures(&self) -> &[FetchFailure] {
        &[]
    }
}

/// A request that came back with a non-200 status
#[derive(Debug, Clone, PartialEq)]
pub struct FetchFailure {
    pub url: String,
    pub status: u16,
}

/// Paced fetcher that records failed urls in the skip log
pub struct ResourceFetcher<T = HttpTransport> {
    transport: T,
    delay: Duration,
    skip_log: SkipLog,
    failures: Vec<FetchFailure>,
}

impl ResourceFetcher<HttpTransport> {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            HttpTransport::new()?,
            config.request_delay,
            SkipLog::new(config.skip_log_path()),
        ))
    }
}

impl<T: Transport> ResourceFetcher<T> {
    pub fn new(transport: T, delay: Duration, skip_log: SkipLog) -> Self {
        Self {
            transport,
            delay,
            skip_log,
            failures: Vec::new(),
        }
    }
}

impl<T: Transport> Fetch for ResourceFetcher<T> {
    fn fetch(&mut self, url: Option<&str>) -> Result<Option<Value>> {
        let Some(url) = url else {
            return Ok(None);
        };

        let response = self.transport.get(url)?;

        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }

        if response.status != 200 {
            self.skip_log.record(url)?;
            self.failures.push(FetchFailure {
                url: url.to_string(),
                status: response.status,
            });
            return Ok(None);
        }

        let json: Value = serde_json::from_str(&response.body)
            .with_context(|| format!("Failed to parse response from {}", url))?;
        Ok(Some(json))
    }

    fn failures(&self) -> &[FetchFailure] {
        &self.failures
    }
}
