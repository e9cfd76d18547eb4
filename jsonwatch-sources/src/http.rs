//! HTTP source: fetches a JSON snapshot from a URL each tick.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::{MetricSource, SourceError};

/// A source that fetches its snapshot from an HTTP endpoint returning
/// JSON.
///
/// The endpoint is polled with a plain GET; any non-success status or
/// unparsable body marks the source absent for that tick. JSON is the
/// only supported body format; there is no data-format knob.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    url: String,
    username: Option<String>,
    password: Option<String>,
}

impl HttpSource {
    /// Create a builder for configuring the source.
    pub fn builder(url: impl Into<String>) -> HttpSourceBuilder {
        HttpSourceBuilder::new(url)
    }

    /// The polled URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl MetricSource for HttpSource {
    async fn fetch(&self) -> Result<Value, SourceError> {
        let mut request = self.client.get(&self.url);
        if let Some(username) = &self.username {
            request = request.basic_auth(username, self.password.as_deref());
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(SourceError::Http(format!(
                "endpoint returned status {}",
                response.status()
            )));
        }

        let root: Value = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))?;

        Ok(root)
    }

    fn id(&self) -> &str {
        &self.url
    }
}

/// Builder for [`HttpSource`].
#[derive(Debug, Default)]
pub struct HttpSourceBuilder {
    url: String,
    timeout: Option<Duration>,
    headers: BTreeMap<String, String>,
    username: Option<String>,
    password: Option<String>,
}

impl HttpSourceBuilder {
    /// Create a builder polling the given URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Add a header sent with every request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set basic-auth credentials.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Build the source.
    ///
    /// Fails synchronously with [`SourceError::Config`] on an invalid
    /// header name or value; request options are never deferred into a
    /// tick.
    pub fn build(self) -> Result<HttpSource, SourceError> {
        let timeout = self.timeout.unwrap_or(Duration::from_secs(10));

        let mut default_headers = reqwest::header::HeaderMap::new();
        for (name, value) in &self.headers {
            let name = reqwest::header::HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| SourceError::Config(format!("header name '{name}': {e}")))?;
            let value = reqwest::header::HeaderValue::from_str(value)
                .map_err(|e| SourceError::Config(format!("header '{name}': {e}")))?;
            default_headers.insert(name, value);
        }

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|e| SourceError::Config(e.to_string()))?;

        Ok(HttpSource {
            client,
            url: self.url,
            username: self.username,
            password: self.password,
        })
    }
}
