use std::time::Duration;

use reqwest::{Client, IntoUrl};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use reqwest_tracing::TracingMiddleware;
use snafu::ResultExt;

use crate::{RequestBuilder, Result, error::BuildSnafu};

static DEFAULT_MAX_RETRIES: u32 = 3;

#[derive(Debug, Clone)]
pub struct HttpClient(ClientWithMiddleware);

#[derive(Debug)]
pub struct HttpClientBuilder {
    client: reqwest::ClientBuilder,
    max_retries: u32,
}

impl HttpClient {
    pub fn new() -> Self {
        Self::with_middleware(Client::new(), DEFAULT_MAX_RETRIES)
    }

    fn with_middleware(inner: Client, max_retries: u32) -> Self {
        let mut builder = ClientBuilder::new(inner).with(TracingMiddleware::default());

        // Only transient failures (timeouts, 5xx, 429) are retried, a 403 goes straight
        // back to the caller.
        if max_retries > 0 {
            builder = builder.with(RetryTransientMiddleware::new_with_policy(
                ExponentialBackoff::builder().build_with_max_retries(max_retries),
            ));
        }

        Self(builder.build())
    }

    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::new()
    }

    pub fn get(&self, url: impl IntoUrl) -> RequestBuilder {
        RequestBuilder(self.0.get(url))
    }

    pub fn post(&self, url: impl IntoUrl) -> RequestBuilder {
        RequestBuilder(self.0.post(url))
    }
}

impl HttpClientBuilder {
    pub fn new() -> Self {
        Self {
            client: reqwest::ClientBuilder::new(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.client = self.client.timeout(timeout);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.client = self.client.connect_timeout(timeout);
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn build(self) -> Result<HttpClient> {
        let inner = self.client.build().context(BuildSnafu)?;
        Ok(HttpClient::with_middleware(inner, self.max_retries))
    }
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}
