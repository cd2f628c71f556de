use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;

pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(timeout: Duration, insecure: bool) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("stampede/", env!("CARGO_PKG_VERSION")));

        if insecure {
            builder = builder.danger_accept_invalid_certs(true);
        }

        Ok(Self {
            client: builder.build().context("Failed to create HTTP client")?,
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn into_inner(self) -> Client {
        self.client
    }
}
