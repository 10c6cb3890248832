// reqwest-backed request sender with bearer authentication.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{ApiError, ApiResult, RequestSender};

const USER_AGENT: &str = "matchstats/0.1 (match history aggregator)";

/// Sends requests over HTTPS with the configured API key as bearer token.
#[derive(Debug, Clone)]
pub struct HttpSender {
    client: Client,
    api_key: String,
    timeout: Duration,
}

impl HttpSender {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(ApiError::Client)?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            timeout,
        })
    }
}

#[async_trait]
impl RequestSender for HttpSender {
    async fn send(&self, url: &str) -> ApiResult<Vec<u8>> {
        debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .header("accept", "application/json")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::Transport {
                url: url.to_owned(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                url: url.to_owned(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| ApiError::Transport {
            url: url.to_owned(),
            message: e.to_string(),
        })?;
        Ok(body.to_vec())
    }
}
