//! REST boundary: authentication and settled-bet history.
//!
//! Out of the realtime core; the history view is the only consumer.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use tracing::warn;
use updraft_types::{Session, SettledBet};
use url::Url;

use crate::{Error, Result};

/// Retry policy for idempotent GETs.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(2),
        }
    }
}

#[derive(Deserialize)]
struct HistoryResponse {
    bets: Vec<SettledBet>,
}

pub struct ApiClient {
    base_url: Url,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        match base_url.scheme() {
            "http" | "https" => {}
            other => return Err(Error::InvalidScheme(other.to_string())),
        }
        Ok(Self {
            base_url,
            client: reqwest::Client::new(),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Authenticate and receive the opaque session payload.
    pub async fn login(&self, username: &str) -> Result<Session> {
        let url = self.base_url.join("api/login")?;
        let response = self
            .client
            .post(url)
            .json(&serde_json::json!({ "username": username }))
            .send()
            .await?;
        Self::ok_json(response).await
    }

    /// Fetch the ordered settled-bet history for a player.
    pub async fn bet_history(&self, user_id: u64) -> Result<Vec<SettledBet>> {
        let url = self.base_url.join("api/user/history")?;
        let response = self
            .get_with_retry(url, &[("userId", user_id.to_string())])
            .await?;
        let history: HistoryResponse = Self::ok_json(response).await?;
        Ok(history.bets)
    }

    async fn get_with_retry(&self, url: Url, query: &[(&str, String)]) -> Result<reqwest::Response> {
        let mut backoff = self.retry.initial_backoff;
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.client.get(url.clone()).query(query).send().await {
                Ok(response)
                    if is_retryable(response.status()) && attempt < self.retry.max_attempts =>
                {
                    warn!(status = %response.status(), attempt, url = %url, "retrying request");
                }
                Ok(response) => return Ok(response),
                Err(err) if attempt < self.retry.max_attempts => {
                    warn!(%err, attempt, url = %url, "retrying request");
                }
                Err(err) => return Err(err.into()),
            }
            tokio::time::sleep(backoff).await;
            backoff = (backoff * 2).min(self.retry.max_backoff);
        }
    }

    async fn ok_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::FailedWithBody { status, body });
        }
        Ok(response.json::<T>().await?)
    }
}

fn is_retryable(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::REQUEST_TIMEOUT
            | StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}
