//! HTTP page fetcher.

use super::HtmlFetcher;
use crate::error::{ServiceError, ServiceResult};
use async_trait::async_trait;
use std::time::Duration;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; LinkPreviewBot/1.0)";
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// [`HtmlFetcher`] over a shared `reqwest` client.
#[derive(Clone)]
pub struct ReqwestFetcher {
    http: reqwest::Client,
}

impl ReqwestFetcher {
    /// `timeout` bounds the whole request; the relay chain applies its own
    /// per-attempt limit on top.
    pub fn new(timeout: Duration) -> ServiceResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl HtmlFetcher for ReqwestFetcher {
    async fn fetch_html(&self, url: &str) -> ServiceResult<String> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Status {
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}
