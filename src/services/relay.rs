//! First-success-or-degrade combinator and the page relay chain built on it.

use super::HtmlFetcher;
use crate::config::{BoardConfig, RelaySpec};
use crate::error::{ServiceError, ServiceResult};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Label recorded when the target answered without a relay
pub const DIRECT: &str = "direct";

/// Try each labelled attempt in order, giving every attempt at most
/// `per_attempt`. Returns the label and value of the first success.
pub async fn first_success<T, I, F, Fut>(attempts: I, per_attempt: Duration) -> ServiceResult<(String, T)>
where
    I: IntoIterator<Item = (String, F)>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = ServiceResult<T>>,
{
    let mut tried = 0;
    for (label, attempt) in attempts {
        tried += 1;
        let outcome = tokio::time::timeout(per_attempt, attempt())
            .await
            .unwrap_or_else(|_| Err(ServiceError::Timeout(per_attempt.as_millis() as u64)));
        match outcome {
            Ok(value) => return Ok((label, value)),
            Err(e) => debug!(%label, error = %e, "attempt failed"),
        }
    }
    Err(ServiceError::AllRelaysFailed { attempts: tried })
}

/// Body fetched through the chain
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fetched {
    pub body: String,
    /// [`DIRECT`] or the relay URL that answered
    pub via: String,
}

/// Direct fetch followed by the configured relays.
#[derive(Clone)]
pub struct RelayChain {
    fetcher: Arc<dyn HtmlFetcher>,
    relays: Vec<RelaySpec>,
    per_attempt: Duration,
}

impl RelayChain {
    pub fn new(fetcher: Arc<dyn HtmlFetcher>, relays: Vec<RelaySpec>, per_attempt: Duration) -> Self {
        Self {
            fetcher,
            relays,
            per_attempt,
        }
    }

    pub fn from_config(fetcher: Arc<dyn HtmlFetcher>, config: &BoardConfig) -> Self {
        Self::new(fetcher, config.relays.clone(), config.relay_timeout())
    }

    /// Fetch `target`, falling through the relays until one returns a
    /// non-empty body.
    pub async fn fetch(&self, target: &str) -> ServiceResult<Fetched> {
        // (label, request url, wrapped in a JSON envelope)
        let mut plan = vec![(DIRECT.to_string(), target.to_string(), false)];
        plan.extend(self.relays.iter().map(|relay| {
            let url = relay.url_for(target);
            (url.clone(), url, relay.json_contents)
        }));

        let attempts = plan.into_iter().map(|(label, request_url, json_contents)| {
            let fetcher = self.fetcher.clone();
            let attempt = move || async move {
                let body = fetcher.fetch_html(&request_url).await?;
                let body = if json_contents {
                    unwrap_json_contents(&body)?
                } else {
                    body
                };
                if body.trim().is_empty() {
                    return Err(ServiceError::MalformedResponse("empty body".to_string()));
                }
                Ok::<String, ServiceError>(body)
            };
            (label, attempt)
        });

        match first_success(attempts, self.per_attempt).await {
            Ok((via, body)) => {
                debug!(%target, %via, bytes = body.len(), "fetched");
                Ok(Fetched { body, via })
            }
            Err(e) => {
                warn!(%target, error = %e, "every fetch attempt failed");
                Err(e)
            }
        }
    }
}

/// Relays flagged `json_contents` wrap the page as `{"contents": "..."}`.
fn unwrap_json_contents(body: &str) -> ServiceResult<String> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| ServiceError::MalformedResponse(e.to_string()))?;
    value
        .get("contents")
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| ServiceError::MalformedResponse("missing contents".to_string()))
}
