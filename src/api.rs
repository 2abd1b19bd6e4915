use std::sync::Arc;

use crate::{retry::RetryPolicy, transport::Transport, ItemId};

mod data;
pub use data::{Observation, PriceSeries};

pub struct Client {
    transport: Arc<dyn Transport>,
    endpoint: String,
    retry: RetryPolicy,
}

#[derive(Debug)]
pub enum FetchError {
    Client(reqwest::Error),
    Request(reqwest::Error),
    Status(reqwest::StatusCode),
    Decode(serde_json::Error),
    /// The attempt went through a relay, so the relay may be the one at fault
    Relayed {
        relay: String,
        error: Box<FetchError>,
    },
}

impl FetchError {
    pub fn is_retryable(&self, policy: &RetryPolicy) -> bool {
        match self {
            Self::Request(_) | Self::Relayed { .. } => true,
            Self::Status(status) => policy.is_retryable_status(status.as_u16()),
            Self::Client(_) | Self::Decode(_) => false,
        }
    }
}

pub fn item_url(endpoint: &str, item: ItemId) -> String {
    format!("{}/{}", endpoint.trim_end_matches('/'), item)
}

impl Client {
    pub fn new(transport: Arc<dyn Transport>, endpoint: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
            retry,
        }
    }

    pub fn item_url(&self, item: ItemId) -> String {
        item_url(&self.endpoint, item)
    }

    /// Loads the price series of the item, an unreachable API or an unusable response both
    /// count as an empty series
    pub async fn fetch_series(&self, item: ItemId) -> PriceSeries {
        match self.try_fetch_series(item).await {
            Ok(series) => series,
            Err(e) => {
                tracing::warn!("Loading series for {} {:?}", item, e);
                PriceSeries::new()
            }
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn try_fetch_series(&self, item: ItemId) -> Result<PriceSeries, FetchError> {
        let url = self.item_url(item);

        self.retry
            .run(
                |attempt| self.load(&url, attempt),
                |e| e.is_retryable(&self.retry),
            )
            .await
    }

    async fn load(&self, url: &str, attempt: u32) -> Result<PriceSeries, FetchError> {
        let dispatch = self
            .transport
            .dispatch(attempt, self.retry.attempts())
            .map_err(FetchError::Client)?;

        match dispatch.relay {
            Some(relay) => Self::request(&dispatch.client, url)
                .await
                .map_err(|e| FetchError::Relayed {
                    relay,
                    error: Box::new(e),
                }),
            None => Self::request(&dispatch.client, url).await,
        }
    }

    async fn request(client: &reqwest::Client, url: &str) -> Result<PriceSeries, FetchError> {
        let resp = client.get(url).send().await.map_err(FetchError::Request)?;

        let status = resp.status();
        if !status.is_success() {
            tracing::debug!("Non Success Response: {:?}", status);
            return Err(FetchError::Status(status));
        }

        let raw_content = resp.bytes().await.map_err(FetchError::Request)?;

        let series: PriceSeries = serde_json::from_slice(&raw_content).map_err(|e| {
            tracing::debug!("Deserializing {:?}", e);
            FetchError::Decode(e)
        })?;

        tracing::debug!("Loaded {} observations", series.len());

        Ok(series)
    }
}
