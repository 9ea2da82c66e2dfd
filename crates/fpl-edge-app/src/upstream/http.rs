// reqwest-backed `LeagueSource`.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use fpl_edge_core::MatchHistoryEntry;

use super::types::{RawBootstrap, RawElementSummary, RawFixture};
use super::{LeagueSource, UpstreamError};
use crate::config::UpstreamConfig;

pub struct HttpLeagueSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpLeagueSource {
    /// Build a client with the configured user agent and request timeout.
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| UpstreamError::Request {
                url: config.base_url.clone(),
                source: e,
            })?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, UpstreamError> {
        let url = self.url(path);
        debug!(%url, "GET");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| UpstreamError::Request {
                url: url.clone(),
                source: e,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = resp.bytes().await.map_err(|e| UpstreamError::Request {
            url: url.clone(),
            source: e,
        })?;
        serde_json::from_slice(&body).map_err(|e| UpstreamError::Decode {
            url,
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl LeagueSource for HttpLeagueSource {
    async fn bootstrap(&self) -> Result<RawBootstrap, UpstreamError> {
        self.get_json("bootstrap-static/").await
    }

    async fn fixtures(&self) -> Result<Vec<RawFixture>, UpstreamError> {
        self.get_json("fixtures/").await
    }

    async fn player_history(&self, player_id: u32) -> Result<Vec<MatchHistoryEntry>, UpstreamError> {
        let summary: RawElementSummary = self
            .get_json(&format!("element-summary/{player_id}/"))
            .await?;
        Ok(summary.to_history())
    }
}
