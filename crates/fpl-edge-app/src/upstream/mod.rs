// Upstream league data source.
//
// The ingestion pipeline only talks to `LeagueSource`; the HTTP client is one
// implementation and tests supply in-memory fakes.

pub mod http;
pub mod types;

use async_trait::async_trait;
use thiserror::Error;

use fpl_edge_core::MatchHistoryEntry;

pub use http::HttpLeagueSource;
pub use types::{RawBootstrap, RawElement, RawElementSummary, RawEvent, RawFixture, RawTeam};

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        source: reqwest::Error,
    },

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("timed out after {millis}ms fetching {what}")]
    Timeout { what: String, millis: u64 },
}

/// Read-only access to the league provider.
#[async_trait]
pub trait LeagueSource: Send + Sync {
    /// Players, teams and gameweek events.
    async fn bootstrap(&self) -> Result<RawBootstrap, UpstreamError>;

    /// Every fixture of the season, finished or not.
    async fn fixtures(&self) -> Result<Vec<RawFixture>, UpstreamError>;

    /// Chronological per-match history for one player.
    async fn player_history(&self, player_id: u32) -> Result<Vec<MatchHistoryEntry>, UpstreamError>;
}
