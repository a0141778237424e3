use async_trait::async_trait;

use common::AgentError;

use crate::models::MarketSnapshot;

pub mod coingecko;

/// Where a cycle gets its market snapshot from.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch(&self) -> Result<MarketSnapshot, AgentError>;
}
