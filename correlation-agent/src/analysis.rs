use std::sync::Arc;

use tracing::info;

use common::providers::CompletionBackend;
use common::{AgentError, RetryPolicy};

use crate::models::MarketSnapshot;

/// Turns a market snapshot into natural-language commentary through the
/// completion backend. Every cycle issues a fresh call; there is no
/// caching even for an unchanged snapshot.
pub struct AnalysisGenerator {
    backend: Arc<dyn CompletionBackend>,
    prompt_template: String,
    retry: RetryPolicy,
}

impl AnalysisGenerator {
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        prompt_template: String,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            backend,
            prompt_template,
            retry,
        }
    }

    pub async fn generate(&self, snapshot: &MarketSnapshot) -> Result<String, AgentError> {
        let prompt = self.build_prompt(snapshot);
        let prompt_ref: &str = &prompt;
        let analysis = self
            .retry
            .run("market analysis", || async move {
                self.backend.complete(prompt_ref).await
            })
            .await?;

        info!(
            btc = snapshot.bitcoin.current_price,
            eth = snapshot.ethereum.current_price,
            preview = %analysis.chars().take(100).collect::<String>(),
            "generated market analysis"
        );
        Ok(analysis)
    }

    fn build_prompt(&self, snapshot: &MarketSnapshot) -> String {
        let btc = &snapshot.bitcoin;
        let eth = &snapshot.ethereum;
        self.prompt_template
            .replace("{btc_price}", &format!("{:.2}", btc.current_price))
            .replace("{btc_change}", &format!("{:.2}", btc.price_change_pct_24h))
            .replace("{btc_volume}", &format!("{:.0}", btc.total_volume))
            .replace("{eth_price}", &format!("{:.2}", eth.current_price))
            .replace("{eth_change}", &format!("{:.2}", eth.price_change_pct_24h))
            .replace("{eth_volume}", &format!("{:.0}", eth.total_volume))
    }
}
