use std::sync::Arc;

use anyhow::Result;
use dotenv::dotenv;
use tracing::info;
use tracing_subscriber::EnvFilter;

use common::providers::anthropic::AnthropicClient;
use correlation_agent::analysis::AnalysisGenerator;
use correlation_agent::api::coingecko::CoinGeckoClient;
use correlation_agent::clients::twitter::TwitterClient;
use correlation_agent::config::Config;
use correlation_agent::duplicate::DuplicateGuard;
use correlation_agent::formatter::PostFormatter;
use correlation_agent::system::CorrelationAgent;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    info!(model = %config.anthropic_model, "starting market correlation agent");

    let backend = Arc::new(AnthropicClient::new(
        &config.anthropic_api_key,
        &config.anthropic_model,
        config.max_completion_tokens,
    )?);

    let market = Arc::new(CoinGeckoClient::new(
        &config.coingecko_base_url,
        &config.tracked_coin_ids,
        config.retry_policy(),
    )?);

    // Setup failures get the same retry budget the cycle stages do.
    let twitter = Arc::new(
        config
            .retry_policy()
            .run("twitter setup", || {
                TwitterClient::connect(&config.twitter, config.retry_policy())
            })
            .await?,
    );

    let agent = CorrelationAgent::new(
        market,
        AnalysisGenerator::new(
            backend,
            config.analysis_prompt.clone(),
            config.retry_policy(),
        ),
        PostFormatter::new(config.constraints),
        DuplicateGuard::new(config.duplicate),
        twitter.clone(),
        twitter,
        config.cycle_interval,
        config.failure_backoff,
    );

    agent.run().await;
    info!("agent stopped");
    Ok(())
}
