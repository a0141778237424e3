use std::env;
use std::time::Duration;

use anyhow::{bail, Result};
use common::RetryPolicy;

const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
const DEFAULT_COINGECKO_URL: &str = "https://api.coingecko.com/api/v3";
const DEFAULT_TRACKED_COINS: &str = "bitcoin,ethereum";
const DEFAULT_MAX_COMPLETION_TOKENS: u32 = 1500;

/// Analysis prompt template. The six numeric placeholders are substituted
/// per cycle from the market snapshot.
pub const ANALYSIS_PROMPT: &str = "\
Analyze ETH/BTC Market Dynamics:

Current Market Data:
Bitcoin:
- Price: ${btc_price}
- 24h Change: {btc_change}%
- Volume: ${btc_volume}

Ethereum:
- Price: ${eth_price}
- 24h Change: {eth_change}%
- Volume: ${eth_volume}

Please provide a concise but detailed market analysis:
1. Short-term Movement:
   - Price action in last few minutes
   - Volume profile significance
   - Immediate support/resistance levels

2. Market Microstructure:
   - Order flow analysis
   - Volume weighted price trends
   - Market depth indicators

3. Cross-Pair Dynamics:
   - ETH/BTC correlation changes
   - Relative strength shifts
   - Market maker activity signals

Focus on actionable micro-trends and real-time market behavior. Identify minimal but significant price movements.
Keep the analysis technical but concise, emphasizing key shifts in market dynamics.";

/// Everything the agent reads from the environment, resolved once at
/// startup and passed by reference afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub anthropic_model: String,
    pub max_completion_tokens: u32,
    pub analysis_prompt: String,
    pub twitter: TwitterCredentials,
    pub coingecko_base_url: String,
    pub tracked_coin_ids: String,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    pub cycle_interval: Duration,
    pub failure_backoff: Duration,
    pub constraints: PostConstraints,
    pub duplicate: DuplicateThresholds,
}

#[derive(Debug, Clone)]
pub struct TwitterCredentials {
    pub username: String,
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_secret: String,
}

/// Post length constraints. The formatter enforces `min_length` and
/// `hard_stop_length`; `max_length` is the soft target carried alongside
/// them.
#[derive(Debug, Clone, Copy)]
pub struct PostConstraints {
    pub min_length: usize,
    pub max_length: usize,
    pub hard_stop_length: usize,
}

impl Default for PostConstraints {
    fn default() -> Self {
        Self {
            min_length: 220,
            max_length: 270,
            hard_stop_length: 280,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DuplicateThresholds {
    /// Price moves below this percentage count as "no movement".
    pub min_change_pct: f64,
    /// Posts closer together than this window are candidates for
    /// suppression.
    pub min_seconds_between: i64,
}

impl Default for DuplicateThresholds {
    fn default() -> Self {
        Self {
            min_change_pct: 0.01,
            min_seconds_between: 30,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            anthropic_api_key: env_str("ANTHROPIC_API_KEY", ""),
            anthropic_model: env_str("ANTHROPIC_MODEL", DEFAULT_MODEL),
            max_completion_tokens: env_u32("MAX_COMPLETION_TOKENS", DEFAULT_MAX_COMPLETION_TOKENS),
            analysis_prompt: ANALYSIS_PROMPT.to_string(),
            twitter: TwitterCredentials {
                username: env_str("TWITTER_USERNAME", ""),
                consumer_key: env_str("TWITTER_CONSUMER_KEY", ""),
                consumer_secret: env_str("TWITTER_CONSUMER_SECRET", ""),
                access_token: env_str("TWITTER_ACCESS_TOKEN", ""),
                access_secret: env_str("TWITTER_ACCESS_SECRET", ""),
            },
            coingecko_base_url: env_str("COINGECKO_BASE_URL", DEFAULT_COINGECKO_URL),
            tracked_coin_ids: env_str("TRACKED_COIN_IDS", DEFAULT_TRACKED_COINS),
            max_retries: env_u32("MAX_RETRIES", 3),
            retry_base_delay: Duration::from_secs(env_u64("RETRY_BASE_DELAY_SECS", 10)),
            cycle_interval: Duration::from_secs(env_u64("CYCLE_INTERVAL_SECS", 60)),
            failure_backoff: Duration::from_secs(env_u64("FAILURE_BACKOFF_SECS", 300)),
            constraints: PostConstraints::default(),
            duplicate: DuplicateThresholds::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// The one retry policy shared by every network-calling component.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.retry_base_delay)
    }

    fn validate(&self) -> Result<()> {
        let required = [
            ("ANTHROPIC_API_KEY", &self.anthropic_api_key),
            ("TWITTER_USERNAME", &self.twitter.username),
            ("TWITTER_CONSUMER_KEY", &self.twitter.consumer_key),
            ("TWITTER_CONSUMER_SECRET", &self.twitter.consumer_secret),
            ("TWITTER_ACCESS_TOKEN", &self.twitter.access_token),
            ("TWITTER_ACCESS_SECRET", &self.twitter.access_secret),
        ];

        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() {
            bail!("missing required configuration: {}", missing.join(", "));
        }
        Ok(())
    }
}

fn env_str(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_u32(name: &str, default: u32) -> u32 {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}
