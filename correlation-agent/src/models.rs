use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One tracked coin inside a market snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinSnapshot {
    pub id: String,
    pub symbol: String,
    pub current_price: f64,
    pub price_change_pct_24h: f64,
    pub total_volume: f64,
}

/// Immutable per-cycle view of the tracked pair. Created once when the
/// cycle starts and discarded when it ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub bitcoin: CoinSnapshot,
    pub ethereum: CoinSnapshot,
}

/// Raw CoinGecko `/coins/markets` record, reduced to the fields the agent
/// reads.
#[derive(Debug, Clone, Deserialize)]
pub struct CoinMarket {
    pub id: String,
    pub symbol: String,
    #[serde(default)]
    pub current_price: f64,
    #[serde(default, rename = "price_change_percentage_24h")]
    pub price_change_24h: Option<f64>,
    #[serde(default)]
    pub total_volume: f64,
}

/// Price pair and timestamp embedded in a post: carried structurally for
/// candidate posts, recovered from raw text for historical ones.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedFields {
    pub btc: f64,
    pub eth: f64,
    pub timestamp: Option<NaiveDateTime>,
}

/// A rendered post plus the structured fields it embeds. Keeping the fields
/// next to the text means the duplicate check never re-parses its own
/// output.
#[derive(Debug, Clone)]
pub struct FormattedPost {
    pub text: String,
    pub fields: ExtractedFields,
}

impl FormattedPost {
    pub fn len_chars(&self) -> usize {
        self.text.chars().count()
    }
}
