use chrono::{NaiveDateTime, Utc};
use tracing::debug;

use crate::config::PostConstraints;
use crate::models::{ExtractedFields, FormattedPost, MarketSnapshot};

const HASHTAG_SUFFIX: &str = "\n#Crypto #ETH #BTC";
const FILLER: &str = "\nDetailed analysis available.";

/// Timestamp layout embedded in the post header; the duplicate check parses
/// historical posts back through the same format.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Renders a length-bounded post from the generated analysis and the
/// snapshot it was generated from.
pub struct PostFormatter {
    constraints: PostConstraints,
}

impl PostFormatter {
    pub fn new(constraints: PostConstraints) -> Self {
        Self { constraints }
    }

    pub fn format(&self, analysis: &str, snapshot: &MarketSnapshot) -> FormattedPost {
        self.format_at(analysis, snapshot, Utc::now().naive_utc())
    }

    /// Header first, then a greedy prefix-fit of whole analysis lines
    /// against the hard stop (hashtag suffix reserved up front), then the
    /// suffix. Short output gets the filler sentence, but only when the
    /// result still fits the hard stop.
    pub fn format_at(
        &self,
        analysis: &str,
        snapshot: &MarketSnapshot,
        now: NaiveDateTime,
    ) -> FormattedPost {
        let btc = &snapshot.bitcoin;
        let eth = &snapshot.ethereum;

        let header = format!(
            "ETH/BTC Market Analysis - {}\n\nBTC: ${:.2} ({:.2}%)\nETH: ${:.2} ({:.2}%)\n\n",
            now.format(TIMESTAMP_FORMAT),
            btc.current_price,
            btc.price_change_pct_24h,
            eth.current_price,
            eth.price_change_pct_24h,
        );

        let header_len = header.chars().count();
        let suffix_len = HASHTAG_SUFFIX.chars().count();

        // Whole lines only: the first line that would overflow ends the
        // fit, and nothing after it is considered.
        let mut body = String::new();
        let mut body_len = 0;
        for line in analysis.lines() {
            let line_len = line.chars().count() + 1;
            if header_len + body_len + line_len + suffix_len > self.constraints.hard_stop_length {
                break;
            }
            body.push_str(line);
            body.push('\n');
            body_len += line_len;
        }

        let mut text = format!("{header}{body}{HASHTAG_SUFFIX}");

        if text.chars().count() < self.constraints.min_length {
            let padded_len = text.chars().count() + FILLER.chars().count();
            if padded_len <= self.constraints.hard_stop_length {
                text.push_str(FILLER);
            }
        }

        debug!(len = text.chars().count(), "formatted post");

        FormattedPost {
            text,
            fields: ExtractedFields {
                btc: btc.current_price,
                eth: eth.current_price,
                timestamp: Some(now),
            },
        }
    }
}
