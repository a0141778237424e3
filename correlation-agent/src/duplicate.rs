use chrono::NaiveDateTime;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info};

use crate::config::DuplicateThresholds;
use crate::formatter::TIMESTAMP_FORMAT;
use crate::models::{ExtractedFields, FormattedPost};

lazy_static! {
    static ref TIMESTAMP_RE: Regex = Regex::new(r"Analysis - ([\d-]+ [\d:]+)").unwrap();
    static ref BTC_RE: Regex = Regex::new(r"BTC: \$([0-9,.]+)").unwrap();
    static ref ETH_RE: Regex = Regex::new(r"ETH: \$([0-9,.]+)").unwrap();
}

/// Recover the embedded price pair and timestamp from raw post text. Text
/// without both prices is non-comparable and yields `None`; a missing or
/// malformed timestamp leaves the prices usable on their own.
pub fn extract_fields(text: &str) -> Option<ExtractedFields> {
    let btc = capture_price(&BTC_RE, text)?;
    let eth = capture_price(&ETH_RE, text)?;
    let timestamp = TIMESTAMP_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| NaiveDateTime::parse_from_str(m.as_str(), TIMESTAMP_FORMAT).ok());

    Some(ExtractedFields {
        btc,
        eth,
        timestamp,
    })
}

fn capture_price(re: &Regex, text: &str) -> Option<f64> {
    let raw = re.captures(text)?.get(1)?.as_str();
    raw.replace(',', "").parse().ok()
}

/// Decides whether a freshly formatted post is a near-duplicate of a recent
/// one. Candidate fields come from the structured record; history entries
/// are parsed from raw text.
pub struct DuplicateGuard {
    thresholds: DuplicateThresholds,
}

impl DuplicateGuard {
    pub fn new(thresholds: DuplicateThresholds) -> Self {
        Self { thresholds }
    }

    /// True when some recent post shows the same prices (both moves under
    /// the threshold) within the suppression window. First match wins.
    /// Unparseable history entries are skipped; when nothing can be
    /// compared the post is allowed through.
    pub fn is_duplicate(&self, candidate: &FormattedPost, history: &[String]) -> bool {
        let new = &candidate.fields;

        for post in history {
            let old = match extract_fields(post) {
                Some(fields) => fields,
                None => {
                    debug!("skipping non-comparable history entry");
                    continue;
                }
            };

            let btc_change = pct_change(new.btc, old.btc);
            let eth_change = pct_change(new.eth, old.eth);
            if btc_change >= self.thresholds.min_change_pct
                || eth_change >= self.thresholds.min_change_pct
            {
                continue;
            }

            let (new_ts, old_ts) = match (new.timestamp, old.timestamp) {
                (Some(new_ts), Some(old_ts)) => (new_ts, old_ts),
                _ => continue,
            };

            if (new_ts - old_ts).num_seconds() < self.thresholds.min_seconds_between {
                info!(btc_change, eth_change, "near-duplicate of a recent post");
                return true;
            }
        }

        false
    }
}

/// Absolute percentage move from `old` to `new`. A zero reference price is
/// infinite movement, so it can never witness a duplicate.
fn pct_change(new: f64, old: f64) -> f64 {
    if old == 0.0 {
        return f64::INFINITY;
    }
    ((new - old) / old * 100.0).abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn candidate(btc: f64, eth: f64, timestamp: NaiveDateTime) -> FormattedPost {
        FormattedPost {
            text: String::new(),
            fields: ExtractedFields {
                btc,
                eth,
                timestamp: Some(timestamp),
            },
        }
    }

    fn history_entry(btc: &str, eth: &str, timestamp: NaiveDateTime) -> String {
        format!(
            "ETH/BTC Market Analysis - {}\n\nBTC: ${btc} (0.10%)\nETH: ${eth} (0.05%)\n\nFlat session.\n#Crypto #ETH #BTC",
            timestamp.format(TIMESTAMP_FORMAT),
        )
    }

    fn guard() -> DuplicateGuard {
        DuplicateGuard::new(DuplicateThresholds::default())
    }

    #[test]
    fn negligible_move_within_window_is_a_duplicate() {
        let candidate = candidate(50_000.0, 3_000.0, ts(0, 0, 10));
        let history = vec![history_entry("50000.01", "3000.00", ts(0, 0, 0))];

        assert!(guard().is_duplicate(&candidate, &history));
    }

    #[test]
    fn negligible_move_outside_window_is_not() {
        let candidate = candidate(50_000.0, 3_000.0, ts(0, 0, 40));
        let history = vec![history_entry("50000.01", "3000.00", ts(0, 0, 0))];

        assert!(!guard().is_duplicate(&candidate, &history));
    }

    #[test]
    fn real_movement_is_never_suppressed() {
        let candidate = candidate(50_100.0, 3_000.0, ts(0, 0, 10));
        let history = vec![history_entry("50000.00", "3000.00", ts(0, 0, 0))];

        assert!(!guard().is_duplicate(&candidate, &history));
    }

    #[test]
    fn malformed_history_is_skipped_not_fatal() {
        let candidate = candidate(50_000.0, 3_000.0, ts(0, 0, 10));
        let history = vec![
            "gm crypto twitter".to_string(),
            "BTC: $not-a-price".to_string(),
            history_entry("50000.00", "3000.00", ts(0, 0, 0)),
        ];

        assert!(guard().is_duplicate(&candidate, &history));
    }

    #[test]
    fn empty_history_always_allows_posting() {
        let candidate = candidate(50_000.0, 3_000.0, ts(0, 0, 10));
        assert!(!guard().is_duplicate(&candidate, &[]));
    }

    #[test]
    fn missing_history_timestamp_allows_posting() {
        let candidate = candidate(50_000.0, 3_000.0, ts(0, 0, 10));
        let history = vec!["BTC: $50000.00 and ETH: $3000.00, no timestamp".to_string()];

        assert!(!guard().is_duplicate(&candidate, &history));
    }

    #[test]
    fn zero_reference_price_never_matches() {
        let candidate = candidate(50_000.0, 3_000.0, ts(0, 0, 10));
        let history = vec![history_entry("0", "3000.00", ts(0, 0, 0))];

        assert!(!guard().is_duplicate(&candidate, &history));
    }

    #[test]
    fn parses_prices_with_thousands_separators() {
        let fields =
            extract_fields("BTC: $50,000.25 (1.00%)\nETH: $3,000.10 (0.50%)").unwrap();
        assert_eq!(fields.btc, 50_000.25);
        assert_eq!(fields.eth, 3_000.10);
        assert_eq!(fields.timestamp, None);
    }

    #[test]
    fn round_trips_a_formatted_post() {
        use crate::config::PostConstraints;
        use crate::formatter::PostFormatter;
        use crate::models::{CoinSnapshot, MarketSnapshot};

        let snapshot = MarketSnapshot {
            bitcoin: CoinSnapshot {
                id: "bitcoin".into(),
                symbol: "BTC".into(),
                current_price: 50_000.0,
                price_change_pct_24h: 2.5,
                total_volume: 30_000_000_000.0,
            },
            ethereum: CoinSnapshot {
                id: "ethereum".into(),
                symbol: "ETH".into(),
                current_price: 3_000.0,
                price_change_pct_24h: -1.2,
                total_volume: 12_000_000_000.0,
            },
        };

        let post = PostFormatter::new(PostConstraints::default()).format_at(
            "Quiet session.",
            &snapshot,
            ts(12, 30, 0),
        );

        let parsed = extract_fields(&post.text).unwrap();
        assert_eq!(parsed.btc, 50_000.0);
        assert_eq!(parsed.eth, 3_000.0);
        assert_eq!(parsed.timestamp, Some(ts(12, 30, 0)));
    }
}
