pub mod analysis;
pub mod api;
pub mod clients;
pub mod config;
pub mod duplicate;
pub mod formatter;
pub mod models;
pub mod system;

// Re-export main components
pub use analysis::AnalysisGenerator;
pub use api::coingecko::CoinGeckoClient;
pub use config::Config;
pub use duplicate::DuplicateGuard;
pub use formatter::PostFormatter;
pub use models::{FormattedPost, MarketSnapshot};
pub use system::{CorrelationAgent, CycleOutcome, Stage};
