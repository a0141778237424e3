use async_trait::async_trait;

use common::AgentError;

use crate::models::FormattedPost;

pub mod twitter;

/// Outbound posting surface. Implementations own their own retry behavior;
/// the cycle treats publish as a single atomic success or failure.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, post: &FormattedPost) -> Result<(), AgentError>;
}

/// Recent-post feed the duplicate check compares against, most recent
/// first.
#[async_trait]
pub trait HistoryReader: Send + Sync {
    async fn recent_posts(&self) -> Result<Vec<String>, AgentError>;
}
