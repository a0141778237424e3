use async_trait::async_trait;

use crate::error::AgentError;

pub mod anthropic;

/// Narrow seam to the remote generation service: one prompt in, one text
/// payload out. Anything other than a well-formed, non-empty text payload
/// is a retryable failure.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, AgentError>;
}
