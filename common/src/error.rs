use thiserror::Error;

/// Failure taxonomy shared by every component that talks to the outside
/// world. Whether an error is worth another attempt is a property of the
/// variant, not of the call site.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("unexpected payload shape: {0}")]
    DataShape(String),

    #[error("{operation} failed after {attempts} attempts")]
    MaxRetriesExceeded { operation: String, attempts: u32 },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AgentError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AgentError::Timeout(_) | AgentError::Network(_) | AgentError::Api(_)
        )
    }
}

impl From<reqwest::Error> for AgentError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AgentError::Timeout(err.to_string())
        } else if err.is_connect() {
            AgentError::Network(err.to_string())
        } else {
            AgentError::Api(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_variants_are_retryable() {
        assert!(AgentError::Timeout("read timed out".into()).is_retryable());
        assert!(AgentError::Network("connection refused".into()).is_retryable());
        assert!(AgentError::Api("502 Bad Gateway".into()).is_retryable());
    }

    #[test]
    fn shape_and_exhaustion_are_not_retryable() {
        assert!(!AgentError::DataShape("missing ETH".into()).is_retryable());
        assert!(!AgentError::MaxRetriesExceeded {
            operation: "fetch".into(),
            attempts: 3,
        }
        .is_retryable());
    }
}
