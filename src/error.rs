use thiserror::Error;

/// Errors surfaced by the Drip client.
#[derive(Debug, Error)]
pub enum DripError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("api error (status {status}): {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("request rejected by client-side rate limiter")]
    RateLimited,

    #[error("circuit breaker is open")]
    CircuitOpen,

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl DripError {
    pub fn status(&self) -> Option<u16> {
        match self {
            DripError::Auth(_) => Some(401),
            DripError::NotFound(_) => Some(404),
            DripError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the error indicates the endpoint is absent on this deployment
    /// (404/501). Optional checks treat these as a skip rather than a failure.
    pub fn is_unimplemented(&self) -> bool {
        matches!(
            self,
            DripError::NotFound(_) | DripError::Api { status: 501, .. }
        )
    }

    /// Whether a retry could plausibly succeed: transport failures,
    /// 429 throttling, and server-side 5xx responses.
    pub fn is_retryable(&self) -> bool {
        match self {
            DripError::Transport(_) => true,
            DripError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Error from `wrap_api_call`: either the wrapped call itself failed (and no
/// charge was recorded) or the call succeeded but the billing step failed.
#[derive(Debug, Error)]
pub enum WrapCallError<E: std::error::Error> {
    #[error("wrapped call failed: {0}")]
    Call(#[source] E),

    #[error("billing failed after successful call: {0}")]
    Billing(#[source] DripError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unimplemented_covers_404_and_501() {
        assert!(DripError::NotFound("x".into()).is_unimplemented());
        assert!(
            DripError::Api {
                status: 501,
                code: None,
                message: "not implemented".into()
            }
            .is_unimplemented()
        );
        assert!(
            !DripError::Api {
                status: 400,
                code: None,
                message: "bad request".into()
            }
            .is_unimplemented()
        );
        assert!(!DripError::Auth("bad key".into()).is_unimplemented());
    }

    #[test]
    fn retryable_classification() {
        assert!(
            DripError::Api {
                status: 429,
                code: None,
                message: "slow down".into()
            }
            .is_retryable()
        );
        assert!(
            DripError::Api {
                status: 503,
                code: None,
                message: "unavailable".into()
            }
            .is_retryable()
        );
        assert!(!DripError::NotFound("x".into()).is_retryable());
        assert!(!DripError::RateLimited.is_retryable());
    }
}
