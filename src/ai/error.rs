use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AIError {
    #[error("failed to build HTTP client: {0}")]
    Client(String),
    #[error("could not reach {endpoint}: {reason}")]
    Unreachable { endpoint: String, reason: String },
    #[error("model did not answer within {0}s")]
    Timeout(u64),
    #[error("{0} API key not configured")]
    MissingApiKey(&'static str),
    #[error("API key is not a valid header value: {0}")]
    InvalidApiKey(String),
    #[error("{provider} rejected the API key")]
    Unauthorized { provider: &'static str },
    #[error("{provider} rate limit exceeded")]
    RateLimited { provider: &'static str },
    #[error("{provider} answered {status}: {body}")]
    Status {
        provider: &'static str,
        status: StatusCode,
        body: String,
    },
    #[error("could not decode model response: {reason} (starts with {excerpt:?})")]
    Malformed { reason: String, excerpt: String },
    #[error("model returned an empty answer")]
    EmptyAnswer,
}

impl AIError {
    pub(crate) fn malformed(reason: impl ToString, raw: &str) -> Self {
        AIError::Malformed {
            reason: reason.to_string(),
            excerpt: raw.chars().take(200).collect(),
        }
    }
}
