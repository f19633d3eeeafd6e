use thiserror::Error;

/// Errors from the judgment-service client.
#[derive(Debug, Error)]
pub enum JudgeError {
    /// Network-level failure talking to the service.
    #[error("judgment service request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The configured API key contains characters that cannot appear in an
    /// HTTP header.
    #[error("judgment service API key is not a valid header value")]
    InvalidApiKey,

    /// The service returned HTTP 429 on the given attempt (1-based).
    #[error("judgment service rate limited on attempt {attempt}")]
    RateLimited { attempt: u32 },

    /// Every attempt was rate limited; the quota is gone for now and the
    /// whole run should stop rather than burn more calls.
    #[error("judgment service quota exhausted")]
    QuotaExhausted,

    /// Non-429 error status from the service.
    #[error("judgment service error (status {status}): {body}")]
    Api { status: u16, body: String },

    /// The response carried no message content.
    #[error("judgment service returned an empty response")]
    EmptyResponse,

    /// The response text did not parse as the expected JSON shape.
    #[error("malformed verdict ({context}): {source}")]
    MalformedVerdict {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}
