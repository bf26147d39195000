//! Client error taxonomy.
//!
//! DESIGN
//! ======
//! One flat enum covers everything the admin-ajax surface can actually
//! produce: transport failures, non-2xx statuses, `success: false`
//! envelopes, malformed payloads, and job-level failure. The poller
//! consults [`ErrorCode::retryable`] to decide between backing off and
//! giving up, so the retry split lives here and nowhere else.

/// Everything that can go wrong between a submit call and a terminal
/// job state.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request never produced a response (connect, timeout, TLS).
    #[error("transport error: {0}")]
    Transport(String),

    /// The endpoint answered with a non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The server answered `success: false`; the message is verbatim.
    #[error("{message}")]
    Api { message: String },

    /// The response decoded as JSON but not as the expected shape.
    #[error("unexpected response shape: {0}")]
    Decode(String),

    /// The job itself reported a `failed` status; the message is verbatim.
    #[error("{message}")]
    JobFailed { message: String },

    /// A retryable failure kept recurring until the retry budget ran out.
    #[error("gave up after {attempts} attempts: {source}")]
    RetriesExhausted { attempts: u32, source: Box<ClientError> },

    /// The poll budget ran out before the job reached a terminal state.
    #[error("no terminal state after {polls} status requests")]
    PollBudgetExhausted { polls: u32 },

    /// Configuration was missing or unparseable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Stable, grepable error codes plus the retry classification.
pub trait ErrorCode {
    /// Short code for logs and CLI output, e.g. `E_TRANSPORT`.
    fn error_code(&self) -> &'static str;

    /// Whether retrying the same request can plausibly succeed.
    fn retryable(&self) -> bool;
}

impl ErrorCode for ClientError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "E_TRANSPORT",
            Self::Http { .. } => "E_HTTP",
            Self::Api { .. } => "E_API",
            Self::Decode(_) => "E_DECODE",
            Self::JobFailed { .. } => "E_JOB_FAILED",
            Self::RetriesExhausted { .. } => "E_RETRIES_EXHAUSTED",
            Self::PollBudgetExhausted { .. } => "E_POLL_BUDGET",
            Self::InvalidConfig(_) => "E_INVALID_CONFIG",
        }
    }

    /// Transport errors and transient HTTP statuses (408, 429, 5xx) are
    /// retryable. Application-level failures are not: the server answered,
    /// it just said no.
    fn retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_)
                | Self::Http {
                    status: 408 | 429 | 500..=599,
                    ..
                }
        )
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
