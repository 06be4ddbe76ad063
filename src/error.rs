use reqwest::StatusCode;
use thiserror::Error;

/// Error taxonomy for the assessment core. Nothing here is retried: every
/// failure surfaces to the front end for the current turn.
#[derive(Debug, Error)]
pub enum AssessmentError {
    /// Detected before any remote call is attempted. Front ends render this
    /// as a prompt to supply a key, not as a crash.
    #[error("no OpenAI API key provided; please add one to continue")]
    MissingCredential,

    #[error("user turn must not be empty")]
    EmptyUserTurn,

    /// The API answered with a non-success status (auth, quota, malformed
    /// request, oversized payload).
    #[error("chat completion API returned {status}: {body}")]
    RemoteStatus { status: StatusCode, body: String },

    /// Network-level failure talking to the API.
    #[error("chat completion request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered 200 but the payload was not the expected shape.
    #[error("malformed chat completion payload: {0}")]
    Malformed(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl AssessmentError {
    /// True for the one error that should be rendered as a credential prompt
    /// rather than a failure.
    pub fn is_missing_credential(&self) -> bool {
        matches!(self, AssessmentError::MissingCredential)
    }
}
