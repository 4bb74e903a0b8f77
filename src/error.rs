//! Error types surfaced by the form controllers and the transport

use thiserror::Error;

/// Reasons a submit attempt did not produce an outbound request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitBlocked {
    #[error("a submission is already in flight")]
    InFlight,
    #[error("correct form errors and try again")]
    Invalid,
    #[error("the submission has already completed")]
    Completed,
    #[error("the dialog is not open")]
    Closed,
    #[error("{0}")]
    NotAllowed(&'static str),
}

/// Errors from the team selection callbacks
#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("team selection is not available when messaging a fixed team")]
    FixedTeam,
    #[error("invalid team picker payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

/// Transport-level failures, before any response document was read
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("failed to encode request: {0}")]
    Encode(String),
    #[error("request failed: {0}")]
    Network(String),
    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}
