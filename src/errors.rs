use std::time::Duration;

use thiserror::Error;

use crate::relayer::StepStatus;

/// A failed HTTP exchange with one of the remote services.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HttpFailure {
    #[error("status code: {status_code}, body: {body}")]
    Status { status_code: u16, body: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("malformed response: {reason}, body: {body}")]
    MalformedResponse { reason: String, body: String },
}

#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("Encoding error: {0}")]
    Encoding(String),
    #[error("Signing error: {0}")]
    Signing(String),
    #[error("Nonce lookup error: {0}")]
    NonceLookup(String),
    #[error("Recent block lookup error: {0}")]
    BlockLookup(String),
    #[error("Chain query error: {0}")]
    ChainQuery(String),
    #[error("Submission error: {0}")]
    Submission(HttpFailure),
    #[error("Status poll error: {0}")]
    StatusPoll(HttpFailure),
    #[error("Status poll for intent {intent_id} step {step_id} timed out after {attempts} attempt(s), last status: {last_status:?}")]
    StatusPollTimeout {
        intent_id: String,
        step_id: u32,
        attempts: u32,
        last_status: Option<StepStatus>,
    },
    #[error("Status poll for intent {intent_id} step {step_id} was cancelled")]
    StatusPollCancelled { intent_id: String, step_id: u32 },
    #[error("RFQT error: {0}")]
    Rfqt(HttpFailure),
    #[error("Route request error: {0}")]
    RouteRequest(HttpFailure),
    #[error("Route service error: {0}")]
    RouteService(String),
    #[error("Config error: {0}")]
    Config(String),
    #[error("Private key parse error: {0:?}")]
    PrivateKeyParse(String),
    #[error("Wallet error: {0:?}")]
    Wallet(String),
    #[error("JSON parse error: {0:?}")]
    JsonParse(String),
}

impl Error {
    fn http_failure(&self) -> Option<&HttpFailure> {
        match self {
            Error::Submission(failure)
            | Error::StatusPoll(failure)
            | Error::Rfqt(failure)
            | Error::RouteRequest(failure) => Some(failure),
            _ => None,
        }
    }

    /// HTTP status returned by the remote service, if the failure carried one.
    pub fn status_code(&self) -> Option<u16> {
        match self.http_failure() {
            Some(HttpFailure::Status { status_code, .. }) => Some(*status_code),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.http_failure(), Some(HttpFailure::Timeout(_)))
            || matches!(self, Error::StatusPollTimeout { .. })
    }
}
