//! Transport-neutral status codes
//!
//! The RPC surface's error vocabulary. Invariant violations and
//! infrastructure failures become a `Status`; domain-level "can't do
//! that right now" stays `success=false` in the response body and
//! never reaches this type. Core errors translate here exactly once.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use pagegraph_core::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCode {
    Ok,
    InvalidArgument,
    NotFound,
    OutOfRange,
    Internal,
    Unavailable,
    DeadlineExceeded,
    Cancelled,
}

impl StatusCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusCode::Ok => "ok",
            StatusCode::InvalidArgument => "invalid_argument",
            StatusCode::NotFound => "not_found",
            StatusCode::OutOfRange => "out_of_range",
            StatusCode::Internal => "internal",
            StatusCode::Unavailable => "unavailable",
            StatusCode::DeadlineExceeded => "deadline_exceeded",
            StatusCode::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{}: {message}", code.as_str())]
pub struct Status {
    pub code: StatusCode,
    pub message: String,
}

impl Status {
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(StatusCode::InvalidArgument, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NotFound, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::Internal, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::Unavailable, message)
    }
}

impl From<CoreError> for Status {
    fn from(e: CoreError) -> Self {
        let code = match &e {
            CoreError::InvalidArgument(_) => StatusCode::InvalidArgument,
            CoreError::NotFound(_) => StatusCode::NotFound,
            CoreError::OutOfRange(_) => StatusCode::OutOfRange,
            CoreError::Store(_) | CoreError::Serialization(_) | CoreError::Template(_) => {
                StatusCode::Internal
            }
            CoreError::Unavailable(_) => StatusCode::Unavailable,
            CoreError::Timeout(_) => StatusCode::DeadlineExceeded,
        };
        Status::new(code, e.to_string())
    }
}

/// Result type alias for RPC handlers
pub type RpcResult<T> = std::result::Result<T, Status>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn core_errors_map_per_the_taxonomy() {
        let cases = [
            (
                CoreError::invalid_argument("bad"),
                StatusCode::InvalidArgument,
            ),
            (CoreError::not_found("gone"), StatusCode::NotFound),
            (CoreError::out_of_range("idx"), StatusCode::OutOfRange),
            (CoreError::Store("disk".into()), StatusCode::Internal),
            (CoreError::Template("loop".into()), StatusCode::Internal),
            (CoreError::unavailable("down"), StatusCode::Unavailable),
        ];
        for (err, expected) in cases {
            assert_eq!(Status::from(err).code, expected);
        }
    }
}
