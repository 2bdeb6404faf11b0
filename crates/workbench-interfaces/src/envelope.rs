//! The uniform `{status, res|error}` wrapper returned by every operation.
//!
//! The wire contract overloads a single object for success and failure. Here the
//! two outcomes are separate variants, so a caller cannot read `res` off a failed
//! call or an `error` off a successful one.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// HTTP status used when no response was received at all
pub const NO_STATUS: u16 = 0;

/// The nested `{"data": ...}` body several endpoints answer with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Data<T> {
    /// The wrapped value
    pub data: T,
}

/// Why an envelope carries an error instead of a result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Network unreachable, connection reset, timeout
    Transport,
    /// Backend answered with a non-2xx status and a reason
    Rejected,
    /// Backend answered 2xx but the body did not match the expected shape
    Malformed,
}

/// Result of a single backend call, already normalized
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope<T> {
    /// 2xx response with a parsed body
    Success {
        /// HTTP status code
        status: u16,
        /// Parsed response body
        res: T,
    },
    /// Any failure, reported as data
    Failure {
        /// HTTP status code, or [`NO_STATUS`] when nothing was received
        status: u16,
        /// Failure classification
        kind: FailureKind,
        /// Normalized error description
        error: String,
    },
}

impl<T> Envelope<T> {
    /// Builds a success envelope
    pub fn success(status: u16, res: T) -> Self {
        Envelope::Success { status, res }
    }

    /// Builds a failure envelope
    pub fn failure(status: u16, kind: FailureKind, error: impl Into<String>) -> Self {
        Envelope::Failure {
            status,
            kind,
            error: error.into(),
        }
    }

    /// Builds a transport failure, which never has a status
    pub fn transport(error: impl Into<String>) -> Self {
        Self::failure(NO_STATUS, FailureKind::Transport, error)
    }

    /// HTTP status of the call
    pub fn status(&self) -> u16 {
        match self {
            Envelope::Success { status, .. } | Envelope::Failure { status, .. } => *status,
        }
    }

    /// True only for `status == 200`, the check every caller performs
    pub fn is_ok(&self) -> bool {
        matches!(self, Envelope::Success { status: 200, .. })
    }

    /// Parsed body, if the call succeeded
    pub fn res(&self) -> Option<&T> {
        match self {
            Envelope::Success { res, .. } => Some(res),
            Envelope::Failure { .. } => None,
        }
    }

    /// Consumes the envelope, keeping only the body
    pub fn into_res(self) -> Option<T> {
        match self {
            Envelope::Success { res, .. } => Some(res),
            Envelope::Failure { .. } => None,
        }
    }

    /// Error description, if the call failed
    pub fn error(&self) -> Option<&str> {
        match self {
            Envelope::Success { .. } => None,
            Envelope::Failure { error, .. } => Some(error),
        }
    }

    /// Failure classification, if the call failed
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Envelope::Success { .. } => None,
            Envelope::Failure { kind, .. } => Some(*kind),
        }
    }

    /// Maps the success body, leaving failures untouched
    pub fn map<U, F>(self, f: F) -> Envelope<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Envelope::Success { status, res } => Envelope::Success { status, res: f(res) },
            Envelope::Failure {
                status,
                kind,
                error,
            } => Envelope::Failure {
                status,
                kind,
                error,
            },
        }
    }
}

impl Envelope<Value> {
    /// Decodes a raw JSON body into a typed one.
    ///
    /// A body that does not deserialize fully is reported as
    /// [`FailureKind::Malformed`] with the original status; no partially
    /// populated value is ever produced.
    pub fn decode<T: DeserializeOwned>(self) -> Envelope<T> {
        match self {
            Envelope::Success { status, res } => match serde_json::from_value::<T>(res) {
                Ok(res) => Envelope::Success { status, res },
                Err(e) => Envelope::failure(
                    status,
                    FailureKind::Malformed,
                    format!("Failed to parse response: {}", e),
                ),
            },
            Envelope::Failure {
                status,
                kind,
                error,
            } => Envelope::Failure {
                status,
                kind,
                error,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Named {
        name: String,
    }

    #[test]
    fn test_only_status_200_is_ok() {
        assert!(Envelope::success(200, ()).is_ok());
        assert!(!Envelope::success(201, ()).is_ok());
        assert!(!Envelope::<()>::failure(409, FailureKind::Rejected, "duplicate").is_ok());
    }

    #[test]
    fn test_transport_failure_has_no_status() {
        let env = Envelope::<Value>::transport("connection refused");
        assert_eq!(env.status(), NO_STATUS);
        assert_eq!(env.failure_kind(), Some(FailureKind::Transport));
        assert_eq!(env.error(), Some("connection refused"));
        assert!(env.res().is_none());
    }

    #[test]
    fn test_decode_success() {
        let env = Envelope::success(200, json!({"name": "btc_1h"})).decode::<Named>();
        assert_eq!(env.res(), Some(&Named { name: "btc_1h".into() }));
    }

    #[test]
    fn test_decode_mismatch_is_malformed() {
        let env = Envelope::success(200, json!({"other": 1})).decode::<Named>();
        assert_eq!(env.status(), 200);
        assert_eq!(env.failure_kind(), Some(FailureKind::Malformed));
        assert!(!env.is_ok());
    }

    #[test]
    fn test_decode_keeps_failure() {
        let env = Envelope::<Value>::failure(400, FailureKind::Rejected, "bad").decode::<Named>();
        assert_eq!(env.error(), Some("bad"));
        assert_eq!(env.failure_kind(), Some(FailureKind::Rejected));
    }
}
