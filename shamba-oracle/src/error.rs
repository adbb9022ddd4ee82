use thiserror::Error;

/// Failure reported by a [`GenerativeBackend`](crate::GenerativeBackend)
/// before any classification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceFailure {
    /// The service answered with a non-success HTTP status.
    #[error("HTTP {code}{}: {message}", rpc_suffix(.status))]
    Status {
        code: u16,
        /// Canonical RPC status, e.g. `RESOURCE_EXHAUSTED`, when the body had one.
        status: Option<String>,
        message: String,
    },
    /// The request did not produce a response (connect, timeout, reset).
    #[error("transport failure: {message}")]
    Transport { message: String },
    /// The request could not be built (bad endpoint URL, invalid header).
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },
    /// The service answered with a success status but an unreadable body.
    #[error("unreadable response body: {message}")]
    InvalidBody { message: String },
}

impl ServiceFailure {
    pub fn status(code: u16, message: impl Into<String>) -> Self {
        ServiceFailure::Status {
            code,
            status: None,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        ServiceFailure::Transport {
            message: message.into(),
        }
    }
}

fn rpc_suffix(status: &Option<String>) -> String {
    status.as_deref().map(|s| format!(" {s}")).unwrap_or_default()
}

/// Error returned by every oracle operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    /// Rate limiting or a server-side fault. Retried.
    #[error("transient service error: {0}")]
    Transient(ServiceFailure),
    /// Any other service failure. Never retried.
    #[error("service error: {0}")]
    Fatal(ServiceFailure),
    /// The service answered but the payload does not have the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),
    /// Rejected before any network call.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The owning session was torn down while the call was in flight.
    #[error("call cancelled")]
    Cancelled,
}

impl OracleError {
    pub fn is_transient(&self) -> bool {
        matches!(self, OracleError::Transient(_))
    }
}

/// RPC status names that indicate a server-side fault or throttling.
const TRANSIENT_RPC_STATUSES: [&str; 4] = [
    "RESOURCE_EXHAUSTED",
    "INTERNAL",
    "UNAVAILABLE",
    "DEADLINE_EXCEEDED",
];

/// Map a raw backend failure into the oracle error taxonomy.
///
/// HTTP 429, any 5xx, a transient RPC status and transport failures are
/// transient. Unreadable success bodies are malformed. Everything else,
/// including content-policy blocks and requests that could not be built, is
/// fatal.
pub fn classify(failure: ServiceFailure) -> OracleError {
    let transient = match &failure {
        ServiceFailure::Status { code, status, .. } => {
            let throttled = *code == 429;
            let server_fault = (500..600).contains(code);
            let rpc_fault = status
                .as_deref()
                .is_some_and(|s| TRANSIENT_RPC_STATUSES.contains(&s));
            throttled || server_fault || rpc_fault
        }
        ServiceFailure::Transport { .. } => true,
        ServiceFailure::InvalidRequest { .. } => false,
        ServiceFailure::InvalidBody { message } => {
            return OracleError::Malformed(message.clone());
        }
    };

    if transient {
        OracleError::Transient(failure)
    } else {
        OracleError::Fatal(failure)
    }
}

impl From<ServiceFailure> for OracleError {
    fn from(failure: ServiceFailure) -> Self {
        classify(failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttling_and_server_faults_are_transient() {
        assert!(classify(ServiceFailure::status(429, "slow down")).is_transient());
        assert!(classify(ServiceFailure::status(500, "Internal error")).is_transient());
        assert!(classify(ServiceFailure::status(503, "overloaded")).is_transient());
        assert!(classify(ServiceFailure::transport("connection reset")).is_transient());
    }

    #[test]
    fn rpc_status_marks_transient() {
        let failure = ServiceFailure::Status {
            code: 499,
            status: Some("INTERNAL".into()),
            message: "Rpc failed".into(),
        };
        assert!(classify(failure).is_transient());
    }

    #[test]
    fn client_errors_are_fatal() {
        for code in [400, 401, 403, 404] {
            let err = classify(ServiceFailure::status(code, "nope"));
            assert!(matches!(err, OracleError::Fatal(_)), "{code}");
        }
    }

    #[test]
    fn unbuildable_request_is_fatal() {
        let err = classify(ServiceFailure::InvalidRequest {
            message: "relative URL without a base".into(),
        });
        assert!(matches!(err, OracleError::Fatal(_)));
    }

    #[test]
    fn content_policy_block_is_fatal() {
        let failure = ServiceFailure::Status {
            code: 200,
            status: Some("SAFETY".into()),
            message: "response blocked by content policy".into(),
        };
        assert!(matches!(classify(failure), OracleError::Fatal(_)));
    }

    #[test]
    fn invalid_body_is_malformed() {
        let err = classify(ServiceFailure::InvalidBody {
            message: "expected value".into(),
        });
        assert_eq!(err, OracleError::Malformed("expected value".into()));
    }

    #[test]
    fn status_display_includes_rpc_status() {
        let failure = ServiceFailure::Status {
            code: 429,
            status: Some("RESOURCE_EXHAUSTED".into()),
            message: "quota".into(),
        };
        assert_eq!(failure.to_string(), "HTTP 429 RESOURCE_EXHAUSTED: quota");
        assert_eq!(ServiceFailure::status(500, "boom").to_string(), "HTTP 500: boom");
    }
}
