//! Error taxonomy for the proxy.
//!
//! Every failure the proxy can surface to a client maps onto one of the
//! variants here. Upstream HTTP responses with non-success status codes are
//! *not* errors: they are relayed verbatim to the client. Only transport
//! failures (connect, DNS, broken stream) become [`ProxyError::Upstream`].

/// Proxy-wide error type.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// Missing, malformed, or non-matching request signature.
    ///
    /// All authentication failure modes collapse into this single variant so
    /// the response body never reveals which check failed.
    #[error("Unauthorized: Invalid signature")]
    Unauthorized,

    /// The request is structurally invalid (missing key, bad continuation token).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A recognized but unsupported operation.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// A backend call failed at the transport level before a response arrived.
    #[error("upstream request failed: {0}")]
    Upstream(String),

    /// Configuration error at startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal error with context.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ProxyError {
    /// The HTTP status code this error maps to at the client boundary.
    #[must_use]
    pub fn status_code(&self) -> http::StatusCode {
        match self {
            Self::Unauthorized => http::StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => http::StatusCode::BAD_REQUEST,
            Self::NotImplemented(_) => http::StatusCode::NOT_IMPLEMENTED,
            Self::Upstream(_) => http::StatusCode::BAD_GATEWAY,
            Self::Config(_) | Self::Internal(_) => http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Convenience result type for proxy operations.
pub type ProxyResult<T> = Result<T, ProxyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_map_unauthorized_to_401() {
        assert_eq!(
            ProxyError::Unauthorized.status_code(),
            http::StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_should_map_bad_request_to_400() {
        let err = ProxyError::BadRequest("invalid continuation token".to_owned());
        assert_eq!(err.status_code(), http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_should_map_not_implemented_to_501() {
        let err = ProxyError::NotImplemented("ListObjects v1".to_owned());
        assert_eq!(err.status_code(), http::StatusCode::NOT_IMPLEMENTED);
    }

    #[test]
    fn test_should_map_upstream_to_502() {
        let err = ProxyError::Upstream("connection refused".to_owned());
        assert_eq!(err.status_code(), http::StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_should_use_fixed_message_for_unauthorized() {
        // The exact body clients receive on any authentication failure.
        assert_eq!(
            ProxyError::Unauthorized.to_string(),
            "Unauthorized: Invalid signature"
        );
    }
}
