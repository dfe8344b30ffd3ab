//! Error types for SigV4 authentication.

/// Errors that can occur while parsing, signing, or verifying a SigV4 request.
///
/// At the HTTP boundary every variant collapses into a single 401 response;
/// the distinctions here exist for logging and tests only.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The `Authorization` header is missing from the request.
    #[error("missing Authorization header")]
    MissingAuthHeader,

    /// The `Authorization` header does not match the SigV4 grammar.
    #[error("malformed Authorization header")]
    MalformedAuthHeader,

    /// The signing algorithm is not `AWS4-HMAC-SHA256`.
    #[error("unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The `Credential` scope is not `AKID/date/region/service/aws4_request`.
    #[error("malformed credential scope")]
    MalformedCredentialScope,

    /// The request was signed with an access key the proxy does not serve.
    #[error("unknown access key: {0}")]
    UnknownAccessKey(String),

    /// A header listed in `SignedHeaders` is absent from the request.
    #[error("missing signed header: {0}")]
    MissingSignedHeader(String),

    /// The computed signature does not match the provided one.
    #[error("signature mismatch")]
    SignatureMismatch,
}
