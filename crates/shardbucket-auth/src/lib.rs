//! AWS Signature Version 4 for Shardbucket.
//!
//! The proxy uses SigV4 twice per request, in opposite directions:
//!
//! - **Inbound**: clients sign requests against the virtual bucket with the
//!   client-facing credential pair; [`verify_request`] checks those
//!   signatures, trusting the region and service the client's own
//!   `Authorization` header declares.
//! - **Outbound**: after routing, the proxy produces a fresh signature over
//!   the rewritten request with the backend credential pair via
//!   [`sign_request`].
//!
//! Both directions share one canonicalization implementation ([`canonical`])
//! so a request the proxy signs is always a request the same code would
//! verify.
//!
//! # Modules
//!
//! - [`canonical`] - Canonical request construction per the SigV4 specification
//! - [`error`] - Authentication error types
//! - [`sigv4`] - Header parsing, key derivation, signing, and verification

pub mod canonical;
pub mod error;
pub mod sigv4;

pub use error::AuthError;
pub use sigv4::{
    ParsedAuthorization, SigningRequest, hash_payload, parse_authorization_header, sign_request,
    verify_request,
};
