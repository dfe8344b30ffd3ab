//! Request classification: object operation, list operation, or
//! recognized-but-unsupported feature.
//!
//! The proxy fronts exactly one virtual bucket, so the URI space is flat:
//! `/` is the bucket itself (list surface) and `/{key}` is an object.
//! Recognized S3 sub-resources outside the supported surface (ListObjects
//! v1, versions, multipart uploads, ACLs) classify as
//! [`RequestKind::NotImplemented`] so they surface as an explicit 501
//! instead of being misrouted to a backend.

use percent_encoding::percent_decode_str;
use shardbucket_core::ProxyError;
use shardbucket_model::{DEFAULT_MAX_KEYS, ListQuery};

/// What an inbound request asks the proxy to do.
#[derive(Debug, Clone)]
pub enum RequestKind {
    /// A single-object operation against the hash-routed bucket.
    Object {
        /// The percent-decoded object key.
        key: String,
    },
    /// A ListObjectsV2 call spanning every physical bucket.
    ListV2(ListQuery),
    /// A recognized S3 feature the proxy deliberately does not implement.
    NotImplemented(&'static str),
}

/// Classify a request from its parts.
///
/// # Errors
///
/// Returns [`ProxyError::BadRequest`] for an empty object key or an invalid
/// `max-keys` value.
pub fn classify(parts: &http::request::Parts) -> Result<RequestKind, ProxyError> {
    let path = parts.uri.path();
    let query = parse_query(parts.uri.query().unwrap_or(""));

    if path == "/" || path.is_empty() {
        return classify_bucket_request(&query);
    }

    // Multipart, versioning, and ACL sub-resources on object paths are
    // recognized so they fail loudly instead of reaching a backend.
    if let Some(feature) = unsupported_subresource(&query) {
        return Ok(RequestKind::NotImplemented(feature));
    }

    let key = percent_decode_str(&path[1..]).decode_utf8_lossy().into_owned();
    if key.is_empty() {
        return Err(ProxyError::BadRequest("missing object key".to_owned()));
    }

    Ok(RequestKind::Object { key })
}

fn classify_bucket_request(query: &[(String, String)]) -> Result<RequestKind, ProxyError> {
    match query_value(query, "list-type") {
        Some("2") => Ok(RequestKind::ListV2(parse_list_query(query)?)),
        Some(_) => Ok(RequestKind::NotImplemented("ListObjects v1")),
        None => {
            if has_param(query, "versions") {
                Ok(RequestKind::NotImplemented("ListObjectVersions"))
            } else if has_param(query, "uploads") {
                Ok(RequestKind::NotImplemented("ListMultipartUploads"))
            } else {
                // A bare bucket request without list-type=2 is the legacy
                // ListObjects v1 shape.
                Ok(RequestKind::NotImplemented("ListObjects v1"))
            }
        }
    }
}

fn unsupported_subresource(query: &[(String, String)]) -> Option<&'static str> {
    if has_param(query, "uploads") || has_param(query, "uploadId") {
        Some("multipart upload")
    } else if has_param(query, "versionId") {
        Some("object versioning")
    } else if has_param(query, "acl") {
        Some("ACLs")
    } else {
        None
    }
}

fn parse_list_query(query: &[(String, String)]) -> Result<ListQuery, ProxyError> {
    let max_keys = match query_value(query, "max-keys") {
        Some(raw) => {
            let parsed: i32 = raw
                .parse()
                .map_err(|_| ProxyError::BadRequest(format!("invalid max-keys: {raw}")))?;
            if parsed < 0 {
                return Err(ProxyError::BadRequest(format!("invalid max-keys: {raw}")));
            }
            // S3 clamps oversized values to its 1000-key ceiling; each shard
            // is only ever asked for that many entries per call.
            parsed.min(DEFAULT_MAX_KEYS)
        }
        None => DEFAULT_MAX_KEYS,
    };

    Ok(ListQuery {
        prefix: query_value(query, "prefix").map(ToOwned::to_owned),
        delimiter: query_value(query, "delimiter").map(ToOwned::to_owned),
        max_keys,
        continuation_token: query_value(query, "continuation-token").map(ToOwned::to_owned),
        start_after: query_value(query, "start-after").map(ToOwned::to_owned),
        fetch_owner: query_value(query, "fetch-owner") == Some("true"),
    })
}

/// Parse a raw query string into percent-decoded name/value pairs.
#[must_use]
pub fn parse_query(raw: &str) -> Vec<(String, String)> {
    raw.split('&')
        .filter(|p| !p.is_empty())
        .map(|p| {
            let (name, value) = p.split_once('=').unwrap_or((p, ""));
            (
                percent_decode_str(name).decode_utf8_lossy().into_owned(),
                percent_decode_str(value).decode_utf8_lossy().into_owned(),
            )
        })
        .collect()
}

fn query_value<'a>(query: &'a [(String, String)], name: &str) -> Option<&'a str> {
    query
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v.as_str())
}

fn has_param(query: &[(String, String)], name: &str) -> bool {
    query.iter().any(|(n, _)| n == name)
}
