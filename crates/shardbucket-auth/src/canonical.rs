//! Canonical request construction for AWS Signature Version 4.
//!
//! SigV4 signs a deterministically formatted text rendering of the request:
//!
//! ```text
//! HTTPRequestMethod\n
//! CanonicalURI\n
//! CanonicalQueryString\n
//! CanonicalHeaders\n\n
//! SignedHeaders\n
//! HashedPayload
//! ```
//!
//! Any deviation from AWS's formatting rules (header lowercasing, value
//! trimming, query sorting, path segment encoding) changes the signature and
//! breaks interoperability with the backend store, so this module follows
//! the published rules exactly.

use std::collections::BTreeMap;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

/// Characters that must be percent-encoded in a URI path segment.
///
/// Everything except RFC 3986 unreserved characters (`A-Z a-z 0-9 - _ . ~`)
/// is encoded; slashes between segments are preserved.
const SEGMENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Assemble the full canonical request text.
///
/// `headers` carries every candidate header of the request; only those named
/// in `signed_headers` participate. `payload_hash` is the lowercase hex
/// SHA-256 of the body.
#[must_use]
pub fn canonical_request(
    method: &str,
    path: &str,
    query: &str,
    headers: &[(String, String)],
    signed_headers: &[String],
    payload_hash: &str,
) -> String {
    format!(
        "{method}\n{}\n{}\n{}\n\n{}\n{payload_hash}",
        canonical_uri(path),
        canonical_query(query),
        canonical_headers(headers, signed_headers),
        signed_header_list(signed_headers),
    )
}

/// Canonicalize a URI path: each segment percent-encoded individually,
/// slashes preserved, the empty path normalized to `/`.
///
/// Segments are decoded before re-encoding so an already-encoded path does
/// not get double-encoded.
#[must_use]
pub fn canonical_uri(path: &str) -> String {
    if path.is_empty() || path == "/" {
        return "/".to_owned();
    }

    path.split('/')
        .map(|segment| {
            let decoded = percent_decode_str(segment).decode_utf8_lossy();
            utf8_percent_encode(&decoded, SEGMENT_ENCODE_SET).to_string()
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Canonicalize a query string: parameters sorted by name, then by value
/// for duplicate names.
///
/// Values are kept exactly as they appear on the wire. Clients differ in
/// which characters they percent-encode when signing, and verification must
/// use whatever encoding the client used.
#[must_use]
pub fn canonical_query(query: &str) -> String {
    if query.is_empty() {
        return String::new();
    }

    let mut params: Vec<(&str, &str)> = query
        .split('&')
        .filter(|p| !p.is_empty())
        .map(|p| p.split_once('=').unwrap_or((p, "")))
        .collect();
    params.sort_unstable();

    let pairs: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
    pairs.join("&")
}

/// Canonicalize the signed headers: names lowercased and sorted, values
/// trimmed with internal whitespace runs collapsed to one space, duplicate
/// names joined with commas.
#[must_use]
pub fn canonical_headers(headers: &[(String, String)], signed_headers: &[String]) -> String {
    let mut by_name: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let name = name.to_lowercase();
        let value = collapse_spaces(value.trim());
        by_name
            .entry(name)
            .and_modify(|existing| {
                existing.push(',');
                existing.push_str(&value);
            })
            .or_insert(value);
    }

    let mut names: Vec<String> = signed_headers.iter().map(|h| h.to_lowercase()).collect();
    names.sort_unstable();

    let lines: Vec<String> = names
        .iter()
        .filter_map(|name| by_name.get(name).map(|value| format!("{name}:{value}")))
        .collect();
    lines.join("\n")
}

/// The `SignedHeaders` component: lowercase names, sorted, `;`-joined.
#[must_use]
pub fn signed_header_list(signed_headers: &[String]) -> String {
    let mut names: Vec<String> = signed_headers.iter().map(|h| h.to_lowercase()).collect();
    names.sort_unstable();
    names.join(";")
}

fn collapse_spaces(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut in_run = false;
    for ch in value.chars() {
        if ch.is_whitespace() {
            if !in_run {
                out.push(' ');
                in_run = true;
            }
        } else {
            out.push(ch);
            in_run = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn test_should_normalize_empty_path_to_slash() {
        assert_eq!(canonical_uri(""), "/");
        assert_eq!(canonical_uri("/"), "/");
    }

    #[test]
    fn test_should_encode_path_segments() {
        assert_eq!(canonical_uri("/hello world"), "/hello%20world");
        assert_eq!(canonical_uri("/a/b c/d"), "/a/b%20c/d");
    }

    #[test]
    fn test_should_not_double_encode_path() {
        assert_eq!(canonical_uri("/hello%20world"), "/hello%20world");
    }

    #[test]
    fn test_should_sort_query_parameters_by_name_then_value() {
        assert_eq!(canonical_query("b=2&a=1&c=3"), "a=1&b=2&c=3");
        assert_eq!(canonical_query("k=2&k=1"), "k=1&k=2");
    }

    #[test]
    fn test_should_preserve_raw_query_values() {
        // Percent-encoded and raw special characters both pass through as-is.
        assert_eq!(
            canonical_query("events=s3%3AObjectCreated%3A%2A&prefix=p"),
            "events=s3%3AObjectCreated%3A%2A&prefix=p"
        );
        assert_eq!(canonical_query("marker=a:b*"), "marker=a:b*");
    }

    #[test]
    fn test_should_handle_valueless_query_parameters() {
        assert_eq!(canonical_query("uploads&prefix=x"), "prefix=x&uploads=");
    }

    #[test]
    fn test_should_lowercase_sort_and_trim_headers() {
        let headers = owned(&[
            ("X-Amz-Date", "20130524T000000Z"),
            ("Host", "  example.com  "),
            ("X-Custom", "a   b   c"),
        ]);
        let signed = names(&["host", "x-amz-date", "x-custom"]);
        assert_eq!(
            canonical_headers(&headers, &signed),
            "host:example.com\nx-amz-date:20130524T000000Z\nx-custom:a b c"
        );
    }

    #[test]
    fn test_should_omit_headers_not_in_signed_list() {
        let headers = owned(&[("Host", "example.com"), ("User-Agent", "curl")]);
        let signed = names(&["host"]);
        assert_eq!(canonical_headers(&headers, &signed), "host:example.com");
    }

    #[test]
    fn test_should_build_signed_header_list() {
        assert_eq!(
            signed_header_list(&names(&["x-amz-date", "Host", "range"])),
            "host;range;x-amz-date"
        );
    }

    #[test]
    fn test_should_match_aws_canonical_request_vector() {
        use sha2::{Digest, Sha256};

        // AWS SigV4 documentation example: GET /test.txt from examplebucket.
        let empty_hash = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
        let headers = owned(&[
            ("host", "examplebucket.s3.amazonaws.com"),
            ("range", "bytes=0-9"),
            ("x-amz-content-sha256", empty_hash),
            ("x-amz-date", "20130524T000000Z"),
        ]);
        let signed = names(&["host", "range", "x-amz-content-sha256", "x-amz-date"]);

        let canonical = canonical_request("GET", "/test.txt", "", &headers, &signed, empty_hash);

        assert_eq!(
            hex::encode(Sha256::digest(canonical.as_bytes())),
            "7344ae5b7ee6c3e7e6b0fe0640412a37625d1fbfff95c48bbb2dc43964946972"
        );
    }
}
