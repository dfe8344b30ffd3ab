//! Outbound signing and forwarding.
//!
//! The [`Forwarder`] rewrites an authenticated inbound request for one
//! physical bucket: it strips every header that identifies the edge hop,
//! computes a fresh body digest and timestamp, signs with the backend
//! credential pair (service `s3`, region `auto`), and dispatches over the
//! [`Transport`] collaborator. Backend responses come back whole — status,
//! headers, and body — so the dispatcher can relay failures verbatim.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use shardbucket_auth::canonical::canonical_uri;
use shardbucket_auth::{SigningRequest, hash_payload, sign_request};
use shardbucket_core::{ProxyConfig, ProxyError, ProxyResult};
use shardbucket_model::ListFragment;
use shardbucket_xml::parse_list_fragment;
use tracing::{debug, warn};

/// Credential-scope region for the backend store.
const BACKEND_REGION: &str = "auto";
/// Credential-scope service for the backend store.
const BACKEND_SERVICE: &str = "s3";

/// Headers that must never reach the backend: hop identification, signature
/// material the proxy replaces, and connection management the client owns.
const STRIPPED_HEADERS: &[&str] = &[
    "host",
    "authorization",
    "x-amz-date",
    "x-amz-content-sha256",
    "content-length",
    "connection",
    "keep-alive",
    "transfer-encoding",
    "upgrade",
    "expect",
    "accept-encoding",
    "forwarded",
    "via",
    "x-forwarded-for",
    "x-forwarded-host",
    "x-forwarded-port",
    "x-forwarded-proto",
    "x-real-ip",
    "true-client-ip",
    "cdn-loop",
    "cf-connecting-ip",
    "cf-ipcountry",
    "cf-ray",
    "cf-visitor",
    "cf-worker",
];

/// Query-string percent-encoding per SigV4: everything outside RFC 3986
/// unreserved characters, including `/`.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// An outbound request after signature headers have been computed and
/// attached. Constructed fresh per forwarded call, never reused.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    /// HTTP method.
    pub method: http::Method,
    /// Full backend URL.
    pub url: String,
    /// Request headers, `Authorization` included.
    pub headers: Vec<(String, String)>,
    /// Request body bytes.
    pub body: Bytes,
}

/// A complete backend response.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status.
    pub status: http::StatusCode,
    /// Response headers.
    pub headers: http::HeaderMap,
    /// Collected response body.
    pub body: Bytes,
}

/// The HTTP transport collaborator the forwarder dispatches over.
///
/// The proxy layers no timeout of its own; whatever the transport enforces
/// is inherited as-is.
pub trait Transport: Send + Sync + 'static {
    /// Send a signed request and collect the full response.
    fn send(
        &self,
        request: SignedRequest,
    ) -> Pin<Box<dyn Future<Output = ProxyResult<TransportResponse>> + Send + '_>>;
}

/// Production transport backed by a pooled reqwest client.
#[derive(Debug, Clone, Default)]
pub struct HttpsTransport {
    client: reqwest::Client,
}

impl HttpsTransport {
    /// Create a transport with a fresh connection pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transport for HttpsTransport {
    fn send(
        &self,
        request: SignedRequest,
    ) -> Pin<Box<dyn Future<Output = ProxyResult<TransportResponse>> + Send + '_>> {
        let client = self.client.clone();
        Box::pin(async move {
            let mut builder = client.request(request.method, &request.url);
            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }

            let response = builder
                .body(request.body)
                .send()
                .await
                .map_err(|e| ProxyError::Upstream(e.to_string()))?;

            let status = response.status();
            let headers = response.headers().clone();
            let body = response
                .bytes()
                .await
                .map_err(|e| ProxyError::Upstream(e.to_string()))?;

            Ok(TransportResponse {
                status,
                headers,
                body,
            })
        })
    }
}

/// Re-signs requests with backend credentials and dispatches them.
pub struct Forwarder {
    config: Arc<ProxyConfig>,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for Forwarder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Forwarder")
            .field("backend_host", &self.config.backend_host())
            .finish_non_exhaustive()
    }
}

impl Forwarder {
    /// Create a forwarder over the given transport.
    #[must_use]
    pub fn new(config: Arc<ProxyConfig>, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    /// Forward a single-object operation to its hash-routed bucket.
    ///
    /// The backend's response is returned whole regardless of status; error
    /// semantics belong to the backend and are relayed, not masked.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::Upstream`] only for transport-level failures.
    pub async fn forward_object(
        &self,
        parts: &http::request::Parts,
        key: &str,
        body: Bytes,
    ) -> ProxyResult<TransportResponse> {
        let bucket = self.config.buckets.pick(key);
        let path = canonical_uri(&format!("/{bucket}/{key}"));
        let query = parts.uri.query().unwrap_or("");

        let (amz_headers, passthrough) = split_forwardable_headers(&parts.headers);

        debug!(
            method = %parts.method,
            key,
            bucket,
            "forwarding object operation"
        );

        let request = self.build_signed_request(
            parts.method.clone(),
            &path,
            query,
            amz_headers,
            passthrough,
            body,
        );
        self.transport.send(request).await
    }

    /// Issue a ListObjectsV2 call against one physical bucket and parse the
    /// fragment.
    ///
    /// # Errors
    ///
    /// Unlike object forwarding, a non-success backend status is an error
    /// here: the orchestrated merge aborts on any shard failure.
    pub async fn list_shard(
        &self,
        bucket: &str,
        query_pairs: &[(String, String)],
    ) -> ProxyResult<ListFragment> {
        let query = encode_query(query_pairs);
        let path = format!("/{bucket}");

        let request = self.build_signed_request(
            http::Method::GET,
            &path,
            &query,
            Vec::new(),
            Vec::new(),
            Bytes::new(),
        );
        let response = self.transport.send(request).await?;

        if !response.status.is_success() {
            warn!(bucket, status = %response.status, "backend list call failed");
            return Err(ProxyError::Upstream(format!(
                "list on bucket {bucket} returned {}",
                response.status
            )));
        }

        parse_list_fragment(&response.body).map_err(|e| {
            ProxyError::Upstream(format!("invalid list response from bucket {bucket}: {e}"))
        })
    }

    fn build_signed_request(
        &self,
        method: http::Method,
        path: &str,
        query: &str,
        amz_headers: Vec<(String, String)>,
        passthrough: Vec<(String, String)>,
        body: Bytes,
    ) -> SignedRequest {
        let host = self.config.backend_host();
        let timestamp = chrono::Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
        let payload_hash = hash_payload(&body);

        // Everything signed: host, the fresh digest and timestamp, and any
        // surviving x-amz-* headers (SigV4 requires those be signed).
        let mut signed = vec![
            ("host".to_owned(), host.clone()),
            ("x-amz-content-sha256".to_owned(), payload_hash.clone()),
            ("x-amz-date".to_owned(), timestamp.clone()),
        ];
        signed.extend(amz_headers);

        let authorization = sign_request(
            &self.config.backend_credentials,
            &SigningRequest {
                method: method.as_str(),
                path,
                query,
                headers: &signed,
                payload_hash: &payload_hash,
                region: BACKEND_REGION,
                service: BACKEND_SERVICE,
                timestamp: &timestamp,
            },
        );

        let url = if query.is_empty() {
            format!("https://{host}{path}")
        } else {
            format!("https://{host}{path}?{query}")
        };

        // The transport derives Host from the URL.
        let mut headers: Vec<(String, String)> =
            signed.into_iter().filter(|(n, _)| n != "host").collect();
        headers.push(("authorization".to_owned(), authorization));
        headers.extend(passthrough);

        SignedRequest {
            method,
            url,
            headers,
            body,
        }
    }
}

/// Split inbound headers into x-amz-* headers that must be re-signed and
/// plain headers forwarded unsigned, dropping stripped headers entirely.
fn split_forwardable_headers(
    headers: &http::HeaderMap,
) -> (Vec<(String, String)>, Vec<(String, String)>) {
    let mut amz = Vec::new();
    let mut passthrough = Vec::new();

    for (name, value) in headers {
        let name = name.as_str().to_lowercase();
        if STRIPPED_HEADERS.contains(&name.as_str()) {
            continue;
        }
        let Ok(value) = value.to_str() else {
            continue;
        };
        if name.starts_with("x-amz-") {
            amz.push((name, value.to_owned()));
        } else {
            passthrough.push((name, value.to_owned()));
        }
    }

    (amz, passthrough)
}

/// Encode query pairs, sorted, with SigV4 percent-encoding. The same string
/// feeds both the signature and the dialed URL so they can never disagree.
fn encode_query(pairs: &[(String, String)]) -> String {
    let mut encoded: Vec<String> = pairs
        .iter()
        .map(|(name, value)| {
            format!(
                "{}={}",
                utf8_percent_encode(name, QUERY_ENCODE_SET),
                utf8_percent_encode(value, QUERY_ENCODE_SET)
            )
        })
        .collect();
    encoded.sort_unstable();
    encoded.join("&")
}

/// Build the per-shard ListObjectsV2 query pairs.
pub(crate) fn shard_list_query(
    query: &shardbucket_model::ListQuery,
    start_after: Option<&str>,
    max_keys: i32,
) -> Vec<(String, String)> {
    let mut pairs = vec![
        ("list-type".to_owned(), "2".to_owned()),
        ("max-keys".to_owned(), max_keys.to_string()),
    ];
    if let Some(ref prefix) = query.prefix {
        pairs.push(("prefix".to_owned(), prefix.clone()));
    }
    if let Some(ref delimiter) = query.delimiter {
        pairs.push(("delimiter".to_owned(), delimiter.clone()));
    }
    if query.fetch_owner {
        pairs.push(("fetch-owner".to_owned(), "true".to_owned()));
    }
    if let Some(start_after) = start_after {
        pairs.push(("start-after".to_owned(), start_after.to_owned()));
    }
    pairs
}
