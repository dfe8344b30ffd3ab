//! The hyper service: verify, classify, delegate, respond.
//!
//! Every connection shares one [`ProxyService`]; the service itself is a
//! cheap `Arc` handle over immutable state. Each request is assigned a
//! request id that appears in logs and in the `x-amz-request-id` response
//! header.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http_body_util::BodyExt;
use shardbucket_auth::{hash_payload, verify_request};
use shardbucket_core::{ProxyConfig, ProxyError};
use shardbucket_xml::list_result_to_xml;
use tracing::{info, warn};

use crate::body::ProxyBody;
use crate::classify::{RequestKind, classify};
use crate::forward::{Forwarder, Transport};
use crate::list::ListOrchestrator;
use crate::response::{error_response, health_response, relay_response, xml_response};

/// The per-process request handler, cloned per connection.
#[derive(Debug, Clone)]
pub struct ProxyService {
    state: Arc<ServiceState>,
}

#[derive(Debug)]
struct ServiceState {
    config: Arc<ProxyConfig>,
    forwarder: Arc<Forwarder>,
    orchestrator: ListOrchestrator,
}

impl ProxyService {
    /// Build the service over the given transport.
    #[must_use]
    pub fn new(config: Arc<ProxyConfig>, transport: Arc<dyn Transport>) -> Self {
        let forwarder = Arc::new(Forwarder::new(Arc::clone(&config), transport));
        let orchestrator = ListOrchestrator::new(Arc::clone(&config), Arc::clone(&forwarder));
        Self {
            state: Arc::new(ServiceState {
                config,
                forwarder,
                orchestrator,
            }),
        }
    }
}

impl<B> hyper::service::Service<http::Request<B>> for ProxyService
where
    B: http_body::Body + Send + 'static,
    B::Data: Send,
    B::Error: std::fmt::Display,
{
    type Response = http::Response<ProxyBody>;
    type Error = std::convert::Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, request: http::Request<B>) -> Self::Future {
        let state = Arc::clone(&self.state);
        Box::pin(async move { Ok(state.handle(request).await) })
    }
}

impl ServiceState {
    async fn handle<B>(&self, request: http::Request<B>) -> http::Response<ProxyBody>
    where
        B: http_body::Body + Send + 'static,
        B::Data: Send,
        B::Error: std::fmt::Display,
    {
        let request_id = uuid::Uuid::new_v4().to_string();
        let (parts, body) = request.into_parts();

        info!(
            %request_id,
            method = %parts.method,
            path = parts.uri.path(),
            "request received"
        );

        // Liveness, served before any authentication.
        if parts.method == http::Method::GET && parts.uri.path() == "/_health" {
            return health_response(&request_id);
        }

        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                warn!(%request_id, error = %e, "failed to read request body");
                return error_response(
                    &ProxyError::BadRequest("failed to read request body".to_owned()),
                    &request_id,
                );
            }
        };

        // Every authentication failure collapses into one generic 401 so the
        // response never reveals which check failed.
        let body_hash = hash_payload(&body);
        if let Err(e) = verify_request(&parts, &body_hash, &self.config.client_credentials) {
            warn!(%request_id, error = %e, "rejecting unsigned or invalid request");
            return error_response(&ProxyError::Unauthorized, &request_id);
        }

        let kind = match classify(&parts) {
            Ok(kind) => kind,
            Err(e) => return error_response(&e, &request_id),
        };

        let result = match kind {
            RequestKind::Object { key } => self
                .forwarder
                .forward_object(&parts, &key, body)
                .await
                .map(|upstream| relay_response(upstream, &request_id)),
            RequestKind::ListV2(query) => match self.orchestrator.list(&query).await {
                Ok(merged) => list_result_to_xml(&merged)
                    .map(|xml| xml_response(xml, &request_id))
                    .map_err(|e| ProxyError::Internal(e.into())),
                Err(e) => Err(e),
            },
            RequestKind::NotImplemented(feature) => {
                Err(ProxyError::NotImplemented(feature.to_owned()))
            }
        };

        match result {
            Ok(response) => {
                info!(%request_id, status = %response.status(), "request complete");
                response
            }
            Err(e) => {
                warn!(%request_id, error = %e, "request failed");
                error_response(&e, &request_id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forward::{SignedRequest, TransportResponse};
    use crate::testing::{MockTransport, list_body, list_response, test_config};
    use bytes::Bytes;
    use chrono::Utc;
    use http_body_util::Full;
    use shardbucket_auth::{SigningRequest, sign_request};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Sign a request the way a client SDK would, against the client pair.
    fn signed_request(method: &str, uri: &str, body: &[u8]) -> http::Request<Full<Bytes>> {
        let config = test_config();
        let timestamp = Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
        let payload_hash = hash_payload(body);

        let (path, query) = match uri.split_once('?') {
            Some((p, q)) => (p, q),
            None => (uri, ""),
        };
        let headers = vec![
            ("host".to_owned(), "proxy.example.com".to_owned()),
            ("x-amz-content-sha256".to_owned(), payload_hash.clone()),
            ("x-amz-date".to_owned(), timestamp.clone()),
        ];
        let authorization = sign_request(
            &config.client_credentials,
            &SigningRequest {
                method,
                path,
                query,
                headers: &headers,
                payload_hash: &payload_hash,
                region: "us-east-1",
                service: "s3",
                timestamp: &timestamp,
            },
        );

        http::Request::builder()
            .method(method)
            .uri(uri)
            .header("host", "proxy.example.com")
            .header("x-amz-content-sha256", payload_hash)
            .header("x-amz-date", timestamp)
            .header("authorization", authorization)
            .body(Full::new(Bytes::copy_from_slice(body)))
            .unwrap()
    }

    fn service(transport: Arc<MockTransport>) -> ProxyService {
        ProxyService::new(test_config(), transport as _)
    }

    async fn dispatch(
        service: &ProxyService,
        request: http::Request<Full<Bytes>>,
    ) -> http::Response<ProxyBody> {
        use hyper::service::Service;
        service.call(request).await.unwrap()
    }

    async fn body_text(response: http::Response<ProxyBody>) -> String {
        let collected = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(collected.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_should_round_trip_put_then_get_through_backend() {
        // Backend double that actually stores and serves bodies.
        let store: Arc<Mutex<HashMap<String, Bytes>>> = Arc::new(Mutex::new(HashMap::new()));
        let transport = {
            let store = Arc::clone(&store);
            Arc::new(MockTransport::new(move |request: &SignedRequest| {
                let path = request.url.splitn(4, '/').nth(3).unwrap_or("").to_owned();
                let mut store = store.lock().unwrap();
                let (status, body) = match request.method.as_str() {
                    "PUT" => {
                        store.insert(path, request.body.clone());
                        (http::StatusCode::OK, Bytes::new())
                    }
                    _ => match store.get(&path) {
                        Some(body) => (http::StatusCode::OK, body.clone()),
                        None => (http::StatusCode::NOT_FOUND, Bytes::new()),
                    },
                };
                Ok(TransportResponse {
                    status,
                    headers: http::HeaderMap::new(),
                    body,
                })
            }))
        };
        let service = service(transport);

        let put = dispatch(&service, signed_request("PUT", "/file1.txt", b"hello")).await;
        assert_eq!(put.status(), http::StatusCode::OK);

        let get = dispatch(&service, signed_request("GET", "/file1.txt", b"")).await;
        assert_eq!(get.status(), http::StatusCode::OK);
        assert_eq!(body_text(get).await, "hello");
    }

    #[tokio::test]
    async fn test_should_relay_head_without_body() {
        let mut headers = http::HeaderMap::new();
        headers.insert("etag", "\"abc\"".parse().unwrap());
        headers.insert("content-length", "5".parse().unwrap());
        let transport = Arc::new(MockTransport::with_response(TransportResponse {
            status: http::StatusCode::OK,
            headers,
            body: Bytes::new(),
        }));
        let service = service(Arc::clone(&transport));

        let response = dispatch(&service, signed_request("HEAD", "/file1.txt", b"")).await;

        assert_eq!(response.status(), http::StatusCode::OK);
        assert_eq!(response.headers()["etag"], "\"abc\"");
        assert_eq!(body_text(response).await, "");

        let sent = transport.single_request();
        assert_eq!(sent.method, http::Method::HEAD);
        assert!(sent.body.is_empty());
    }

    #[tokio::test]
    async fn test_should_reject_missing_authorization_with_fixed_body() {
        let service = service(Arc::new(MockTransport::ok()));

        let request = http::Request::builder()
            .method("PUT")
            .uri("/file1.txt")
            .body(Full::new(Bytes::from_static(b"hello")))
            .unwrap();
        let response = dispatch(&service, request).await;

        assert_eq!(response.status(), http::StatusCode::UNAUTHORIZED);
        assert_eq!(body_text(response).await, "Unauthorized: Invalid signature");
    }

    #[tokio::test]
    async fn test_should_reject_tampered_body() {
        let service = service(Arc::new(MockTransport::ok()));

        let mut request = signed_request("PUT", "/file1.txt", b"hello");
        *request.body_mut() = Full::new(Bytes::from_static(b"tampered"));
        let response = dispatch(&service, request).await;

        assert_eq!(response.status(), http::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_should_answer_501_for_list_v1() {
        let transport = Arc::new(MockTransport::ok());
        let service = service(Arc::clone(&transport));

        let response = dispatch(&service, signed_request("GET", "/?list-type=1", b"")).await;

        assert_eq!(response.status(), http::StatusCode::NOT_IMPLEMENTED);
        assert!(body_text(response).await.contains("ListObjects v1"));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_should_merge_list_v2_across_buckets() {
        let transport = Arc::new(MockTransport::new(|request: &SignedRequest| {
            let keys: &[&str] = if request.url.contains("/shard-0?") {
                &["b", "d"]
            } else if request.url.contains("/shard-1?") {
                &["a", "c"]
            } else {
                &[]
            };
            Ok(list_response(&list_body(keys)))
        }));
        let service = service(Arc::clone(&transport));

        let response = dispatch(&service, signed_request("GET", "/?list-type=2", b"")).await;
        assert_eq!(response.status(), http::StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"].to_str().unwrap(),
            "application/xml"
        );
        assert_eq!(transport.requests().len(), 3);

        let body = body_text(response).await;
        let positions: Vec<usize> = ["<Key>a</Key>", "<Key>b</Key>", "<Key>c</Key>", "<Key>d</Key>"]
            .iter()
            .map(|needle| body.find(needle).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(body.contains("<Name>virtual</Name>"));
        assert!(body.contains("<IsTruncated>false</IsTruncated>"));
    }

    #[tokio::test]
    async fn test_should_answer_400_for_malformed_continuation_token() {
        let service = service(Arc::new(MockTransport::ok()));

        let response = dispatch(
            &service,
            signed_request("GET", "/?list-type=2&continuation-token=garbage", b""),
        )
        .await;

        assert_eq!(response.status(), http::StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("<Code>InvalidArgument</Code>"));
    }

    #[tokio::test]
    async fn test_should_serve_health_without_authentication() {
        let service = service(Arc::new(MockTransport::ok()));

        let request = http::Request::builder()
            .method("GET")
            .uri("/_health")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let response = dispatch(&service, request).await;

        assert_eq!(response.status(), http::StatusCode::OK);
        assert_eq!(body_text(response).await, "ok");
    }

    #[tokio::test]
    async fn test_should_stamp_request_id_on_every_response() {
        let service = service(Arc::new(MockTransport::ok()));

        let response = dispatch(&service, signed_request("GET", "/file1.txt", b"")).await;
        assert!(response.headers().contains_key("x-amz-request-id"));
    }
}
