//! Shared test doubles for the proxy crate.

use std::sync::{Arc, Mutex};

use bytes::Bytes;
use shardbucket_core::{BucketSet, CredentialPair, ProxyConfig, ProxyResult};

use crate::forward::{SignedRequest, Transport, TransportResponse};

/// A fixed three-bucket configuration used across unit tests.
pub(crate) fn test_config() -> Arc<ProxyConfig> {
    Arc::new(ProxyConfig {
        gateway_listen: "127.0.0.1:0".to_owned(),
        log_level: "debug".to_owned(),
        virtual_bucket: "virtual".to_owned(),
        backend_account_id: "acct".to_owned(),
        backend_domain: "r2.cloudflarestorage.com".to_owned(),
        buckets: BucketSet::parse("shard-0,shard-1,shard-2").unwrap(),
        client_credentials: CredentialPair::new("client-key", "client-secret"),
        backend_credentials: CredentialPair::new("backend-key", "backend-secret"),
    })
}

type Responder = Box<dyn Fn(&SignedRequest) -> ProxyResult<TransportResponse> + Send + Sync>;

/// Records every dispatched request and answers from a canned responder.
pub(crate) struct MockTransport {
    requests: Mutex<Vec<SignedRequest>>,
    responder: Responder,
}

impl MockTransport {
    pub(crate) fn new(
        responder: impl Fn(&SignedRequest) -> ProxyResult<TransportResponse> + Send + Sync + 'static,
    ) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            responder: Box::new(responder),
        }
    }

    /// Answers every request with an empty 200.
    pub(crate) fn ok() -> Self {
        Self::with_response(TransportResponse {
            status: http::StatusCode::OK,
            headers: http::HeaderMap::new(),
            body: Bytes::new(),
        })
    }

    /// Answers every request with a clone of the given response.
    pub(crate) fn with_response(response: TransportResponse) -> Self {
        Self::new(move |_| Ok(response.clone()))
    }

    /// Answers every request with a ListObjectsV2 body holding these keys.
    pub(crate) fn ok_list(keys: &[&str]) -> Self {
        let body = list_body(keys);
        Self::new(move |_| Ok(list_response(&body)))
    }

    pub(crate) fn requests(&self) -> Vec<SignedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// The one request that was dispatched; panics if the count differs.
    pub(crate) fn single_request(&self) -> SignedRequest {
        let requests = self.requests();
        assert_eq!(requests.len(), 1, "expected exactly one dispatched request");
        requests.into_iter().next().unwrap()
    }
}

impl Transport for MockTransport {
    fn send(
        &self,
        request: SignedRequest,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = ProxyResult<TransportResponse>> + Send + '_>,
    > {
        self.requests.lock().unwrap().push(request.clone());
        let result = (self.responder)(&request);
        Box::pin(async move { result })
    }
}

/// A 200 response carrying the given XML body.
pub(crate) fn list_response(body: &str) -> TransportResponse {
    TransportResponse {
        status: http::StatusCode::OK,
        headers: http::HeaderMap::new(),
        body: Bytes::from(body.to_owned()),
    }
}

/// A minimal backend ListObjectsV2 body with one `Contents` entry per key.
pub(crate) fn list_body(keys: &[&str]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <ListBucketResult xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">\
         <Name>shard</Name><IsTruncated>false</IsTruncated>",
    );
    for key in keys {
        xml.push_str(&format!(
            "<Contents><Key>{key}</Key>\
             <LastModified>2024-05-01T00:00:00.000Z</LastModified>\
             <ETag>&quot;d41d8cd98f00b204e9800998ecf8427e&quot;</ETag>\
             <Size>4</Size>\
             <StorageClass>STANDARD</StorageClass></Contents>"
        ));
    }
    xml.push_str("</ListBucketResult>");
    xml
}
