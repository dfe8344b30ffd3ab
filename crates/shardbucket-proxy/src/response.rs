//! Response assembly: proxy-generated errors, XML payloads, and verbatim
//! relays of backend responses.

use shardbucket_core::ProxyError;
use shardbucket_xml::error_to_xml;

use crate::body::ProxyBody;
use crate::forward::TransportResponse;

/// `Server` header value on every proxy-generated response.
pub(crate) const SERVER_NAME: &str = "shardbucket";

/// Headers never copied from a backend response. The relay re-frames the
/// body and owns the connection, and the proxy stamps its own request id.
const STRIPPED_RESPONSE_HEADERS: &[&str] = &[
    "connection",
    "transfer-encoding",
    "content-length",
    "keep-alive",
    "x-amz-request-id",
];

/// Build the response for a proxy-generated error.
///
/// Authentication failures carry the fixed plain-text body clients key on;
/// every other error is an S3-style XML error document.
pub(crate) fn error_response(error: &ProxyError, request_id: &str) -> http::Response<ProxyBody> {
    let status = error.status_code();
    match error {
        ProxyError::Unauthorized => {
            build(status, "text/plain", request_id, ProxyBody::from_string(error.to_string()))
        }
        _ => {
            let code = match error {
                ProxyError::BadRequest(_) => "InvalidArgument",
                ProxyError::NotImplemented(_) => "NotImplemented",
                _ => "InternalError",
            };
            let body = error_to_xml(code, &error.to_string(), request_id);
            build(status, "application/xml", request_id, ProxyBody::from_bytes(body))
        }
    }
}

/// Build a 200 response carrying an XML document.
pub(crate) fn xml_response(body: Vec<u8>, request_id: &str) -> http::Response<ProxyBody> {
    build(
        http::StatusCode::OK,
        "application/xml",
        request_id,
        ProxyBody::from_bytes(body),
    )
}

/// The liveness response, served before authentication.
pub(crate) fn health_response(request_id: &str) -> http::Response<ProxyBody> {
    build(
        http::StatusCode::OK,
        "text/plain",
        request_id,
        ProxyBody::from_string("ok"),
    )
}

/// Relay a backend response to the client: status and body verbatim, headers
/// verbatim minus connection framing.
pub(crate) fn relay_response(
    upstream: TransportResponse,
    request_id: &str,
) -> http::Response<ProxyBody> {
    let mut builder = http::Response::builder().status(upstream.status);
    for (name, value) in &upstream.headers {
        if STRIPPED_RESPONSE_HEADERS.contains(&name.as_str()) {
            continue;
        }
        builder = builder.header(name, value);
    }
    builder
        .header("x-amz-request-id", request_id)
        .header(http::header::SERVER, SERVER_NAME)
        .body(ProxyBody::from_bytes(upstream.body))
        .expect("relayed headers are already valid header values")
}

fn build(
    status: http::StatusCode,
    content_type: &str,
    request_id: &str,
    body: ProxyBody,
) -> http::Response<ProxyBody> {
    http::Response::builder()
        .status(status)
        .header(http::header::CONTENT_TYPE, content_type)
        .header("x-amz-request-id", request_id)
        .header(http::header::SERVER, SERVER_NAME)
        .body(body)
        .expect("static response construction cannot fail")
}
