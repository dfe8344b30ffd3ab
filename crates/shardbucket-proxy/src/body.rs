//! Response body type.
//!
//! Every response the proxy produces is fully buffered before it is sent:
//! relayed backend bodies, XML documents, error messages, and liveness
//! replies are all small enough to hold in memory, and HEAD relays simply
//! carry zero bytes.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body_util::Full;

/// The HTTP response body used throughout the proxy: a buffered byte
/// sequence, possibly zero-length.
#[derive(Debug)]
pub struct ProxyBody(Full<Bytes>);

impl ProxyBody {
    /// Create a body from bytes.
    #[must_use]
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self(Full::new(data.into()))
    }

    /// Create a body from a UTF-8 string.
    #[must_use]
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(Full::new(Bytes::from(s.into())))
    }
}

impl http_body::Body for ProxyBody {
    type Data = Bytes;
    type Error = std::io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<http_body::Frame<Self::Data>, Self::Error>>> {
        Pin::new(&mut self.get_mut().0)
            .poll_frame(cx)
            .map_err(|never| match never {})
    }

    fn is_end_stream(&self) -> bool {
        self.0.is_end_stream()
    }

    fn size_hint(&self) -> http_body::SizeHint {
        self.0.size_hint()
    }
}
