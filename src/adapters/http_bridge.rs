//! Bridge between the engine's native request/response objects and the
//! neutral model.
//!
//! One native inbound request becomes exactly one native outbound response:
//! translate in, dispatch to the handler behind a fault boundary, translate
//! out. Handler failures and panics are mapped to fixed error responses here
//! and never reach the engine, where an escaped failure could corrupt
//! connection state.

use std::{
    any::Any,
    io,
    net::SocketAddr,
    panic::AssertUnwindSafe,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use axum::body::Body as NativeBody;
use bytes::Bytes;
use futures_util::{FutureExt, StreamExt, stream::BoxStream};
use http::{HeaderName, HeaderValue, StatusCode, header};
use hyper::{
    Request as NativeRequest, Response as NativeResponse,
    body::{Body as _, Frame, SizeHint},
};
use thiserror::Error;
use tracing::Instrument;

use crate::{
    core::{Body, Headers, InvalidMethod, Method, Request, RequestSource, Response, Scheme},
    ports::{Handler, HandlerError},
};

/// Headers whose values are always derived by the engine from the body's
/// actual framing; copying them through would double-specify the framing.
const RESERVED_HEADERS: [&str; 2] = ["content-length", "transfer-encoding"];

/// A failure surfaced at the adapter boundary.
///
/// Dispatch is an explicit `Result<Response, Fault>` step with a fixed
/// fault-to-response mapping, rather than exception interception.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Fault {
    /// The inbound method token is not a supported verb
    #[error(transparent)]
    Method(#[from] InvalidMethod),
    /// The handler returned an error
    #[error(transparent)]
    Handler(#[from] HandlerError),
    /// The handler panicked mid-dispatch
    #[error("Handler panicked: {0}")]
    Panic(String),
}

impl Fault {
    fn status(&self) -> u16 {
        match self {
            Fault::Method(_) | Fault::Handler(HandlerError::BadRequest(_)) => 400,
            Fault::Handler(_) | Fault::Panic(_) => 500,
        }
    }

    /// The fixed, well-formed error response for this fault
    pub fn to_response(&self) -> Response {
        let response = Response::new(self.status());
        let reason = response.reason().to_string();
        response.with_body(reason)
    }
}

/// Transport adapter: adapts a [`Handler`] onto the native engine types.
pub struct HttpBridge {
    handler: Arc<dyn Handler>,
    default_scheme: Scheme,
}

impl HttpBridge {
    pub fn new(handler: Arc<dyn Handler>) -> Self {
        Self {
            handler,
            default_scheme: Scheme::Http,
        }
    }

    /// Scheme recorded in request provenance when the request target does
    /// not carry one (origin-form targets never do)
    pub fn with_default_scheme(mut self, scheme: Scheme) -> Self {
        self.default_scheme = scheme;
        self
    }

    /// Serve one native request, producing one native response.
    ///
    /// Infallible by construction: every fault is mapped to an error
    /// response before it can reach the engine.
    pub async fn serve(
        &self,
        req: NativeRequest<NativeBody>,
        peer: SocketAddr,
    ) -> NativeResponse<NativeBody> {
        let span = tracing::info_span!(
            "request",
            http.method = %req.method(),
            http.path = %req.uri().path(),
            peer = %peer,
        );

        async move {
            match self.dispatch(req, peer).await {
                Ok(response) => {
                    tracing::debug!(status = response.status(), "Request handled");
                    response_into_native(response)
                }
                Err(fault) => {
                    tracing::error!(error = %fault, "Request faulted");
                    response_into_native(fault.to_response())
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn dispatch(
        &self,
        req: NativeRequest<NativeBody>,
        peer: SocketAddr,
    ) -> Result<Response, Fault> {
        let request = request_from_native(req, peer, self.default_scheme)?;

        match AssertUnwindSafe(self.handler.handle(request))
            .catch_unwind()
            .await
        {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(Fault::Handler(e)),
            Err(panic) => Err(Fault::Panic(panic_message(panic.as_ref()))),
        }
    }
}

/// Translate a native inbound request into the neutral model.
///
/// Extracting provenance from the peer address cannot fail; an unrecognized
/// method is the only rejection, handled by the fault boundary above.
pub fn request_from_native(
    req: NativeRequest<NativeBody>,
    peer: SocketAddr,
    default_scheme: Scheme,
) -> Result<Request, InvalidMethod> {
    let (parts, body) = req.into_parts();

    let method: Method = parts.method.as_str().parse()?;

    let target = match parts.uri.query() {
        Some(query) if !query.trim().is_empty() => format!("{}?{}", parts.uri.path(), query),
        _ => parts.uri.path().to_string(),
    };

    let mut headers = Headers::new();
    for (name, value) in &parts.headers {
        headers.insert(name.as_str(), String::from_utf8_lossy(value.as_bytes()));
    }

    // A malformed Content-Length downgrades to "unknown length" rather than
    // rejecting the request; the stream is then read to exhaustion.
    let declared_length = headers
        .get(header::CONTENT_LENGTH.as_str())
        .and_then(|v| v.trim().parse::<u64>().ok());

    // Decide once whether this request carries a body; no capability probing
    // later in the pipeline.
    let body = if body.is_end_stream() {
        Body::empty()
    } else {
        let stream = body
            .into_data_stream()
            .map(|chunk| chunk.map_err(io::Error::other));
        Body::from_stream(stream, declared_length)
    };

    let scheme = match parts.uri.scheme_str() {
        Some("https") => Scheme::Https,
        Some("http") => Scheme::Http,
        _ => default_scheme,
    };
    let source = RequestSource::new(peer.ip().to_string(), peer.port(), scheme);

    Ok(Request::new(method, target)
        .with_headers(headers)
        .with_body(body)
        .with_source(source))
}

/// Translate a neutral response onto the native outbound type.
pub fn response_into_native(response: Response) -> NativeResponse<NativeBody> {
    let (status, _reason, headers, body) = response.into_parts();

    let mut native = NativeResponse::new(native_body(body));
    *native.status_mut() =
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let map = native.headers_mut();
    for (name, value) in headers.iter() {
        if RESERVED_HEADERS.iter().any(|r| name.eq_ignore_ascii_case(r)) {
            tracing::debug!(header = name, "Skipping engine-derived framing header");
            continue;
        }
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(header_name), Ok(header_value)) => {
                map.append(header_name, header_value);
            }
            _ => {
                tracing::warn!(header = name, "Dropping header with invalid name or value");
            }
        }
    }

    // Entity writing needs a content type; fall back to the wildcard.
    if !map.contains_key(header::CONTENT_TYPE) {
        map.insert(header::CONTENT_TYPE, HeaderValue::from_static("*/*"));
    }

    native
}

fn native_body(body: Body) -> NativeBody {
    let (length, stream) = body.into_parts();
    match length {
        Some(0) => NativeBody::empty(),
        length => NativeBody::new(StreamingBody {
            stream,
            remaining: length,
        }),
    }
}

/// Body handed to the engine: exact size hint when the length is known (the
/// engine emits Content-Length), open-ended otherwise (the engine chunks
/// until stream end).
struct StreamingBody {
    stream: BoxStream<'static, io::Result<Bytes>>,
    remaining: Option<u64>,
}

impl hyper::body::Body for StreamingBody {
    type Data = Bytes;
    type Error = io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        match this.stream.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                if let Some(remaining) = &mut this.remaining {
                    *remaining = remaining.saturating_sub(chunk.len() as u64);
                }
                Poll::Ready(Some(Ok(Frame::data(chunk))))
            }
            Poll::Ready(Some(Err(e))) => Poll::Ready(Some(Err(e))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }

    fn size_hint(&self) -> SizeHint {
        match self.remaining {
            Some(remaining) => SizeHint::with_exact(remaining),
            None => SizeHint::default(),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::HandlerError;

    fn peer() -> SocketAddr {
        "127.0.0.1:1234".parse().unwrap()
    }

    fn native_get(uri: &str) -> NativeRequest<NativeBody> {
        NativeRequest::builder()
            .method("GET")
            .uri(uri)
            .body(NativeBody::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn get_with_query_translates() {
        let request = request_from_native(native_get("/search?q=http4k"), peer(), Scheme::Http)
            .unwrap();

        assert_eq!(request.method(), Method::Get);
        assert_eq!(request.target(), "/search?q=http4k");
        assert_eq!(request.body().length(), Some(0));
        assert_eq!(request.source().host, "127.0.0.1");
        assert_eq!(request.source().port, 1234);
        assert_eq!(request.source().scheme, Scheme::Http);
    }

    #[tokio::test]
    async fn blank_query_is_dropped_from_target() {
        let request = request_from_native(native_get("/search?"), peer(), Scheme::Http).unwrap();
        assert_eq!(request.target(), "/search");
    }

    #[tokio::test]
    async fn declared_content_length_is_carried() {
        let native = NativeRequest::builder()
            .method("POST")
            .uri("/upload")
            .header("Content-Length", "5")
            .body(NativeBody::from("hello"))
            .unwrap();

        let request = request_from_native(native, peer(), Scheme::Http).unwrap();
        assert_eq!(request.body().length(), Some(5));
        assert_eq!(&request.into_body().collect().await.unwrap()[..], b"hello");
    }

    #[tokio::test]
    async fn unparseable_content_length_means_unknown() {
        let native = NativeRequest::builder()
            .method("POST")
            .uri("/upload")
            .header("Content-Length", "five")
            .body(NativeBody::from("hello"))
            .unwrap();

        let request = request_from_native(native, peer(), Scheme::Http).unwrap();
        assert_eq!(request.body().length(), None);
        assert_eq!(&request.into_body().collect().await.unwrap()[..], b"hello");
    }

    #[tokio::test]
    async fn headers_are_copied_in_order() {
        let native = NativeRequest::builder()
            .method("GET")
            .uri("/")
            .header("Accept", "text/plain")
            .header("X-Trace", "abc")
            .header("Accept", "application/json")
            .body(NativeBody::empty())
            .unwrap();

        let request = request_from_native(native, peer(), Scheme::Http).unwrap();
        let accepts: Vec<_> = request.headers().get_all("accept").collect();
        assert_eq!(accepts, vec!["text/plain", "application/json"]);
        assert_eq!(request.header("x-trace"), Some("abc"));
    }

    #[tokio::test]
    async fn unknown_method_is_rejected() {
        let native = NativeRequest::builder()
            .method("BREW")
            .uri("/coffee")
            .body(NativeBody::empty())
            .unwrap();

        assert!(request_from_native(native, peer(), Scheme::Http).is_err());
    }

    #[tokio::test]
    async fn reserved_framing_headers_are_never_copied_out() {
        let response = Response::not_found()
            .with_header("Content-Length", "999")
            .with_header("Transfer-Encoding", "chunked")
            .with_header("X-Reason", "not-found");

        let native = response_into_native(response);
        assert_eq!(native.status(), StatusCode::NOT_FOUND);
        assert!(!native.headers().contains_key(header::CONTENT_LENGTH));
        assert!(!native.headers().contains_key(header::TRANSFER_ENCODING));
        assert_eq!(native.headers().get("X-Reason").unwrap(), "not-found");
    }

    #[tokio::test]
    async fn content_type_defaults_to_wildcard() {
        let native = response_into_native(Response::ok());
        assert_eq!(native.headers().get(header::CONTENT_TYPE).unwrap(), "*/*");

        let explicit = response_into_native(
            Response::ok().with_header("Content-Type", "application/json"),
        );
        assert_eq!(
            explicit.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[tokio::test]
    async fn invalid_status_degrades_to_500() {
        let native = response_into_native(Response::new(9999));
        assert_eq!(native.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    async fn failing(_req: Request) -> Result<Response, HandlerError> {
        Err(HandlerError::Internal("database gone".to_string()))
    }

    async fn exploding(_req: Request) -> Result<Response, HandlerError> {
        panic!("boom")
    }

    #[tokio::test]
    async fn handler_errors_map_to_500() {
        use http_body_util::BodyExt;

        let bridge = HttpBridge::new(Arc::new(failing));
        let native = bridge.serve(native_get("/"), peer()).await;
        assert_eq!(native.status(), StatusCode::INTERNAL_SERVER_ERROR);

        // Body carries the fixed reason text, never handler internals
        let bytes = native.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"Internal Server Error");
    }

    #[tokio::test]
    async fn handler_panics_map_to_500() {
        let bridge = HttpBridge::new(Arc::new(exploding));
        let native = bridge.serve(native_get("/"), peer()).await;
        assert_eq!(native.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn unknown_method_maps_to_400_at_the_boundary() {
        let bridge = HttpBridge::new(Arc::new(|_req: Request| async {
            Ok::<_, HandlerError>(Response::ok())
        }));
        let native = NativeRequest::builder()
            .method("BREW")
            .uri("/coffee")
            .body(NativeBody::empty())
            .unwrap();
        let response = bridge.serve(native, peer()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
