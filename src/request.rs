//! Transport-neutral view of an incoming request.
//!
//! [`BindRequest`] carries exactly what the binder needs: router-supplied path
//! variables, decoded query pairs, headers and an optional body stream. Adapters
//! build it from an [`http::Request`] or piece by piece.

use crate::ids::{RequestId, REQUEST_ID_HEADER};
use http::Method;
use smallvec::SmallVec;
use std::fmt;
use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Maximum inline path/query parameters before heap allocation
pub const MAX_INLINE_PARAMS: usize = 8;

/// Maximum inline headers before heap allocation
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated name/value pairs for path variables and query parameters
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Stack-allocated header storage (names lowercased)
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Shared flag the transport sets when the client goes away.
///
/// The body reader checks it between chunks, so an in-flight read stops at the
/// next chunk boundary.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Owned request body.
///
/// Dropping the stream releases the underlying reader; the body pipeline takes
/// ownership and drops it on every exit path.
pub struct BodyStream {
    reader: Box<dyn Read + Send>,
    content_length: Option<u64>,
    cancellation: Option<CancellationFlag>,
}

impl BodyStream {
    pub fn from_reader(reader: impl Read + Send + 'static) -> Self {
        Self {
            reader: Box::new(reader),
            content_length: None,
            cancellation: None,
        }
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        let len = bytes.len() as u64;
        Self::from_reader(io::Cursor::new(bytes)).with_content_length(len)
    }

    /// Length announced by the client (`Content-Length`), if any.
    pub fn with_content_length(mut self, len: u64) -> Self {
        self.content_length = Some(len);
        self
    }

    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancellation = Some(flag);
        self
    }

    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .map(CancellationFlag::is_cancelled)
            .unwrap_or(false)
    }
}

impl Read for BodyStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.is_cancelled() {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionAborted,
                "request cancelled",
            ));
        }
        self.reader.read(buf)
    }
}

impl fmt::Debug for BodyStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodyStream")
            .field("content_length", &self.content_length)
            .field("cancellable", &self.cancellation.is_some())
            .finish_non_exhaustive()
    }
}

/// Request data the binder reads parameters from.
#[derive(Debug)]
pub struct BindRequest {
    /// Correlation id for logs
    pub request_id: RequestId,
    pub method: Method,
    /// Request path without the query string
    pub path: String,
    /// Path variables supplied by the router
    pub path_params: ParamVec,
    /// Decoded query pairs in request order
    pub query_params: ParamVec,
    /// Headers with lowercase names in request order
    pub headers: HeaderVec,
    /// Body stream; `None` when the request carries no body at all
    pub body: Option<BodyStream>,
}

/// Parse the query string of a request target.
///
/// Everything after the first `?` is form-url-decoded. Repeated names are kept in
/// order; lookups take the first occurrence.
pub fn parse_query_params(path: &str) -> ParamVec {
    match path.split_once('?') {
        Some((_, query)) => url::form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (Arc::from(k.as_ref()), v.into_owned()))
            .collect(),
        None => ParamVec::new(),
    }
}

impl BindRequest {
    /// Start a request from a method and a request target (`/path?query`).
    pub fn new(method: Method, target: &str) -> Self {
        let path = target.split('?').next().unwrap_or("/").to_string();
        Self {
            request_id: RequestId::new(),
            method,
            path,
            path_params: ParamVec::new(),
            query_params: parse_query_params(target),
            headers: HeaderVec::new(),
            body: None,
        }
    }

    /// Convert an [`http::Request`] whose body is readable.
    ///
    /// `path_params` are the variables the router matched for this request.
    pub fn from_http<B, I, K, V>(req: http::Request<B>, path_params: I) -> Self
    where
        B: Read + Send + 'static,
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let (parts, body) = req.into_parts();
        let target = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let mut request = BindRequest::new(parts.method.clone(), target);

        for (name, value) in parts.headers.iter() {
            request.headers.push((
                Arc::from(name.as_str()),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            ));
        }
        for (name, value) in path_params {
            request.path_params.push((Arc::from(name.as_ref()), value.into()));
        }

        let mut stream = BodyStream::from_reader(body);
        if let Some(len) = request
            .get_header(http::header::CONTENT_LENGTH.as_str())
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            stream = stream.with_content_length(len);
        }
        request.body = Some(stream);
        request.request_id =
            RequestId::from_header_or_new(request.get_header(REQUEST_ID_HEADER));

        debug!(
            request_id = %request.request_id,
            method = %request.method,
            path = %request.path,
            header_count = request.headers.len(),
            query_count = request.query_params.len(),
            path_param_count = request.path_params.len(),
            "Bind request assembled"
        );
        request
    }

    pub fn with_path_param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.path_params.push((Arc::from(name), value.into()));
        self
    }

    /// Add a header; an `x-request-id` header also sets [`request_id`](Self::request_id).
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        let name = name.to_ascii_lowercase();
        let value = value.into();
        if name == REQUEST_ID_HEADER && self.get_header(REQUEST_ID_HEADER).is_none() {
            self.request_id = RequestId::from_header_or_new(Some(&value));
        }
        self.headers.push((Arc::from(name.as_str()), value));
        self
    }

    pub fn with_body(mut self, body: BodyStream) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_body_bytes(self, bytes: impl Into<Vec<u8>>) -> Self {
        self.with_body(BodyStream::from_bytes(bytes))
    }

    /// Get a path variable by name
    #[inline]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get the first query value for `name`
    #[inline]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get the first header value for `name` (case-insensitive per RFC 7230)
    #[inline]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Move the body stream out of the request.
    pub fn take_body(&mut self) -> Option<BodyStream> {
        self.body.take()
    }
}
