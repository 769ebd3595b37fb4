//! The request exchange facade consumed by the routing core.
//!
//! [`HttpExchange`] is what the transport hands to the dispatcher for each
//! inbound request: method, path, query, headers, cookies, session, and a
//! buffered request body, plus the per-request facets the router fills in
//! after matching (captured path parameters and route metadata).
//!
//! The exchange is a cheap `Arc` clone so boxed handler futures can own
//! their handle. Everything set at construction is immutable; only
//! attributes, path captures, and route metadata mutate afterwards, and
//! those are interior-locked and owned by a single request task.

use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::context::RequestContext;
use crate::error::HttpError;
use crate::query::{QueryString, percent_decode};
use crate::session::Session;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Trace,
}

impl Method {
    /// The canonical uppercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Options => "OPTIONS",
            Self::Trace => "TRACE",
        }
    }

    /// Parse a method name (case-sensitive, as on the wire).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(Self::Get),
            "HEAD" => Some(Self::Head),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "DELETE" => Some(Self::Delete),
            "PATCH" => Some(Self::Patch),
            "OPTIONS" => Some(Self::Options),
            "TRACE" => Some(Self::Trace),
            _ => None,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP headers collection with case-insensitive names.
#[derive(Debug, Default, Clone)]
pub struct Headers {
    inner: HashMap<String, String>,
}

impl Headers {
    /// Create empty headers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a header value by name (case-insensitive).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Insert a header.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner
            .insert(name.into().to_ascii_lowercase(), value.into());
    }

    /// Iterate over all headers as (name, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Number of headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Buffered request body.
#[derive(Debug, Clone, Default)]
pub enum Body {
    /// Empty body.
    #[default]
    Empty,
    /// Bytes body.
    Bytes(Vec<u8>),
}

impl Body {
    /// View the body as bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Empty => &[],
            Self::Bytes(bytes) => bytes,
        }
    }

    /// Check if the body is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

/// Raw request-body reader, the stream capability handed to handlers that
/// declare it.
///
/// The body is already buffered by the transport, so this is a cursor over
/// those bytes implementing [`std::io::Read`].
#[derive(Clone)]
pub struct BodyReader {
    bytes: Vec<u8>,
    pos: usize,
}

impl BodyReader {
    /// Create a reader over the given bytes.
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Bytes not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }
}

impl Read for BodyReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = buf.len().min(self.remaining());
        buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

impl std::fmt::Debug for BodyReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BodyReader")
            .field("len", &self.bytes.len())
            .field("pos", &self.pos)
            .finish()
    }
}

/// Metadata of the matched route, exposed to decorators for policy
/// decisions (authorization tags and the like).
#[derive(Debug, Clone)]
pub struct RouteMeta {
    name: String,
    entries: Vec<(String, Value)>,
}

impl RouteMeta {
    /// Create metadata for a named route.
    #[must_use]
    pub fn new(name: impl Into<String>, entries: Vec<(String, Value)>) -> Self {
        Self {
            name: name.into(),
            entries,
        }
    }

    /// The handler name the route was registered under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// First metadata value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Whether a metadata key is present.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// All metadata entries, in merge order.
    #[must_use]
    pub fn entries(&self) -> &[(String, Value)] {
        &self.entries
    }
}

struct ExchangeInner {
    context: RequestContext,
    method: Method,
    path: String,
    query: Option<String>,
    headers: Headers,
    body: Body,
    session: Session,
    attrs: RwLock<HashMap<String, Value>>,
    path_params: RwLock<HashMap<String, String>>,
    route: RwLock<Option<RouteMeta>>,
}

/// One inbound request plus its per-request state.
#[derive(Clone)]
pub struct HttpExchange {
    inner: Arc<ExchangeInner>,
}

impl HttpExchange {
    /// Start building an exchange. Transports call this once the request
    /// head and body have been read.
    #[must_use]
    pub fn builder(context: RequestContext, method: Method, path: impl Into<String>) -> ExchangeBuilder {
        ExchangeBuilder::new(context, method, path)
    }

    /// The request context.
    #[must_use]
    pub fn context(&self) -> &RequestContext {
        &self.inner.context
    }

    /// The request method.
    #[must_use]
    pub fn method(&self) -> Method {
        self.inner.method
    }

    /// The request path, without the query string.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.inner.path
    }

    /// The raw query string, if any.
    #[must_use]
    pub fn query_string(&self) -> Option<&str> {
        self.inner.query.as_deref()
    }

    /// Decoded value of a query parameter.
    ///
    /// A bare flag (`?force`) yields `None`; see [`HttpExchange::query_has`].
    #[must_use]
    pub fn query(&self, name: &str) -> Option<String> {
        self.inner
            .query
            .as_deref()
            .and_then(|raw| QueryString::parse(raw).value(name))
            .map(std::borrow::Cow::into_owned)
    }

    /// Whether a query parameter appears at all, even as a bare flag.
    #[must_use]
    pub fn query_has(&self, name: &str) -> bool {
        self.inner
            .query
            .as_deref()
            .is_some_and(|raw| QueryString::parse(raw).has(name))
    }

    /// A request header value.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<String> {
        self.inner.headers.get(name).map(str::to_owned)
    }

    /// All request headers.
    #[must_use]
    pub fn headers(&self) -> &Headers {
        &self.inner.headers
    }

    /// A cookie value, decoded, parsed from the `cookie` header.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<String> {
        let header = self.inner.headers.get("cookie")?;
        header.split(';').find_map(|pair| {
            let (k, v) = pair.trim().split_once('=')?;
            (k == name).then(|| percent_decode(v).into_owned())
        })
    }

    /// The request session.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    /// A request attribute, set earlier in the request by a decorator or
    /// the transport.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<Value> {
        self.inner.attrs.read().get(name).cloned()
    }

    /// Set a request attribute.
    pub fn set_attr(&self, name: impl Into<String>, value: Value) {
        self.inner.attrs.write().insert(name.into(), value);
    }

    /// A captured path parameter from the matched route.
    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<String> {
        self.inner.path_params.read().get(name).cloned()
    }

    /// Record the captured path parameters. Called by the dispatcher after
    /// a successful match.
    pub fn set_path_params(&self, params: Vec<(String, String)>) {
        *self.inner.path_params.write() = params.into_iter().collect();
    }

    /// Metadata of the matched route, if dispatch has matched one.
    #[must_use]
    pub fn route(&self) -> Option<RouteMeta> {
        self.inner.route.read().clone()
    }

    /// Record the matched route's metadata. Called by the dispatcher.
    pub fn set_route(&self, meta: RouteMeta) {
        *self.inner.route.write() = Some(meta);
    }

    /// The buffered request body.
    #[must_use]
    pub fn body(&self) -> &Body {
        &self.inner.body
    }

    /// The body bytes.
    #[must_use]
    pub fn body_bytes(&self) -> &[u8] {
        self.inner.body.as_bytes()
    }

    /// The body decoded as UTF-8 (lossily).
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(self.body_bytes()).into_owned()
    }

    /// The body parsed as JSON.
    ///
    /// # Errors
    ///
    /// Returns a bad-request error when the body is empty or not valid
    /// JSON.
    pub fn body_json(&self) -> Result<Value, HttpError> {
        if self.inner.body.is_empty() {
            return Err(HttpError::bad_request().with_detail("request body is empty"));
        }
        serde_json::from_slice(self.body_bytes()).map_err(|err| {
            HttpError::bad_request()
                .with_detail(format!("invalid request body: {err}"))
                .with_source(err)
        })
    }

    /// A fresh reader over the raw body bytes, the stream capability.
    #[must_use]
    pub fn request_stream(&self) -> BodyReader {
        BodyReader::new(self.body_bytes().to_vec())
    }
}

impl std::fmt::Debug for HttpExchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpExchange")
            .field("method", &self.inner.method)
            .field("path", &self.inner.path)
            .field("request_id", &self.inner.context.request_id())
            .finish_non_exhaustive()
    }
}

/// Builder for [`HttpExchange`].
#[derive(Debug)]
pub struct ExchangeBuilder {
    context: RequestContext,
    method: Method,
    path: String,
    query: Option<String>,
    headers: Headers,
    body: Body,
    session: Session,
}

impl ExchangeBuilder {
    /// Start a builder for the given context, method and path.
    #[must_use]
    pub fn new(context: RequestContext, method: Method, path: impl Into<String>) -> Self {
        Self {
            context,
            method,
            path: path.into(),
            query: None,
            headers: Headers::new(),
            body: Body::Empty,
            session: Session::new(),
        }
    }

    /// Set the raw query string (without the leading `?`).
    #[must_use]
    pub fn query(mut self, raw: impl Into<String>) -> Self {
        self.query = Some(raw.into());
        self
    }

    /// Add a request header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Set the body to raw bytes.
    #[must_use]
    pub fn body_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.body = Body::Bytes(bytes);
        self
    }

    /// Set a text body.
    #[must_use]
    pub fn body_text(self, text: impl Into<String>) -> Self {
        self.body_bytes(text.into().into_bytes())
    }

    /// Set a JSON body.
    #[must_use]
    pub fn body_json(self, value: &Value) -> Self {
        self.body_bytes(value.to_string().into_bytes())
    }

    /// Use an existing session instead of a fresh one.
    #[must_use]
    pub fn session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> HttpExchange {
        HttpExchange {
            inner: Arc::new(ExchangeInner {
                context: self.context,
                method: self.method,
                path: self.path,
                query: self.query,
                headers: self.headers,
                body: self.body,
                session: self.session,
                attrs: RwLock::new(HashMap::new()),
                path_params: RwLock::new(HashMap::new()),
                route: RwLock::new(None),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RequestContext;
    use asupersync::Cx;

    fn exchange(method: Method, path: &str) -> ExchangeBuilder {
        ExchangeBuilder::new(RequestContext::new(Cx::for_testing(), 1), method, path)
    }

    #[test]
    fn method_roundtrip() {
        assert_eq!(Method::parse("GET"), Some(Method::Get));
        assert_eq!(Method::parse("PATCH"), Some(Method::Patch));
        assert_eq!(Method::parse("get"), None);
        assert_eq!(Method::Delete.to_string(), "DELETE");
    }

    #[test]
    fn headers_are_case_insensitive() {
        let e = exchange(Method::Get, "/")
            .header("X-Token", "abc")
            .build();
        assert_eq!(e.header("x-token").as_deref(), Some("abc"));
        assert_eq!(e.header("X-TOKEN").as_deref(), Some("abc"));
    }

    #[test]
    fn query_values_and_flags() {
        let e = exchange(Method::Get, "/items")
            .query("q=hello%20there&force")
            .build();
        assert_eq!(e.query("q").as_deref(), Some("hello there"));
        assert_eq!(e.query("force"), None);
        assert!(e.query_has("force"));
        assert!(!e.query_has("missing"));
    }

    #[test]
    fn cookie_parsing() {
        let e = exchange(Method::Get, "/")
            .header("cookie", "a=1; token=x%20y; b=2")
            .build();
        assert_eq!(e.cookie("token").as_deref(), Some("x y"));
        assert_eq!(e.cookie("b").as_deref(), Some("2"));
        assert_eq!(e.cookie("missing"), None);
    }

    #[test]
    fn attrs_are_request_scoped() {
        let e = exchange(Method::Get, "/").build();
        assert_eq!(e.attr("user"), None);
        e.set_attr("user", Value::from("ann"));
        assert_eq!(e.attr("user"), Some(Value::from("ann")));
    }

    #[test]
    fn path_params_after_match() {
        let e = exchange(Method::Get, "/users/42").build();
        assert_eq!(e.path_param("id"), None);
        e.set_path_params(vec![("id".into(), "42".into())]);
        assert_eq!(e.path_param("id").as_deref(), Some("42"));
    }

    #[test]
    fn body_json_rejects_empty_body() {
        let e = exchange(Method::Post, "/").build();
        let err = e.body_json().unwrap_err();
        assert_eq!(err.status.as_u16(), 400);
    }

    #[test]
    fn body_json_parses() {
        let e = exchange(Method::Post, "/")
            .body_json(&serde_json::json!({"name": "Ann"}))
            .build();
        let body = e.body_json().unwrap();
        assert_eq!(body["name"], "Ann");
    }

    #[test]
    fn request_stream_reads_body() {
        let e = exchange(Method::Post, "/").body_text("hello").build();
        let mut reader = e.request_stream();
        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        assert_eq!(out, "hello");
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn route_meta_lookup() {
        let meta = RouteMeta::new(
            "get_user",
            vec![("role".into(), Value::from("admin"))],
        );
        assert_eq!(meta.name(), "get_user");
        assert!(meta.has("role"));
        assert_eq!(meta.get("role"), Some(&Value::from("admin")));
        assert!(!meta.has("missing"));
    }

    #[test]
    fn exchange_clones_share_state() {
        let e = exchange(Method::Get, "/").build();
        let clone = e.clone();
        e.set_attr("k", Value::from(1));
        assert_eq!(clone.attr("k"), Some(Value::from(1)));
    }
}
