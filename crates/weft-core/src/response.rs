//! HTTP response types.

use serde::Serialize;

use crate::error::HttpError;

/// HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(u16);

impl StatusCode {
    pub const OK: StatusCode = StatusCode(200);
    pub const CREATED: StatusCode = StatusCode(201);
    pub const NO_CONTENT: StatusCode = StatusCode(204);
    pub const BAD_REQUEST: StatusCode = StatusCode(400);
    pub const UNAUTHORIZED: StatusCode = StatusCode(401);
    pub const FORBIDDEN: StatusCode = StatusCode(403);
    pub const NOT_FOUND: StatusCode = StatusCode(404);
    pub const METHOD_NOT_ALLOWED: StatusCode = StatusCode(405);
    pub const CONFLICT: StatusCode = StatusCode(409);
    pub const UNPROCESSABLE_ENTITY: StatusCode = StatusCode(422);
    /// Non-standard nginx code for a client that disconnected mid-request.
    pub const CLIENT_CLOSED_REQUEST: StatusCode = StatusCode(499);
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);
    pub const SERVICE_UNAVAILABLE: StatusCode = StatusCode(503);

    /// Create a status code from a raw u16.
    #[must_use]
    pub const fn from_u16(code: u16) -> Self {
        Self(code)
    }

    /// The numeric status code.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// True for 2xx codes.
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// True for 4xx codes.
    #[must_use]
    pub const fn is_client_error(self) -> bool {
        self.0 >= 400 && self.0 < 500
    }

    /// True for 5xx codes.
    #[must_use]
    pub const fn is_server_error(self) -> bool {
        self.0 >= 500 && self.0 < 600
    }

    /// Canonical reason phrase for this code.
    #[must_use]
    pub fn canonical_reason(self) -> &'static str {
        match self.0 {
            200 => "OK",
            201 => "Created",
            204 => "No Content",
            301 => "Moved Permanently",
            302 => "Found",
            304 => "Not Modified",
            400 => "Bad Request",
            401 => "Unauthorized",
            403 => "Forbidden",
            404 => "Not Found",
            405 => "Method Not Allowed",
            409 => "Conflict",
            422 => "Unprocessable Entity",
            499 => "Client Closed Request",
            500 => "Internal Server Error",
            501 => "Not Implemented",
            503 => "Service Unavailable",
            _ => "Unknown",
        }
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.0, self.canonical_reason())
    }
}

/// Response body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ResponseBody {
    /// Empty body.
    #[default]
    Empty,
    /// Bytes body.
    Bytes(Vec<u8>),
}

impl ResponseBody {
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

/// HTTP response produced by a handler.
///
/// The transport collaborator is responsible for serializing this onto the
/// wire; the routing core only constructs and inspects it.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: ResponseBody,
}

impl Response {
    /// Create a response with the given status and no body.
    #[must_use]
    pub fn status(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: ResponseBody::Empty,
        }
    }

    /// Create a 200 OK response with no body.
    #[must_use]
    pub fn ok() -> Self {
        Self::status(StatusCode::OK)
    }

    /// Create a 204 No Content response.
    #[must_use]
    pub fn no_content() -> Self {
        Self::status(StatusCode::NO_CONTENT)
    }

    /// Append a header. Names are stored lowercase.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into().to_ascii_lowercase(), value.into()));
        self
    }

    /// Set the body.
    #[must_use]
    pub fn body(mut self, body: ResponseBody) -> Self {
        self.body = body;
        self
    }

    /// Set a plain-text body.
    #[must_use]
    pub fn body_text(self, text: impl Into<String>) -> Self {
        self.header("content-type", "text/plain; charset=utf-8")
            .body(ResponseBody::Bytes(text.into().into_bytes()))
    }

    /// Set a JSON body serialized from `value`.
    ///
    /// # Errors
    ///
    /// Returns an internal error when serialization fails.
    pub fn body_json<T: Serialize>(self, value: &T) -> Result<Self, HttpError> {
        let bytes = serde_json::to_vec(value).map_err(|err| {
            HttpError::internal()
                .with_detail("response serialization failed")
                .with_source(err)
        })?;
        Ok(self
            .header("content-type", "application/json")
            .body(ResponseBody::Bytes(bytes)))
    }

    /// Shorthand for `Response::ok().body_json(value)`.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, HttpError> {
        Self::ok().body_json(value)
    }

    /// The response status.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    /// The response headers as (lowercase name, value) pairs.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Get the first header value by name (case-insensitive).
    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    /// The response body.
    #[must_use]
    pub fn response_body(&self) -> &ResponseBody {
        &self.body
    }

    /// The body bytes decoded as UTF-8 (lossily).
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(self.body.as_bytes()).into_owned()
    }

    /// Decompose into (status, headers, body).
    #[must_use]
    pub fn into_parts(self) -> (StatusCode, Vec<(String, String)>, ResponseBody) {
        (self.status, self.headers, self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_classes() {
        assert!(StatusCode::OK.is_success());
        assert!(StatusCode::BAD_REQUEST.is_client_error());
        assert!(StatusCode::INTERNAL_SERVER_ERROR.is_server_error());
        assert!(!StatusCode::NOT_FOUND.is_success());
    }

    #[test]
    fn status_code_display() {
        assert_eq!(StatusCode::OK.to_string(), "200 OK");
        assert_eq!(StatusCode::METHOD_NOT_ALLOWED.to_string(), "405 Method Not Allowed");
        assert_eq!(StatusCode::from_u16(599).canonical_reason(), "Unknown");
    }

    #[test]
    fn text_body_sets_content_type() {
        let response = Response::ok().body_text("hello");
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(
            response.header_value("content-type"),
            Some("text/plain; charset=utf-8")
        );
        assert_eq!(response.text(), "hello");
    }

    #[test]
    fn json_body() {
        let response = Response::json(&serde_json::json!({"message": "hi"})).unwrap();
        assert_eq!(response.header_value("content-type"), Some("application/json"));
        assert_eq!(response.text(), r#"{"message":"hi"}"#);
    }

    #[test]
    fn empty_body() {
        let response = Response::no_content();
        assert!(response.response_body().is_empty());
        assert_eq!(response.status_code().as_u16(), 204);
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let response = Response::ok().header("X-Trace", "abc");
        assert_eq!(response.header_value("x-trace"), Some("abc"));
        assert_eq!(response.header_value("X-TRACE"), Some("abc"));
    }
}
