//! Request-time error type.

use std::sync::Arc;

use crate::context::CancelledError;
use crate::response::StatusCode;

/// An error produced while serving a single request.
///
/// Carries the status the external status-mapping collaborator should use,
/// an optional human-readable detail, and an optional underlying cause.
/// Handler errors and binding failures are both expressed as `HttpError`;
/// nothing inside the dispatch core converts them to responses.
#[derive(Debug, Clone)]
pub struct HttpError {
    /// Status that a response for this error should carry.
    pub status: StatusCode,
    /// Human-readable detail, if any.
    pub detail: Option<String>,
    source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl HttpError {
    /// Create an error with the given status.
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            detail: None,
            source: None,
        }
    }

    /// 400 Bad Request.
    #[must_use]
    pub fn bad_request() -> Self {
        Self::new(StatusCode::BAD_REQUEST)
    }

    /// 401 Unauthorized.
    #[must_use]
    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED)
    }

    /// 403 Forbidden.
    #[must_use]
    pub fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN)
    }

    /// 404 Not Found.
    #[must_use]
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND)
    }

    /// 405 Method Not Allowed.
    #[must_use]
    pub fn method_not_allowed() -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED)
    }

    /// 500 Internal Server Error.
    #[must_use]
    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Attach a detail message.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Attach an underlying cause.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// The detail message, if any.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{}: {detail}", self.status),
            None => write!(f, "{}", self.status),
        }
    }
}

impl std::error::Error for HttpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|err| err as &(dyn std::error::Error + 'static))
    }
}

impl From<CancelledError> for HttpError {
    fn from(err: CancelledError) -> Self {
        Self::new(StatusCode::CLIENT_CLOSED_REQUEST)
            .with_detail("request cancelled")
            .with_source(err)
    }
}
