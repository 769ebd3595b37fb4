//! Request context with asupersync integration.
//!
//! [`RequestContext`] wraps asupersync's [`Cx`] to give the dispatch core
//! request-scoped identity and cooperative cancellation.

use asupersync::Cx;

/// Per-request capability context.
///
/// One `RequestContext` is created by the transport for each inbound
/// request and travels with the exchange for the request's lifetime.
/// Cloning is cheap; all clones observe the same cancellation state.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// The underlying capability context.
    cx: Cx,
    /// Unique request identifier for tracing.
    request_id: u64,
}

impl RequestContext {
    /// Creates a new request context from an asupersync Cx.
    #[must_use]
    pub fn new(cx: Cx, request_id: u64) -> Self {
        Self { cx, request_id }
    }

    /// Returns the unique request identifier.
    #[must_use]
    pub fn request_id(&self) -> u64 {
        self.request_id
    }

    /// Checks if cancellation has been requested.
    ///
    /// This includes client disconnection, timeout, or explicit
    /// cancellation by the transport.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cx.is_cancel_requested()
    }

    /// Cooperative cancellation checkpoint.
    ///
    /// The dispatcher calls this at natural suspension points (before
    /// binding, before handler invocation). Handlers may also call it
    /// inside long loops.
    ///
    /// # Errors
    ///
    /// Returns an error if the request has been cancelled and cancellation
    /// is not currently masked.
    pub fn checkpoint(&self) -> Result<(), CancelledError> {
        self.cx.checkpoint().map_err(|_| CancelledError)
    }

    /// Executes a closure with cancellation masked.
    ///
    /// While masked, `checkpoint()` will not return an error even if
    /// cancellation is pending. Decorator `after` hooks use this so
    /// cleanup still runs for cancelled requests.
    pub fn masked<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        self.cx.masked(f)
    }

    /// Records a trace event for this request.
    pub fn trace(&self, message: &str) {
        self.cx.trace(message);
    }

    /// Returns a reference to the underlying asupersync Cx.
    #[must_use]
    pub fn cx(&self) -> &Cx {
        &self.cx
    }
}

/// Error returned when a request has been cancelled.
///
/// Returned by `checkpoint()` when the request should stop processing;
/// converted to 499 Client Closed Request at the dispatch boundary.
#[derive(Debug, Clone, Copy)]
pub struct CancelledError;

impl std::fmt::Display for CancelledError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "request cancelled")
    }
}

impl std::error::Error for CancelledError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_error_display() {
        let err = CancelledError;
        assert_eq!(format!("{err}"), "request cancelled");
    }

    #[test]
    fn checkpoint_returns_error_when_cancel_requested() {
        let cx = Cx::for_testing();
        let ctx = RequestContext::new(cx, 1);
        assert!(ctx.checkpoint().is_ok());
        ctx.cx().set_cancel_requested(true);
        assert!(ctx.is_cancelled());
        assert!(ctx.checkpoint().is_err());
    }

    #[test]
    fn masked_defers_cancellation_at_checkpoint() {
        let cx = Cx::for_testing();
        let ctx = RequestContext::new(cx, 1);
        ctx.cx().set_cancel_requested(true);

        let result = ctx.masked(|| ctx.checkpoint());
        assert!(result.is_ok());
        assert!(ctx.checkpoint().is_err());
    }

    #[test]
    fn clone_preserves_request_id() {
        let ctx = RequestContext::new(Cx::for_testing(), 7);
        let clone = ctx.clone();
        assert_eq!(clone.request_id(), 7);
    }
}
