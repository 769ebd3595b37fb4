//! Test fixtures shared by the framework crates.
//!
//! These helpers build exchanges against a fresh testing context and run
//! handler futures to completion synchronously, so routing tests stay
//! plain `#[test]` functions.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use asupersync::Cx;

use crate::context::RequestContext;
use crate::exchange::{ExchangeBuilder, Method};

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// A fresh request context backed by a testing runtime context.
#[must_use]
pub fn test_context() -> RequestContext {
    RequestContext::new(Cx::for_testing(), NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed))
}

/// Start building an exchange for a test request.
#[must_use]
pub fn exchange(method: Method, path: &str) -> ExchangeBuilder {
    ExchangeBuilder::new(test_context(), method, path)
}

/// Run a future to completion on the current thread.
pub fn block_on<F: Future>(future: F) -> F::Output {
    futures_executor::block_on(future)
}
