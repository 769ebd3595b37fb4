//! Decorators: named before/after hook pairs around handlers.
//!
//! A [`Decorator`] carries an optional before hook and an optional after
//! hook. [`wrap`] folds a slice of decorators around an erased handler so
//! the first decorator in the slice is outermost: its before hook runs
//! first and its after hook runs last. A failing before hook short-circuits
//! the chain, and its own after hook still runs with the error.

use std::future::Future;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use weft_core::{BoxFuture, HttpError, HttpExchange, logging};

use crate::table::RouteHandler;

/// An erased before hook.
pub type BeforeHook =
    Arc<dyn Fn(HttpExchange) -> BoxFuture<Result<(), HttpError>> + Send + Sync>;

/// An erased after hook. Receives the handler's error, if any.
pub type AfterHook = Arc<
    dyn Fn(HttpExchange, Option<HttpError>) -> BoxFuture<Result<(), HttpError>> + Send + Sync,
>;

/// A named before/after hook pair.
#[derive(Clone)]
pub struct Decorator {
    name: String,
    before: Option<BeforeHook>,
    after: Option<AfterHook>,
}

impl Decorator {
    /// A decorator with no hooks yet; attach them with
    /// [`Decorator::with_before`] and [`Decorator::with_after`].
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            before: None,
            after: None,
        }
    }

    /// Attach a before hook.
    #[must_use]
    pub fn with_before<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(HttpExchange) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HttpError>> + Send + 'static,
    {
        self.before = Some(Arc::new(move |exchange| Box::pin(hook(exchange))));
        self
    }

    /// Attach an after hook.
    #[must_use]
    pub fn with_after<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(HttpExchange, Option<HttpError>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HttpError>> + Send + 'static,
    {
        self.after = Some(Arc::new(move |exchange, err| Box::pin(hook(exchange, err))));
        self
    }

    /// A decorator with only a before hook.
    #[must_use]
    pub fn before<F, Fut>(name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(HttpExchange) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HttpError>> + Send + 'static,
    {
        Self::named(name).with_before(hook)
    }

    /// A decorator with only an after hook.
    #[must_use]
    pub fn after<F, Fut>(name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(HttpExchange, Option<HttpError>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HttpError>> + Send + 'static,
    {
        Self::named(name).with_after(hook)
    }

    /// The decorator's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for Decorator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decorator")
            .field("name", &self.name)
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .finish()
    }
}

/// Fold decorators around a handler, first decorator outermost.
#[must_use]
pub fn wrap(handler: RouteHandler, decorators: &[Decorator]) -> RouteHandler {
    decorators.iter().rev().fold(handler, |inner, decorator| {
        let before = decorator.before.clone();
        let after = decorator.after.clone();
        Arc::new(move |exchange: &HttpExchange| {
            let exchange = exchange.clone();
            let inner = Arc::clone(&inner);
            let before = before.clone();
            let after = after.clone();
            Box::pin(async move {
                if let Some(before) = &before {
                    if let Err(err) = before(exchange.clone()).await {
                        // The pair's own after hook still observes the
                        // failure; inner decorators and the handler do
                        // not run.
                        if let Some(after) = &after {
                            after(exchange, Some(err.clone())).await?;
                        }
                        return Err(err);
                    }
                }
                let result = inner(&exchange).await;
                if let Some(after) = &after {
                    after(exchange, result.as_ref().err().cloned()).await?;
                }
                result
            })
        })
    })
}

const START_ATTR: &str = "weft.request_start_ms";

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

/// A decorator that logs one line per request with method, path, outcome,
/// and elapsed time.
#[must_use]
pub fn request_logger() -> Decorator {
    Decorator::named("request_logger")
        .with_before(|exchange| async move {
            exchange.set_attr(START_ATTR, serde_json::Value::from(now_millis()));
            Ok(())
        })
        .with_after(|exchange, err| async move {
            let elapsed = exchange
                .attr(START_ATTR)
                .and_then(|v| v.as_u64())
                .map_or(0, |start| now_millis().saturating_sub(start));
            let outcome = match &err {
                Some(err) => format!("failed: {err}"),
                None => "ok".to_owned(),
            };
            logging::info(
                "weft::request",
                &format!(
                    "{} {} {outcome} ({elapsed}ms)",
                    exchange.method(),
                    exchange.path()
                ),
            );
            Ok(())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use weft_core::testing::{block_on, exchange};
    use weft_core::{Method, Response};

    type Trace = Arc<Mutex<Vec<&'static str>>>;

    fn tracing_decorator(name: &'static str, trace: &Trace) -> Decorator {
        let before_trace = Arc::clone(trace);
        let after_trace = Arc::clone(trace);
        let before_label: &'static str = Box::leak(format!("{name}.before").into_boxed_str());
        let after_label: &'static str = Box::leak(format!("{name}.after").into_boxed_str());
        Decorator::named(name)
            .with_before(move |_| {
                let trace = Arc::clone(&before_trace);
                async move {
                    trace.lock().push(before_label);
                    Ok(())
                }
            })
            .with_after(move |_, _| {
                let trace = Arc::clone(&after_trace);
                async move {
                    trace.lock().push(after_label);
                    Ok(())
                }
            })
    }

    fn base_handler(trace: &Trace) -> RouteHandler {
        let trace = Arc::clone(trace);
        Arc::new(move |_| {
            let trace = Arc::clone(&trace);
            Box::pin(async move {
                trace.lock().push("handler");
                Ok(Response::ok())
            })
        })
    }

    #[test]
    fn first_decorator_is_outermost() {
        let trace: Trace = Arc::default();
        let wrapped = wrap(
            base_handler(&trace),
            &[
                tracing_decorator("outer", &trace),
                tracing_decorator("inner", &trace),
            ],
        );
        let e = exchange(Method::Get, "/").build();
        block_on(wrapped(&e)).unwrap();
        assert_eq!(
            *trace.lock(),
            vec![
                "outer.before",
                "inner.before",
                "handler",
                "inner.after",
                "outer.after",
            ]
        );
    }

    #[test]
    fn failing_before_skips_inner_and_handler() {
        let trace: Trace = Arc::default();
        let trace_in_hook = Arc::clone(&trace);
        let failing = Decorator::named("gate")
            .with_before(move |_| {
                let trace = Arc::clone(&trace_in_hook);
                async move {
                    trace.lock().push("gate.before");
                    Err(HttpError::forbidden().with_detail("no entry"))
                }
            })
            .with_after({
                let trace = Arc::clone(&trace);
                move |_, err| {
                    let trace = Arc::clone(&trace);
                    let saw_error = err.is_some();
                    async move {
                        assert!(saw_error);
                        trace.lock().push("gate.after");
                        Ok(())
                    }
                }
            });
        let wrapped = wrap(
            base_handler(&trace),
            &[failing, tracing_decorator("inner", &trace)],
        );
        let e = exchange(Method::Get, "/").build();
        let err = block_on(wrapped(&e)).unwrap_err();
        assert_eq!(err.status.as_u16(), 403);
        assert_eq!(*trace.lock(), vec!["gate.before", "gate.after"]);
    }

    #[test]
    fn after_hook_sees_handler_error() {
        let seen: Arc<Mutex<Option<u16>>> = Arc::default();
        let seen_in_hook = Arc::clone(&seen);
        let observer = Decorator::after("observer", move |_, err| {
            let seen = Arc::clone(&seen_in_hook);
            let status = err.map(|e| e.status.as_u16());
            async move {
                *seen.lock() = status;
                Ok(())
            }
        });
        let handler: RouteHandler = Arc::new(|_| {
            Box::pin(async { Err(HttpError::not_found().with_detail("gone")) })
        });
        let wrapped = wrap(handler, &[observer]);
        let e = exchange(Method::Get, "/").build();
        assert!(block_on(wrapped(&e)).is_err());
        assert_eq!(*seen.lock(), Some(404));
    }

    #[test]
    fn request_logger_records_start_attr() {
        let wrapped = wrap(
            Arc::new(|_| Box::pin(async { Ok(Response::ok()) })),
            &[request_logger()],
        );
        let e = exchange(Method::Get, "/ping").build();
        block_on(wrapped(&e)).unwrap();
        assert!(e.attr(START_ATTR).is_some());
    }
}
