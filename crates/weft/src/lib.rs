//! Explicit, reflection-free request routing and dispatch.
//!
//! weft routes HTTP requests to handler functions through declarations
//! made entirely at registration time:
//!
//! - **Explicit registration** — every handler names its route tag and a
//!   descriptor per parameter; nothing is discovered at runtime
//! - **Typed binding** — raw path, query, header, cookie, session, and
//!   body values coerce to a closed set of target types before the
//!   handler runs
//! - **Decorators** — named before/after hook pairs compose around
//!   handlers, set-level hooks outermost
//! - **First-class async** — built on asupersync for structured
//!   concurrency and cancel-correct dispatch
//! - **Minimal dependencies** — only asupersync + serde + parking_lot
//!
//! # Quick Start
//!
//! ```ignore
//! use weft::prelude::*;
//!
//! let mut router = Router::new();
//! router.register(
//!     RouteSet::new("/users").handler(
//!         HandlerSpec::new("get_user", |_exchange, values: Vec<BoundValue>| async move {
//!             let id = values[0].as_int().unwrap_or(0);
//!             Ok(Response::ok().body_text(format!("user {id}")))
//!         })
//!         .tag(RouteTag::get("/:id"))
//!         .param(ParamSpec::path("id", TargetType::Int)),
//!     ),
//! )?;
//! let dispatcher = Dispatcher::new(router.build());
//! ```
//!
//! # Crate Structure
//!
//! - [`weft_core`] — Exchange, response, and conversion types
//! - [`weft_router`] — Patterns, binding, decorators, and dispatch

#![forbid(unsafe_code)]

// Re-export crates
pub use weft_core as core;
pub use weft_router as router;

// Re-export commonly used types
pub use weft_core::{
    Body, BodyReader, BoundValue, BoxFuture, CancelledError, ConvertError, Cx, ExchangeBuilder,
    Headers, HttpError, HttpExchange, Method, RequestContext, Response, ResponseBody, RouteMeta,
    Session, StatusCode, TargetType, coerce,
};
pub use weft_router::{
    AllowedMethods, Binding, ConfigError, ContractSpec, Decorator, DefaultErrorMapper,
    DispatchOutcome, Dispatcher, ErrorMapper, HandlerSpec, ParamSource, ParamSpec, PathPattern,
    PatternError, RouteLookup, RouteSet, RouteTable, RouteTag, Router, request_logger,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{
        BoundValue, ContractSpec, Decorator, DefaultErrorMapper, DispatchOutcome, Dispatcher,
        HandlerSpec, HttpError, HttpExchange, Method, ParamSpec, Response, RouteSet, RouteTag,
        Router, StatusCode, TargetType,
    };
    pub use serde::{Deserialize, Serialize};
}

/// Testing utilities module.
pub mod testing {
    pub use weft_core::testing::{block_on, exchange, test_context};
}

/// Framework logging controls.
pub mod logging {
    pub use weft_core::logging::{LogLevel, enabled, max_level, set_max_level};
}
