//! Route registration, parameter binding, and dispatch for weft.
//!
//! The pipeline, in request order:
//!
//! 1. [`RouteTable::find`] matches the path against compiled
//!    [`PathPattern`]s, literal segments outranking captures.
//! 2. The route's [`Binding`]s resolve each declared parameter from the
//!    exchange and coerce it to its target type.
//! 3. [`Decorator`] chains run their before hooks, the handler, then the
//!    after hooks.
//!
//! Everything is declared explicitly at registration through
//! [`HandlerSpec`] and [`RouteSet`]; the [`Router`] validates the
//! declarations while building the table, so a misdeclared handler is a
//! [`ConfigError`] at startup rather than a request-time surprise.

#![forbid(unsafe_code)]

mod binder;
mod decorate;
mod dispatch;
mod pattern;
mod registry;
mod table;

pub use binder::{Binding, ParamSource, ParamSpec, bind_all};
pub use decorate::{AfterHook, BeforeHook, Decorator, request_logger, wrap};
pub use dispatch::{DefaultErrorMapper, DispatchOutcome, Dispatcher, ErrorMapper};
pub use pattern::{PathPattern, PatternError, Segment};
pub use registry::{ConfigError, ContractSpec, HandlerCall, HandlerSpec, RouteSet, RouteTag, Router};
pub use table::{AllowedMethods, Route, RouteHandler, RouteLookup, RouteMatch, RouteTable};
