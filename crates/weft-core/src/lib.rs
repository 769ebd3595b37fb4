//! Core request types for weft.
//!
//! This crate provides the fundamental building blocks:
//! - [`HttpExchange`] and [`Response`] types
//! - [`RequestContext`] wrapping asupersync's [`Cx`](asupersync::Cx)
//! - [`TargetType`] and [`BoundValue`] for typed parameter binding
//! - Error types and the framework's leveled logging
//!
//! # Design Principles
//!
//! - No runtime reflection: every binding is declared explicitly
//! - A closed coercion table with total dispatch
//! - All types support `Send + Sync`
//! - Cancel-correct via asupersync integration

#![forbid(unsafe_code)]

mod context;
pub mod convert;
pub mod error;
mod exchange;
pub mod logging;
mod query;
mod response;
mod session;
pub mod testing;

pub use asupersync::Cx;
pub use context::{CancelledError, RequestContext};
pub use convert::{BoundValue, ConvertError, TargetType, coerce};
pub use error::HttpError;
pub use exchange::{
    Body, BodyReader, ExchangeBuilder, Headers, HttpExchange, Method, RouteMeta,
};
pub use query::{QueryString, percent_decode};
pub use response::{Response, ResponseBody, StatusCode};
pub use session::Session;

use std::future::Future;
use std::pin::Pin;

/// A boxed, sendable future, the return type of erased handlers and hooks.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
