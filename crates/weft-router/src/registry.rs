//! Route registration: handler specs, contracts, route sets, and the
//! table-building router.
//!
//! Registration is fully explicit. A [`HandlerSpec`] names its handler
//! function, its route tag, and a descriptor per parameter; a [`RouteSet`]
//! groups specs under a shared path prefix, metadata, and decorators; the
//! [`Router`] validates everything while building and returns a
//! [`ConfigError`] for any misdeclaration instead of deferring it to
//! request time.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use weft_core::{BoundValue, BoxFuture, HttpError, HttpExchange, Method, Response, RouteMeta, TargetType, logging};

use crate::binder::{Binding, ParamSpec, bind_all};
use crate::decorate::{Decorator, wrap};
use crate::pattern::{PathPattern, PatternError};
use crate::table::{Route, RouteHandler, RouteTable};

/// A route tag: the method plus path template a handler is exposed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteTag {
    Get(String),
    Post(String),
    Put(String),
    Patch(String),
    Delete(String),
    Options(String),
}

impl RouteTag {
    /// A GET tag.
    #[must_use]
    pub fn get(template: impl Into<String>) -> Self {
        Self::Get(template.into())
    }

    /// A POST tag.
    #[must_use]
    pub fn post(template: impl Into<String>) -> Self {
        Self::Post(template.into())
    }

    /// A PUT tag.
    #[must_use]
    pub fn put(template: impl Into<String>) -> Self {
        Self::Put(template.into())
    }

    /// A PATCH tag.
    #[must_use]
    pub fn patch(template: impl Into<String>) -> Self {
        Self::Patch(template.into())
    }

    /// A DELETE tag.
    #[must_use]
    pub fn delete(template: impl Into<String>) -> Self {
        Self::Delete(template.into())
    }

    /// An OPTIONS tag.
    #[must_use]
    pub fn options(template: impl Into<String>) -> Self {
        Self::Options(template.into())
    }

    /// The tagged method.
    #[must_use]
    pub fn method(&self) -> Method {
        match self {
            Self::Get(_) => Method::Get,
            Self::Post(_) => Method::Post,
            Self::Put(_) => Method::Put,
            Self::Patch(_) => Method::Patch,
            Self::Delete(_) => Method::Delete,
            Self::Options(_) => Method::Options,
        }
    }

    /// The path template relative to the route set.
    #[must_use]
    pub fn template(&self) -> &str {
        match self {
            Self::Get(t)
            | Self::Post(t)
            | Self::Put(t)
            | Self::Patch(t)
            | Self::Delete(t)
            | Self::Options(t) => t,
        }
    }
}

/// The erased handler function: receives the exchange and the bound
/// parameter values in declaration order.
pub type HandlerCall = Arc<
    dyn Fn(HttpExchange, Vec<BoundValue>) -> BoxFuture<Result<Response, HttpError>> + Send + Sync,
>;

/// A separately declared contract a handler implements.
///
/// The contract side owns the route tags and the parameter metadata; the
/// implementing [`HandlerSpec`] contributes only per-parameter optionality
/// and the function itself.
#[derive(Debug, Clone, Default)]
pub struct ContractSpec {
    tags: Vec<RouteTag>,
    params: Vec<ParamSpec>,
}

impl ContractSpec {
    /// An empty contract.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a route tag.
    #[must_use]
    pub fn tag(mut self, tag: RouteTag) -> Self {
        self.tags.push(tag);
        self
    }

    /// Add a parameter descriptor.
    #[must_use]
    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// The contract's route tags.
    #[must_use]
    pub fn tags(&self) -> &[RouteTag] {
        &self.tags
    }

    /// The contract's parameter descriptors.
    #[must_use]
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }
}

/// One handler's registration record.
#[derive(Clone)]
pub struct HandlerSpec {
    name: String,
    tags: Vec<RouteTag>,
    params: Vec<ParamSpec>,
    meta: Vec<(String, Value)>,
    decorators: Vec<Decorator>,
    contract: Option<ContractSpec>,
    call: HandlerCall,
}

impl HandlerSpec {
    /// Record a handler function under a name.
    #[must_use]
    pub fn new<F, Fut>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(HttpExchange, Vec<BoundValue>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response, HttpError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            tags: Vec::new(),
            params: Vec::new(),
            meta: Vec::new(),
            decorators: Vec::new(),
            contract: None,
            call: Arc::new(move |exchange, values| Box::pin(handler(exchange, values))),
        }
    }

    /// Add a route tag. Exactly one is required at registration.
    #[must_use]
    pub fn tag(mut self, tag: RouteTag) -> Self {
        self.tags.push(tag);
        self
    }

    /// Add a parameter descriptor, in the handler's positional order.
    #[must_use]
    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// Add a metadata entry visible to decorators via the matched route.
    #[must_use]
    pub fn meta(mut self, key: impl Into<String>, value: Value) -> Self {
        self.meta.push((key.into(), value));
        self
    }

    /// Add a handler-level decorator, innermost in the chain.
    #[must_use]
    pub fn decorator(mut self, decorator: Decorator) -> Self {
        self.decorators.push(decorator);
        self
    }

    /// Declare that this handler implements a contract. Tags and
    /// parameter metadata then come from the contract side.
    #[must_use]
    pub fn contract(mut self, contract: ContractSpec) -> Self {
        self.contract = Some(contract);
        self
    }

    /// The handler's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for HandlerSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerSpec")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .field("params", &self.params.len())
            .finish_non_exhaustive()
    }
}

/// A group of handlers sharing a path prefix, metadata, and decorators.
#[derive(Debug, Clone, Default)]
pub struct RouteSet {
    prefix: String,
    meta: Vec<(String, Value)>,
    decorators: Vec<Decorator>,
    handlers: Vec<HandlerSpec>,
}

impl RouteSet {
    /// A route set mounted at `prefix`.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            meta: Vec::new(),
            decorators: Vec::new(),
            handlers: Vec::new(),
        }
    }

    /// Add a set-level before hook.
    #[must_use]
    pub fn before<F, Fut>(self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(HttpExchange) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HttpError>> + Send + 'static,
    {
        self.decorator(Decorator::before(name, hook))
    }

    /// Add a set-level after hook.
    #[must_use]
    pub fn after<F, Fut>(self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(HttpExchange, Option<HttpError>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HttpError>> + Send + 'static,
    {
        self.decorator(Decorator::after(name, hook))
    }

    /// Add a set-level decorator, outermost for every handler in the set.
    #[must_use]
    pub fn decorator(mut self, decorator: Decorator) -> Self {
        self.decorators.push(decorator);
        self
    }

    /// Add a set-level metadata entry. Handler-level entries with the
    /// same key take precedence.
    #[must_use]
    pub fn meta(mut self, key: impl Into<String>, value: Value) -> Self {
        self.meta.push((key.into(), value));
        self
    }

    /// Add a handler.
    #[must_use]
    pub fn handler(mut self, spec: HandlerSpec) -> Self {
        self.handlers.push(spec);
        self
    }
}

/// A registration-time misdeclaration.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// A handler carries more than one route tag.
    MultipleRouteTags { handler: String },
    /// A handler carries no route tag (and no contract supplying one).
    MissingRouteTag { handler: String },
    /// A contract's parameter list does not line up with the handler's.
    UnresolvedContract {
        handler: String,
        expected: usize,
        found: usize,
    },
    /// A contract parameter and its implementing parameter disagree on
    /// target type.
    ParamTypeMismatch {
        handler: String,
        param: String,
        declared: TargetType,
        receiver: TargetType,
    },
    /// A path template failed to compile.
    Pattern(PatternError),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MultipleRouteTags { handler } => {
                write!(f, "handler `{handler}` has multiple route tags")
            }
            Self::MissingRouteTag { handler } => {
                write!(f, "handler `{handler}` has no route tag")
            }
            Self::UnresolvedContract {
                handler,
                expected,
                found,
            } => write!(
                f,
                "handler `{handler}` implements a contract with {expected} parameters but declares {found}"
            ),
            Self::ParamTypeMismatch {
                handler,
                param,
                declared,
                receiver,
            } => write!(
                f,
                "handler `{handler}` parameter `{param}` is declared {declared} but received as {receiver}"
            ),
            Self::Pattern(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Pattern(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PatternError> for ConfigError {
    fn from(err: PatternError) -> Self {
        Self::Pattern(err)
    }
}

/// Builds the route table from registered route sets.
#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// An empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route set at its own prefix.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for any misdeclared handler in the set.
    pub fn register(&mut self, set: RouteSet) -> Result<&mut Self, ConfigError> {
        self.register_with("", set, &[])
    }

    /// Register a route set under an additional mount prefix, with extra
    /// metadata entries that take precedence over handler- and set-level
    /// ones.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for any misdeclared handler in the set.
    pub fn register_with(
        &mut self,
        prefix: &str,
        set: RouteSet,
        extra_meta: &[(String, Value)],
    ) -> Result<&mut Self, ConfigError> {
        for spec in &set.handlers {
            let route = build_route(prefix, &set, spec, extra_meta)?;
            logging::debug(
                "weft::registry",
                &format!(
                    "registered {} {} -> {}",
                    route.method(),
                    route.pattern().template(),
                    route.meta().name()
                ),
            );
            self.routes.push(route);
        }
        Ok(self)
    }

    /// Finish registration and build the table.
    #[must_use]
    pub fn build(self) -> RouteTable {
        RouteTable::build(self.routes)
    }
}

fn build_route(
    prefix: &str,
    set: &RouteSet,
    spec: &HandlerSpec,
    extra_meta: &[(String, Value)],
) -> Result<Route, ConfigError> {
    // Route tags and parameter metadata come from the contract when one
    // is declared; the handler side keeps only optionality.
    let tags = spec
        .contract
        .as_ref()
        .map_or(spec.tags.as_slice(), |c| c.tags.as_slice());
    let tag = match tags {
        [] => {
            return Err(ConfigError::MissingRouteTag {
                handler: spec.name.clone(),
            });
        }
        [tag] => tag,
        _ => {
            return Err(ConfigError::MultipleRouteTags {
                handler: spec.name.clone(),
            });
        }
    };

    let bindings = match &spec.contract {
        Some(contract) => {
            if contract.params.len() != spec.params.len() {
                return Err(ConfigError::UnresolvedContract {
                    handler: spec.name.clone(),
                    expected: contract.params.len(),
                    found: spec.params.len(),
                });
            }
            contract
                .params
                .iter()
                .zip(&spec.params)
                .map(|(declared, receiver)| {
                    if declared.target() != receiver.target() {
                        return Err(ConfigError::ParamTypeMismatch {
                            handler: spec.name.clone(),
                            param: declared.name().to_owned(),
                            declared: declared.target(),
                            receiver: receiver.target(),
                        });
                    }
                    Ok(Binding::paired(declared.clone(), receiver))
                })
                .collect::<Result<Vec<_>, _>>()?
        }
        None => spec.params.iter().cloned().map(Binding::direct).collect(),
    };

    let template = combine_paths(prefix, &set.prefix, tag.template());
    let pattern = PathPattern::compile(&template)?;

    // Merge order is mount, handler, set: earlier entries shadow later
    // ones on key lookup.
    let mut meta_entries = extra_meta.to_vec();
    meta_entries.extend(spec.meta.iter().cloned());
    meta_entries.extend(set.meta.iter().cloned());
    let meta = RouteMeta::new(spec.name.clone(), meta_entries);

    let bindings: Arc<[Binding]> = bindings.into();
    let call = Arc::clone(&spec.call);
    let terminal: RouteHandler = Arc::new(move |exchange: &HttpExchange| {
        let exchange = exchange.clone();
        let bindings = Arc::clone(&bindings);
        let call = Arc::clone(&call);
        Box::pin(async move {
            let values = bind_all(&exchange, &bindings)?;
            call(exchange, values).await
        })
    });

    // Chain order: set-level decorators outermost, handler-level inside.
    let mut chain: Vec<Decorator> =
        Vec::with_capacity(set.decorators.len() + spec.decorators.len());
    chain.extend(set.decorators.iter().cloned());
    chain.extend(spec.decorators.iter().cloned());
    let handler = wrap(terminal, &chain);

    Ok(Route::new(tag.method(), pattern, meta, handler))
}

/// Join a mount prefix, a set prefix, and a tag template into one
/// normalized template starting with `/`.
fn combine_paths(prefix: &str, set_prefix: &str, template: &str) -> String {
    let mut out = String::new();
    for piece in [prefix, set_prefix, template] {
        let piece = piece.trim_matches('/');
        if !piece.is_empty() {
            out.push('/');
            out.push_str(piece);
        }
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}
