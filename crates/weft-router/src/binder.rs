//! Parameter descriptors and request-value binding.
//!
//! Each handler parameter is described by a [`ParamSpec`]: a name, the
//! request source it reads from, a declared [`TargetType`], and an
//! optionality flag. At dispatch the binder resolves every spec against
//! the exchange, coerces the raw value, and hands the handler a
//! positional vector of [`BoundValue`]s.
//!
//! When a handler implements a separately declared contract, the binding
//! pairs both descriptors: names, sources, and targets come from the
//! contract side, optionality from the implementing side.

use weft_core::{BoundValue, HttpError, HttpExchange, TargetType, coerce};

/// Where a parameter's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSource {
    /// A captured path segment.
    Path,
    /// A query-string parameter.
    Query,
    /// A request header.
    Header,
    /// A cookie.
    Cookie,
    /// A session value.
    Session,
    /// A request attribute set earlier in the request.
    Attr,
    /// A named field of the JSON request body.
    BodyField,
    /// The entire request body.
    WholeBody,
    /// A capability resolved from the exchange itself.
    Capability,
}

impl ParamSource {
    fn label(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Cookie => "cookie",
            Self::Session => "session",
            Self::Attr => "attribute",
            Self::BodyField => "body field",
            Self::WholeBody => "body",
            Self::Capability => "capability",
        }
    }
}

/// One handler parameter's descriptor.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    name: String,
    source: ParamSource,
    target: TargetType,
    optional: bool,
}

impl ParamSpec {
    fn new(name: impl Into<String>, source: ParamSource, target: TargetType) -> Self {
        Self {
            name: name.into(),
            source,
            target,
            optional: false,
        }
    }

    /// A path capture.
    #[must_use]
    pub fn path(name: impl Into<String>, target: TargetType) -> Self {
        Self::new(name, ParamSource::Path, target)
    }

    /// A query parameter.
    #[must_use]
    pub fn query(name: impl Into<String>, target: TargetType) -> Self {
        Self::new(name, ParamSource::Query, target)
    }

    /// A request header.
    #[must_use]
    pub fn header(name: impl Into<String>, target: TargetType) -> Self {
        Self::new(name, ParamSource::Header, target)
    }

    /// A cookie.
    #[must_use]
    pub fn cookie(name: impl Into<String>, target: TargetType) -> Self {
        Self::new(name, ParamSource::Cookie, target)
    }

    /// A session value.
    #[must_use]
    pub fn session(name: impl Into<String>, target: TargetType) -> Self {
        Self::new(name, ParamSource::Session, target)
    }

    /// A request attribute.
    #[must_use]
    pub fn attr(name: impl Into<String>, target: TargetType) -> Self {
        Self::new(name, ParamSource::Attr, target)
    }

    /// A named field of the JSON body.
    #[must_use]
    pub fn body(name: impl Into<String>, target: TargetType) -> Self {
        Self::new(name, ParamSource::BodyField, target)
    }

    /// The whole request body.
    #[must_use]
    pub fn whole_body(name: impl Into<String>, target: TargetType) -> Self {
        Self::new(name, ParamSource::WholeBody, target)
    }

    /// The exchange capability.
    #[must_use]
    pub fn exchange(name: impl Into<String>) -> Self {
        Self::new(name, ParamSource::Capability, TargetType::Exchange)
    }

    /// The session capability.
    #[must_use]
    pub fn session_handle(name: impl Into<String>) -> Self {
        Self::new(name, ParamSource::Capability, TargetType::Session)
    }

    /// The raw body stream capability.
    #[must_use]
    pub fn stream(name: impl Into<String>) -> Self {
        Self::new(name, ParamSource::Capability, TargetType::Stream)
    }

    /// Mark the parameter optional: an absent value binds as
    /// [`BoundValue::Absent`] instead of failing.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// The parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The request source.
    #[must_use]
    pub fn source(&self) -> ParamSource {
        self.source
    }

    /// The declared target type.
    #[must_use]
    pub fn target(&self) -> TargetType {
        self.target
    }

    /// Whether the parameter is optional.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.optional
    }
}

/// A resolved binding for one parameter position.
///
/// Direct handlers bind their own descriptor. Contract implementations
/// pair two: the contract's descriptor supplies name, source, and target;
/// the implementation's supplies optionality.
#[derive(Debug, Clone)]
pub struct Binding {
    declared: ParamSpec,
    optional: bool,
}

impl Binding {
    /// Bind a handler's own descriptor.
    #[must_use]
    pub fn direct(spec: ParamSpec) -> Self {
        let optional = spec.optional;
        Self {
            declared: spec,
            optional,
        }
    }

    /// Pair a contract descriptor with the implementing side's.
    #[must_use]
    pub fn paired(declared: ParamSpec, receiver: &ParamSpec) -> Self {
        Self {
            optional: receiver.optional,
            declared,
        }
    }

    /// The descriptor metadata used for resolution.
    #[must_use]
    pub fn declared(&self) -> &ParamSpec {
        &self.declared
    }

    /// Whether the bound position tolerates an absent value.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Resolve this binding against an exchange.
    ///
    /// # Errors
    ///
    /// Returns a bad-request error when a required value is missing or a
    /// present value does not coerce. Failures name the parameter: either
    /// the cause's detail already contains it, or the cause is wrapped as
    /// `cannot get <name>: <cause>`.
    pub fn bind(&self, exchange: &HttpExchange) -> Result<BoundValue, HttpError> {
        let name = self.declared.name.as_str();
        match self.resolve(exchange) {
            Ok(Some(value)) => Ok(value),
            Ok(None) if self.optional => Ok(BoundValue::Absent),
            Ok(None) => Err(HttpError::bad_request().with_detail(format!(
                "missing required {} parameter `{name}`",
                self.declared.source.label()
            ))),
            Err(err) => Err(wrap_bind_error(name, err)),
        }
    }

    fn resolve(&self, exchange: &HttpExchange) -> Result<Option<BoundValue>, HttpError> {
        let name = self.declared.name.as_str();
        let target = self.declared.target;
        if target.is_capability() {
            return Ok(Some(match target {
                TargetType::Exchange => BoundValue::Exchange,
                TargetType::Session => BoundValue::Session(exchange.session().clone()),
                _ => BoundValue::Stream(exchange.request_stream()),
            }));
        }
        match self.declared.source {
            ParamSource::Path => coerce_text(exchange.path_param(name), target),
            ParamSource::Query => match exchange.query(name) {
                Some(raw) => coerce_text(Some(raw), target),
                // A bare flag means true for booleans and nothing else.
                None if target == TargetType::Bool && exchange.query_has(name) => {
                    Ok(Some(BoundValue::Bool(true)))
                }
                None => Ok(None),
            },
            ParamSource::Header => coerce_text(exchange.header(name), target),
            ParamSource::Cookie => coerce_text(exchange.cookie(name), target),
            ParamSource::Session => coerce_text(exchange.session().get(name), target),
            ParamSource::Attr => Ok(exchange.attr(name).map(BoundValue::from_json).and_then(
                |value| (!value.is_absent()).then_some(value),
            )),
            ParamSource::BodyField => self.resolve_body_field(exchange),
            ParamSource::WholeBody => self.resolve_whole_body(exchange),
            ParamSource::Capability => Ok(None),
        }
    }

    fn resolve_body_field(&self, exchange: &HttpExchange) -> Result<Option<BoundValue>, HttpError> {
        if exchange.body().is_empty() {
            return Ok(None);
        }
        let body = exchange.body_json()?;
        let Some(field) = body.get(self.declared.name.as_str()) else {
            return Ok(None);
        };
        match field {
            serde_json::Value::Null => Ok(None),
            // Textual body fields trim to nothing and coerce like form
            // input; structured fields pass through typed.
            serde_json::Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    Ok(None)
                } else {
                    coerce(trimmed, self.declared.target)
                        .map(Some)
                        .map_err(HttpError::from)
                }
            }
            other => {
                let value = BoundValue::from_json(other.clone());
                Ok((!value.is_absent()).then_some(value))
            }
        }
    }

    fn resolve_whole_body(&self, exchange: &HttpExchange) -> Result<Option<BoundValue>, HttpError> {
        if exchange.body().is_empty() {
            return Ok(None);
        }
        match self.declared.target {
            TargetType::Structured => exchange.body_json().map(BoundValue::Json).map(Some),
            TargetType::Str => Ok(Some(BoundValue::Str(exchange.body_text()))),
            target => {
                let text = exchange.body_text();
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    Ok(None)
                } else {
                    coerce(trimmed, target).map(Some).map_err(HttpError::from)
                }
            }
        }
    }
}

/// Keep failures traceable to the parameter without double-wrapping
/// errors that already name it.
fn wrap_bind_error(name: &str, err: HttpError) -> HttpError {
    let already_named = err
        .detail
        .as_deref()
        .is_some_and(|detail| detail.contains(name));
    if already_named {
        err
    } else {
        let cause = err
            .detail
            .clone()
            .unwrap_or_else(|| err.status.canonical_reason().to_owned());
        HttpError::bad_request()
            .with_detail(format!("cannot get {name}: {cause}"))
            .with_source(err)
    }
}

fn coerce_text(
    raw: Option<String>,
    target: TargetType,
) -> Result<Option<BoundValue>, HttpError> {
    match raw {
        Some(raw) => coerce(&raw, target).map(Some).map_err(HttpError::from),
        None => Ok(None),
    }
}

/// Resolve every binding in order.
///
/// # Errors
///
/// Returns the first binding failure.
pub fn bind_all(
    exchange: &HttpExchange,
    bindings: &[Binding],
) -> Result<Vec<BoundValue>, HttpError> {
    bindings.iter().map(|b| b.bind(exchange)).collect()
}
