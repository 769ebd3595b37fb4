//! Target types and value coercion for parameter binding.
//!
//! Every handler parameter declares a [`TargetType`] tag up front, and the
//! binder funnels each raw textual value through [`coerce`] to produce the
//! [`BoundValue`] a handler actually receives. Keeping the type set closed
//! keeps the coercion table total: there is exactly one match arm per
//! (raw, target) combination and no open-ended registry to consult.

use serde_json::Value;

use crate::error::HttpError;
use crate::exchange::BodyReader;
use crate::response::StatusCode;
use crate::session::Session;

/// The declared type of a handler parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetType {
    /// A plain string, passed through as-is.
    Str,
    /// A 64-bit signed integer.
    Int,
    /// A 64-bit float.
    Float,
    /// A boolean (`true`/`false`, with bare query flags meaning `true`).
    Bool,
    /// Structured JSON data (objects, arrays, or any JSON value).
    Structured,
    /// The exchange capability itself.
    Exchange,
    /// The session capability.
    Session,
    /// The raw body stream capability.
    Stream,
}

impl TargetType {
    /// The name used in error messages.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Str => "string",
            Self::Int => "integer",
            Self::Float => "float",
            Self::Bool => "boolean",
            Self::Structured => "structured",
            Self::Exchange => "exchange",
            Self::Session => "session",
            Self::Stream => "stream",
        }
    }

    /// Whether this target is a capability rather than a data value.
    #[must_use]
    pub fn is_capability(self) -> bool {
        matches!(self, Self::Exchange | Self::Session | Self::Stream)
    }
}

impl std::fmt::Display for TargetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A value produced by binding, tagged by what it holds.
#[derive(Debug, Clone)]
pub enum BoundValue {
    /// No value was present (only for optional parameters).
    Absent,
    /// A string value.
    Str(String),
    /// An integer value.
    Int(i64),
    /// A float value.
    Float(f64),
    /// A boolean value.
    Bool(bool),
    /// Structured JSON.
    Json(Value),
    /// The exchange capability. The handler already holds the exchange, so
    /// the bound slot carries only the tag.
    Exchange,
    /// The session capability.
    Session(Session),
    /// The raw body stream capability.
    Stream(BodyReader),
}

impl BoundValue {
    /// Whether this slot is absent.
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// The string value, if this is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The integer value, if this is one.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// The float value, if this is one.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(x) => Some(*x),
            _ => None,
        }
    }

    /// The boolean value, if this is one.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The JSON value, if this is one.
    #[must_use]
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(v) => Some(v),
            _ => None,
        }
    }

    /// The session capability, if this is one.
    #[must_use]
    pub fn as_session(&self) -> Option<&Session> {
        match self {
            Self::Session(s) => Some(s),
            _ => None,
        }
    }

    /// Take the stream capability, if this is one.
    #[must_use]
    pub fn into_stream(self) -> Option<BodyReader> {
        match self {
            Self::Stream(r) => Some(r),
            _ => None,
        }
    }

    /// Wrap an already-typed JSON value without re-parsing.
    ///
    /// Attribute values and named body fields are already structured, so
    /// JSON strings stay strings here; only textual sources go through
    /// [`coerce`].
    #[must_use]
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Self::Absent,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else {
                    Self::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => Self::Str(s),
            other => Self::Json(other),
        }
    }
}

/// A value failed to convert to its declared target type.
#[derive(Debug, Clone)]
pub struct ConvertError {
    value: String,
    target: TargetType,
}

impl ConvertError {
    /// The raw value that failed.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The target it failed to reach.
    #[must_use]
    pub fn target(&self) -> TargetType {
        self.target
    }
}

impl std::fmt::Display for ConvertError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cannot parse {:?} as {}", self.value, self.target)
    }
}

impl std::error::Error for ConvertError {}

impl From<ConvertError> for HttpError {
    fn from(err: ConvertError) -> Self {
        HttpError::new(StatusCode::BAD_REQUEST)
            .with_detail(err.to_string())
            .with_source(err)
    }
}

/// Coerce a raw textual value to the declared target type.
///
/// # Errors
///
/// Returns a [`ConvertError`] when the text does not parse as the target,
/// or when the target is a capability (capabilities are never coerced from
/// text; the binder resolves them from the exchange directly).
pub fn coerce(raw: &str, target: TargetType) -> Result<BoundValue, ConvertError> {
    let fail = || ConvertError {
        value: raw.to_owned(),
        target,
    };
    match target {
        TargetType::Str => Ok(BoundValue::Str(raw.to_owned())),
        TargetType::Int => raw.parse::<i64>().map(BoundValue::Int).map_err(|_| fail()),
        TargetType::Float => raw.parse::<f64>().map(BoundValue::Float).map_err(|_| fail()),
        TargetType::Bool => match raw {
            "true" => Ok(BoundValue::Bool(true)),
            "false" => Ok(BoundValue::Bool(false)),
            _ => Err(fail()),
        },
        TargetType::Structured => serde_json::from_str(raw).map(BoundValue::Json).map_err(|_| fail()),
        TargetType::Exchange | TargetType::Session | TargetType::Stream => Err(fail()),
    }
}
