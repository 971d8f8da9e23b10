//! Lazy, type-directed access to request parameters.
//!
//! The raw parameter container is kept as decoded by the codec; nothing is
//! converted into application types until a handler asks for a value, so an
//! unused parameter with an unexpected type never produces an error.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::codec::{DEFAULT_FRAGMENT_LIMIT, fragment_of};
use crate::error::CodecError;

/// A key into a parameter container: an index for positional parameters or a
/// name for named parameters.
pub trait ParamKey {
    fn lookup<'a>(&self, params: &'a Params) -> Result<Option<&'a Value>, CodecError>;
    fn describe(&self) -> String;
}

impl ParamKey for usize {
    fn lookup<'a>(&self, params: &'a Params) -> Result<Option<&'a Value>, CodecError> {
        match &params.value {
            Value::Array(items) => Ok(items.get(*self)),
            _ => Err(params.invalid(format!(
                "cannot read positional parameter {} from named params",
                self
            ))),
        }
    }

    fn describe(&self) -> String {
        format!("#{}", self)
    }
}

impl ParamKey for &str {
    fn lookup<'a>(&self, params: &'a Params) -> Result<Option<&'a Value>, CodecError> {
        match &params.value {
            Value::Object(map) => Ok(map.get(*self)),
            _ => Err(params.invalid(format!(
                "cannot read named parameter '{}' from positional params",
                self
            ))),
        }
    }

    fn describe(&self) -> String {
        format!("'{}'", self)
    }
}

impl ParamKey for String {
    fn lookup<'a>(&self, params: &'a Params) -> Result<Option<&'a Value>, CodecError> {
        self.as_str().lookup(params)
    }

    fn describe(&self) -> String {
        self.as_str().describe()
    }
}

/// Parameters of a request: either positional (array) or named (object).
#[derive(Debug, Clone, PartialEq)]
pub struct Params {
    value: Value,
    fragment_limit: usize,
}

impl Params {
    /// Wrap a raw container. Returns `None` unless `value` is an array or object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Array(_) | Value::Object(_) => Some(Self {
                value,
                fragment_limit: DEFAULT_FRAGMENT_LIMIT,
            }),
            _ => None,
        }
    }

    pub fn positional(items: Vec<Value>) -> Self {
        Self {
            value: Value::Array(items),
            fragment_limit: DEFAULT_FRAGMENT_LIMIT,
        }
    }

    pub fn named(map: Map<String, Value>) -> Self {
        Self {
            value: Value::Object(map),
            fragment_limit: DEFAULT_FRAGMENT_LIMIT,
        }
    }

    pub(crate) fn with_fragment_limit(mut self, limit: usize) -> Self {
        self.fragment_limit = limit;
        self
    }

    /// Whether these are positional params; if so use an index with [`Params::get`],
    /// otherwise a name.
    pub fn is_positional(&self) -> bool {
        self.value.is_array()
    }

    /// Decode the parameter at `key` into `T`.
    ///
    /// A missing parameter decodes as JSON `null`, so `Option<T>` yields `None`
    /// while other types fail. Using the wrong kind of key for the container is
    /// an Invalid-params failure.
    pub fn get<T, K>(&self, key: K) -> Result<T, CodecError>
    where
        T: DeserializeOwned,
        K: ParamKey,
    {
        match key.lookup(self)? {
            Some(raw) => T::deserialize(raw).map_err(|e| CodecError::InvalidParams {
                message: format!("parameter {}: {}", key.describe(), e),
                fragment: fragment_of(raw, self.fragment_limit),
            }),
            None => T::deserialize(&Value::Null).map_err(|_| {
                self.invalid(format!("missing parameter {}", key.describe()))
            }),
        }
    }

    /// Decode the whole container, e.g. into a struct for named params or a
    /// tuple for positional ones.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, CodecError> {
        T::deserialize(&self.value).map_err(|e| self.invalid(e.to_string()))
    }

    pub fn len(&self) -> usize {
        match &self.value {
            Value::Array(items) => items.len(),
            Value::Object(map) => map.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parameter names, for named params only.
    pub fn names(&self) -> Option<impl Iterator<Item = &str>> {
        self.value
            .as_object()
            .map(|map| map.keys().map(String::as_str))
    }

    pub fn as_value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    fn invalid(&self, message: String) -> CodecError {
        CodecError::InvalidParams {
            message,
            fragment: fragment_of(&self.value, self.fragment_limit),
        }
    }
}

impl From<Vec<Value>> for Params {
    fn from(items: Vec<Value>) -> Self {
        Params::positional(items)
    }
}

impl From<Map<String, Value>> for Params {
    fn from(map: Map<String, Value>) -> Self {
        Params::named(map)
    }
}
