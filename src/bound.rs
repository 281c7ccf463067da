//! Per-request binding results.

use crate::coerce::ParamValue;
use crate::error::BindingError;
use crate::ids::RequestId;
use crate::spec::ParameterLocation;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Outcome of resolving one declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundValue {
    /// Optional parameter not supplied
    Absent,
    Present(ParamValue),
}

impl BoundValue {
    pub fn is_present(&self) -> bool {
        matches!(self, BoundValue::Present(_))
    }

    pub fn value(&self) -> Option<&ParamValue> {
        match self {
            BoundValue::Present(v) => Some(v),
            BoundValue::Absent => None,
        }
    }
}

/// One entry of the argument tuple, identified by `(name, location)`.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundArgument {
    pub name: String,
    pub location: ParameterLocation,
    pub value: BoundValue,
}

/// Every declared parameter of an operation, bound, in declaration order.
///
/// Rendered for output through [`to_json`](Self::to_json).
#[derive(Debug, Clone)]
pub struct BoundArguments {
    pub request_id: RequestId,
    pub operation_id: Arc<str>,
    pub arguments: Vec<BoundArgument>,
}

impl BoundArguments {
    pub fn new(request_id: RequestId, operation_id: Arc<str>) -> Self {
        Self {
            request_id,
            operation_id,
            arguments: Vec::new(),
        }
    }

    pub fn push(&mut self, name: &str, location: ParameterLocation, value: BoundValue) {
        self.arguments.push(BoundArgument {
            name: name.to_string(),
            location,
            value,
        });
    }

    pub fn len(&self) -> usize {
        self.arguments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoundArgument> {
        self.arguments.iter()
    }

    /// Bound value of `(name, location)`; `None` when no such parameter is declared.
    pub fn get(&self, name: &str, location: ParameterLocation) -> Option<&BoundValue> {
        self.arguments
            .iter()
            .find(|a| a.name == name && a.location == location)
            .map(|a| &a.value)
    }

    /// Present value of `(name, location)`.
    pub fn value(&self, name: &str, location: ParameterLocation) -> Option<&ParamValue> {
        self.get(name, location).and_then(BoundValue::value)
    }

    pub fn path(&self, name: &str) -> Option<&ParamValue> {
        self.value(name, ParameterLocation::Path)
    }

    pub fn query(&self, name: &str) -> Option<&ParamValue> {
        self.value(name, ParameterLocation::Query)
    }

    pub fn header(&self, name: &str) -> Option<&ParamValue> {
        self.value(name, ParameterLocation::Header)
    }

    /// The body argument, if one was declared and supplied.
    pub fn body_argument(&self) -> Option<&BoundArgument> {
        self.arguments
            .iter()
            .find(|a| a.location == ParameterLocation::Body)
    }

    pub fn body_value(&self) -> Option<&Value> {
        self.body_argument()
            .and_then(|a| a.value.value())
            .and_then(ParamValue::as_json)
    }

    /// Decode the body into a handler-defined type.
    ///
    /// Returns `Ok(None)` when the body is absent.
    ///
    /// # Errors
    ///
    /// [`BindingError::BodyDecodeFailure`] when the schema-valid body does not fit `T`.
    pub fn body<T: DeserializeOwned>(&self) -> Result<Option<T>, BindingError> {
        let Some(arg) = self.body_argument() else {
            return Ok(None);
        };
        let Some(value) = arg.value.value().and_then(ParamValue::as_json) else {
            return Ok(None);
        };
        T::deserialize(value)
            .map(Some)
            .map_err(|e| BindingError::BodyDecodeFailure {
                name: arg.name.clone(),
                cause: e.to_string(),
            })
    }

    /// The arguments as a JSON array of `{name, in, value}` objects, in order.
    pub fn to_json(&self) -> Value {
        Value::Array(
            self.arguments
                .iter()
                .map(|a| {
                    let mut obj = Map::new();
                    obj.insert("name".into(), Value::String(a.name.clone()));
                    obj.insert("in".into(), Value::String(a.location.as_str().into()));
                    obj.insert(
                        "value".into(),
                        a.value.value().map(ParamValue::to_json).unwrap_or(Value::Null),
                    );
                    Value::Object(obj)
                })
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a BoundArguments {
    type Item = &'a BoundArgument;
    type IntoIter = std::slice::Iter<'a, BoundArgument>;

    fn into_iter(self) -> Self::IntoIter {
        self.arguments.iter()
    }
}
