//! # Core Utilities
//!
//! Shape helpers shared by every model: [`Kind`] (string or object),
//! [`OneMany`] (single item or array), [`Field`] (already decoded or raw
//! JSON), and the [`Decode`] / [`Encode`] / [`Validate`] contracts each
//! model implements.

pub mod properties;
pub mod syntax;

use serde_json::Value;

use crate::error::{Error, Result, ValidationErrors, join};

/// `Kind` holds either a simple string or a complex object value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Kind<T> {
    /// Simple string value
    String(String),

    /// Complex object value
    Object(T),
}

impl<T> Default for Kind<T> {
    fn default() -> Self {
        Self::String(String::new())
    }
}

impl<T> From<String> for Kind<T> {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl<T> From<&str> for Kind<T> {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl<T> Kind<T> {
    /// Returns the string value, if the `Kind` is a string.
    pub const fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            Self::Object(_) => None,
        }
    }

    /// Returns the object value, if the `Kind` is an object.
    pub const fn as_object(&self) -> Option<&T> {
        match self {
            Self::String(_) => None,
            Self::Object(o) => Some(o),
        }
    }
}

/// `OneMany` holds a single item or a set of items, remembering which of the
/// two shapes it was created from so it can be re-encoded the same way.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OneMany<T> {
    /// Single object
    One(T),

    /// Set of objects
    Many(Vec<T>),
}

impl<T: Default> Default for OneMany<T> {
    fn default() -> Self {
        Self::One(T::default())
    }
}

impl<T> From<T> for OneMany<T> {
    fn from(value: T) -> Self {
        Self::One(value)
    }
}

impl<T> OneMany<T> {
    /// Returns the single item when the `OneMany` was created from one.
    pub const fn as_one(&self) -> Option<&T> {
        match self {
            Self::One(o) => Some(o),
            Self::Many(_) => None,
        }
    }

    /// Returns the `OneMany` as a slice regardless of shape.
    pub fn as_slice(&self) -> &[T] {
        match self {
            Self::One(one) => std::slice::from_ref(one),
            Self::Many(many) => many.as_slice(),
        }
    }

    /// Iterate over the contained items in order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    /// Returns the `OneMany` as a Vec regardless of contents.
    pub fn to_vec(self) -> Vec<T> {
        match self {
            Self::One(one) => vec![one],
            Self::Many(many) => many,
        }
    }

    /// Adds an item. If the `OneMany` is a single item, it is converted to a
    /// set of items.
    pub fn add(&mut self, item: T) {
        match self {
            Self::One(_) => {
                if let Self::One(one) = std::mem::replace(self, Self::Many(vec![])) {
                    *self = Self::Many(vec![one, item]);
                }
            }
            Self::Many(many) => {
                many.push(item);
            }
        }
    }

    /// Returns the number of items.
    pub fn len(&self) -> usize {
        match self {
            Self::One(_) => 1,
            Self::Many(many) => many.len(),
        }
    }

    /// Returns `true` if the `OneMany` is an empty `Many`.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::One(_) => false,
            Self::Many(many) => many.is_empty(),
        }
    }

    /// Returns `true` when any item matches the predicate.
    pub fn contains(&self, item: &T) -> bool
    where
        T: PartialEq,
    {
        self.iter().any(|i| i == item)
    }
}

/// Decoding from a raw JSON value.
///
/// Decoding is structural only: required keys must be present with the right
/// JSON type. Semantic rules (URI syntax, timestamps, required types) are
/// checked separately by [`Validate`].
pub trait Decode: Sized {
    /// Decode a raw JSON value into the model.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`], [`Error::WrongType`] or
    /// [`Error::EmptyCollection`] naming the offending field.
    fn decode(value: Value) -> Result<Self>;
}

/// Encoding back to the JSON wire shape.
pub trait Encode {
    /// Encode the model as a JSON value.
    fn encode(&self) -> Value;
}

/// Post-construction validation.
pub trait Validate {
    /// Record every rule violation under `path` into `errors`.
    fn validate_at(&self, path: &str, errors: &mut ValidationErrors);

    /// Validate the model, reporting every offending field at once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] listing every violation.
    fn validate(&self) -> Result<()> {
        let mut errors = ValidationErrors::default();
        self.validate_at("", &mut errors);
        errors.into_result()
    }
}

impl Decode for String {
    fn decode(value: Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            _ => Err(Error::wrong_type("", "a string")),
        }
    }
}

impl Encode for String {
    fn encode(&self) -> Value {
        Value::String(self.clone())
    }
}

impl Decode for serde_json::Map<String, Value> {
    fn decode(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(map),
            _ => Err(Error::wrong_type("", "an object")),
        }
    }
}

impl Encode for serde_json::Map<String, Value> {
    fn encode(&self) -> Value {
        Value::Object(self.clone())
    }
}

impl<T: Decode> Decode for Kind<T> {
    fn decode(value: Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(Self::String(s)),
            value @ Value::Object(_) => T::decode(value).map(Self::Object),
            _ => Err(Error::wrong_type("", "a string or an object")),
        }
    }
}

impl<T: Encode> Encode for Kind<T> {
    fn encode(&self) -> Value {
        match self {
            Self::String(s) => Value::String(s.clone()),
            Self::Object(o) => o.encode(),
        }
    }
}

impl<T: Encode> Encode for OneMany<T> {
    fn encode(&self) -> Value {
        match self {
            Self::One(one) => one.encode(),
            Self::Many(many) => Value::Array(many.iter().map(Encode::encode).collect()),
        }
    }
}

impl<T: Validate> Validate for OneMany<T> {
    fn validate_at(&self, path: &str, errors: &mut ValidationErrors) {
        match self {
            Self::One(one) => one.validate_at(path, errors),
            Self::Many(many) => {
                for (i, item) in many.iter().enumerate() {
                    item.validate_at(&format!("{path}[{i}]"), errors);
                }
            }
        }
    }
}

/// A model value that is either already decoded or still raw JSON.
///
/// Passing a `Decoded` value through [`coerce`] is a no-op, so values can be
/// re-used across builders without a JSON round trip.
#[derive(Clone, Debug, PartialEq)]
pub enum Field<T> {
    /// An already-constructed model value.
    Decoded(T),

    /// Raw JSON still to be decoded.
    Raw(Value),
}

impl<T> From<T> for Field<T> {
    fn from(value: T) -> Self {
        Self::Decoded(value)
    }
}

impl<T: Decode> Field<T> {
    /// Resolve the field to its decoded form.
    ///
    /// # Errors
    ///
    /// Returns the decode error of a `Raw` value.
    pub fn resolve(self) -> Result<T> {
        match self {
            Self::Decoded(value) => Ok(value),
            Self::Raw(value) => T::decode(value),
        }
    }
}

/// Whether a one-or-many field accepts an empty array.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cardinality {
    /// An array, when present, must hold at least one entry.
    NonEmpty,

    /// An empty array is accepted.
    AllowEmpty,
}

/// Coerce a one-or-many set of fields into decoded items, preserving the
/// single/array shape, order, and multiplicity.
///
/// # Errors
///
/// Returns [`Error::EmptyCollection`] when `cardinality` is
/// [`Cardinality::NonEmpty`] and an empty array is supplied, or the first item
/// decode error, prefixed with the field path.
pub fn coerce<T: Decode>(
    field: &str, value: OneMany<Field<T>>, cardinality: Cardinality,
) -> Result<OneMany<T>> {
    match value {
        OneMany::One(item) => item.resolve().map(OneMany::One).map_err(|e| e.nested(field)),
        OneMany::Many(items) => {
            if items.is_empty() && cardinality == Cardinality::NonEmpty {
                return Err(Error::EmptyCollection { field: field.to_string() });
            }
            let mut decoded = Vec::with_capacity(items.len());
            for (i, item) in items.into_iter().enumerate() {
                decoded.push(item.resolve().map_err(|e| e.nested(&format!("{field}[{i}]")))?);
            }
            Ok(OneMany::Many(decoded))
        }
    }
}

/// Coerce a raw JSON value (single item or array) into a one-or-many set of
/// decoded items.
///
/// # Errors
///
/// See [`coerce`].
pub fn coerce_value<T: Decode>(
    field: &str, value: Value, cardinality: Cardinality,
) -> Result<OneMany<T>> {
    let raw = match value {
        Value::Array(items) => OneMany::Many(items.into_iter().map(Field::Raw).collect()),
        other => OneMany::One(Field::Raw(other)),
    };
    coerce(field, raw, cardinality)
}

/// Record a violation for a non-empty rule on a one-or-many field.
pub(crate) fn require_non_empty<T>(
    value: &OneMany<T>, path: &str, field: &str, errors: &mut ValidationErrors,
) {
    if value.is_empty() {
        errors.push(join(path, field), "must contain at least one entry");
    }
}

/// Implements `TryFrom<Value>` (decode then validate), `From<&Model> for
/// Value`, and the serde traits in terms of the model's codec.
macro_rules! json_codec {
    ($($ty:ty),* $(,)?) => {$(
        impl TryFrom<serde_json::Value> for $ty {
            type Error = $crate::error::Error;

            fn try_from(value: serde_json::Value) -> ::core::result::Result<Self, Self::Error> {
                let decoded = <$ty as $crate::core::Decode>::decode(value)?;
                $crate::core::Validate::validate(&decoded)?;
                Ok(decoded)
            }
        }

        impl From<&$ty> for serde_json::Value {
            fn from(value: &$ty) -> Self {
                $crate::core::Encode::encode(value)
            }
        }

        impl serde::Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> ::core::result::Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serde::Serialize::serialize(&$crate::core::Encode::encode(self), serializer)
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let value = <serde_json::Value as serde::Deserialize>::deserialize(deserializer)?;
                Self::try_from(value).map_err(serde::de::Error::custom)
            }
        }
    )*};
}
pub(crate) use json_codec;
