//! # Property Bag
//!
//! Splits a raw JSON object into the fields a model recognizes and an opaque
//! remainder, and merges the two back together on encode.

use serde_json::{Map, Value};

use crate::core::{Cardinality, Decode, OneMany, coerce_value};
use crate::error::{Error, Result};

/// A raw JSON object split into known fields and an opaque remainder.
#[derive(Clone, Debug, Default)]
pub struct PropertyBag {
    known: Map<String, Value>,
    rest: Map<String, Value>,
}

impl PropertyBag {
    /// Split `value` into the keys listed in `known` and everything else.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WrongType`] if `value` is not a JSON object.
    pub fn split(value: Value, known: &[&str]) -> Result<Self> {
        let Value::Object(object) = value else {
            return Err(Error::wrong_type("", "an object"));
        };

        let mut bag = Self::default();
        for (key, value) in object {
            if known.contains(&key.as_str()) {
                bag.known.insert(key, value);
            } else {
                bag.rest.insert(key, value);
            }
        }
        Ok(bag)
    }

    /// Take a known field's raw value. `null` is treated as absent.
    pub fn take(&mut self, key: &str) -> Option<Value> {
        self.known.remove(key).filter(|v| !v.is_null())
    }

    /// Take and decode a required field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] if absent, or the field's decode error.
    pub fn required<T: Decode>(&mut self, key: &str) -> Result<T> {
        let value = self.take(key).ok_or_else(|| Error::missing(key))?;
        T::decode(value).map_err(|e| e.nested(key))
    }

    /// Take and decode an optional field.
    ///
    /// # Errors
    ///
    /// Returns the field's decode error.
    pub fn optional<T: Decode>(&mut self, key: &str) -> Result<Option<T>> {
        self.take(key).map(|value| T::decode(value).map_err(|e| e.nested(key))).transpose()
    }

    /// Take and coerce an optional one-or-many field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyCollection`] or the item decode error.
    pub fn one_many<T: Decode>(
        &mut self, key: &str, cardinality: Cardinality,
    ) -> Result<Option<OneMany<T>>> {
        self.take(key).map(|value| coerce_value(key, value, cardinality)).transpose()
    }

    /// The opaque remainder: every key not listed as known.
    #[must_use]
    pub fn into_rest(self) -> Map<String, Value> {
        self.rest
    }
}

/// Merge `properties` with a model's explicit fields. Explicit fields are
/// written last so they always win over a same-named opaque property; `None`
/// fields are omitted.
pub fn merge<'a>(
    properties: &Map<String, Value>, explicit: impl IntoIterator<Item = (&'a str, Option<Value>)>,
) -> Value {
    let mut object = properties.clone();
    for (key, value) in explicit {
        if let Some(value) = value {
            object.insert(key.to_string(), value);
        }
    }
    Value::Object(object)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn split_and_merge() {
        let raw = json!({"id": "urn:a", "type": "T", "@id": "reserved", "extra": [1, 2]});
        let mut bag = PropertyBag::split(raw.clone(), &["id", "type"]).expect("should split");

        let id: Option<String> = bag.optional("id").expect("should decode");
        let type_: String = bag.required("type").expect("should decode");
        let rest = bag.into_rest();
        assert_eq!(Value::Object(rest.clone()), json!({"@id": "reserved", "extra": [1, 2]}));

        let merged = merge(&rest, [("id", id.map(Value::String)), ("type", Some(Value::String(type_)))]);
        assert_eq!(merged, raw);
    }

    #[test]
    fn explicit_fields_win() {
        let properties = json!({"type": "Shadowed", "other": true});
        let Value::Object(properties) = properties else { unreachable!() };

        let merged = merge(&properties, [("type", Some(json!("Explicit")))]);
        assert_eq!(merged, json!({"type": "Explicit", "other": true}));
    }

    #[test]
    fn required_missing() {
        let mut bag = PropertyBag::split(json!({}), &["type"]).expect("should split");
        let err = bag.required::<String>("type").expect_err("should fail");
        assert!(matches!(err, Error::MissingField { ref field } if field == "type"));
    }

    #[test]
    fn not_an_object() {
        let err = PropertyBag::split(json!("str"), &[]).expect_err("should fail");
        assert!(matches!(err, Error::WrongType { .. }));
    }
}
