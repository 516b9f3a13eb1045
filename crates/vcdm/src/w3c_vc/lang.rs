//! # Language Strings
//!
//! <https://www.w3.org/TR/vc-data-model-2.0/#language-and-base-direction>

use std::ops::Deref;

use serde_json::{Map, Value};

use crate::core::properties::{PropertyBag, merge};
use crate::core::syntax::is_language_tag;
use crate::core::{Cardinality, Decode, Encode, Kind, OneMany, Validate, coerce_value, json_codec};
use crate::error::{Error, Result, ValidationErrors, join};

/// `LangString` is a string that has one or more language representations.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LangString(Kind<OneMany<LocalizedValue>>);

impl LangString {
    /// Create a new `LangString` from a simple string.
    #[must_use]
    pub fn new_string(value: impl Into<String>) -> Self {
        Self(Kind::String(value.into()))
    }

    /// Create a new `LangString` from a single language object.
    #[must_use]
    pub const fn new_object(value: LocalizedValue) -> Self {
        Self(Kind::Object(OneMany::One(value)))
    }

    /// Add a language object to the `LangString`. A simple string becomes
    /// the untagged first entry.
    pub fn add(&mut self, value: LocalizedValue) {
        match &mut self.0 {
            Kind::String(s) => {
                let existing = LocalizedValue::new(std::mem::take(s));
                self.0 = Kind::Object(OneMany::Many(vec![existing, value]));
            }
            Kind::Object(values) => values.add(value),
        }
    }

    /// Length of the `LangString` is the number of language objects.
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.0 {
            Kind::String(_) => 1,
            Kind::Object(values) => values.len(),
        }
    }

    /// Check if the `LangString` is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Extract the value for the provided language tag.
    ///
    /// A simple string is returned as is, whatever the tag.
    #[must_use]
    pub fn value(&self, language: &str) -> Option<&str> {
        match &self.0 {
            Kind::String(s) => Some(s),
            Kind::Object(values) => values
                .iter()
                .find(|v| v.language.as_deref() == Some(language))
                .map(|v| v.value.as_str()),
        }
    }
}

impl Deref for LangString {
    type Target = Kind<OneMany<LocalizedValue>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<&str> for LangString {
    fn from(value: &str) -> Self {
        Self::new_string(value)
    }
}

impl Decode for LangString {
    fn decode(value: Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(Self(Kind::String(s))),
            value @ (Value::Object(_) | Value::Array(_)) => {
                coerce_value("", value, Cardinality::AllowEmpty).map(|v| Self(Kind::Object(v)))
            }
            _ => Err(Error::wrong_type("", "a string, an object or an array")),
        }
    }
}

impl Encode for LangString {
    fn encode(&self) -> Value {
        self.0.encode()
    }
}

impl Validate for LangString {
    fn validate_at(&self, path: &str, errors: &mut ValidationErrors) {
        if let Kind::Object(values) = &self.0 {
            values.validate_at(path, errors);
        }
    }
}

/// `LocalizedValue` is a description of a string in a specific language.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LocalizedValue {
    /// Value of the string
    pub value: String,

    /// Language-tag as defined in [rfc5646](https://www.rfc-editor.org/rfc/rfc5646)
    ///
    /// A missing language tag implies that the string is in the default language.
    pub language: Option<String>,

    /// Base direction of the text when bidirectional text is displayed.
    pub direction: Option<Direction>,

    /// Any other keys of the value object.
    pub properties: Map<String, Value>,
}

const KNOWN: &[&str] = &["@value", "@language", "@direction"];

impl LocalizedValue {
    /// Create an untagged value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }

    /// Set the language tag.
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Set the base direction.
    #[must_use]
    pub const fn direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }
}

impl Decode for LocalizedValue {
    fn decode(value: Value) -> Result<Self> {
        let mut bag = PropertyBag::split(value, KNOWN)?;
        Ok(Self {
            value: bag.required("@value")?,
            language: bag.optional("@language")?,
            direction: bag.optional("@direction")?,
            properties: bag.into_rest(),
        })
    }
}

impl Encode for LocalizedValue {
    fn encode(&self) -> Value {
        merge(
            &self.properties,
            [
                ("@value", Some(Value::String(self.value.clone()))),
                ("@language", self.language.clone().map(Value::String)),
                ("@direction", self.direction.as_ref().map(Encode::encode)),
            ],
        )
    }
}

impl Validate for LocalizedValue {
    fn validate_at(&self, path: &str, errors: &mut ValidationErrors) {
        if let Some(language) = &self.language
            && !is_language_tag(language)
        {
            errors.push(join(path, "@language"), "must be a language tag");
        }
    }
}

/// Base direction of the text when bidirectional text is displayed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Left-to-right
    Ltr,

    /// Right-to-left
    Rtl,
}

impl Decode for Direction {
    fn decode(value: Value) -> Result<Self> {
        match value.as_str() {
            Some("ltr") => Ok(Self::Ltr),
            Some("rtl") => Ok(Self::Rtl),
            _ => Err(Error::wrong_type("", "`ltr` or `rtl`")),
        }
    }
}

impl Encode for Direction {
    fn encode(&self) -> Value {
        match self {
            Self::Ltr => Value::from("ltr"),
            Self::Rtl => Value::from("rtl"),
        }
    }
}

json_codec!(LangString, LocalizedValue);
