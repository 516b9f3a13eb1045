//! # Issuer and Holder
//!
//! Both parties may be expressed as a bare URI or as an object with an `id`.
//! A `Kind<Issuer>` (or `Kind<Holder>`) remembers which form was decoded and
//! encodes back to the same form; a bare URI is never promoted to an object.

use serde_json::{Map, Value};

use crate::core::properties::{PropertyBag, merge};
use crate::core::syntax::is_uri;
use crate::core::{Decode, Encode, Kind, Validate, json_codec};
use crate::error::{Result, ValidationErrors, join};

/// Issuer identifies the issuer of the credential.
///
/// <https://www.w3.org/TR/vc-data-model-2.0/#issuer>
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Issuer {
    /// The issuer URI. If dereferenced, it should result in a machine-readable
    /// document that can be used to verify the credential.
    pub id: String,

    /// Issuer-specific fields that may be used to express additional
    /// information about the issuer.
    pub properties: Map<String, Value>,
}

impl Issuer {
    /// Create an issuer with no additional properties.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            properties: Map::new(),
        }
    }
}

impl Decode for Issuer {
    fn decode(value: Value) -> Result<Self> {
        let mut bag = PropertyBag::split(value, &["id"])?;
        Ok(Self {
            id: bag.required("id")?,
            properties: bag.into_rest(),
        })
    }
}

impl Encode for Issuer {
    fn encode(&self) -> Value {
        merge(&self.properties, [("id", Some(Value::String(self.id.clone())))])
    }
}

impl Validate for Issuer {
    fn validate_at(&self, path: &str, errors: &mut ValidationErrors) {
        if !is_uri(&self.id) {
            errors.push(join(path, "id"), "must be a URI");
        }
    }
}

impl Validate for Kind<Issuer> {
    fn validate_at(&self, path: &str, errors: &mut ValidationErrors) {
        match self {
            Self::String(id) if !is_uri(id) => {
                errors.push(path, "must be a URI or a valid issuer object");
            }
            Self::String(_) => {}
            Self::Object(issuer) => issuer.validate_at(path, errors),
        }
    }
}

/// Holder identifies the entity presenting credentials.
///
/// <https://www.w3.org/TR/vc-data-model-2.0/#holder>
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Holder {
    /// The holder URI. For example, `did:example:ebfeb1f712ebc6f1c276e12ec21`.
    pub id: String,

    /// Additional holder properties.
    pub properties: Map<String, Value>,
}

impl Holder {
    /// Create a holder with no additional properties.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            properties: Map::new(),
        }
    }
}

impl Decode for Holder {
    fn decode(value: Value) -> Result<Self> {
        let mut bag = PropertyBag::split(value, &["id"])?;
        Ok(Self {
            id: bag.required("id")?,
            properties: bag.into_rest(),
        })
    }
}

impl Encode for Holder {
    fn encode(&self) -> Value {
        merge(&self.properties, [("id", Some(Value::String(self.id.clone())))])
    }
}

impl Validate for Holder {
    fn validate_at(&self, path: &str, errors: &mut ValidationErrors) {
        if !is_uri(&self.id) {
            errors.push(join(path, "id"), "must be a URI");
        }
    }
}

impl Validate for Kind<Holder> {
    fn validate_at(&self, path: &str, errors: &mut ValidationErrors) {
        match self {
            Self::String(id) if !is_uri(id) => {
                errors.push(path, "must be a URI or a valid holder object");
            }
            Self::String(_) => {}
            Self::Object(holder) => holder.validate_at(path, errors),
        }
    }
}

json_codec!(Issuer, Holder);

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::Error;

    #[test]
    fn string_stays_string() {
        let issuer = Kind::<Issuer>::decode(json!("https://example.com/issuers/14"))
            .expect("should decode");
        assert_eq!(issuer, Kind::String("https://example.com/issuers/14".to_string()));
        assert_eq!(issuer.encode(), json!("https://example.com/issuers/14"));
    }

    #[test]
    fn object_round_trip() {
        let raw = json!({
            "id": "did:example:76e12ec712ebc6f1c221ebfeb1f",
            "name": "Example University",
            "@type": "Organization"
        });
        let issuer = Kind::<Issuer>::decode(raw.clone()).expect("should decode");
        let Kind::Object(object) = &issuer else {
            panic!("should decode to an object");
        };
        assert_eq!(object.id, "did:example:76e12ec712ebc6f1c221ebfeb1f");
        assert_eq!(object.properties.len(), 2);
        assert_eq!(issuer.encode(), raw);
    }

    #[test]
    fn object_without_id() {
        let err = Issuer::decode(json!({"name": "Example University"})).expect_err("should fail");
        assert!(matches!(err, Error::MissingField { ref field } if field == "id"));
    }

    #[test]
    fn wrong_type() {
        let err = Kind::<Holder>::decode(json!(42)).expect_err("should fail");
        assert!(matches!(err, Error::WrongType { .. }));
    }

    #[test]
    fn validation() {
        let mut errors = ValidationErrors::default();
        Kind::<Issuer>::String("not a uri".to_string()).validate_at("issuer", &mut errors);
        Kind::Object(Holder::new("also not a uri")).validate_at("holder", &mut errors);
        Kind::<Holder>::String("did:example:123".to_string()).validate_at("holder", &mut errors);
        assert_eq!(errors.fields(), vec!["issuer", "holder.id"]);
    }

    #[test]
    fn serde_validates() {
        let issuer: Issuer =
            serde_json::from_value(json!({"id": "https://example.com"})).expect("should decode");
        assert_eq!(issuer.id, "https://example.com");

        serde_json::from_value::<Issuer>(json!({"id": "relative"}))
            .expect_err("relative id should fail validation");
    }
}
