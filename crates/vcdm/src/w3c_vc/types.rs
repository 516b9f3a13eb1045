//! # Credential Sub-Entities
//!
//! Small records hung off a credential. Each keeps a few typed fields and
//! captures every other key in `properties`.

use serde_json::{Map, Value};

use super::validate_uri;
use crate::core::properties::{PropertyBag, merge};
use crate::core::{Cardinality, Decode, Encode, OneMany, Validate, json_codec, require_non_empty};
use crate::error::{Error, Result, ValidationErrors};

/// `CredentialSubject` holds claims about the subject(s) referenced by the
/// credential. Or, more correctly: a set of objects containing one or more
/// properties related to a subject of the credential.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CredentialSubject {
    /// A URI that uniquely identifies the subject of the claims. if set, it
    /// MUST be the identifier used by others to identify the subject.
    pub id: Option<String>,

    /// Claims about the subject.
    pub properties: Map<String, Value>,
}

impl CredentialSubject {
    /// Create a subject from its identifier and claims.
    #[must_use]
    pub fn new(id: Option<String>, claims: Map<String, Value>) -> Self {
        Self {
            id,
            properties: claims,
        }
    }
}

impl Decode for CredentialSubject {
    fn decode(value: Value) -> Result<Self> {
        let mut bag = PropertyBag::split(value, &["id"])?;
        Ok(Self {
            id: bag.optional("id")?,
            properties: bag.into_rest(),
        })
    }
}

impl Encode for CredentialSubject {
    fn encode(&self) -> Value {
        merge(&self.properties, [("id", self.id.clone().map(Value::String))])
    }
}

impl Validate for CredentialSubject {
    fn validate_at(&self, path: &str, errors: &mut ValidationErrors) {
        validate_uri(self.id.as_deref(), path, "id", errors);
    }
}

/// `CredentialStatus` can be used for the discovery of information about the
/// current status of a credential, such as whether it is suspended or revoked.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CredentialStatus {
    /// A URI where credential status information can be retrieved.
    pub id: Option<String>,

    /// Refers to the status method used to provide the (machine readable)
    /// status of the credential. e.g. "`BitstringStatusListEntry`"
    pub type_: String,

    /// Status method specific fields.
    pub properties: Map<String, Value>,
}

impl Decode for CredentialStatus {
    fn decode(value: Value) -> Result<Self> {
        let mut bag = PropertyBag::split(value, &["id", "type"])?;
        Ok(Self {
            id: bag.optional("id")?,
            type_: bag.required("type")?,
            properties: bag.into_rest(),
        })
    }
}

impl Encode for CredentialStatus {
    fn encode(&self) -> Value {
        merge(
            &self.properties,
            [
                ("id", self.id.clone().map(Value::String)),
                ("type", Some(Value::String(self.type_.clone()))),
            ],
        )
    }
}

impl Validate for CredentialStatus {
    fn validate_at(&self, path: &str, errors: &mut ValidationErrors) {
        validate_uri(self.id.as_deref(), path, "id", errors);
    }
}

/// `CredentialSchema` defines the structure of the credential and the datatypes
/// of each property contained.
///
/// It can be used to verify if credential data is syntatically correct. The
/// precise contents of each data schema is determined by the specific type
/// definition.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CredentialSchema {
    /// A URI identifying the schema file.
    pub id: String,

    /// The schema validation method. e.g. "`JsonSchema`"
    pub type_: String,

    /// Additional schema properties.
    pub properties: Map<String, Value>,
}

impl Decode for CredentialSchema {
    fn decode(value: Value) -> Result<Self> {
        let mut bag = PropertyBag::split(value, &["id", "type"])?;
        Ok(Self {
            id: bag.required("id")?,
            type_: bag.required("type")?,
            properties: bag.into_rest(),
        })
    }
}

impl Encode for CredentialSchema {
    fn encode(&self) -> Value {
        merge(
            &self.properties,
            [
                ("id", Some(Value::String(self.id.clone()))),
                ("type", Some(Value::String(self.type_.clone()))),
            ],
        )
    }
}

impl Validate for CredentialSchema {
    fn validate_at(&self, path: &str, errors: &mut ValidationErrors) {
        validate_uri(Some(&self.id), path, "id", errors);
    }
}

/// Evidence can be included by an issuer to provide the verifier with
/// additional supporting information in a credential.
///
/// This could be used by the verifier to establish the confidence with which it
/// relies on credential claims.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Evidence {
    /// A URL pointing to where more information about this instance of evidence
    /// can be found.
    pub id: Option<String>,

    /// Type identifies the evidence scheme used for the instance of evidence.
    /// For example, "`DriversLicense`" or "`Passport`".
    pub type_: OneMany<String>,

    /// A list of schema-specific evidence fields.
    pub properties: Map<String, Value>,
}

impl Decode for Evidence {
    fn decode(value: Value) -> Result<Self> {
        let mut bag = PropertyBag::split(value, &["id", "type"])?;
        Ok(Self {
            id: bag.optional("id")?,
            type_: bag
                .one_many("type", Cardinality::NonEmpty)?
                .ok_or_else(|| Error::missing("type"))?,
            properties: bag.into_rest(),
        })
    }
}

impl Encode for Evidence {
    fn encode(&self) -> Value {
        merge(
            &self.properties,
            [("id", self.id.clone().map(Value::String)), ("type", Some(self.type_.encode()))],
        )
    }
}

impl Validate for Evidence {
    fn validate_at(&self, path: &str, errors: &mut ValidationErrors) {
        validate_uri(self.id.as_deref(), path, "id", errors);
        require_non_empty(&self.type_, path, "type", errors);
    }
}

/// `TermsOfUse` is a single policy the issuer or holder attaches to a
/// credential or presentation.
///
/// In aggregate, the termsOfUse property tells the verifier what actions it is
/// required to perform (an obligation), not allowed to perform (a prohibition),
/// or allowed to perform (a permission) if it is to accept the verifiable
/// credential or verifiable presentation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TermsOfUse {
    /// A URI where credential policy information can be retrieved.
    pub id: Option<String>,

    /// The policy type.
    pub type_: String,

    /// The policy content specific to the type.
    pub properties: Map<String, Value>,
}

impl Decode for TermsOfUse {
    fn decode(value: Value) -> Result<Self> {
        let mut bag = PropertyBag::split(value, &["id", "type"])?;
        Ok(Self {
            id: bag.optional("id")?,
            type_: bag.required("type")?,
            properties: bag.into_rest(),
        })
    }
}

impl Encode for TermsOfUse {
    fn encode(&self) -> Value {
        merge(
            &self.properties,
            [
                ("id", self.id.clone().map(Value::String)),
                ("type", Some(Value::String(self.type_.clone()))),
            ],
        )
    }
}

impl Validate for TermsOfUse {
    fn validate_at(&self, path: &str, errors: &mut ValidationErrors) {
        validate_uri(self.id.as_deref(), path, "id", errors);
    }
}

/// `RefreshService` can be used to provide a link to the issuer's refresh
/// service so Holder's can refresh (manually or automatically) an expired
/// credential.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RefreshService {
    /// The refresh service endpoint.
    pub id: Option<String>,

    /// The refresh mechanism, e.g. "`VerifiableCredentialRefreshService2021`"
    pub type_: String,

    /// Service specific fields.
    pub properties: Map<String, Value>,
}

impl Decode for RefreshService {
    fn decode(value: Value) -> Result<Self> {
        let mut bag = PropertyBag::split(value, &["id", "type"])?;
        Ok(Self {
            id: bag.optional("id")?,
            type_: bag.required("type")?,
            properties: bag.into_rest(),
        })
    }
}

impl Encode for RefreshService {
    fn encode(&self) -> Value {
        merge(
            &self.properties,
            [
                ("id", self.id.clone().map(Value::String)),
                ("type", Some(Value::String(self.type_.clone()))),
            ],
        )
    }
}

impl Validate for RefreshService {
    fn validate_at(&self, path: &str, errors: &mut ValidationErrors) {
        validate_uri(self.id.as_deref(), path, "id", errors);
    }
}

json_codec!(
    CredentialSubject,
    CredentialStatus,
    CredentialSchema,
    Evidence,
    TermsOfUse,
    RefreshService
);

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn round_trips_with_extensions() {
        let status = json!({
            "id": "https://university.example/credentials/status/3#94567",
            "type": "BitstringStatusListEntry",
            "statusPurpose": "revocation",
            "statusListIndex": "94567",
            "@id": "kept"
        });
        assert_eq!(CredentialStatus::decode(status.clone()).expect("should decode").encode(), status);

        let schema = json!({
            "id": "https://example.org/examples/degree.json",
            "type": "JsonSchema",
            "digestSRI": "sha384-S57yQDg1MTzF56Oi9DbSQ14u7jBy0RDdx0YbeV7shwhCS88G8SCXeFq82PafhCrW"
        });
        assert_eq!(CredentialSchema::decode(schema.clone()).expect("should decode").encode(), schema);

        let evidence = json!({
            "id": "https://university.example/evidence/f2aeec97",
            "type": ["Evidence", "DocumentVerification"],
            "verifier": "https://university.example/issuers/14"
        });
        assert_eq!(Evidence::decode(evidence.clone()).expect("should decode").encode(), evidence);

        let terms = json!({"type": "TrustFrameworkPolicy", "trustFramework": "Employment"});
        assert_eq!(TermsOfUse::decode(terms.clone()).expect("should decode").encode(), terms);

        let refresh = json!({"id": "https://university.example/refresh/3732", "type": "VerifiableCredentialRefreshService2021"});
        assert_eq!(RefreshService::decode(refresh.clone()).expect("should decode").encode(), refresh);

        let subject = json!({"id": "did:example:123", "degree": {"type": "BachelorDegree"}});
        assert_eq!(CredentialSubject::decode(subject.clone()).expect("should decode").encode(), subject);
    }

    #[test]
    fn required_fields() {
        let err = CredentialStatus::decode(json!({"id": "urn:x"})).expect_err("should fail");
        assert!(matches!(err, Error::MissingField { ref field } if field == "type"));

        let err = CredentialSchema::decode(json!({"type": "JsonSchema"})).expect_err("should fail");
        assert!(matches!(err, Error::MissingField { ref field } if field == "id"));

        let err = Evidence::decode(json!({"type": []})).expect_err("should fail");
        assert!(matches!(err, Error::EmptyCollection { ref field } if field == "type"));

        let err = TermsOfUse::decode(json!({"type": 7})).expect_err("should fail");
        assert!(matches!(err, Error::WrongType { ref field, .. } if field == "type"));
    }

    #[test]
    fn explicit_type_wins() {
        let status = CredentialStatus {
            id: None,
            type_: "BitstringStatusListEntry".to_string(),
            properties: json!({"type": "Shadowed"}).as_object().cloned().unwrap_or_default(),
        };
        assert_eq!(status.encode(), json!({"type": "BitstringStatusListEntry"}));
    }

    #[test]
    fn invalid_ids() {
        let mut errors = ValidationErrors::default();
        CredentialSubject::new(Some("not-a-uri".to_string()), Map::new())
            .validate_at("credentialSubject[1]", &mut errors);
        CredentialSubject::new(None, Map::new()).validate_at("credentialSubject[2]", &mut errors);
        assert_eq!(errors.fields(), vec!["credentialSubject[1].id"]);
    }
}
