//! # Credential Builder
//!
//! Assembles a [`Credential`] from already-typed values, raw JSON, or a mix
//! of both. The builder will not `build` until an issuer and at least one
//! subject have been supplied.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

use super::{
    Context, Credential, CredentialSchema, CredentialStatus, CredentialSubject, Evidence, Issuer,
    LangString, RefreshService, TermsOfUse, VERIFIABLE_CREDENTIAL_TYPE, base_context,
};
use crate::core::{Cardinality, Decode, Field, Kind, OneMany, Validate, coerce};
use crate::error::Result;

/// Build a W3C VC 2.0 [`Credential`].
#[derive(Debug)]
pub struct CredentialBuilder<I, S> {
    context: Vec<Context>,
    id: Option<String>,
    type_: Vec<String>,
    name: Option<LangString>,
    description: Option<LangString>,
    issuer: I,
    subject: S,
    valid_from: Option<String>,
    valid_until: Option<String>,
    status: Vec<Field<CredentialStatus>>,
    schema: Vec<Field<CredentialSchema>>,
    refresh_service: Vec<Field<RefreshService>>,
    terms_of_use: Vec<Field<TermsOfUse>>,
    evidence: Vec<Field<Evidence>>,
    properties: Map<String, Value>,
}

/// Builder has no issuer.
#[doc(hidden)]
#[derive(Debug)]
pub struct NoIssuer;
/// Builder has an issuer.
#[doc(hidden)]
#[derive(Debug)]
pub struct HasIssuer(Field<Kind<Issuer>>);

/// Builder has no subject.
#[doc(hidden)]
#[derive(Debug)]
pub struct NoSubject;
/// Builder has one or more subjects.
#[doc(hidden)]
#[derive(Debug)]
pub struct HasSubject(Vec<Field<CredentialSubject>>);

impl From<Issuer> for Field<Kind<Issuer>> {
    fn from(issuer: Issuer) -> Self {
        Self::Decoded(Kind::Object(issuer))
    }
}

impl From<&str> for Field<Kind<Issuer>> {
    fn from(id: &str) -> Self {
        Self::Decoded(Kind::String(id.to_string()))
    }
}

impl Default for CredentialBuilder<NoIssuer, NoSubject> {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialBuilder<NoIssuer, NoSubject> {
    /// Create a new credential builder with the base context and type.
    #[must_use]
    pub fn new() -> Self {
        Self {
            context: base_context().to_vec(),
            id: None,
            type_: vec![VERIFIABLE_CREDENTIAL_TYPE.to_string()],
            name: None,
            description: None,
            issuer: NoIssuer,
            subject: NoSubject,
            valid_from: None,
            valid_until: None,
            status: vec![],
            schema: vec![],
            refresh_service: vec![],
            terms_of_use: vec![],
            evidence: vec![],
            properties: Map::new(),
        }
    }
}

// Issuer
impl<S> CredentialBuilder<NoIssuer, S> {
    /// Set the issuer: a URI, an [`Issuer`], or raw JSON (`Field::Raw`).
    #[must_use]
    pub fn issuer(self, issuer: impl Into<Field<Kind<Issuer>>>) -> CredentialBuilder<HasIssuer, S> {
        CredentialBuilder {
            context: self.context,
            id: self.id,
            type_: self.type_,
            name: self.name,
            description: self.description,
            issuer: HasIssuer(issuer.into()),
            subject: self.subject,
            valid_from: self.valid_from,
            valid_until: self.valid_until,
            status: self.status,
            schema: self.schema,
            refresh_service: self.refresh_service,
            terms_of_use: self.terms_of_use,
            evidence: self.evidence,
            properties: self.properties,
        }
    }
}

// Subject
impl<I> CredentialBuilder<I, NoSubject> {
    /// Add the first credential subject.
    #[must_use]
    pub fn subject(
        self, subject: impl Into<Field<CredentialSubject>>,
    ) -> CredentialBuilder<I, HasSubject> {
        CredentialBuilder {
            context: self.context,
            id: self.id,
            type_: self.type_,
            name: self.name,
            description: self.description,
            issuer: self.issuer,
            subject: HasSubject(vec![subject.into()]),
            valid_from: self.valid_from,
            valid_until: self.valid_until,
            status: self.status,
            schema: self.schema,
            refresh_service: self.refresh_service,
            terms_of_use: self.terms_of_use,
            evidence: self.evidence,
            properties: self.properties,
        }
    }
}

impl<I> CredentialBuilder<I, HasSubject> {
    /// Add a further credential subject.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<Field<CredentialSubject>>) -> Self {
        self.subject.0.push(subject.into());
        self
    }
}

impl<I, S> CredentialBuilder<I, S> {
    /// Append a context after the base context.
    #[must_use]
    pub fn add_context(mut self, context: impl Into<Context>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Set the credential's identifier.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Append a credential type after `VerifiableCredential`.
    #[must_use]
    pub fn add_type(mut self, type_: impl Into<String>) -> Self {
        self.type_.push(type_.into());
        self
    }

    /// Set the credential's display name.
    #[must_use]
    pub fn name(mut self, name: impl Into<LangString>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the credential's description.
    #[must_use]
    pub fn description(mut self, description: impl Into<LangString>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the date-time the credential becomes valid.
    #[must_use]
    pub fn valid_from(mut self, valid_from: DateTime<Utc>) -> Self {
        self.valid_from = Some(valid_from.to_rfc3339_opts(SecondsFormat::Secs, true));
        self
    }

    /// Set the date-time the credential ceases to be valid.
    #[must_use]
    pub fn valid_until(mut self, valid_until: DateTime<Utc>) -> Self {
        self.valid_until = Some(valid_until.to_rfc3339_opts(SecondsFormat::Secs, true));
        self
    }

    /// Add a credential status entry.
    #[must_use]
    pub fn status(mut self, status: impl Into<Field<CredentialStatus>>) -> Self {
        self.status.push(status.into());
        self
    }

    /// Add a credential schema.
    #[must_use]
    pub fn schema(mut self, schema: impl Into<Field<CredentialSchema>>) -> Self {
        self.schema.push(schema.into());
        self
    }

    /// Add a refresh service.
    #[must_use]
    pub fn refresh_service(mut self, refresh_service: impl Into<Field<RefreshService>>) -> Self {
        self.refresh_service.push(refresh_service.into());
        self
    }

    /// Add a terms of use policy.
    #[must_use]
    pub fn terms_of_use(mut self, terms_of_use: impl Into<Field<TermsOfUse>>) -> Self {
        self.terms_of_use.push(terms_of_use.into());
        self
    }

    /// Add an evidence entry.
    #[must_use]
    pub fn evidence(mut self, evidence: impl Into<Field<Evidence>>) -> Self {
        self.evidence.push(evidence.into());
        self
    }

    /// Set an extension property.
    #[must_use]
    pub fn property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

impl CredentialBuilder<HasIssuer, HasSubject> {
    /// Decode any raw fields, assemble the credential, and validate it.
    ///
    /// # Errors
    ///
    /// Returns a field-scoped decode error for raw JSON that does not decode,
    /// or [`crate::Error::Validation`] listing every rule the assembled
    /// credential breaks.
    pub fn build(self) -> Result<Credential> {
        let issuer = self.issuer.0.resolve().map_err(|e| e.nested("issuer"))?;
        let credential_subject = coerce(
            "credentialSubject",
            one_or_many(self.subject.0).unwrap_or(OneMany::Many(vec![])),
            Cardinality::NonEmpty,
        )?;

        let credential = Credential {
            context: OneMany::Many(self.context),
            id: self.id,
            type_: OneMany::Many(self.type_),
            name: self.name,
            description: self.description,
            issuer,
            credential_subject,
            valid_from: self.valid_from,
            valid_until: self.valid_until,
            credential_status: collect("credentialStatus", self.status)?,
            credential_schema: collect("credentialSchema", self.schema)?,
            refresh_service: collect("refreshService", self.refresh_service)?,
            terms_of_use: collect("termsOfUse", self.terms_of_use)?,
            evidence: collect("evidence", self.evidence)?,
            properties: self.properties,
        };

        credential.validate()?;
        Ok(credential)
    }
}

/// A single item stays single; several become an array.
fn one_or_many<T>(mut items: Vec<T>) -> Option<OneMany<T>> {
    match items.len() {
        0 => None,
        1 => items.pop().map(OneMany::One),
        _ => Some(OneMany::Many(items)),
    }
}

fn collect<T: Decode>(field: &str, items: Vec<Field<T>>) -> Result<Option<OneMany<T>>> {
    one_or_many(items).map(|items| coerce(field, items, Cardinality::NonEmpty)).transpose()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::core::Encode;
    use crate::error::Error;

    #[test]
    fn builds_from_typed_values() {
        let subject = CredentialSubject::new(
            Some("did:example:ebfeb1f712ebc6f1c276e12ec21".to_string()),
            json!({"familyName": "Doe"}).as_object().cloned().unwrap_or_default(),
        );

        let vc = Credential::builder()
            .id("https://example.com/credentials/3732")
            .add_type("EmployeeIDCredential")
            .issuer("https://example.com/issuers/14")
            .subject(subject)
            .valid_from(Utc.with_ymd_and_hms(2023, 11, 20, 23, 21, 55).unwrap())
            .build()
            .expect("should build");

        assert_eq!(
            vc.encode(),
            json!({
                "@context": ["https://www.w3.org/ns/credentials/v2"],
                "id": "https://example.com/credentials/3732",
                "type": ["VerifiableCredential", "EmployeeIDCredential"],
                "issuer": "https://example.com/issuers/14",
                "credentialSubject": {
                    "id": "did:example:ebfeb1f712ebc6f1c276e12ec21",
                    "familyName": "Doe"
                },
                "validFrom": "2023-11-20T23:21:55Z"
            })
        );
    }

    #[test]
    fn builds_from_raw_json() {
        let vc = Credential::builder()
            .issuer(Field::Raw(json!({"id": "https://example.com/issuers/14", "name": "Example"})))
            .subject(Field::Raw(json!({"id": "did:example:1"})))
            .subject(Field::Raw(json!({"id": "did:example:2"})))
            .status(Field::Raw(json!({"type": "BitstringStatusListEntry"})))
            .build()
            .expect("should build");

        assert_eq!(vc.issuer_id(), "https://example.com/issuers/14");
        assert_eq!(vc.credential_subject_ids(), vec!["did:example:1", "did:example:2"]);
        assert!(vc.credential_status.as_ref().is_some_and(|s| s.as_one().is_some()));
    }

    #[test]
    fn reuses_decoded_credential_parts() {
        let first = Credential::builder()
            .issuer(Issuer::new("did:example:issuer"))
            .subject(Field::Raw(json!({"id": "did:example:1"})))
            .build()
            .expect("should build");

        let second = Credential::builder()
            .issuer(Field::Decoded(first.issuer.clone()))
            .subject(first.credential_subject.as_slice()[0].clone())
            .build()
            .expect("should build");
        assert_eq!(first, second);
    }

    #[test]
    fn raw_decode_error_is_scoped() {
        let err = Credential::builder()
            .issuer("did:example:issuer")
            .subject(Field::Raw(json!({"id": "did:example:1"})))
            .subject(Field::Raw(json!("not an object")))
            .build()
            .expect_err("should fail");
        assert!(matches!(err, Error::WrongType { ref field, .. } if field == "credentialSubject[1]"));
    }

    #[test]
    fn validates() {
        let err = Credential::builder()
            .issuer("issuers/14")
            .subject(CredentialSubject::default())
            .build()
            .expect_err("should fail");
        let Error::Validation(errors) = err else {
            panic!("should be a validation error");
        };
        assert_eq!(errors.fields(), vec!["issuer"]);
    }
}
