//! # Credential
//!
//! <https://www.w3.org/TR/vc-data-model-2.0/#credentials>

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::builder::{CredentialBuilder, NoIssuer, NoSubject};
use super::{
    Context, CredentialSchema, CredentialStatus, CredentialSubject, Evidence, Issuer, LangString,
    RefreshService, TermsOfUse, VERIFIABLE_CREDENTIAL_TYPE, base_context, validate_context,
    validate_type, validate_uri,
};
use crate::core::properties::{PropertyBag, merge};
use crate::core::syntax::is_rfc3339;
use crate::core::{
    Cardinality, Decode, Encode, Kind, OneMany, Validate, json_codec, require_non_empty,
};
use crate::error::{Error, Result, ValidationErrors, join};

const KNOWN: &[&str] = &[
    "@context",
    "id",
    "type",
    "name",
    "description",
    "issuer",
    "credentialSubject",
    "validFrom",
    "validUntil",
    "credentialStatus",
    "credentialSchema",
    "refreshService",
    "termsOfUse",
    "evidence",
];

/// `Credential` is a set of one or more claims made by an issuer.
///
/// Unrecognized top-level keys are held in `properties` and written back on
/// encode, so `encode(decode(x))` reproduces `x`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credential {
    /// The @context property is used to map property URIs into short-form
    /// aliases. It is an ordered set where the first item is
    /// `"https://www.w3.org/ns/credentials/v2"`. Subsequent items may be
    /// URIs or embedded context objects.
    pub context: OneMany<Context>,

    /// The credential's URI. It is RECOMMENDED that if dereferenced, the URI
    /// results in a document containing machine-readable information about
    /// the id (a "verifiable data registry").
    pub id: Option<String>,

    /// The type property is used to uniquely identify the type of the
    /// credential. That is, to indicate the set of claims the credential
    /// contains. It is an unordered set of URIs (full or relative to
    /// @context). It is RECOMMENDED that each URI, if dereferenced, will
    /// result in a document containing machine-readable information about
    /// the type. Syntactic conveniences, such as JSON-LD, SHOULD be used to
    /// ease developer usage.
    pub type_: OneMany<String>,

    /// The name property expresses the name of the credential. If present,
    /// the value of the name property MUST be a string or a language value
    /// object. Ideally, the name of a credential is concise, human-readable,
    /// and could enable an individual to quickly differentiate one credential
    /// from any other credentials they might hold.
    pub name: Option<LangString>,

    /// The description property conveys specific details about a credential.
    /// If present, the value of the description property MUST be a string or
    /// a language value object. Ideally, the description of a credential is
    /// no more than a few sentences in length and conveys enough information
    /// about the credential to remind an individual of its contents without
    /// their having to look through the entirety of the claims.
    pub description: Option<LangString>,

    /// A URI or object with an id property. It is RECOMMENDED that the
    /// URI/object id, dereferences to machine-readable information about the
    /// issuer that can be used to verify credential information.
    pub issuer: Kind<Issuer>,

    /// A set of objects containing claims about credential subject(s).
    pub credential_subject: OneMany<CredentialSubject>,

    /// An XMLSCHEMA11-2 (RFC3339) date-time the credential becomes valid.
    /// e.g. 2010-01-01T19:23:24Z.
    pub valid_from: Option<String>,

    /// An XMLSCHEMA11-2 (RFC3339) date-time the credential ceases to be
    /// valid. e.g. 2010-06-30T19:23:24Z
    pub valid_until: Option<String>,

    /// Used to determine the status of the credential, such as whether it is
    /// suspended or revoked.
    pub credential_status: Option<OneMany<CredentialStatus>>,

    /// The credentialSchema defines the structure and datatypes of the
    /// credential. Consists of one or more schemas that can be used to check
    /// credential data conformance.
    pub credential_schema: Option<OneMany<CredentialSchema>>,

    /// `RefreshService` can be used to provide a link to the issuer's refresh
    /// service so Holder's can refresh (manually or automatically) an expired
    /// credential.
    pub refresh_service: Option<OneMany<RefreshService>>,

    /// Terms of use can be utilized by an issuer or a holder to communicate
    /// the terms under which a verifiable credential or verifiable
    /// presentation was issued.
    pub terms_of_use: Option<OneMany<TermsOfUse>>,

    /// Evidence can be included by an issuer to provide the verifier with
    /// additional supporting information in a credential. This could be used
    /// by the verifier to establish the confidence with which it relies on
    /// credential claims.
    pub evidence: Option<OneMany<Evidence>>,

    /// Every top-level key not modeled above.
    pub properties: Map<String, Value>,
}

impl Credential {
    /// Returns a new [`CredentialBuilder`].
    #[must_use]
    pub fn builder() -> CredentialBuilder<NoIssuer, NoSubject> {
        CredentialBuilder::new()
    }

    /// The issuer's URI, whether expressed as a bare string or an object.
    #[must_use]
    pub fn issuer_id(&self) -> &str {
        match &self.issuer {
            Kind::String(id) => id,
            Kind::Object(issuer) => &issuer.id,
        }
    }

    /// Identifiers of every credential schema.
    #[must_use]
    pub fn credential_schema_ids(&self) -> Vec<&str> {
        self.credential_schema
            .as_ref()
            .map(|schemas| schemas.iter().map(|s| s.id.as_str()).collect())
            .unwrap_or_default()
    }

    /// Identifiers of every credential subject. Subjects without an `id` are
    /// omitted.
    #[must_use]
    pub fn credential_subject_ids(&self) -> Vec<&str> {
        self.credential_subject.iter().filter_map(|s| s.id.as_deref()).collect()
    }

    /// Every `@context` entry, regardless of whether it was a single value.
    #[must_use]
    pub fn contexts(&self) -> &[Context] {
        self.context.as_slice()
    }

    /// Returns `true` if the credential's `type` includes `type_`.
    #[must_use]
    pub fn has_type(&self, type_: &str) -> bool {
        self.type_.iter().any(|t| t == type_)
    }

    /// The parsed `validFrom` timestamp, if present and well-formed.
    #[must_use]
    pub fn valid_from_time(&self) -> Option<DateTime<Utc>> {
        parse_time(self.valid_from.as_deref())
    }

    /// The parsed `validUntil` timestamp, if present and well-formed.
    #[must_use]
    pub fn valid_until_time(&self) -> Option<DateTime<Utc>> {
        parse_time(self.valid_until.as_deref())
    }
}

fn parse_time(value: Option<&str>) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value?).ok().map(|dt| dt.with_timezone(&Utc))
}

impl Decode for Credential {
    fn decode(value: Value) -> Result<Self> {
        let mut bag = PropertyBag::split(value, KNOWN)?;

        Ok(Self {
            context: bag.one_many("@context", Cardinality::AllowEmpty)?.unwrap_or_else(base_context),
            id: bag.optional("id")?,
            type_: bag
                .one_many("type", Cardinality::AllowEmpty)?
                .unwrap_or_else(|| OneMany::Many(vec![VERIFIABLE_CREDENTIAL_TYPE.to_string()])),
            name: bag.optional("name")?,
            description: bag.optional("description")?,
            issuer: bag.required("issuer")?,
            credential_subject: bag
                .one_many("credentialSubject", Cardinality::NonEmpty)?
                .ok_or_else(|| Error::missing("credentialSubject"))?,
            valid_from: bag.optional("validFrom")?,
            valid_until: bag.optional("validUntil")?,
            credential_status: bag.one_many("credentialStatus", Cardinality::NonEmpty)?,
            credential_schema: bag.one_many("credentialSchema", Cardinality::NonEmpty)?,
            refresh_service: bag.one_many("refreshService", Cardinality::NonEmpty)?,
            terms_of_use: bag.one_many("termsOfUse", Cardinality::NonEmpty)?,
            evidence: bag.one_many("evidence", Cardinality::NonEmpty)?,
            properties: bag.into_rest(),
        })
    }
}

impl Encode for Credential {
    fn encode(&self) -> Value {
        merge(
            &self.properties,
            [
                ("@context", Some(self.context.encode())),
                ("id", self.id.clone().map(Value::String)),
                ("type", Some(self.type_.encode())),
                ("name", self.name.as_ref().map(Encode::encode)),
                ("description", self.description.as_ref().map(Encode::encode)),
                ("issuer", Some(self.issuer.encode())),
                ("credentialSubject", Some(self.credential_subject.encode())),
                ("validFrom", self.valid_from.clone().map(Value::String)),
                ("validUntil", self.valid_until.clone().map(Value::String)),
                ("credentialStatus", self.credential_status.as_ref().map(Encode::encode)),
                ("credentialSchema", self.credential_schema.as_ref().map(Encode::encode)),
                ("refreshService", self.refresh_service.as_ref().map(Encode::encode)),
                ("termsOfUse", self.terms_of_use.as_ref().map(Encode::encode)),
                ("evidence", self.evidence.as_ref().map(Encode::encode)),
            ],
        )
    }
}

impl Validate for Credential {
    fn validate_at(&self, path: &str, errors: &mut ValidationErrors) {
        validate_context(&self.context, path, errors);
        validate_uri(self.id.as_deref(), path, "id", errors);
        validate_type(&self.type_, VERIFIABLE_CREDENTIAL_TYPE, path, errors);

        if let Some(name) = &self.name {
            name.validate_at(&join(path, "name"), errors);
        }
        if let Some(description) = &self.description {
            description.validate_at(&join(path, "description"), errors);
        }

        self.issuer.validate_at(&join(path, "issuer"), errors);
        require_non_empty(&self.credential_subject, path, "credentialSubject", errors);
        self.credential_subject.validate_at(&join(path, "credentialSubject"), errors);

        for (field, value) in [("validFrom", &self.valid_from), ("validUntil", &self.valid_until)] {
            if let Some(value) = value
                && !is_rfc3339(value)
            {
                errors.push(join(path, field), "must be an RFC 3339 date-time");
            }
        }

        validate_collection(self.credential_status.as_ref(), path, "credentialStatus", errors);
        validate_collection(self.credential_schema.as_ref(), path, "credentialSchema", errors);
        validate_collection(self.refresh_service.as_ref(), path, "refreshService", errors);
        validate_collection(self.terms_of_use.as_ref(), path, "termsOfUse", errors);
        validate_collection(self.evidence.as_ref(), path, "evidence", errors);
    }
}

/// An optional collection must be non-empty when present, and each entry
/// must validate.
pub(super) fn validate_collection<T: Validate>(
    value: Option<&OneMany<T>>, path: &str, field: &str, errors: &mut ValidationErrors,
) {
    if let Some(value) = value {
        require_non_empty(value, path, field, errors);
        value.validate_at(&join(path, field), errors);
    }
}

json_codec!(Credential);
