//! # Presentation
//!
//! <https://www.w3.org/TR/vc-data-model-2.0/#verifiable-presentations>

use serde_json::{Map, Value};

use super::credential::validate_collection;
use super::{
    Context, EnvelopedVerifiableCredential, Holder, SecuredCredential, TermsOfUse,
    VERIFIABLE_PRESENTATION_TYPE, base_context, validate_context, validate_type, validate_uri,
};
use crate::core::properties::{PropertyBag, merge};
use crate::core::{Cardinality, Decode, Encode, Kind, OneMany, Validate, json_codec};
use crate::error::{Result, ValidationErrors, join};
use crate::sd_jwt::{Hasher, Sha2Hasher};

const KNOWN: &[&str] = &["@context", "id", "type", "holder", "verifiableCredential", "termsOfUse"];

/// A Verifiable Presentation is used to combine and present credentials to a
/// Verifer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Presentation {
    /// The @context property is used to map property URIs into short-form
    /// aliases. It is an ordered set where the first item is
    /// `"https://www.w3.org/ns/credentials/v2"`.
    pub context: OneMany<Context>,

    /// MAY be used to provide a unique identifier for the presentation.
    pub id: Option<String>,

    /// The type property is required and expresses the type of presentation,
    /// such as `VerifiablePresentation`. Consists of `VerifiablePresentation`
    /// and, optionally, a more specific verifiable presentation type.
    pub type_: OneMany<String>,

    /// The entity generating the presentation: a URI or a [`Holder`] object.
    /// For example, did:example:ebfeb1f712ebc6f1c276e12ec21.
    pub holder: Option<Kind<Holder>>,

    /// One or more enveloped Verifiable Credentials.
    pub verifiable_credential: Option<OneMany<EnvelopedVerifiableCredential>>,

    /// Terms under which the presentation was made.
    pub terms_of_use: Option<OneMany<TermsOfUse>>,

    /// Every top-level key not modeled above.
    pub properties: Map<String, Value>,
}

impl Presentation {
    /// Create an empty presentation with the base context and type.
    #[must_use]
    pub fn new() -> Self {
        Self {
            context: base_context(),
            id: None,
            type_: OneMany::Many(vec![VERIFIABLE_PRESENTATION_TYPE.to_string()]),
            holder: None,
            verifiable_credential: None,
            terms_of_use: None,
            properties: Map::new(),
        }
    }

    /// Add an enveloped credential.
    pub fn add_credential(&mut self, credential: EnvelopedVerifiableCredential) {
        match &mut self.verifiable_credential {
            Some(credentials) => credentials.add(credential),
            None => self.verifiable_credential = Some(OneMany::One(credential)),
        }
    }

    /// The holder's URI, whether expressed as a bare string or an object.
    #[must_use]
    pub fn holder_id(&self) -> Option<&str> {
        self.holder.as_ref().map(|holder| match holder {
            Kind::String(id) => id.as_str(),
            Kind::Object(holder) => holder.id.as_str(),
        })
    }

    /// Every `@context` entry, regardless of whether it was a single value.
    #[must_use]
    pub fn contexts(&self) -> &[Context] {
        self.context.as_slice()
    }

    /// Decode every enclosed credential using the default SHA-2 hasher.
    ///
    /// # Errors
    ///
    /// See [`Self::credentials_with`].
    pub fn credentials(&self) -> Result<Vec<SecuredCredential>> {
        self.credentials_with(&Sha2Hasher)
    }

    /// Decode every enclosed credential, in order.
    ///
    /// # Errors
    ///
    /// Returns the first error from
    /// [`EnvelopedVerifiableCredential::resolve_credential_with`].
    pub fn credentials_with(&self, hasher: &dyn Hasher) -> Result<Vec<SecuredCredential>> {
        let Some(credentials) = &self.verifiable_credential else {
            return Ok(vec![]);
        };
        credentials.iter().map(|vc| vc.resolve_credential_with(hasher)).collect()
    }
}

impl Default for Presentation {
    fn default() -> Self {
        Self::new()
    }
}

impl Decode for Presentation {
    fn decode(value: Value) -> Result<Self> {
        let mut bag = PropertyBag::split(value, KNOWN)?;

        Ok(Self {
            context: bag.one_many("@context", Cardinality::AllowEmpty)?.unwrap_or_else(base_context),
            id: bag.optional("id")?,
            type_: bag
                .one_many("type", Cardinality::AllowEmpty)?
                .unwrap_or_else(|| OneMany::Many(vec![VERIFIABLE_PRESENTATION_TYPE.to_string()])),
            holder: bag.optional("holder")?,
            verifiable_credential: bag.one_many("verifiableCredential", Cardinality::NonEmpty)?,
            terms_of_use: bag.one_many("termsOfUse", Cardinality::NonEmpty)?,
            properties: bag.into_rest(),
        })
    }
}

impl Encode for Presentation {
    fn encode(&self) -> Value {
        merge(
            &self.properties,
            [
                ("@context", Some(self.context.encode())),
                ("id", self.id.clone().map(Value::String)),
                ("type", Some(self.type_.encode())),
                ("holder", self.holder.as_ref().map(Encode::encode)),
                ("verifiableCredential", self.verifiable_credential.as_ref().map(Encode::encode)),
                ("termsOfUse", self.terms_of_use.as_ref().map(Encode::encode)),
            ],
        )
    }
}

impl Validate for Presentation {
    fn validate_at(&self, path: &str, errors: &mut ValidationErrors) {
        validate_context(&self.context, path, errors);
        validate_uri(self.id.as_deref(), path, "id", errors);
        validate_type(&self.type_, VERIFIABLE_PRESENTATION_TYPE, path, errors);
        if let Some(holder) = &self.holder {
            holder.validate_at(&join(path, "holder"), errors);
        }
        validate_collection(self.verifiable_credential.as_ref(), path, "verifiableCredential", errors);
        validate_collection(self.terms_of_use.as_ref(), path, "termsOfUse", errors);
    }
}

json_codec!(Presentation);

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::Error;

    #[test]
    fn round_trip() {
        let raw = json!({
            "@context": ["https://www.w3.org/ns/credentials/v2"],
            "id": "urn:uuid:3978344f-8596-4c3a-a978-8fcaba3903c5",
            "type": ["VerifiablePresentation", "ExamplePresentation"],
            "holder": {"id": "did:example:holder", "name": "Alice"},
            "verifiableCredential": [{
                "@context": "https://www.w3.org/ns/credentials/v2",
                "id": "data:application/vc+sd-jwt,eyJhbGciOiJFUzI1NiJ9.e30.c2ln~",
                "type": "EnvelopedVerifiableCredential"
            }],
            "nonce": "n-0S6_WzA2Mj"
        });
        let vp = Presentation::try_from(raw.clone()).expect("should decode");
        assert_eq!(vp.holder_id(), Some("did:example:holder"));
        assert_eq!(vp.properties.len(), 1);
        assert_eq!(vp.encode(), raw);
    }

    #[test]
    fn defaults() {
        let vp = Presentation::try_from(json!({"holder": "did:example:holder"})).expect("should decode");
        assert_eq!(vp, Presentation {
            holder: Some(Kind::String("did:example:holder".to_string())),
            ..Presentation::new()
        });
        assert!(vp.credentials().expect("should resolve").is_empty());
    }

    #[test]
    fn empty_credentials() {
        let err = Presentation::decode(json!({"verifiableCredential": []})).expect_err("should fail");
        assert!(matches!(err, Error::EmptyCollection { ref field } if field == "verifiableCredential"));
    }

    #[test]
    fn validation() {
        let mut vp = Presentation::new();
        vp.type_ = OneMany::One("VerifiableCredential".to_string());
        vp.holder = Some(Kind::String("holder".to_string()));
        vp.add_credential(EnvelopedVerifiableCredential::new("data:text/plain,a"));
        vp.add_credential(EnvelopedVerifiableCredential::new("not a data uri"));

        let Err(Error::Validation(errors)) = vp.validate() else {
            panic!("should fail validation");
        };
        assert_eq!(errors.fields(), vec!["type", "holder", "verifiableCredential[1].id"]);
    }
}
