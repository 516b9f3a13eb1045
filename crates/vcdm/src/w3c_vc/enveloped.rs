//! # Enveloped Verifiable Credential
//!
//! A credential secured by an enveloping proof is carried as a data URI in
//! the `id` of an `EnvelopedVerifiableCredential`:
//!
//! ```json
//! {
//!   "@context": "https://www.w3.org/ns/credentials/v2",
//!   "id": "data:application/vc+sd-jwt,eyJhbGciOiJFUzI1NiIs…",
//!   "type": "EnvelopedVerifiableCredential"
//! }
//! ```
//!
//! Decoding checks the envelope's shape only. The enclosed credential is
//! decoded on demand by [`EnvelopedVerifiableCredential::resolve_credential`],
//! so an envelope whose contents cannot be decoded can still be held and
//! passed on.
//!
//! <https://www.w3.org/TR/vc-data-model-2.0/#enveloped-verifiable-credentials>

use serde_json::{Map, Value};
use tracing::instrument;

use super::{
    CREDENTIALS_CONTEXT_V2, Context, Credential, ENVELOPED_VERIFIABLE_CREDENTIAL_TYPE,
    validate_context, validate_type,
};
use crate::core::properties::{PropertyBag, merge};
use crate::core::syntax::is_data_uri;
use crate::core::{Cardinality, Decode, Encode, Kind, OneMany, Validate, json_codec};
use crate::error::{Error, Result, ValidationErrors, envelope, join};
use crate::sd_jwt::{ClaimFormat, Hasher, SdJwtVerifiableCredential, Sha2Hasher};

const KNOWN: &[&str] = &["@context", "id", "type"];

/// Decodes the payload of a data URI into a secured credential.
type Resolver = fn(&str, &dyn Hasher) -> Result<SecuredCredential>;

/// Media types with a registered decoder.
static FORMATS: &[(&str, Resolver)] = &[("application/vc+sd-jwt", resolve_vc_sd_jwt)];

fn resolve_vc_sd_jwt(payload: &str, hasher: &dyn Hasher) -> Result<SecuredCredential> {
    SdJwtVerifiableCredential::from_compact_with(payload, hasher).map(SecuredCredential::SdJwt)
}

/// A credential carried inside an enveloping proof.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnvelopedVerifiableCredential {
    /// The JSON-LD context. Defaults to the base VC 2.0 context.
    pub context: OneMany<Context>,

    /// A `data:<mimetype>,<payload>` URI holding the secured credential.
    pub id: String,

    /// Must be, or include, `EnvelopedVerifiableCredential`.
    pub type_: OneMany<String>,

    /// Any other keys of the envelope.
    pub properties: Map<String, Value>,
}

impl EnvelopedVerifiableCredential {
    /// Create an envelope for the given data URI.
    #[must_use]
    pub fn new(data_uri: impl Into<String>) -> Self {
        Self {
            context: OneMany::One(Kind::String(CREDENTIALS_CONTEXT_V2.to_string())),
            id: data_uri.into(),
            type_: OneMany::One(ENVELOPED_VERIFIABLE_CREDENTIAL_TYPE.to_string()),
            properties: Map::new(),
        }
    }

    /// The media type declared by the data URI.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedEnvelope`] if `id` is not a data URI.
    pub fn media_type(&self) -> Result<&str> {
        resolve_data_uri(&self.id).map(|(media_type, _)| media_type)
    }

    /// Decode the enclosed credential using the default SHA-2 hasher.
    ///
    /// # Errors
    ///
    /// See [`Self::resolve_credential_with`].
    pub fn resolve_credential(&self) -> Result<SecuredCredential> {
        self.resolve_credential_with(&Sha2Hasher)
    }

    /// Decode the enclosed credential, dispatching on the data URI's media
    /// type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedEnvelope`] if `id` is not a data URI,
    /// [`Error::UnsupportedEnvelopeFormat`] if the media type has no
    /// decoder, or the decoder's error.
    #[instrument(level = "debug", skip_all, fields(id_len = self.id.len()))]
    pub fn resolve_credential_with(&self, hasher: &dyn Hasher) -> Result<SecuredCredential> {
        let (media_type, payload) = resolve_data_uri(&self.id)?;
        let Some((_, resolve)) = FORMATS.iter().find(|(mt, _)| *mt == media_type) else {
            return Err(Error::UnsupportedEnvelopeFormat {
                mimetype: media_type.to_string(),
            });
        };
        tracing::trace!(media_type, "resolving enveloped credential");
        resolve(payload, hasher)
    }
}

impl From<&SdJwtVerifiableCredential> for EnvelopedVerifiableCredential {
    fn from(vc: &SdJwtVerifiableCredential) -> Self {
        Self::new(vc.data_uri())
    }
}

/// Split a data URI into its media type and payload.
///
/// # Errors
///
/// Returns [`Error::MalformedEnvelope`] if `uri` is not of the form
/// `data:<mimetype>,<payload>`.
pub fn resolve_data_uri(uri: &str) -> Result<(&str, &str)> {
    let Some(rest) = uri.strip_prefix("data:") else {
        return Err(envelope!("`id` must be a data URI"));
    };
    rest.split_once(',')
        .ok_or_else(|| envelope!("data URI must be of the form `data:<mimetype>,<payload>`"))
}

impl Decode for EnvelopedVerifiableCredential {
    fn decode(value: Value) -> Result<Self> {
        let mut bag = PropertyBag::split(value, KNOWN)?;

        let id: String = bag.required("id")?;
        if !is_data_uri(&id) {
            return Err(envelope!("`id` must be of the form `data:<mimetype>,<payload>`"));
        }

        Ok(Self {
            context: bag
                .one_many("@context", Cardinality::AllowEmpty)?
                .unwrap_or_else(|| OneMany::One(Kind::String(CREDENTIALS_CONTEXT_V2.to_string()))),
            id,
            type_: bag
                .one_many("type", Cardinality::AllowEmpty)?
                .unwrap_or_else(|| OneMany::One(ENVELOPED_VERIFIABLE_CREDENTIAL_TYPE.to_string())),
            properties: bag.into_rest(),
        })
    }
}

impl Encode for EnvelopedVerifiableCredential {
    fn encode(&self) -> Value {
        merge(
            &self.properties,
            [
                ("@context", Some(self.context.encode())),
                ("id", Some(Value::String(self.id.clone()))),
                ("type", Some(self.type_.encode())),
            ],
        )
    }
}

impl Validate for EnvelopedVerifiableCredential {
    fn validate_at(&self, path: &str, errors: &mut ValidationErrors) {
        validate_context(&self.context, path, errors);
        if !is_data_uri(&self.id) {
            errors.push(join(path, "id"), "must be a data URI");
        }
        validate_type(&self.type_, ENVELOPED_VERIFIABLE_CREDENTIAL_TYPE, path, errors);
    }
}

json_codec!(EnvelopedVerifiableCredential);

/// A credential recovered from an envelope, by securing format.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum SecuredCredential {
    /// `application/vc+sd-jwt`
    SdJwt(SdJwtVerifiableCredential),
}

impl SecuredCredential {
    /// The enclosed credential.
    #[must_use]
    pub const fn credential(&self) -> &Credential {
        match self {
            Self::SdJwt(vc) => vc.credential(),
        }
    }

    /// The securing format.
    #[must_use]
    pub const fn claim_format(&self) -> ClaimFormat {
        match self {
            Self::SdJwt(vc) => vc.claim_format(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn defaults() {
        let envelope = EnvelopedVerifiableCredential::try_from(json!({"id": "data:text/plain,hello"}))
            .expect("should decode");
        assert_eq!(
            envelope.encode(),
            json!({
                "@context": "https://www.w3.org/ns/credentials/v2",
                "id": "data:text/plain,hello",
                "type": "EnvelopedVerifiableCredential"
            })
        );
    }

    #[test]
    fn malformed_id() {
        let err = EnvelopedVerifiableCredential::decode(json!({"id": "data:text/plain"}))
            .expect_err("should fail");
        assert!(matches!(err, Error::MalformedEnvelope(_)));

        let err = EnvelopedVerifiableCredential::decode(json!({"id": "https://example.com"}))
            .expect_err("should fail");
        assert!(matches!(err, Error::MalformedEnvelope(_)));

        let err = EnvelopedVerifiableCredential::decode(json!({})).expect_err("should fail");
        assert!(matches!(err, Error::MissingField { ref field } if field == "id"));
    }

    #[test]
    fn type_must_include_enveloped() {
        EnvelopedVerifiableCredential::try_from(json!({
            "id": "data:text/plain,hello",
            "type": ["EnvelopedVerifiableCredential", "Other"]
        }))
        .expect("should include");

        let err = EnvelopedVerifiableCredential::try_from(json!({
            "id": "data:text/plain,hello",
            "type": "VerifiableCredential"
        }))
        .expect_err("should fail");
        let Error::Validation(errors) = err else {
            panic!("should be a validation error");
        };
        assert_eq!(errors.fields(), vec!["type"]);
    }

    #[test]
    fn unsupported_media_type() {
        let envelope = EnvelopedVerifiableCredential::new("data:text/plain,hello");
        assert_eq!(envelope.media_type().expect("should parse"), "text/plain");

        let err = envelope.resolve_credential().expect_err("should fail");
        assert!(matches!(err, Error::UnsupportedEnvelopeFormat { ref mimetype } if mimetype == "text/plain"));
    }

    #[test]
    fn data_uri_parts() {
        assert_eq!(
            resolve_data_uri("data:application/vc+sd-jwt,a.b.c~d~").expect("should split"),
            ("application/vc+sd-jwt", "a.b.c~d~")
        );
        assert_eq!(resolve_data_uri("data:,").expect("should split"), ("", ""));
        resolve_data_uri("data:no-comma").expect_err("should fail");
        resolve_data_uri("http://a,b").expect_err("should fail");
    }
}
