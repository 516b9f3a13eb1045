//! # Verifiable Credential
//!
//! A secured credential arrives either wrapped in an
//! `EnvelopedVerifiableCredential` object or as a bare compact SD-JWT. Both
//! entry points decode to [`VerifiableCredential`], which exposes the
//! revealed [`Credential`] the same way whichever route was taken.

use serde_json::Value;

use crate::core::Encode;
use crate::error::Result;
use crate::sd_jwt::{Hasher, SdJwtVerifiableCredential, Sha2Hasher};
use crate::w3c_vc::{Credential, EnvelopedVerifiableCredential, SecuredCredential};

/// A secured credential and the route it was decoded by.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerifiableCredential {
    /// Decoded from an `EnvelopedVerifiableCredential` object.
    Enveloped {
        /// The envelope as received.
        envelope: EnvelopedVerifiableCredential,

        /// The credential the envelope resolved to.
        secured: SecuredCredential,
    },

    /// Decoded from a compact SD-JWT.
    SdJwt(SdJwtVerifiableCredential),
}

impl VerifiableCredential {
    /// Decode an `EnvelopedVerifiableCredential` object and resolve its
    /// contents using the default SHA-2 hasher.
    ///
    /// # Errors
    ///
    /// See [`Self::from_enveloped_with`].
    pub fn from_enveloped(value: Value) -> Result<Self> {
        Self::from_enveloped_with(value, &Sha2Hasher)
    }

    /// Decode and validate an `EnvelopedVerifiableCredential` object, then
    /// resolve its contents.
    ///
    /// # Errors
    ///
    /// Returns the envelope's decode or validation error, or the error from
    /// [`EnvelopedVerifiableCredential::resolve_credential_with`].
    pub fn from_enveloped_with(value: Value, hasher: &dyn Hasher) -> Result<Self> {
        let envelope = EnvelopedVerifiableCredential::try_from(value)?;
        let secured = envelope.resolve_credential_with(hasher)?;
        Ok(Self::Enveloped { envelope, secured })
    }

    /// Decode a compact SD-JWT using the default SHA-2 hasher.
    ///
    /// # Errors
    ///
    /// See [`SdJwtVerifiableCredential::from_compact_with`].
    pub fn from_compact(compact: &str) -> Result<Self> {
        Self::from_compact_with(compact, &Sha2Hasher)
    }

    /// Decode a compact SD-JWT.
    ///
    /// # Errors
    ///
    /// See [`SdJwtVerifiableCredential::from_compact_with`].
    pub fn from_compact_with(compact: &str, hasher: &dyn Hasher) -> Result<Self> {
        SdJwtVerifiableCredential::from_compact_with(compact, hasher).map(Self::SdJwt)
    }

    /// The revealed credential.
    #[must_use]
    pub const fn credential(&self) -> &Credential {
        match self {
            Self::Enveloped { secured, .. } => secured.credential(),
            Self::SdJwt(vc) => vc.credential(),
        }
    }
}

impl Encode for VerifiableCredential {
    /// The credential in the shape it was received: the envelope object, or
    /// the compact SD-JWT as a JSON string.
    fn encode(&self) -> Value {
        match self {
            Self::Enveloped { envelope, .. } => envelope.encode(),
            Self::SdJwt(vc) => Value::String(vc.compact().to_string()),
        }
    }
}
