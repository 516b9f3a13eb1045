//! # SD-JWT Verifiable Credential
//!
//! A W3C credential secured as an SD-JWT (`vc+sd-jwt`).

use serde_json::Value;
use tracing::instrument;

use super::{ClaimFormat, DecodedSdJwt, Hasher, Sha2Hasher, assert_header, decode};
use crate::error::{Result, envelope};
use crate::w3c_vc::Credential;

/// Data URI prefix of an SD-JWT secured credential.
pub const VC_SD_JWT_PREFIX: &str = "data:application/vc+sd-jwt,";

/// A credential decoded from an SD-JWT, alongside the token it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SdJwtVerifiableCredential {
    sd_jwt: DecodedSdJwt,
    credential: Credential,
}

impl SdJwtVerifiableCredential {
    /// Decode a compact SD-JWT using the default SHA-2 hasher.
    ///
    /// # Errors
    ///
    /// See [`Self::from_compact_with`].
    pub fn from_compact(compact: &str) -> Result<Self> {
        Self::from_compact_with(compact, &Sha2Hasher)
    }

    /// Decode a compact SD-JWT, reveal its disclosed claims, and decode them
    /// as a [`Credential`].
    ///
    /// # Errors
    ///
    /// Returns an SD-JWT decoding error (see [`super::decode`]),
    /// [`crate::Error::InvalidHeaderAssertion`] if the `typ` or `cyt` header
    /// is present with the wrong value, or the decode or validation error of
    /// the revealed credential.
    #[instrument(level = "debug", skip_all)]
    pub fn from_compact_with(compact: &str, hasher: &dyn Hasher) -> Result<Self> {
        let sd_jwt = decode(compact, hasher)?;
        assert_header(&sd_jwt.header, "typ", ClaimFormat::VcSdJwt.as_str())?;
        assert_header(&sd_jwt.header, "cyt", "vc")?;

        let credential = Credential::try_from(Value::Object(sd_jwt.claims.clone()))?;
        Ok(Self { sd_jwt, credential })
    }

    /// Decode a `data:application/vc+sd-jwt,<compact>` URI.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MalformedEnvelope`] if the URI does not carry
    /// the exact prefix, otherwise see [`Self::from_compact`].
    pub fn from_data_uri(data_uri: &str) -> Result<Self> {
        Self::from_data_uri_with(data_uri, &Sha2Hasher)
    }

    /// Decode a `data:application/vc+sd-jwt,<compact>` URI with the given
    /// hasher.
    ///
    /// # Errors
    ///
    /// See [`Self::from_data_uri`].
    pub fn from_data_uri_with(data_uri: &str, hasher: &dyn Hasher) -> Result<Self> {
        let Some(compact) = data_uri.strip_prefix(VC_SD_JWT_PREFIX) else {
            return Err(envelope!("data URI must start with `{VC_SD_JWT_PREFIX}`"));
        };
        Self::from_compact_with(compact, hasher)
    }

    /// The compact SD-JWT, exactly as decoded.
    #[must_use]
    pub fn compact(&self) -> &str {
        self.sd_jwt.compact()
    }

    /// The credential as a data URI.
    #[must_use]
    pub fn data_uri(&self) -> String {
        format!("{VC_SD_JWT_PREFIX}{}", self.compact())
    }

    /// The credential's claim format.
    #[must_use]
    pub const fn claim_format(&self) -> ClaimFormat {
        ClaimFormat::VcSdJwt
    }

    /// The decoded SD-JWT: header, payload, disclosures, and revealed claims.
    #[must_use]
    pub const fn sd_jwt(&self) -> &DecodedSdJwt {
        &self.sd_jwt
    }

    /// The revealed credential.
    #[must_use]
    pub const fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Consume the wrapper, returning the revealed credential.
    #[must_use]
    pub fn into_credential(self) -> Credential {
        self.credential
    }
}
