//! # SD-JWT Verifiable Presentation
//!
//! A W3C presentation secured as an SD-JWT (`vp+sd-jwt`).

use serde_json::Value;
use tracing::instrument;

use super::{ClaimFormat, DecodedSdJwt, Hasher, Sha2Hasher, assert_header, decode};
use crate::error::{Result, envelope};
use crate::w3c_vc::Presentation;

/// Data URI prefix of an SD-JWT secured presentation.
pub const VP_SD_JWT_PREFIX: &str = "data:application/vp+sd-jwt,";

/// A presentation decoded from an SD-JWT, alongside the token it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SdJwtVerifiablePresentation {
    sd_jwt: DecodedSdJwt,
    presentation: Presentation,
}

impl SdJwtVerifiablePresentation {
    /// Decode a compact SD-JWT using the default SHA-2 hasher.
    ///
    /// # Errors
    ///
    /// See [`Self::from_compact_with`].
    pub fn from_compact(compact: &str) -> Result<Self> {
        Self::from_compact_with(compact, &Sha2Hasher)
    }

    /// Decode a compact SD-JWT, reveal its disclosed claims, and decode them
    /// as a [`Presentation`].
    ///
    /// # Errors
    ///
    /// Returns an SD-JWT decoding error,
    /// [`crate::Error::InvalidHeaderAssertion`] if the `typ` or `cyt` header
    /// is present with the wrong value, or the decode or validation error of
    /// the revealed presentation.
    #[instrument(level = "debug", skip_all)]
    pub fn from_compact_with(compact: &str, hasher: &dyn Hasher) -> Result<Self> {
        let sd_jwt = decode(compact, hasher)?;
        assert_header(&sd_jwt.header, "typ", ClaimFormat::VpSdJwt.as_str())?;
        assert_header(&sd_jwt.header, "cyt", "vp")?;

        let presentation = Presentation::try_from(Value::Object(sd_jwt.claims.clone()))?;
        Ok(Self { sd_jwt, presentation })
    }

    /// Decode a `data:application/vp+sd-jwt,<compact>` URI.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MalformedEnvelope`] if the URI does not carry
    /// the exact prefix, otherwise see [`Self::from_compact`].
    pub fn from_data_uri(data_uri: &str) -> Result<Self> {
        Self::from_data_uri_with(data_uri, &Sha2Hasher)
    }

    /// Decode a `data:application/vp+sd-jwt,<compact>` URI with the given
    /// hasher.
    ///
    /// # Errors
    ///
    /// See [`Self::from_data_uri`].
    pub fn from_data_uri_with(data_uri: &str, hasher: &dyn Hasher) -> Result<Self> {
        let Some(compact) = data_uri.strip_prefix(VP_SD_JWT_PREFIX) else {
            return Err(envelope!("data URI must start with `{VP_SD_JWT_PREFIX}`"));
        };
        Self::from_compact_with(compact, hasher)
    }

    /// The compact SD-JWT, exactly as decoded.
    #[must_use]
    pub fn compact(&self) -> &str {
        self.sd_jwt.compact()
    }

    /// The presentation as a data URI.
    #[must_use]
    pub fn data_uri(&self) -> String {
        format!("{VP_SD_JWT_PREFIX}{}", self.compact())
    }

    /// The presentation's claim format.
    #[must_use]
    pub const fn claim_format(&self) -> ClaimFormat {
        ClaimFormat::VpSdJwt
    }

    /// The decoded SD-JWT.
    #[must_use]
    pub const fn sd_jwt(&self) -> &DecodedSdJwt {
        &self.sd_jwt
    }

    /// The revealed presentation.
    #[must_use]
    pub const fn presentation(&self) -> &Presentation {
        &self.presentation
    }
}

#[cfg(test)]
mod tests {
    use base64ct::{Base64UrlUnpadded, Encoding};
    use serde_json::json;

    use super::*;
    use crate::error::Error;

    fn token(header: &Value) -> String {
        let payload = json!({
            "@context": ["https://www.w3.org/ns/credentials/v2"],
            "type": ["VerifiablePresentation"],
            "holder": "did:example:alice"
        });
        format!(
            "{}.{}.c2ln~",
            Base64UrlUnpadded::encode_string(header.to_string().as_bytes()),
            Base64UrlUnpadded::encode_string(payload.to_string().as_bytes())
        )
    }

    #[test]
    fn header_checks() {
        SdJwtVerifiablePresentation::from_compact(&token(&json!({"alg": "ES256"})))
            .expect("absent headers should pass");
        let vp = SdJwtVerifiablePresentation::from_compact(&token(
            &json!({"alg": "ES256", "typ": "vp+sd-jwt", "cyt": "vp"}),
        ))
        .expect("expected headers should pass");
        assert_eq!(vp.presentation().holder_id(), Some("did:example:alice"));

        let err = SdJwtVerifiablePresentation::from_compact(&token(&json!({"typ": "vc+sd-jwt"})))
            .expect_err("credential typ should fail");
        let Error::InvalidHeaderAssertion { header, expected, found } = err else {
            panic!("should be a header assertion error");
        };
        assert_eq!((header, expected, found.as_str()), ("typ", "vp+sd-jwt", "vc+sd-jwt"));

        let err = SdJwtVerifiablePresentation::from_compact(&token(&json!({"cyt": "vc"})))
            .expect_err("credential cyt should fail");
        assert!(matches!(
            err,
            Error::InvalidHeaderAssertion { header: "cyt", expected: "vp", ref found } if found == "vc"
        ));
    }
}
